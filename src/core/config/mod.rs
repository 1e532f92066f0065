mod parsing;
mod settings;
mod types;

pub use types::{
    ConfigError, Environment, GradingSettings, RuntimeSettings, Settings, TelemetrySettings,
    TimerSettings,
};
