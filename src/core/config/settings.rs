use super::parsing::{env_optional, env_or_default, parse_bool, parse_environment, parse_f64, parse_u64};
use super::types::{
    ConfigError, GradingSettings, RuntimeSettings, Settings, TelemetrySettings, TimerSettings,
};

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        let environment =
            parse_environment(env_optional("EXAMFLOW_ENV").or_else(|| env_optional("ENVIRONMENT")));

        let default_passing_score = parse_f64(
            "EXAMFLOW_PASSING_SCORE",
            env_or_default("EXAMFLOW_PASSING_SCORE", "60"),
        )?;
        let warning_threshold_seconds = parse_u64(
            "EXAMFLOW_TIMER_WARNING_SECONDS",
            env_or_default("EXAMFLOW_TIMER_WARNING_SECONDS", "300"),
        )?;

        let log_level = env_or_default("EXAMFLOW_LOG_LEVEL", "info");
        let json = env_optional("EXAMFLOW_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            runtime: RuntimeSettings { environment },
            grading: GradingSettings { default_passing_score },
            timer: TimerSettings { warning_threshold_seconds },
            telemetry: TelemetrySettings { log_level, json },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    pub fn grading(&self) -> &GradingSettings {
        &self.grading
    }

    pub fn timer(&self) -> &TimerSettings {
        &self.timer
    }

    pub fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=100.0).contains(&self.grading.default_passing_score) {
            return Err(ConfigError::InvalidValue {
                field: "EXAMFLOW_PASSING_SCORE",
                value: self.grading.default_passing_score.to_string(),
            });
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            runtime: RuntimeSettings { environment: super::types::Environment::Development },
            grading: GradingSettings { default_passing_score: 60.0 },
            timer: TimerSettings { warning_threshold_seconds: 300 },
            telemetry: TelemetrySettings { log_level: "info".to_string(), json: false },
        }
    }
}
