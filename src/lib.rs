pub mod backend;
pub mod core;
pub mod schemas;
pub mod scoring;
pub mod services;
pub mod session;

#[cfg(test)]
mod test_support;

use crate::core::{config::Settings, telemetry};

/// Load environment configuration and install the tracing subscriber. Call
/// once from the embedding application before opening sessions.
pub fn init() -> anyhow::Result<Settings> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;

    tracing::info!(
        environment = %settings.runtime().environment.as_str(),
        "examflow core initialized"
    );

    Ok(settings)
}
