use clap::Parser;
use orchid::cli::{self, Cli, Commands};
use orchid::config::AppConfig;
use orchid::error::{OrchidError, Result};
use orchid::vitals::VitalsSample;
use tracing::error;

mod main_runtime;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_from(&cli.config)?;
    cli.apply_overrides(&mut config);
    config.validate().map_err(OrchidError::InvalidConfig)?;

    let _log_guard = main_runtime::init_logging(&config.logging);

    let result = match &cli.command {
        Commands::Train { .. } => cli::train(&config),
        Commands::Serve { .. } => cli::serve(&config).await,
        Commands::Predict {
            systolic,
            diastolic,
            spo2,
            temperature,
        } => cli::predict(
            &config,
            VitalsSample::from_features([*systolic, *diastolic, *spo2, *temperature]),
        ),
    };

    if let Err(ref e) = result {
        error!("{e}");
    }
    result
}
