//! P9710 Command-Line Tool
//!
//! Identifies a Gigahertz-Optik P9710 measuring head and its detector, takes
//! readings with their uncertainty, and switches measurement ranges.
//!
//! # Usage
//!
//! ```bash
//! p9710 --port /dev/ttyUSB0 read
//! p9710 --port COM3 range set 4
//! p9710 --simulate detector
//! p9710 uncertainty 1.5e-6
//! ```

mod cli;
mod commands;
mod error;
mod settings;

use std::process::ExitCode;

use clap::Parser;
use p9710_driver::Meter;
use p9710_sim::VirtualMeter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, RangeAction, SettingsAction};
use error::CliError;
use settings::Settings;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "p9710={level},p9710_protocol={level},p9710_driver={level},p9710_sim={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, CliError> {
    let settings = Settings::load().with_overrides(&cli.overrides());

    match cli.command {
        Commands::Uncertainty { current, range } => {
            Ok(commands::uncertainty(current, range.as_deref())?)
        }
        Commands::Ports { probe } => Ok(commands::ports(probe, &settings.session)?),
        Commands::Settings { action } => settings_command(&settings, action),
        Commands::Identify => Ok(commands::identify(&mut open_meter(&settings)?)),
        Commands::Detector => Ok(commands::detector(&mut open_meter(&settings)?)),
        Commands::Read => Ok(commands::read(&mut open_meter(&settings)?)),
        Commands::Range { action } => {
            let mut meter = open_meter(&settings)?;
            Ok(commands::range(
                &mut meter,
                action.unwrap_or(RangeAction::Show),
            )?)
        }
    }
}

fn open_meter(settings: &Settings) -> Result<Meter, CliError> {
    if settings.simulate {
        tracing::info!("Using a simulated head");
        return Ok(Meter::with_link(VirtualMeter::new(), &settings.session));
    }
    if settings.session.port.is_empty() {
        return Err(CliError::NoPort);
    }
    Ok(Meter::connect(&settings.session))
}

fn settings_command(
    settings: &Settings,
    action: Option<SettingsAction>,
) -> Result<String, CliError> {
    match action.unwrap_or(SettingsAction::Show) {
        SettingsAction::Show => {
            let path = Settings::settings_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no settings path)".to_string());
            let json = serde_json::to_string_pretty(settings)
                .map_err(|e| CliError::Settings(e.to_string()))?;
            Ok(format!("{}\n{}\n", path, json))
        }
        SettingsAction::Save => {
            let path = settings.save().map_err(CliError::Settings)?;
            Ok(format!("Saved {}\n", path.display()))
        }
    }
}
