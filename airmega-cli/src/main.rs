mod cli;
mod commands;
mod config;
mod error;
mod output;

use crate::{
    cli::{Args, Commands, OutputFormat},
    commands::{CommandExecutor, ControlAction},
    config::AppConfig,
    error::Result,
};
use clap::Parser;
use std::process;
use tracing::{Level, debug, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let output = args.output;

    if let Err(e) = run(args).await {
        match output {
            OutputFormat::Json => {
                let error_json = serde_json::json!({
                    "status": "error",
                    "message": e.to_string(),
                });
                println!("{}", error_json);
            }
            OutputFormat::Pretty => {
                error!("Application error: {}", e);
                eprintln!("Error: {}", e);
            }
        }
        process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    init_logging(args.verbose, args.quiet)?;

    let config = AppConfig::load(args.config.as_deref())?;
    debug!("Loaded configuration from {:?}", args.config);

    if let Commands::Config { show, reset } = &args.command {
        if *reset {
            AppConfig::reset(args.config.as_deref())?;
            println!("Configuration reset to defaults");
        }
        if *show || !*reset {
            println!("{}", config.show()?);
        }
        return Ok(());
    }

    let executor = CommandExecutor::new(config, args.username, args.password, args.output);

    match args.command {
        Commands::Login => executor.login().await,
        Commands::Devices => executor.list_devices().await,
        Commands::Status { device } => executor.status(&device).await,
        Commands::Filters { device } => executor.filters(&device).await,
        Commands::Power { device, state } => {
            executor
                .control(&device, ControlAction::Power(state.is_on()))
                .await
        }
        Commands::Mode { device, mode } => {
            executor
                .control(&device, ControlAction::Mode(mode.into()))
                .await
        }
        Commands::Fan { device, speed } => executor.control(&device, ControlAction::Fan(speed)).await,
        Commands::Light { device, state } => {
            executor
                .control(&device, ControlAction::Light(state.is_on()))
                .await
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn init_logging(verbose: bool, quiet: bool) -> Result<()> {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .init();
    Ok(())
}
