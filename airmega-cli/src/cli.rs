use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "airmega", version, about = "Control Coway Airmega air purifiers from the command line")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Account username (overrides the config file)
    #[arg(long, global = true, env = "AIRMEGA_USERNAME")]
    pub username: Option<String>,

    /// Account password (overrides the config file)
    #[arg(long, global = true, env = "AIRMEGA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Pretty)]
    pub output: OutputFormat,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and cache the issued tokens
    Login,

    /// List the purifiers on the account
    Devices,

    /// Show the current state of a purifier
    Status {
        /// Barcode or nickname
        device: String,
    },

    /// Show filter life levels of a purifier
    Filters {
        /// Barcode or nickname
        device: String,
    },

    /// Turn a purifier on or off
    Power { device: String, state: Switch },

    /// Switch between automatic and manual mode
    Mode { device: String, mode: ModeArg },

    /// Set the fan speed (1-3)
    Fan {
        device: String,
        #[arg(value_parser = clap::value_parser!(u8).range(1..=3))]
        speed: u8,
    },

    /// Turn the indicator light on or off
    Light { device: String, state: Switch },

    /// Show or reset the configuration
    Config {
        #[arg(long)]
        show: bool,
        #[arg(long)]
        reset: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Pretty,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Switch {
    On,
    Off,
}

impl Switch {
    pub fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Auto,
    Manual,
}

impl From<ModeArg> for airmega::Mode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => airmega::Mode::Auto,
            ModeArg::Manual => airmega::Mode::Manual,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fan_command() {
        let args = Args::try_parse_from(["airmega", "fan", "Bedroom", "3", "-o", "json"]).unwrap();
        assert_eq!(args.output, OutputFormat::Json);
        assert!(matches!(args.command, Commands::Fan { speed: 3, .. }));
    }

    #[test]
    fn test_fan_speed_range() {
        assert!(Args::try_parse_from(["airmega", "fan", "Bedroom", "4"]).is_err());
    }

    #[test]
    fn test_parse_switch() {
        let args = Args::try_parse_from(["airmega", "power", "02EUZ", "off"]).unwrap();
        match args.command {
            Commands::Power { device, state } => {
                assert_eq!(device, "02EUZ");
                assert!(!state.is_on());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
