use std::path::PathBuf;

use chorus_config::LogFormat;
use chorus_core::Mode;
use clap::{Parser, Subcommand, ValueEnum};

/// Chorus multi-provider router
#[derive(Debug, Parser)]
#[command(
    name = "chorus",
    about = "Route a request to several text-generation providers and merge their answers"
)]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "chorus.toml", env = "CHORUS_CONFIG")]
    pub config: PathBuf,

    /// Override the configured log format
    #[arg(long, value_enum, env = "CHORUS_LOG_FORMAT")]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Route a request and print the synthesized answer
    Route {
        /// Processing mode: `normal` or `deep`
        #[arg(short, long, default_value = "normal")]
        mode: Mode,

        /// Print the whole result as JSON
        #[arg(long)]
        json: bool,

        /// Request text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Print persisted per-provider usage counters
    Usage {
        /// Print counters as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Text => Self::Text,
            LogFormatArg::Json => Self::Json,
        }
    }
}
