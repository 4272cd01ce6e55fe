use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Log level options for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// No logging output
    Off,
    /// Error messages only
    Error,
    /// Warnings and errors
    Warn,
    /// Informational messages
    Info,
    /// Debug messages
    Debug,
    /// Trace-level messages (most verbose)
    Trace,
}

impl LogLevel {
    /// Name accepted by `EnvFilter` and the config file.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Off => "off",
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Output format for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable table
    Table,
    /// JSON document
    Json,
}

/// Output format for `config show`
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ConfigFormat {
    /// TOML, as written in the config file
    Toml,
    /// JSON document
    Json,
}

#[derive(Parser)]
#[command(name = "assetsync")]
#[command(about = "assetsync - keep $-marked images in sync with a Contentful asset catalog")]
#[command(version)]
pub struct Cli {
    /// Subcommand to execute (defaults to run if not provided)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Set log level (off, error, warn, info, debug, trace)
    /// If not specified, uses config file value
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Enable verbose logging (shortcut for --log-level=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path (defaults to ~/.config/assetsync/config.toml)
    #[arg(short = 'C', long, global = true, env = "ASSETSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Config profile to overlay ([profiles.<name>] table)
    #[arg(short = 'p', long, global = true)]
    pub profile: Option<String>,

    /// Watched asset directory (overrides config file)
    #[arg(short = 'd', long = "asset-dir", global = true)]
    pub asset_dir: Option<PathBuf>,

    /// Directory for daily rolling log files (overrides config file)
    #[arg(long = "log-dir", global = true)]
    pub log_dir: Option<PathBuf>,
}

impl Cli {
    /// Level requested on the command line, if any.
    pub fn requested_level(&self) -> Option<LogLevel> {
        self.log_level
            .or(if self.verbose { Some(LogLevel::Debug) } else { None })
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan, reconcile against the catalog, then watch for changes until Ctrl-C
    Run,

    /// Print the inventory of sync subjects found under the asset directory
    Scan {
        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Bring the catalog in line with the files on disk
    Reconcile {
        /// Print the plan without executing it
        #[arg(long)]
        dry_run: bool,

        /// Output format for the plan
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write an example config file
    Init {
        /// Where to write it (defaults to the default config path)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration, secrets masked
    Show {
        /// Output format
        #[arg(short, long, value_enum, default_value = "toml")]
        format: ConfigFormat,
    },
}
