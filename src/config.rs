//! Configuration management for RiskLens.
//!
//! This module provides a flexible configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `RISKLENS_` prefix
//! - Sensible defaults for all optional settings
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use risklens::config::{Cli, Command};
//!
//! match Cli::parse().command {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Analyze(config) => println!("Analyzing {}", config.csv_path.display()),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `RISKLENS_HOST` - Server bind address (default: 0.0.0.0)
//! - `RISKLENS_PORT` - Server port (default: 8000)
//! - `RISKLENS_BASE_DIR` - Directory holding the sample datasets (default: .)
//! - `RISKLENS_MEDIA_DIR` - Root directory for stored uploads (default: media)
//! - `RISKLENS_MAX_UPLOAD_SIZE` - Maximum request body size in bytes (default: 10 MiB)
//! - `RISKLENS_CORS_ORIGINS` - Allowed CORS origins, comma-separated
//! - `RISKLENS_ANALYZER` - `heuristic` or `command` (default: heuristic)
//! - `RISKLENS_ANALYZER_COMMAND` - Program run by the command analyzer
//! - `RISKLENS_ANALYZER_ARGS` - Extra arguments for the program, comma-separated
//! - `RISKLENS_ANALYZER_TIMEOUT` - Command analyzer timeout in seconds (default: 300)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default directory containing `clean_dataset.csv` and `dirty_dataset.csv`.
pub const DEFAULT_BASE_DIR: &str = ".";

/// Default root directory for uploaded files.
pub const DEFAULT_MEDIA_DIR: &str = "media";

/// Default maximum request body size (10 MiB).
pub const DEFAULT_MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Default timeout for the external analyzer command in seconds.
pub const DEFAULT_ANALYZER_TIMEOUT: u64 = 300;

// =============================================================================
// CLI Arguments
// =============================================================================

/// RiskLens - threat analysis for CSV activity logs.
#[derive(Parser, Debug, Clone)]
#[command(name = "risklens")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP API server.
    Serve(ServeConfig),

    /// Run the configured analyzer once on a local CSV file and print the result.
    Analyze(AnalyzeConfig),
}

/// Which analyzer implementation handles CSV files.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyzerKind {
    /// Built-in column heuristic.
    Heuristic,
    /// External program that prints JSON on stdout.
    Command,
}

/// Analyzer selection shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct AnalyzerArgs {
    /// Analyzer implementation.
    #[arg(long, value_enum, default_value_t = AnalyzerKind::Heuristic, env = "RISKLENS_ANALYZER")]
    pub analyzer: AnalyzerKind,

    /// Program to run when `--analyzer command` is selected.
    ///
    /// The CSV path is appended as the final argument.
    #[arg(long, env = "RISKLENS_ANALYZER_COMMAND")]
    pub analyzer_command: Option<String>,

    /// Extra arguments placed before the CSV path.
    #[arg(long = "analyzer-arg", env = "RISKLENS_ANALYZER_ARGS", value_delimiter = ',')]
    pub analyzer_args: Vec<String>,

    /// Seconds to wait for the analyzer command before giving up.
    #[arg(long, default_value_t = DEFAULT_ANALYZER_TIMEOUT, env = "RISKLENS_ANALYZER_TIMEOUT")]
    pub analyzer_timeout: u64,
}

impl AnalyzerArgs {
    /// Validate the analyzer selection and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.analyzer == AnalyzerKind::Command {
            match self.analyzer_command.as_deref() {
                Some(program) if !program.trim().is_empty() => {}
                _ => {
                    return Err(
                        "The command analyzer needs a program. \
                         Set --analyzer-command or RISKLENS_ANALYZER_COMMAND"
                            .to_string(),
                    )
                }
            }
        }

        if self.analyzer_timeout == 0 {
            return Err("analyzer_timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Configuration for the `serve` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "RISKLENS_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "RISKLENS_PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    /// Directory containing the bundled sample datasets.
    #[arg(long, default_value = DEFAULT_BASE_DIR, env = "RISKLENS_BASE_DIR")]
    pub base_dir: PathBuf,

    /// Root directory where uploaded CSV files are stored.
    #[arg(long, default_value = DEFAULT_MEDIA_DIR, env = "RISKLENS_MEDIA_DIR")]
    pub media_dir: PathBuf,

    /// Maximum accepted request body size in bytes.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_SIZE, env = "RISKLENS_MAX_UPLOAD_SIZE")]
    pub max_upload_size: usize,

    // =========================================================================
    // Analyzer Configuration
    // =========================================================================
    #[command(flatten)]
    pub analyzer: AnalyzerArgs,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "RISKLENS_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.port == 0 {
            return Err("port must be greater than 0".to_string());
        }

        if self.max_upload_size == 0 {
            return Err("max_upload_size must be greater than 0".to_string());
        }

        if self.media_dir.as_os_str().is_empty() {
            return Err(
                "Media directory is required. Set --media-dir or RISKLENS_MEDIA_DIR".to_string(),
            );
        }

        self.analyzer.validate()
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration for the `analyze` subcommand.
#[derive(Args, Debug, Clone)]
pub struct AnalyzeConfig {
    /// CSV file to analyze.
    pub csv_path: PathBuf,

    #[command(flatten)]
    pub analyzer: AnalyzerArgs,

    /// Pretty-print the JSON result.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
