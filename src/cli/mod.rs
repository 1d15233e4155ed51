//! Command-line interface for wpcsv
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and CLI overrides
//! - Subcommand dispatch

pub mod commands;
pub mod completion;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::client::{RestClient, SiteConnection};
use crate::config::{Config, LogLevel};
use crate::error::Result;
use crate::formatter::{TableFormatter, TableStyle};

/// WordPress content to CSV exporter
#[derive(Parser, Debug)]
#[command(
    name = "wpcsv",
    version,
    about = "Export WordPress REST collections to CSV",
    long_about = "Fetches every page of a WordPress REST collection, flattens each record
into dot-separated columns and writes a CSV file, either streamed page by page
or fetched eagerly with bounded concurrency."
)]
pub struct CliArgs {
    /// Site base URL, e.g. https://example.com
    #[arg(long, value_name = "URL", global = true)]
    pub site: Option<String>,

    /// Bearer token for authentication
    #[arg(long, value_name = "TOKEN", global = true)]
    pub token: Option<String>,

    /// Username for basic authentication
    #[arg(short = 'u', long = "user", value_name = "USERNAME", global = true)]
    pub username: Option<String>,

    /// Password (or application password) for basic authentication
    #[arg(short = 'p', long, value_name = "PASSWORD", global = true)]
    pub password: Option<String>,

    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config_file: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECONDS", global = true)]
    pub timeout: Option<u64>,

    /// Table style for `types` and `preview`
    #[arg(long, value_enum, value_name = "STYLE", default_value = "modern", global = true)]
    pub style: TableStyle,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv", global = true)]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Subcommands for wpcsv
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Test the connection to the site
    Check,

    /// List the content types the site exposes
    Types,

    /// Print the field names inferred from one sample record
    Fields {
        /// Content type route, e.g. posts
        #[arg(value_name = "TYPE")]
        content_type: String,
    },

    /// Export a content type to a CSV file
    Export(ExportArgs),

    /// Print the first rows of a CSV file or URL as a table
    Preview(PreviewArgs),

    /// Show configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },

    /// Generate shell completion script
    Completion {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_name = "SHELL")]
        shell: String,
    },
}

/// Arguments of the export subcommand
#[derive(Args, Debug, Clone)]
pub struct ExportArgs {
    /// Content type route, e.g. posts
    #[arg(value_name = "TYPE")]
    pub content_type: String,

    /// Columns to export, comma separated (inferred when omitted)
    #[arg(long, value_name = "FIELDS", value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Output file (defaults to <prefix>-<type>-<date>.csv)
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Records per page request
    #[arg(long, value_name = "N")]
    pub per_page: Option<u32>,

    /// Fetch every page before writing
    #[arg(long)]
    pub eager: bool,

    /// Pages fetched at once in eager mode
    #[arg(long, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments of the preview subcommand
#[derive(Args, Debug, Clone)]
pub struct PreviewArgs {
    /// CSV file path or http(s) URL
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Number of rows to show
    #[arg(short = 'n', long, value_name = "N", default_value_t = 10)]
    pub rows: usize,

    /// Columns to keep, comma separated, in output order (all when omitted)
    #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
    pub columns: Vec<String>,

    /// Write the selected columns to this CSV file
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum width of a table column
    #[arg(long, value_name = "CHARS")]
    pub max_width: Option<usize>,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface from process arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        Self::from_args(CliArgs::parse())
    }

    /// Create a CLI interface from already parsed arguments
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;

        if let Err(e) = config.validate() {
            eprintln!("Warning: Configuration validation failed: {}", e);
            eprintln!("Using default configuration instead.");
            config = Config::default();
        }

        Self::apply_args_to_config(&mut config, args);

        // Overrides must satisfy the same rules as the file
        config.validate()?;

        Ok(config)
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Build a REST client for the configured site
    pub fn rest_client(&self) -> Result<RestClient> {
        let site = self.config.site.connection()?;
        RestClient::new(site, self.config.request_timeout())
    }

    /// Build a REST client for an arbitrary URL, reusing the configured credentials
    pub fn url_client(&self, url: &str) -> Result<RestClient> {
        let mut site = SiteConnection::new(url);
        site.credentials = self.config.site.credentials();
        RestClient::new(site, self.config.request_timeout())
    }

    /// Table formatter honouring `--style`
    pub fn table_formatter(&self) -> TableFormatter {
        TableFormatter::new().with_style(self.args.style)
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_logging_args(config, args);
        Self::apply_site_args(config, args);
        Self::apply_export_args(config, args);
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Apply site-related CLI arguments to configuration
    fn apply_site_args(config: &mut Config, args: &CliArgs) {
        if let Some(ref site) = args.site {
            config.site.url = Some(site.clone());
        }
        if let Some(ref token) = args.token {
            config.site.token = Some(token.clone());
        }
        if let Some(ref username) = args.username {
            config.site.username = Some(username.clone());
        }
        if let Some(ref password) = args.password {
            config.site.password = Some(password.clone());
        }
        if let Some(timeout) = args.timeout {
            config.site.timeout = timeout;
        }
    }

    /// Apply export-related CLI arguments to configuration
    fn apply_export_args(config: &mut Config, args: &CliArgs) {
        if let Commands::Export(ref export) = args.command {
            if let Some(per_page) = export.per_page {
                config.export.per_page = per_page;
            }
            if let Some(concurrency) = export.concurrency {
                config.export.concurrency = concurrency;
            }
            if export.no_progress || args.quiet {
                config.export.show_progress = false;
            }
        }
    }

    /// Get configuration file path (from args or default)
    fn config_path(&self) -> PathBuf {
        self.args
            .config_file
            .clone()
            .unwrap_or_else(Config::default_config_path)
    }
}
