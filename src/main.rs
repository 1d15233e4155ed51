//! wpcsv - WordPress REST to CSV exporter
//!
//! Fetches every page of a WordPress REST collection and writes it as CSV.
//!
//! # Usage
//!
//! ```bash
//! # Stream all posts into wordpress-export-posts-<date>.csv
//! wpcsv --site https://example.com export posts
//!
//! # Selected columns, eager mode
//! wpcsv --site https://example.com export pages --fields id,title.rendered --eager
//! ```

use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use wpcsv::cli::CliInterface;
use wpcsv::error::Result;

/// Exit code used when the user interrupts an export
const EXIT_CANCELLED: i32 = 130;

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        if e.is_cancelled() {
            eprintln!("{}. Partial output was kept.", e);
            std::process::exit(EXIT_CANCELLED);
        }
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Run the subcommand
async fn run() -> Result<()> {
    let cli = CliInterface::new()?;

    initialize_logging(&cli);

    cli.handle().await
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    // RUST_LOG directives take precedence over the configured level
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy();

    // Logs go to stderr so CSV or tables on stdout stay clean
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
