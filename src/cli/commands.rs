//! Subcommand handlers

use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{CliInterface, Commands, ExportArgs, PreviewArgs, completion};
use crate::client::RestClient;
use crate::config::Config;
use crate::error::Result;
use crate::export::sink::{create_writer, output_path, validate_path};
use crate::export::{ExportCoordinator, ExportRequest, ProgressTracker};
use crate::ingest::{CsvSource, parse_csv};
use crate::record::sample_fields;

impl CliInterface {
    /// Run the selected subcommand
    ///
    /// # Returns
    /// * `Result<()>` - Success or the first error
    pub async fn handle(&self) -> Result<()> {
        match &self.args.command {
            Commands::Check => self.check().await,
            Commands::Types => self.list_types().await,
            Commands::Fields { content_type } => self.show_fields(content_type).await,
            Commands::Export(args) => self.export(args).await,
            Commands::Preview(args) => self.preview(args).await,
            Commands::Config { show, validate } => self.handle_config_command(*show, *validate),
            Commands::Completion { shell } => completion::generate_completion(shell),
        }
    }

    async fn check(&self) -> Result<()> {
        let client = self.rest_client()?;
        client.check_connection().await?;
        if !self.args.quiet {
            println!("Connected to {}", client.site().base_url);
        }
        Ok(())
    }

    async fn list_types(&self) -> Result<()> {
        let client = self.rest_client()?;
        let types = client.content_types().await?;
        println!("{}", self.table_formatter().format_content_types(&types));
        Ok(())
    }

    async fn show_fields(&self, content_type: &str) -> Result<()> {
        let client = self.rest_client()?;
        for field in sample_fields(&client, content_type).await? {
            println!("{}", field);
        }
        Ok(())
    }

    /// Export a content type to a file, streaming unless `--eager` is set
    async fn export(&self, args: &ExportArgs) -> Result<()> {
        let client = self.rest_client()?;
        let export_config = &self.config.export;

        let fields = if args.fields.is_empty() {
            let fields = sample_fields(&client, &args.content_type).await?;
            info!("Inferred {} fields for '{}'", fields.len(), args.content_type);
            fields
        } else {
            args.fields.clone()
        };

        let path = output_path(
            args.output.as_deref(),
            export_config.output_dir.as_deref(),
            &export_config.filename_prefix,
            &args.content_type,
            chrono::Local::now().date_naive(),
        );
        debug!("Writing export to {}", path.display());

        let token = CancellationToken::new();
        let ctrl_c = spawn_ctrl_c_listener(token.clone());

        let tracker = Arc::new(ProgressTracker::new(export_config.show_progress));
        let request = ExportRequest::new(args.content_type.clone(), fields)
            .with_per_page(export_config.per_page)
            .with_concurrency(export_config.concurrency)
            .with_cancellation(token)
            .with_progress(tracker.callback());
        let coordinator = ExportCoordinator::new(&client, request);

        let outcome = if args.eager {
            self.write_eager(&coordinator, &path).await
        } else {
            self.write_streaming(&coordinator, &path).await
        };

        ctrl_c.abort();
        tracker.finish();

        let records = outcome?;
        if !self.args.quiet {
            println!("Exported {} records to {}", records, path.display());
        }
        Ok(())
    }

    async fn write_streaming(
        &self,
        coordinator: &ExportCoordinator<'_, RestClient>,
        path: &Path,
    ) -> Result<u64> {
        let mut writer = create_writer(path).await?;
        let result = coordinator.write_to(&mut writer).await?;
        Ok(result.records_exported)
    }

    async fn write_eager(
        &self,
        coordinator: &ExportCoordinator<'_, RestClient>,
        path: &Path,
    ) -> Result<u64> {
        // Fail before any page is fetched
        validate_path(path)?;
        let (csv, result) = coordinator.export_eager_with_result().await?;
        tokio::fs::write(path, csv).await?;
        Ok(result.records_exported)
    }

    /// Show a CSV table, optionally narrowed to some columns and written back out
    async fn preview(&self, args: &PreviewArgs) -> Result<()> {
        let source = CsvSource::parse(&args.source);
        let http = match source {
            CsvSource::Remote(ref url) => Some(self.url_client(url)?),
            CsvSource::File(_) => None,
        };
        let text = source.load_text(http.as_ref()).await?;
        let table = parse_csv(&text)?;
        let summary = table.summary(text.len());

        let table = if args.columns.is_empty() {
            table
        } else {
            table.select_columns(&args.columns)?
        };

        let mut formatter = self.table_formatter();
        if let Some(width) = args.max_width {
            formatter = formatter.with_max_column_width(width);
        }
        println!("{}", formatter.format_csv(&table, args.rows));

        if !self.args.quiet {
            println!("{}", summary);
            if table.rows.len() > args.rows {
                println!("({} of {} rows shown)", args.rows, table.rows.len());
            }
        }

        if let Some(ref output) = args.output {
            validate_path(output)?;
            tokio::fs::write(output, table.to_csv()).await?;
            info!("Wrote {} columns from {} to {}", table.headers.len(), source, output.display());
            if !self.args.quiet {
                println!("Saved {} columns to {}", table.headers.len(), output.display());
            }
        }

        Ok(())
    }

    /// Handle config subcommand
    fn handle_config_command(&self, show: bool, validate: bool) -> Result<()> {
        if validate {
            self.validate_config_file();
        }

        if show || !validate {
            self.show_config()?;
        }

        Ok(())
    }

    /// Validate configuration file
    fn validate_config_file(&self) {
        let path = self.config_path();
        println!("Validating configuration file: {}", path.display());

        if !path.exists() {
            println!("Configuration file does not exist");
            return;
        }

        match Config::load_from_file(Some(&path)) {
            Ok(config) => match config.validate() {
                Ok(_) => println!("Configuration is valid"),
                Err(e) => println!("Configuration validation failed: {}", e),
            },
            Err(e) => println!("Failed to load configuration: {}", e),
        }
    }

    /// Show effective configuration with secrets masked
    fn show_config(&self) -> Result<()> {
        println!("Configuration file: {}", self.config_path().display());
        println!();
        println!("{}", self.config.redacted().to_toml()?);
        Ok(())
    }
}

/// Cancel `token` on the first Ctrl+C
fn spawn_ctrl_c_listener(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => token.cancel(),
            Err(err) => warn!("Failed to listen for Ctrl+C: {}", err),
        }
    })
}
