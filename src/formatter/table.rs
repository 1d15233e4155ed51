//! Table formatting for CSV previews and listings using tabled
//!
//! - Builder pattern for dynamic column sets
//! - Configurable styles and per-column width limits
//! - Long cell values are wrapped, not truncated

use clap::ValueEnum;
use tabled::{
    Table,
    builder::Builder,
    settings::{Alignment, Modify, Style, object::Columns, object::Rows, width::Width},
};

use crate::client::ContentType;
use crate::ingest::CsvTable;

/// Maximum width for a single column (characters)
const DEFAULT_MAX_COLUMN_WIDTH: usize = 40;

/// Table formatter for tabular terminal output
pub struct TableFormatter {
    /// Maximum column width
    max_column_width: usize,

    /// Table style
    style: TableStyle,
}

/// Available table styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TableStyle {
    /// Modern style with box-drawing characters
    #[default]
    Modern,
    /// ASCII style with basic characters
    Ascii,
    /// Markdown style
    Markdown,
    /// Psql style
    Psql,
}

impl TableFormatter {
    /// Create a new table formatter with default settings
    pub fn new() -> Self {
        Self {
            max_column_width: DEFAULT_MAX_COLUMN_WIDTH,
            style: TableStyle::Modern,
        }
    }

    /// Set the table style
    pub fn with_style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Set maximum column width
    pub fn with_max_column_width(mut self, width: usize) -> Self {
        self.max_column_width = width;
        self
    }

    /// Render headers and rows
    pub fn format_rows<S: AsRef<str>>(&self, headers: &[S], rows: &[Vec<S>]) -> String {
        if headers.is_empty() {
            return "(no fields found)".to_string();
        }

        let mut builder = Builder::default();
        builder.push_record(headers.iter().map(|h| h.as_ref().to_string()));
        for row in rows {
            builder.push_record(row.iter().map(|c| c.as_ref().to_string()));
        }

        let mut table = builder.build();
        self.apply_style(&mut table);

        // Wrap long values per column
        for i in 0..headers.len() {
            table.with(Modify::new(Columns::new(i..=i)).with(Width::wrap(self.max_column_width)));
        }
        table.with(Modify::new(Rows::first()).with(Alignment::center()));

        table.to_string()
    }

    /// Render the first `limit` rows of a parsed CSV file
    pub fn format_csv(&self, csv: &CsvTable, limit: usize) -> String {
        let shown = &csv.rows[..csv.rows.len().min(limit)];
        self.format_rows(&csv.headers, shown)
    }

    /// Render a content type listing
    pub fn format_content_types(&self, types: &[ContentType]) -> String {
        let rows: Vec<Vec<String>> = types
            .iter()
            .map(|t| vec![t.rest_base.clone(), t.slug.clone(), t.name.clone()])
            .collect();
        let headers = vec!["rest_base".to_string(), "slug".to_string(), "name".to_string()];
        self.format_rows(&headers, &rows)
    }

    fn apply_style(&self, table: &mut Table) {
        match self.style {
            TableStyle::Modern => table.with(Style::modern()),
            TableStyle::Ascii => table.with(Style::ascii()),
            TableStyle::Markdown => table.with(Style::markdown()),
            TableStyle::Psql => table.with(Style::psql()),
        };
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}
