//! CSV encoding for flattened records
//!
//! This is the crate's single CSV codepath: headers, rows and whole documents
//! are all built from [`escape_cell`].

use std::borrow::Cow;

use crate::record::FlatRecord;

/// Field separator
pub const DELIMITER: char = ',';

/// Line terminator between rows
pub const LINE_TERMINATOR: char = '\n';

/// Escape a CSV value if necessary
///
/// Internal quotes are doubled and the value is wrapped in quotes when it
/// contains a comma, quote, or line break; anything else is emitted as-is.
///
/// # Arguments
/// * `value` - Value to escape
///
/// # Returns
/// * `Cow<str>` - Escaped value, borrowed when untouched
pub fn escape_cell(value: &str) -> Cow<'_, str> {
    if value.contains([DELIMITER, '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

/// Encode already-ordered cell values as one line (no terminator)
pub fn encode_values<S: AsRef<str>>(values: &[S]) -> String {
    let mut line = String::new();
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            line.push(DELIMITER);
        }
        line.push_str(&escape_cell(value.as_ref()));
    }
    line
}

/// Header line for the selected fields
///
/// Field names are escaped exactly like data cells.
pub fn encode_header(fields: &[String]) -> String {
    encode_values(fields)
}

/// One record projected onto `fields`; missing keys become empty cells
pub fn encode_row(record: &FlatRecord, fields: &[String]) -> String {
    let values: Vec<&str> = fields
        .iter()
        .map(|field| record.get(field).map(String::as_str).unwrap_or_default())
        .collect();
    encode_values(&values)
}

/// Header followed by every row, joined with `\n`, no trailing newline
pub fn encode_document(fields: &[String], records: &[FlatRecord]) -> String {
    let mut out = encode_header(fields);
    for record in records {
        out.push(LINE_TERMINATOR);
        out.push_str(&encode_row(record, fields));
    }
    out
}
