//! Field inference from a sample record.

use serde_json::Value;
use tracing::debug;

use crate::client::PageFetcher;
use crate::error::{ExportError, Result};

use super::flatten::flatten;

/// Derive the sorted list of exportable field names from one sample.
///
/// Returns an empty list when the sample flattens to nothing (e.g. `null`);
/// callers should surface that as [`ExportError::NoFieldsFound`].
pub fn infer_fields(sample: &Value) -> Vec<String> {
    // BTreeMap keys are already unique and ascending
    flatten(sample).into_keys().collect()
}

/// Fetch a single record of `content_type` and infer its fields.
///
/// The schema is driven by this one record: later records with a richer
/// shape lose the extra fields.
pub async fn sample_fields<F>(fetcher: &F, content_type: &str) -> Result<Vec<String>>
where
    F: PageFetcher + ?Sized,
{
    let page = fetcher.fetch_page(content_type, 1, 1).await?;
    let sample = page
        .items
        .first()
        .ok_or_else(|| ExportError::EmptyCollection {
            content_type: content_type.to_string(),
        })?;

    let fields = infer_fields(sample);
    debug!("Inferred {} fields for '{}'", fields.len(), content_type);

    if fields.is_empty() {
        return Err(ExportError::NoFieldsFound {
            content_type: content_type.to_string(),
        });
    }
    Ok(fields)
}
