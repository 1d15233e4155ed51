//! Record shaping: flattening nested JSON and inferring field names.

pub mod fields;
pub mod flatten;

pub use fields::{infer_fields, sample_fields};
pub use flatten::{ARRAY_DELIMITER, EXCLUDED_KEYS, FlatRecord, flatten, select_fields};
