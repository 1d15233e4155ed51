//! Error handling module.
//!
//! All fallible operations in the crate return [`Result`], whose error type
//! [`ExportError`] distinguishes fetch failures, empty collections, user
//! cancellation and CSV parse failures so the caller can present each one
//! differently.
//!
//! # Example
//!
//! ```rust,no_run
//! use wpcsv::error::{ExportError, Result};
//!
//! fn report(result: Result<()>) {
//!     match result {
//!         Ok(()) => println!("done"),
//!         Err(e) if e.is_cancelled() => println!("cancelled"),
//!         Err(ExportError::EmptyCollection { content_type }) => {
//!             println!("nothing to export for {content_type}")
//!         }
//!         Err(e) => eprintln!("{e}"),
//!     }
//! }
//! ```

pub mod kinds;

// Re-export commonly used types
pub use kinds::{ConfigError, ExportError, FetchError, ParseError, Result};
