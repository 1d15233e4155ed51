use std::{fmt, io};

/// Crate-wide `Result` type using [`ExportError`] as the error.
///
/// This alias is re-exported by the parent `error` module and is intended
/// to be used throughout the crate for fallible operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Top-level error type for wpcsv operations.
///
/// Every variant is terminal for the export attempt that produced it;
/// nothing inside the crate retries automatically.
#[derive(Debug)]
pub enum ExportError {
    /// A page (or other REST resource) could not be retrieved.
    Fetch(FetchError),

    /// The first page of a content type contained no records.
    ///
    /// Usually means a wrong content type name rather than a broken site.
    EmptyCollection { content_type: String },

    /// Cancellation was observed at a checkpoint.
    Cancelled,

    /// A sample record produced no exportable fields.
    NoFieldsFound { content_type: String },

    /// Malformed CSV text on the ingestion path.
    Parse(ParseError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Errors raised while talking to the remote REST API.
#[derive(Debug)]
pub enum FetchError {
    /// Non-2xx response.
    Status {
        status: u16,
        status_text: String,
        url: String,
    },

    /// Transport failure (DNS, TLS, timeout, connection reset).
    Network(String),

    /// The body was not the JSON shape we expected.
    Decode(String),

    /// The request URL could not be built.
    InvalidUrl(String),
}

/// First structural problem found in user-supplied CSV text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number, when known.
    pub line: Option<u64>,
    pub message: String,
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Missing required field.
    MissingField(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },

    /// Anything else.
    Generic(String),
}

impl ExportError {
    /// True when the error only reports a user-requested cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ExportError::Cancelled)
    }
}

impl FetchError {
    /// HTTP status code, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Fetch(e) => write!(f, "Fetch error: {e}"),
            ExportError::EmptyCollection { content_type } => write!(
                f,
                "No records found for content type '{content_type}' (check the type name)"
            ),
            ExportError::Cancelled => write!(f, "Export cancelled"),
            ExportError::NoFieldsFound { content_type } => {
                write!(f, "No fields found for content type '{content_type}'")
            }
            ExportError::Parse(e) => write!(f, "{e}"),
            ExportError::Config(e) => write!(f, "Configuration error: {e}"),
            ExportError::Io(e) => write!(f, "I/O error: {e}"),
            ExportError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Status {
                status,
                status_text,
                url,
            } => write!(f, "Failed to fetch {url}: {status} {status_text}"),
            FetchError::Network(msg) => write!(f, "Network failure: {msg}"),
            FetchError::Decode(msg) => write!(f, "Unexpected response body: {msg}"),
            FetchError::InvalidUrl(msg) => write!(f, "Invalid URL: {msg}"),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Invalid CSV format at line {line}: {}", self.message),
            None => write!(f, "Invalid CSV format: {}", self.message),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::MissingField(field) => write!(f, "Missing required field: {field}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
            ConfigError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Fetch(e) => Some(e),
            ExportError::Parse(e) => Some(e),
            ExportError::Config(e) => Some(e),
            ExportError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for FetchError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to ExportError ========================= */

impl From<io::Error> for ExportError {
    fn from(err: io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<FetchError> for ExportError {
    fn from(err: FetchError) -> Self {
        ExportError::Fetch(err)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

impl From<reqwest::Error> for ExportError {
    fn from(err: reqwest::Error) -> Self {
        ExportError::Fetch(err.into())
    }
}

impl From<ParseError> for ExportError {
    fn from(err: ParseError) -> Self {
        ExportError::Parse(err)
    }
}

impl From<ConfigError> for ExportError {
    fn from(err: ConfigError) -> Self {
        ExportError::Config(err)
    }
}

impl From<String> for ExportError {
    fn from(msg: String) -> Self {
        ExportError::Generic(msg)
    }
}

impl From<&str> for ExportError {
    fn from(msg: &str) -> Self {
        ExportError::Generic(msg.to_owned())
    }
}
