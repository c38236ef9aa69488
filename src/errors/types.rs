//! Error type definitions for the EPG conversion pipeline

use thiserror::Error;

/// Top-level application error type
///
/// Everything that can end a run, or end the processing of one input file,
/// converts into this type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Filesystem errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed vendor XML
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Source staging errors
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Per-record mapping errors
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Errors raised while staging vendor packages
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP errors from the vendor
    #[error("HTTP error: {status} - {message}")]
    Http { status: u16, message: String },

    /// The vendor answered with something other than an archive
    #[error("Unexpected content type: {content_type}")]
    UnexpectedContentType { content_type: String },

    /// Archive could not be read or extracted
    #[error("Archive error: {message}")]
    Archive { message: String },

    /// Missing credentials or similar setup problems
    #[error("Invalid configuration: {field} - {message}")]
    InvalidConfig { field: String, message: String },
}

/// Errors that make a single programme record unconvertible
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MappingError {
    /// A numeric field held something that is not an integer
    #[error("field {field} is not an integer: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    /// A timestamp did not match `YYYY-MM-DD HH:MM:SS`
    #[error("field {field} is not a valid timestamp: '{value}'")]
    InvalidTimestamp { field: &'static str, value: String },
}

/// Failures reported by the episode metadata service
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The service does not know the series
    #[error("series not found: {series}")]
    SeriesNotFound { series: String },

    /// Transport, authentication or server-side failure
    #[error("service error: {message}")]
    Service { message: String },

    /// The service answered, but without the fields we rely on
    #[error("unexpected response: {message}")]
    UnexpectedResponse { message: String },
}

impl AppError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl SourceError {
    /// Create an archive error
    pub fn archive<S: Into<String>>(message: S) -> Self {
        Self::Archive {
            message: message.into(),
        }
    }
}

impl LookupError {
    pub fn service<S: Into<String>>(message: S) -> Self {
        Self::Service {
            message: message.into(),
        }
    }

    pub fn unexpected<S: Into<String>>(message: S) -> Self {
        Self::UnexpectedResponse {
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for LookupError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::unexpected(err.to_string())
        } else {
            Self::service(err.to_string())
        }
    }
}
