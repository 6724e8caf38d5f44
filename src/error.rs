//! Error types for catalog fetches

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Failures that can surface from a catalog request.
///
/// Errors are `Clone` because a single in-flight fetch hands its outcome to
/// every caller waiting on the same query key.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The API answered with a non-success HTTP status
    #[error("Unable to load videos ({status})")]
    FetchFailure { status: u16 },

    /// The body was not valid JSON or lacked a required field
    #[error("Unable to parse catalog response: {0}")]
    ParseFailure(String),

    /// The request never produced a response
    #[error("Unable to reach catalog API: {0}")]
    TransportFailure(String),

    /// A base URL could not be turned into a request URL
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

impl CatalogError {
    /// HTTP status carried by a [`CatalogError::FetchFailure`]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            CatalogError::FetchFailure { status } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::ParseFailure(err.to_string())
    }
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        CatalogError::TransportFailure(err.to_string())
    }
}

impl From<url::ParseError> for CatalogError {
    fn from(err: url::ParseError) -> Self {
        CatalogError::InvalidUrl(err.to_string())
    }
}
