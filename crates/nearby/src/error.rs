use nearby_content::{ContentError, CoordinateError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NearbyError {
    #[error("Content error: {0}")]
    Content(#[from] ContentError),
    #[error("No location available for {subject:?}")]
    NoCoordinate { subject: String },
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(#[from] CoordinateError),
    #[error("Geolocation error: {0}")]
    Geolocation(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Init Logging error: {0}")]
    InitLoggingError(#[from] tracing_subscriber::filter::ParseError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The failure classes a caller acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network, timeout or HTTP status failure.
    Fetch,
    /// The endpoint answered with something unexpected.
    Parse,
    /// The article or place resolved, but has no usable location.
    NoCoordinate,
    /// Rejected before any network call.
    EmptyQuery,
    InvalidInput,
    Geolocation,
    Internal,
}

impl NearbyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Content(ContentError::EmptyQuery) => ErrorKind::EmptyQuery,
            Self::Content(e) if e.is_parse() => ErrorKind::Parse,
            Self::Content(_) => ErrorKind::Fetch,
            Self::NoCoordinate { .. } => ErrorKind::NoCoordinate,
            Self::InvalidCoordinate(_) | Self::ConfigError(_) => ErrorKind::InvalidInput,
            Self::Geolocation(_) => ErrorKind::Geolocation,
            Self::InitLoggingError(_) | Self::Other(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, NearbyError>;
