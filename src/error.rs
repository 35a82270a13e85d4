use thiserror::Error;

/// Inputs the projection needs before it can run
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingInput {
    #[error("heading unavailable")]
    Heading,

    #[error("geolocation unavailable")]
    Location,

    #[error("marker list empty or not loaded")]
    Markers,
}

/// Wayfinder error types
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WayfinderError {
    #[error("Missing input: {0}")]
    MissingInput(MissingInput),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid sensor reading: {0}")]
    InvalidReading(String),

    #[error("Marker source error: {0}")]
    MarkerSource(String),
}

impl From<MissingInput> for WayfinderError {
    fn from(missing: MissingInput) -> Self {
        WayfinderError::MissingInput(missing)
    }
}

/// Result type for engine operations
pub type WayfinderResult<T> = Result<T, WayfinderError>;
