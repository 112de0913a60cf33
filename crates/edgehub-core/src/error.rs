use thiserror::Error;

/// Input validation errors raised before any upstream call is made.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required parameter '{name}'")]
    MissingParameter { name: &'static str },
    #[error("parameter '{name}' must be a number: '{value}'")]
    NotANumber { name: &'static str, value: String },
    #[error("parameter '{name}' must be within [{min}, {max}]")]
    OutOfRange {
        name: &'static str,
        min: i32,
        max: i32,
    },
    #[error("provide either 'q' or 'lat'/'lon', not both")]
    ConflictingLocation,
    #[error("provide either 'q' or both 'lat' and 'lon'")]
    MissingLocation,
    #[error("city query must not be empty")]
    EmptyCityQuery,
    #[error("currency must be a 3-letter ISO code: '{value}'")]
    InvalidCurrency { value: String },
    #[error("coin identifier may only contain lowercase letters, digits and '-': '{value}'")]
    InvalidCoin { value: String },

    #[error("url is not a valid absolute url: '{value}'")]
    InvalidUrl { value: String },
    #[error("url scheme must be http or https: '{scheme}'")]
    UnsupportedScheme { scheme: String },
    #[error("host '{host}' is not in the allowed media hosts")]
    HostNotAllowed { host: String },

    #[error("cameraId may only contain letters, digits, '-' and '_'")]
    InvalidCameraId,
    #[error("invalid action '{value}'")]
    InvalidAction { value: String },
    #[error("durationMs must be within [1, {max}]")]
    InvalidDuration { max: u64 },
    #[error("invalid JSON body: {message}")]
    InvalidBody { message: String },
}

impl ValidationError {
    /// Host allow-list rejections map to 403 rather than 400.
    pub const fn is_forbidden(&self) -> bool {
        matches!(self, Self::HostNotAllowed { .. })
    }
}

/// A 2xx upstream payload that could not be mapped to the normalized shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("payload is missing required field '{field}'")]
    MissingField { field: &'static str },
    #[error("payload field '{field}' has an unexpected type")]
    UnexpectedType { field: &'static str },
    #[error("payload reported no results")]
    Empty,
}

/// Top-level error type for core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
