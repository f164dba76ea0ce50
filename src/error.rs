use thiserror::Error;

/// Everything that can go wrong during a single submission.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictionError {
    #[error("No image uploaded")]
    NoInput,
    #[error("Threshold must be a number within [0, 1], got {0}")]
    InvalidThreshold(String),
    #[error("Upload exceeds {0} bytes")]
    TooLarge(usize),
    #[error("Failed to encode image: {0}")]
    Encode(String),
    #[error("{0}")]
    Transport(String),
    #[error("API Error {0}")]
    Status(u16),
    #[error("No file_id returned")]
    MissingFileId,
    #[error("Error fetching JSON (status {0})")]
    FetchStatus(u16),
    #[error("Invalid prediction response: {0}")]
    Parse(String),
}

impl PredictionError {
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionError::NoInput => "no_input",
            PredictionError::InvalidThreshold(_) => "invalid_threshold",
            PredictionError::TooLarge(_) => "too_large",
            PredictionError::Encode(_) => "encode",
            PredictionError::Transport(_) => "transport",
            PredictionError::Status(_) => "status",
            PredictionError::MissingFileId => "missing_file_id",
            PredictionError::FetchStatus(_) => "fetch_status",
            PredictionError::Parse(_) => "parse",
        }
    }
}

impl From<reqwest::Error> for PredictionError {
    fn from(err: reqwest::Error) -> Self {
        PredictionError::Transport(err.to_string())
    }
}

impl From<image::ImageError> for PredictionError {
    fn from(err: image::ImageError) -> Self {
        PredictionError::Encode(err.to_string())
    }
}

impl From<serde_json::Error> for PredictionError {
    fn from(err: serde_json::Error) -> Self {
        PredictionError::Parse(err.to_string())
    }
}
