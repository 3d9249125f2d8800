use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("navigation did not settle within {seconds}s")]
    NavigationTimeout { seconds: u64 },

    #[error("GraphQL request failed with {status} status")]
    UpstreamHttp { status: i64 },

    #[error("GraphQL request failed with error: {message}")]
    Bridge { message: String },

    #[error("record is missing a usable value at '{path}'")]
    MalformedRecord { path: String },

    #[error("unexpected response shape: no value at '{path}'")]
    MalformedResponse { path: String },

    #[error("browser error: {0}")]
    Browser(String),

    #[error("configuration error: {message}")]
    Config { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<chromiumoxide::error::CdpError> for HarvestError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        HarvestError::Browser(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;
