/// Errors produced by the coin detection pipeline
#[derive(thiserror::Error, Debug)]
pub enum DetectionError {
    /// Empty, zero-dimension or wrongly shaped input image
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A configuration value outside of its accepted range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DetectionError>;
