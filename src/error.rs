use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    /// `k` missing, not a positive integer, or out of range for the strategy.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unable to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("invalid color table: {0}")]
    Palette(String),

    #[error("color table parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unable to seed clustering: {0}")]
    Entropy(#[from] getrandom::Error),
}

pub type Result<T> = std::result::Result<T, ProfileError>;
