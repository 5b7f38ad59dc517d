// One error type for the whole crate.
// Every variant states *where* things went wrong. The map generators never
// fail; only the boundary (params, config, export, window) does.
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A numeric input broke the caller contract (negative size, n <= 1, ...).
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// Reading or parsing the JSON config failed.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Writing the PNG (or building the image buffer) failed.
    #[error("Image export error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Window init error: {0}")]
    WindowInit(String),

    #[error("Window update error: {0}")]
    WindowUpdate(String),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Error::InvalidParameter { name, reason: reason.into() }
    }
}

/// Reject NaN/inf and values <= 0.
pub(crate) fn ensure_positive(name: &'static str, value: f64) -> Result<(), Error> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::invalid(name, format!("must be finite and > 0, got {value}")));
    }
    Ok(())
}
