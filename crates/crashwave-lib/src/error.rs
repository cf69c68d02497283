use thiserror::Error;

/// Errors raised by the series, spectrum and filter operations.
///
/// Every variant is caller-correctable input validation; nothing here is
/// transient or worth retrying.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no events to build a series from")]
    EmptyInput,
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unrecognized filter kind '{0}' (expected lowpass, highpass or bandpass)")]
    InvalidFilterSpec(String),
    #[error("fft backend rejected buffers: {0}")]
    Transform(String),
}

impl AnalysisError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
