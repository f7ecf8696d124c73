/// Errors surfaced by the waveform container, generator and extractors.
#[derive(Debug, thiserror::Error)]
pub enum WaveformError {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to read tabular source: {0}")]
    Tabular(#[source] anyhow::Error),
}

impl WaveformError {
    pub(crate) fn waveform(name: &str) -> Self {
        WaveformError::NotFound {
            what: format!("waveform '{}'", name),
        }
    }

    pub(crate) fn feature(name: &str, kind: &str) -> Self {
        WaveformError::NotFound {
            what: format!("feature '{}' of waveform '{}'", kind, name),
        }
    }

    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        WaveformError::InvalidInput(msg.into())
    }
}

pub type Result<T, E = WaveformError> = std::result::Result<T, E>;
