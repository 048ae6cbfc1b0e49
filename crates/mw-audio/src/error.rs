use thiserror::Error;

/// Errors originating from the audio module.
#[derive(Error, Debug)]
pub enum AudioError {
    /// The file could not be opened.
    #[error("Impossible d'ouvrir {path} : {source}")]
    Io {
        /// Path of the file.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Audio decode error (malformed or unsupported container).
    #[error("Erreur de décodage : {0}")]
    DecodeError(String),

    /// Classifier or signal parameter outside of its domain.
    #[error("Paramètre invalide `{name}` : {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl AudioError {
    /// `true` for per-file failures a batch caller skips over.
    ///
    /// # Example
    /// ```
    /// use mw_audio::error::AudioError;
    /// assert!(AudioError::DecodeError("bad header".into()).is_per_file());
    /// ```
    #[must_use]
    pub fn is_per_file(&self) -> bool {
        matches!(self, Self::Io { .. } | Self::DecodeError(_))
    }
}

impl From<mw_core::CoreError> for AudioError {
    fn from(err: mw_core::CoreError) -> Self {
        match err {
            mw_core::CoreError::InvalidParameter { name, reason } => {
                Self::InvalidParameter { name, reason }
            }
            other => Self::InvalidParameter {
                name: "config",
                reason: other.to_string(),
            },
        }
    }
}
