use thiserror::Error;

/// Errors originating from the core module.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A parameter is outside of its accepted domain.
    #[error("Paramètre invalide `{name}` : {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// A schedule entry could not be parsed as `HH:MM`.
    #[error("Horaire invalide : {value}")]
    InvalidTime {
        /// The raw schedule entry.
        value: String,
    },
}
