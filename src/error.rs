//! Error types for the tracked-input core
//!
//! Only initialization-time failures are surfaced as errors. Per-frame
//! failures are absorbed into stale or inert values so the frame loop never
//! stutters, and an out-of-range slot is a programming error that panics.

use thiserror::Error;

/// Errors reported by the input core to its caller
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InputError {
    /// The tracking or action subsystem is not initialized.
    ///
    /// Reported once; afterwards queries degrade to disconnected devices and
    /// inactive actions.
    #[error("{subsystem} backend is unavailable")]
    BackendUnavailable { subsystem: &'static str },

    /// A backend call rejected a registration request.
    #[error("failed to register {kind} \"{path}\": {source}")]
    Registration {
        kind: &'static str,
        path: String,
        #[source]
        source: BackendError,
    },
}

/// Errors reported by a tracking/action backend implementation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("backend not initialized")]
    NotInitialized,

    #[error("unknown action path \"{0}\"")]
    UnknownPath(String),

    #[error("invalid handle {0}")]
    InvalidHandle(u64),

    #[error("no localized name for origin {0}")]
    NameResolutionFailed(u64),
}

pub type Result<T, E = InputError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = InputError::BackendUnavailable { subsystem: "action" };
        assert_eq!(err.to_string(), "action backend is unavailable");

        let err = InputError::Registration {
            kind: "digital action",
            path: "/actions/default/in/grabgrip".to_string(),
            source: BackendError::UnknownPath("/actions/default/in/grabgrip".to_string()),
        };
        assert!(err.to_string().starts_with("failed to register digital action"));
    }
}
