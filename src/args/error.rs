//! Pipeline error types.
//!
//! Unrecognized options are not errors (they are forwarded), so every
//! variant here is fatal for the run.

use thiserror::Error;

use crate::peer::PeerError;

/// Errors that abort a launch before any invocation is assembled.
#[derive(Debug, Error)]
pub enum LaunchError {
    /// An option's argument failed the recognizer's shape check.
    #[error("{option}: invalid value '{value}': {reason}")]
    MalformedArgument {
        option: String,
        value: String,
        reason: String,
    },

    /// A value-taking option had no argument.
    #[error("{option}: requires a value")]
    MissingValue { option: String },

    /// A flag was given an inline argument.
    #[error("{option}: does not take a value")]
    UnexpectedValue { option: String },

    /// A mandatory field was unset at the end of a target's batch.
    #[error("{target}: missing {field} specification ({hint})")]
    MissingField {
        target: String,
        field: String,
        hint: String,
    },

    /// A peer address was required and could not be resolved.
    #[error("{target}: cannot resolve {field} from peer '{peer}'")]
    PeerResolution {
        target: String,
        field: String,
        peer: String,
        #[source]
        source: PeerError,
    },

    /// A sidecar registration that cannot be honored: declared twice, or
    /// declared without any option of its own.
    #[error("duplicate registration of sidecar '{name}': {reason}")]
    DuplicateTarget { name: String, reason: String },

    /// A known option given to a target that cannot use it.
    #[error("{option}: {reason}")]
    Unsupported { option: String, reason: String },

    /// A sidecar declaration named a sidecar this launcher does not have.
    #[error("unknown sidecar '{name}' (available: {available})")]
    UnknownSidecar { name: String, available: String },
}

impl LaunchError {
    pub fn malformed(option: &str, value: &str, reason: impl Into<String>) -> Self {
        LaunchError::MalformedArgument {
            option: option.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unsupported(option: &str, reason: impl Into<String>) -> Self {
        LaunchError::Unsupported {
            option: option.to_string(),
            reason: reason.into(),
        }
    }

    pub fn missing(target: &str, field: &str, hint: impl Into<String>) -> Self {
        LaunchError::MissingField {
            target: target.to_string(),
            field: field.to_string(),
            hint: hint.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_field_names_the_field() {
        let err = LaunchError::missing("sn-node", "sentinel", "use --sentinel");
        assert_eq!(
            err.to_string(),
            "sn-node: missing sentinel specification (use --sentinel)"
        );
    }

    #[test]
    fn malformed_is_single_line() {
        let err = LaunchError::malformed("--sn-api-port", "http", "not a port number");
        let msg = err.to_string();
        assert!(!msg.contains('\n'));
        assert!(msg.starts_with("--sn-api-port: invalid value 'http'"));
    }
}
