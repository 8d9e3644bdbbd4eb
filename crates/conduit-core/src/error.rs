// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for Conduit backend plugins.

use thiserror::Error;

/// Boxed error source carried by infrastructure and handler failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The error type shared by every plugin protocol operation.
///
/// [`PluginError::MethodNotImplemented`] is the sentinel for "this plugin
/// does not offer the requested capability". Callers branch on it with
/// [`PluginError::is_not_implemented`] or `matches!`; every other variant
/// means the capability exists but the call failed.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The plugin has no handler for the requested operation.
    #[error("method not implemented")]
    MethodNotImplemented,

    /// A configured handler failed. Produced by handler implementations and
    /// passed through the adapter untouched.
    #[error("plugin handler error: {message}")]
    Handler {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The settings store backing context resolution failed.
    #[error("failed to resolve plugin context: {source}")]
    ContextResolution {
        #[source]
        source: BoxError,
    },

    /// The real-time engine rejected a publication.
    #[error("failed to publish to channel {channel}: {source}")]
    Publish {
        channel: String,
        #[source]
        source: BoxError,
    },

    /// The real-time engine could not report presence for a channel.
    #[error("failed to get presence for channel {channel}: {source}")]
    Presence {
        channel: String,
        #[source]
        source: BoxError,
    },

    /// A request could not be translated into the handler's request shape.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The call context was cancelled before the operation completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PluginError {
    /// Convenience constructor for handler failures without a source.
    pub fn handler(message: impl Into<String>) -> Self {
        PluginError::Handler {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true for the "capability not implemented" sentinel.
    pub fn is_not_implemented(&self) -> bool {
        matches!(self, PluginError::MethodNotImplemented)
    }

    /// Returns true if the failure came from infrastructure and retrying
    /// the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PluginError::ContextResolution { .. }
                | PluginError::Publish { .. }
                | PluginError::Presence { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_implemented_is_distinguishable() {
        assert!(PluginError::MethodNotImplemented.is_not_implemented());
        assert!(!PluginError::handler("boom").is_not_implemented());
        assert!(!PluginError::Cancelled.is_not_implemented());
    }

    #[test]
    fn handler_error_keeps_source_chain() {
        let err = PluginError::Handler {
            message: "upstream failed".into(),
            source: Some(Box::new(std::io::Error::other("connection reset"))),
        };
        let source = std::error::Error::source(&err).expect("source should be kept");
        assert_eq!(source.to_string(), "connection reset");
        assert_eq!(err.to_string(), "plugin handler error: upstream failed");
    }

    #[test]
    fn only_infrastructure_errors_are_retryable() {
        let resolution = PluginError::ContextResolution {
            source: Box::new(std::io::Error::other("db down")),
        };
        assert!(resolution.is_retryable());
        assert!(!PluginError::MethodNotImplemented.is_retryable());
        assert!(!PluginError::InvalidRequest("bad".into()).is_retryable());
    }
}
