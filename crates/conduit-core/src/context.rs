// SPDX-FileCopyrightText: 2026 Conduit Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-call context carrying cancellation from the host to plugin handlers.

use tokio_util::sync::CancellationToken;

/// Context passed unchanged through every plugin call.
///
/// Long-running handlers (`call_resource`, `run_stream`) must watch
/// [`CallContext::cancelled`] and return promptly once it fires.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    token: CancellationToken,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing token, e.g. one owned by a transport session.
    pub fn with_token(token: CancellationToken) -> Self {
        Self { token }
    }

    /// A derived context that is cancelled with this one but can also be
    /// cancelled on its own.
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves once the call is cancelled.
    pub async fn cancelled(&self) {
        self.token.cancelled().await;
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}
