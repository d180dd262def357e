//! Isolated invocation context for server-side logins.
//!
//! A login performed on behalf of an HTTP request has no client connection
//! of its own. The authenticator still receives a connection handle, but it
//! is detached: closing it does nothing and it carries no transport.

use uuid::Uuid;

/// Connection handle with no transport behind it.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedConnection;

impl DetachedConnection {
    /// No-op.
    pub fn close(&self) {}

    #[cfg(test)]
    pub fn is_live(&self) -> bool {
        false
    }
}

#[derive(Debug, Clone)]
pub struct IsolatedInvocation {
    id: Uuid,
    connection: DetachedConnection,
}

impl IsolatedInvocation {
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7(),
            connection: DetachedConnection,
        }
    }

    /// Identifier used to correlate log lines of one login attempt.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn connection(&self) -> &DetachedConnection {
        &self.connection
    }
}

impl Default for IsolatedInvocation {
    fn default() -> Self {
        Self::new()
    }
}
