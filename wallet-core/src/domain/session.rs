//! Session and identity domain models

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one login. Every successful login mints a fresh id, so a
/// re-login with an identical token is still a different session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The live authenticated credential.
///
/// Cloned into in-flight operations so their results can be tagged with the
/// session they were issued under. Never written to disk.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    id: SessionId,
    token: String,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            id: SessionId::new(),
            token: token.into(),
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Bearer token for the remote service
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Profile of the signed-in user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub email: String,
}

impl Identity {
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
        }
    }
}
