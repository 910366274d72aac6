//! Session identity types for connected chat clients.
//!
//! A session is one live transport connection. It is identified by an opaque
//! [`SessionId`] and owned by exactly one authenticated [`UserId`]; a single
//! user may hold several sessions at once (e.g., two browser tabs).

use serde::{Deserialize, Serialize};

use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Opaque identifier for one connection, unique among live sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Numeric identifier of an authenticated user.
///
/// Serializes as a bare integer so it can appear directly as `senderId`
/// in the wire envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// Lifecycle of a session. Transitions only move forward.
///
/// - `Active`: registered with the hub, both pumps running.
/// - `Draining`: unregistered and the outbound queue is closed; the outbound
///   pump is still flushing messages queued before the close.
/// - `Closed`: both pumps have exited and the transport is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Active,
    Draining,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Active => write!(f, "active"),
            SessionState::Draining => write!(f, "draining"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_parses_and_trims() {
        let id: UserId = " 42 ".parse().unwrap();
        assert_eq!(id, UserId(42));
        assert!("abc".parse::<UserId>().is_err());
    }

    #[test]
    fn user_id_serializes_as_integer() {
        let json = serde_json::to_string(&UserId(7)).unwrap();
        assert_eq!(json, "7");
    }

    #[test]
    fn session_id_display_matches_inner() {
        let id = SessionId::new("127.0.0.1:5000/abc");
        assert_eq!(id.to_string(), "127.0.0.1:5000/abc");
        assert_eq!(id.as_str(), "127.0.0.1:5000/abc");
    }

    #[test]
    fn session_state_only_moves_forward() {
        assert!(SessionState::Active < SessionState::Draining);
        assert!(SessionState::Draining < SessionState::Closed);
        assert_eq!(SessionState::Draining.to_string(), "draining");
    }
}
