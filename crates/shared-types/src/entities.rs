//! # Core Entities
//!
//! ## Clusters
//!
//! - **Identity**: `PeerId`, `UserId`
//! - **Sessions**: `SessionKind`, `Namespace`

use crate::errors::IdentifierError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Transport-level connection identifier.
///
/// Stable for the lifetime of one connection, not across reconnects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    /// Create a peer identifier, rejecting empty strings.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::Empty { kind: "peer id" });
        }
        Ok(Self(id))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PeerId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Identity-level identifier, stable across reconnects.
///
/// Used for display lookups only; the protocol never keys state on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create a user identifier, rejecting empty strings.
    pub fn new(id: impl Into<String>) -> Result<Self, IdentifierError> {
        let id = id.into();
        if id.is_empty() {
            return Err(IdentifierError::Empty { kind: "user id" });
        }
        Ok(Self(id))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for UserId {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

// =============================================================================
// CLUSTER B: SESSIONS
// =============================================================================

/// Partition key for action traffic.
///
/// Direct and group sessions reuse the same action identifiers; the namespace
/// keeps their traffic apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    /// One-to-one session (`dm` on the wire).
    #[serde(rename = "dm")]
    Direct,
    /// Multi-party room (`g` on the wire).
    #[serde(rename = "g")]
    Group,
}

impl Namespace {
    /// Wire tag for this namespace.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "dm",
            Self::Group => "g",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Namespace {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dm" => Ok(Self::Direct),
            "g" => Ok(Self::Group),
            other => Err(IdentifierError::UnknownNamespace(other.to_string())),
        }
    }
}

/// Kind of session a node participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionKind {
    /// One-to-one session. Verification is started explicitly.
    Direct,
    /// Multi-party room. Verification is scheduled as peers appear.
    #[default]
    Group,
}

impl SessionKind {
    /// Namespace used for this session's action traffic.
    #[must_use]
    pub fn namespace(&self) -> Namespace {
        match self {
            Self::Direct => Namespace::Direct,
            Self::Group => Namespace::Group,
        }
    }

    /// Returns true for one-to-one sessions.
    #[must_use]
    pub fn is_direct(&self) -> bool {
        matches!(self, Self::Direct)
    }
}

impl FromStr for SessionKind {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "direct" => Ok(Self::Direct),
            "group" => Ok(Self::Group),
            other => Err(IdentifierError::UnknownSessionKind(other.to_string())),
        }
    }
}
