//! # Actions
//!
//! Action identifiers, namespaced wire keys and the envelope handed to
//! receivers.

use serde::{Deserialize, Serialize};
use shared_types::Namespace;
use std::fmt;

/// Application-defined action identifier.
///
/// The same identifier may be registered under several namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActionId(&'static str);

impl ActionId {
    /// Create an action identifier.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Raw identifier.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Wire key for an action in a namespace: `"<namespace>.<action>"`.
///
/// This is the tag the transport carries alongside every frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionKey(String);

impl ActionKey {
    /// Build the key for `action` in `namespace`.
    #[must_use]
    pub fn new(action: ActionId, namespace: Namespace) -> Self {
        Self(format!("{}.{}", namespace.as_str(), action.as_str()))
    }

    /// Build a key from a raw wire tag (as received from a transport).
    #[must_use]
    pub fn from_wire(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    /// Raw wire tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the wire tag in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the wire tag is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ActionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
