//! Display names for alerts.

use crate::ports::{DisplayNameResolver, PeerRegistry};
use sha2::{Digest, Sha256};
use shared_types::UserId;
use std::sync::Arc;

const ADJECTIVES: [&str; 16] = [
    "Amber", "Brave", "Calm", "Dusty", "Eager", "Fuzzy", "Gentle", "Hasty", "Icy", "Jolly",
    "Keen", "Lucky", "Mellow", "Nimble", "Quiet", "Rusty",
];

const ANIMALS: [&str; 16] = [
    "Badger", "Crane", "Dingo", "Falcon", "Gecko", "Heron", "Ibex", "Jackal", "Koala", "Lynx",
    "Marten", "Newt", "Otter", "Puffin", "Raven", "Stoat",
];

/// Stable human-readable name for a user without a custom one.
///
/// The same user id always yields the same name on every peer.
#[must_use]
pub fn derive_display_name(user_id: &UserId) -> String {
    let digest = Sha256::digest(user_id.as_str().as_bytes());
    let adjective = ADJECTIVES[usize::from(digest[0]) % ADJECTIVES.len()];
    let animal = ANIMALS[usize::from(digest[1]) % ANIMALS.len()];
    format!("{adjective} {animal}")
}

/// Looks up custom names in the peer registry.
pub struct RegistryNameResolver {
    registry: Arc<dyn PeerRegistry>,
    local: Option<(UserId, String)>,
}

impl RegistryNameResolver {
    /// Resolve names from `registry`.
    pub fn new(registry: Arc<dyn PeerRegistry>) -> Self {
        Self {
            registry,
            local: None,
        }
    }

    /// Also resolve the local user's own custom name.
    #[must_use]
    pub fn with_local_user(mut self, user_id: UserId, custom_username: Option<String>) -> Self {
        self.local = custom_username.map(|name| (user_id, name));
        self
    }
}

impl DisplayNameResolver for RegistryNameResolver {
    fn display_username(&self, user_id: &UserId) -> String {
        if let Some((local_id, name)) = &self.local {
            if local_id == user_id {
                return name.clone();
            }
        }

        self.registry
            .peer_list()
            .into_iter()
            .filter(|peer| &peer.user_id == user_id)
            .find_map(|peer| peer.custom_username.filter(|name| !name.is_empty()))
            .unwrap_or_else(|| derive_display_name(user_id))
    }
}
