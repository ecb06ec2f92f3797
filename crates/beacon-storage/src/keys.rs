//! Storage key constants.

/// Namespace prepended to every key by default.
pub const DEFAULT_NAMESPACE: &str = "myron";

/// Logical storage keys used by the journal.
pub struct StorageKeys;

impl StorageKeys {
    /// Retry queue of undelivered events (JSON array)
    pub const FAILED_EVENTS: &'static str = "failed_events";

    /// Persisted pseudo-random user id
    pub const USER_ID: &'static str = "user_id";
}

/// Resolves logical keys to their namespaced physical form (`myron_user_id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySpace {
    namespace: String,
}

impl KeySpace {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Physical key for `logical`. An empty namespace leaves the key untouched.
    pub fn key(&self, logical: &str) -> String {
        if self.namespace.is_empty() {
            logical.to_string()
        } else {
            format!("{}_{}", self.namespace, logical)
        }
    }

    pub fn failed_events(&self) -> String {
        self.key(StorageKeys::FAILED_EVENTS)
    }

    pub fn user_id(&self) -> String {
        self.key(StorageKeys::USER_ID)
    }
}

impl Default for KeySpace {
    fn default() -> Self {
        Self::new(DEFAULT_NAMESPACE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_namespace_matches_legacy_keys() {
        let keys = KeySpace::default();
        assert_eq!(keys.failed_events(), "myron_failed_events");
        assert_eq!(keys.user_id(), "myron_user_id");
    }

    #[test]
    fn empty_namespace_uses_bare_keys() {
        let keys = KeySpace::new("");
        assert_eq!(keys.failed_events(), StorageKeys::FAILED_EVENTS);
        assert_eq!(keys.user_id(), StorageKeys::USER_ID);
    }

    #[test]
    fn storage_keys_are_unique() {
        assert_ne!(StorageKeys::FAILED_EVENTS, StorageKeys::USER_ID);
    }
}
