//! User and session identifiers.
//!
//! - User id: `user_` + 9 base-36 characters, persisted, reused until cleared.
//! - Session id: `session_<unix millis>_` + 9 base-36 characters, per process.
//!
//! Neither is cryptographically secure; they only need to be unlikely to
//! collide across the visitors of one small site.

use crate::JournalResult;
use beacon_storage::{KeySpace, KeyValueStore};
use chrono::Utc;
use rand::Rng;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random suffix in generated ids.
pub const ID_SUFFIX_LEN: usize = 9;

const USER_PREFIX: &str = "user_";

fn random_base36(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// Generate a fresh user id.
pub fn generate_user_id() -> String {
    format!("{}{}", USER_PREFIX, random_base36(ID_SUFFIX_LEN))
}

/// Generate a fresh session id.
pub fn generate_session_id() -> String {
    format!(
        "session_{}_{}",
        Utc::now().timestamp_millis(),
        random_base36(ID_SUFFIX_LEN)
    )
}

/// Whether `id` has the shape produced by [`generate_user_id`].
pub fn is_generated_user_id(id: &str) -> bool {
    id.strip_prefix(USER_PREFIX).is_some_and(|suffix| {
        suffix.len() == ID_SUFFIX_LEN && suffix.bytes().all(|b| BASE36.contains(&b))
    })
}

/// Issues the persisted user id and the per-process session id.
pub struct IdentityProvider {
    store: Arc<dyn KeyValueStore>,
    user_key: String,
    session_id: String,
    /// Cached user id. The mutex also serializes the read-generate-persist cycle.
    user_id: Mutex<Option<String>>,
}

impl IdentityProvider {
    /// Create a provider over `store`. A new session id is generated here.
    pub fn new(store: Arc<dyn KeyValueStore>, keys: &KeySpace) -> Self {
        Self {
            store,
            user_key: keys.user_id(),
            session_id: generate_session_id(),
            user_id: Mutex::new(None),
        }
    }

    /// The session id for this provider's lifetime.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Return the persisted user id, generating and persisting one if absent.
    ///
    /// If storage cannot be read or written the id generated for this call is
    /// kept for the rest of the process, so callers always see one value.
    pub fn user_id(&self) -> String {
        let mut cached = self.user_id.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(id) = cached.as_ref() {
            return id.clone();
        }

        let id = match self.store.get(&self.user_key) {
            Ok(Some(existing)) if !existing.trim().is_empty() => {
                debug!(key = %self.user_key, "Loaded persisted user id");
                existing
            }
            Ok(_) => self.generate_and_persist(),
            Err(e) => {
                warn!(key = %self.user_key, error = %e, "User id unreadable, generating a new one");
                self.generate_and_persist()
            }
        };

        *cached = Some(id.clone());
        id
    }

    fn generate_and_persist(&self) -> String {
        let id = generate_user_id();
        match self.store.set(&self.user_key, &id) {
            Ok(()) => info!(user_id = %id, "Generated user id"),
            Err(e) => warn!(
                user_id = %id,
                error = %e,
                "Failed to persist user id, keeping it for this process only"
            ),
        }
        id
    }

    /// Forget the user id, both cached and persisted. The next
    /// [`user_id`](Self::user_id) call generates a new one.
    ///
    /// The cache is cleared even when deleting the persisted id fails.
    pub fn clear_user_id(&self) -> JournalResult<()> {
        let mut cached = self.user_id.lock().unwrap_or_else(PoisonError::into_inner);
        *cached = None;
        self.store.delete(&self.user_key)?;
        info!(key = %self.user_key, "Cleared user id");
        Ok(())
    }
}
