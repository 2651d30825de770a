use crate::error::{Error, Result};
use crate::utils::secure_token;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod middleware;
pub mod store;

#[cfg(feature = "redis")]
pub mod redis;

/// Length of generated session ids (alphanumeric, ~190 bits of entropy)
pub const SESSION_ID_LENGTH: usize = 32;

/// Prefix for flash keys inside the session data object, so flash values
/// cannot collide with application keys
const FLASH_PREFIX: &str = "_flash:";

/// Cookie SameSite attribute
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl Default for SameSite {
    fn default() -> Self {
        Self::Lax
    }
}

impl std::fmt::Display for SameSite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lax => write!(f, "Lax"),
            Self::None => write!(f, "None"),
        }
    }
}

/// Session payload as persisted by a store backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    /// Session data as a JSON object
    pub data: Value,
    /// Session creation timestamp (Unix seconds)
    pub created_at: u64,
}

impl Default for SessionData {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionData {
    pub fn new() -> Self {
        Self {
            data: Value::Object(Map::new()),
            created_at: unix_timestamp(),
        }
    }
}

/// Get current Unix timestamp in seconds
pub fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Generate a fresh session id
pub fn generate_session_id() -> String {
    secure_token(SESSION_ID_LENGTH)
}

#[derive(Default)]
struct SessionFlags {
    dirty: bool,
    destroyed: bool,
    regenerated: bool,
}

/// Per-request mutable view over one store entry
///
/// Cheaply clonable: clones share the same interior state, so the guard and
/// the session middleware observe each other's mutations within a request.
/// A session is never shared across concurrent requests; the owning
/// middleware persists or destroys it exactly once at response time based
/// on the dirty/new/destroyed flags.
#[derive(Clone)]
pub struct Session {
    /// Current id (replaced by `regenerate`)
    id: Arc<Mutex<String>>,
    /// Id at load time, used for store cleanup on destroy
    original_id: String,
    /// True if no cookie existed at request start
    is_new: bool,
    created_at: u64,
    data: Arc<RwLock<Value>>,
    flags: Arc<Mutex<SessionFlags>>,
}

impl Session {
    /// Create a fresh session with a newly generated id and empty data
    pub fn create() -> Self {
        let id = generate_session_id();
        Self {
            original_id: id.clone(),
            id: Arc::new(Mutex::new(id)),
            is_new: true,
            created_at: unix_timestamp(),
            data: Arc::new(RwLock::new(Value::Object(Map::new()))),
            flags: Arc::new(Mutex::new(SessionFlags::default())),
        }
    }

    /// Rehydrate a session loaded from a store entry
    pub fn from_data(id: &str, session_data: SessionData) -> Self {
        Self {
            id: Arc::new(Mutex::new(id.to_string())),
            original_id: id.to_string(),
            is_new: false,
            created_at: session_data.created_at,
            data: Arc::new(RwLock::new(session_data.data)),
            flags: Arc::new(Mutex::new(SessionFlags::default())),
        }
    }

    /// Snapshot for persistence
    pub fn to_data(&self) -> Result<SessionData> {
        let data = self
            .data
            .read()
            .map_err(|_| Error::session("Failed to acquire read lock for session data"))?
            .clone();
        Ok(SessionData {
            data,
            created_at: self.created_at,
        })
    }

    /// Current session id
    pub fn id(&self) -> String {
        self.id
            .lock()
            .map(|id| id.clone())
            .unwrap_or_default()
    }

    /// Id the session was loaded under at request start
    pub fn original_id(&self) -> &str {
        &self.original_id
    }

    /// True if no session cookie existed at request start
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// Set a session value, marking the session dirty
    pub fn set<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        let value = serde_json::to_value(value)?;
        let mut data = self
            .data
            .write()
            .map_err(|_| Error::session("Failed to acquire write lock for session data"))?;
        if let Value::Object(ref mut map) = *data {
            map.insert(key.to_string(), value);
        }
        self.mark_dirty();
        Ok(())
    }

    /// Get a session value
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        let data = self.data.read().ok()?;
        if let Value::Object(ref map) = *data {
            map.get(key)
                .and_then(|v| serde_json::from_value(v.clone()).ok())
        } else {
            None
        }
    }

    /// Check whether a key is present
    pub fn has(&self, key: &str) -> bool {
        match self.data.read() {
            Ok(data) => {
                if let Value::Object(ref map) = *data {
                    map.contains_key(key)
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    /// Remove a key; marks dirty only if a removal occurred
    pub fn forget(&self, key: &str) -> Option<Value> {
        let mut data = self.data.write().ok()?;
        let removed = if let Value::Object(ref mut map) = *data {
            map.remove(key)
        } else {
            None
        };
        drop(data);

        if removed.is_some() {
            self.mark_dirty();
        }
        removed
    }

    /// Clear all data; marks dirty only if data was non-empty
    pub fn flush(&self) {
        let had_items = if let Ok(mut data) = self.data.write() {
            if let Value::Object(ref mut map) = *data {
                let had_items = !map.is_empty();
                map.clear();
                had_items
            } else {
                false
            }
        } else {
            false
        };

        if had_items {
            self.mark_dirty();
        }
    }

    /// Copy of all session data
    pub fn all(&self) -> Map<String, Value> {
        match self.data.read() {
            Ok(data) => {
                if let Value::Object(ref map) = *data {
                    map.clone()
                } else {
                    Map::new()
                }
            }
            Err(_) => Map::new(),
        }
    }

    /// Set a flash value, consumed by the next `pull`
    pub fn flash<T: Serialize>(&self, key: &str, value: T) -> Result<()> {
        self.set(&format!("{}{}", FLASH_PREFIX, key), value)
    }

    /// Remove and return a flash value
    pub fn pull<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.forget(&format!("{}{}", FLASH_PREFIX, key))
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Replace the id with a freshly generated token, keeping all data
    ///
    /// Rotating the identifier after a privilege change prevents session
    /// fixation. The old store entry is left to expire unless
    /// `destroy_previous_on_regenerate` is configured on the middleware.
    pub fn regenerate(&self) {
        let new_id = generate_session_id();
        if let Ok(mut id) = self.id.lock() {
            *id = new_id;
        }
        if let Ok(mut flags) = self.flags.lock() {
            flags.dirty = true;
            flags.regenerated = true;
        }
    }

    /// Flush all data and mark the session destroyed
    ///
    /// After this, no further persistence occurs and the store entry under
    /// the original id is removed at response time.
    pub fn invalidate(&self) {
        self.flush();
        if let Ok(mut flags) = self.flags.lock() {
            flags.destroyed = true;
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.flags.lock().map(|f| f.dirty).unwrap_or(false)
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags.lock().map(|f| f.destroyed).unwrap_or(false)
    }

    pub fn was_regenerated(&self) -> bool {
        self.flags.lock().map(|f| f.regenerated).unwrap_or(false)
    }

    fn mark_dirty(&self) {
        if let Ok(mut flags) = self.flags.lock() {
            flags.dirty = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fresh_session_is_new_and_clean() {
        let session = Session::create();
        assert!(session.is_new());
        assert!(!session.is_dirty());
        assert!(!session.is_destroyed());
        assert_eq!(session.id().len(), SESSION_ID_LENGTH);
        assert_eq!(session.id(), session.original_id());
    }

    #[test]
    fn test_set_get_round_trip() {
        let session = Session::create();
        let value = json!({"items": [1, 2, 3], "nested": {"a": true}});
        session.set("cart", value.clone()).unwrap();

        let read: Value = session.get("cart").unwrap();
        assert_eq!(read, value);
        assert!(session.is_dirty());
    }

    #[test]
    fn test_forget_marks_dirty_only_on_removal() {
        let session = Session::from_data("sid", SessionData::new());
        assert!(session.forget("missing").is_none());
        assert!(!session.is_dirty());

        session.set("k", "v").unwrap();
        assert!(session.forget("k").is_some());
        assert!(session.is_dirty());
    }

    #[test]
    fn test_flush_marks_dirty_only_if_nonempty() {
        let session = Session::from_data("sid", SessionData::new());
        session.flush();
        assert!(!session.is_dirty());

        session.set("k", 1).unwrap();
        session.flush();
        assert!(session.is_dirty());
        assert!(session.all().is_empty());
    }

    #[test]
    fn test_regenerate_keeps_data_and_original_id() {
        let session = Session::from_data("old-id", SessionData::new());
        session.set("user", "alice").unwrap();
        session.regenerate();

        assert_ne!(session.id(), "old-id");
        assert_eq!(session.original_id(), "old-id");
        assert!(session.was_regenerated());
        assert_eq!(session.get::<String>("user").unwrap(), "alice");
    }

    #[test]
    fn test_invalidate_flushes_and_destroys() {
        let session = Session::from_data("sid", SessionData::new());
        session.set("k", 1).unwrap();
        session.invalidate();

        assert!(session.is_destroyed());
        assert!(session.all().is_empty());
    }

    #[test]
    fn test_clones_share_state() {
        let session = Session::create();
        let clone = session.clone();
        clone.set("k", "v").unwrap();
        assert_eq!(session.get::<String>("k").unwrap(), "v");
        assert!(session.is_dirty());
    }

    #[test]
    fn test_flash_is_consumed_on_pull() {
        let session = Session::create();
        session.flash("notice", "saved").unwrap();
        assert_eq!(session.pull::<String>("notice").unwrap(), "saved");
        assert!(session.pull::<String>("notice").is_none());
    }
}
