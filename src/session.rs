use std::{collections::HashMap, sync::Arc};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::warn;
use uuid::Uuid;

use crate::{containers::NewBillDraft, model::User, routes::NavigationContext};

pub const USER_KEY: &str = "user";
pub const JWT_KEY: &str = "jwt";

/// Opaque string map scoped to one browser session.
pub trait SessionStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
    fn remove(&mut self, key: &str);
    fn clear(&mut self);
}

#[derive(Debug, Clone, Default)]
pub struct MemorySessionStore {
    entries: HashMap<String, String>,
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Decode the `user` record, ignoring entries that no longer parse.
pub fn session_user(store: &(impl SessionStore + ?Sized)) -> Option<User> {
    let raw = store.get(USER_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(err) => {
            warn!(?err, "discarding unreadable session user");
            None
        }
    }
}

pub fn session_jwt(store: &(impl SessionStore + ?Sized)) -> Option<String> {
    store.get(JWT_KEY).filter(|token| !token.is_empty())
}

/// Everything the server keeps for one browser session.
#[derive(Debug, Default)]
pub struct SessionContext {
    pub storage: MemorySessionStore,
    pub navigation: NavigationContext,
    pub draft: NewBillDraft,
}

impl SessionContext {
    pub fn user(&self) -> Option<User> {
        session_user(&self.storage)
    }

    pub fn jwt(&self) -> Option<String> {
        session_jwt(&self.storage)
    }

    pub fn reset(&mut self) {
        self.storage.clear();
        self.navigation = NavigationContext::default();
        self.draft = NewBillDraft::default();
    }
}

pub type SessionHandle = Arc<Mutex<SessionContext>>;

struct SessionSlot {
    context: SessionHandle,
    expires_at: DateTime<Utc>,
}

/// Cookie-keyed registry of session contexts.
#[derive(Clone)]
pub struct SessionRegistry {
    slots: Arc<RwLock<HashMap<Uuid, SessionSlot>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Resolve the session for `id`, creating a fresh one when the id is unknown or expired.
    /// The expiry is pushed back on every call.
    pub async fn open(&self, id: Option<Uuid>) -> (Uuid, SessionHandle) {
        let now = Utc::now();
        let mut slots = self.slots.write().await;

        if let Some(id) = id {
            if let Some(slot) = slots.get_mut(&id) {
                if slot.expires_at > now {
                    slot.expires_at = now + self.ttl;
                    return (id, slot.context.clone());
                }
                slots.remove(&id);
            }
        }

        let id = Uuid::new_v4();
        let context = SessionHandle::default();
        slots.insert(
            id,
            SessionSlot {
                context: context.clone(),
                expires_at: now + self.ttl,
            },
        );
        (id, context)
    }

    /// Look up a live session without creating one.
    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        let slots = self.slots.read().await;
        slots
            .get(&id)
            .filter(|slot| slot.expires_at > Utc::now())
            .map(|slot| slot.context.clone())
    }

    pub async fn discard(&self, id: Uuid) {
        self.slots.write().await.remove(&id);
    }

    pub async fn purge_expired(&self) -> usize {
        let now = Utc::now();
        let mut slots = self.slots.write().await;
        let before = slots.len();
        slots.retain(|_, slot| slot.expires_at > now);
        before - slots.len()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserType;

    #[test]
    fn memory_store_get_set_remove() {
        let mut store = MemorySessionStore::default();
        assert_eq!(store.get(JWT_KEY), None);
        store.set(JWT_KEY, "token".to_string());
        assert_eq!(store.get(JWT_KEY).as_deref(), Some("token"));
        store.remove(JWT_KEY);
        assert_eq!(store.get(JWT_KEY), None);
    }

    #[test]
    fn session_user_decodes_record() {
        let mut store = MemorySessionStore::default();
        let user = User::connected(UserType::Employee, "a@a", "pw");
        store.set(USER_KEY, serde_json::to_string(&user).unwrap());
        assert_eq!(session_user(&store), Some(user));

        store.set(USER_KEY, "{not json".to_string());
        assert_eq!(session_user(&store), None);
    }

    #[test]
    fn empty_jwt_counts_as_absent() {
        let mut store = MemorySessionStore::default();
        store.set(JWT_KEY, String::new());
        assert_eq!(session_jwt(&store), None);
    }

    #[tokio::test]
    async fn open_reuses_live_sessions() {
        let registry = SessionRegistry::new(Duration::days(1));
        let (id, first) = registry.open(None).await;
        first
            .lock()
            .await
            .storage
            .set(JWT_KEY, "abc".to_string());

        let (same_id, second) = registry.open(Some(id)).await;
        assert_eq!(same_id, id);
        assert_eq!(second.lock().await.jwt().as_deref(), Some("abc"));

        let (other_id, _) = registry.open(Some(Uuid::new_v4())).await;
        assert_ne!(other_id, id);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn expired_sessions_are_purged() {
        let registry = SessionRegistry::new(Duration::seconds(-1));
        let (id, _) = registry.open(None).await;
        assert!(registry.get(id).await.is_none());
        assert_eq!(registry.purge_expired().await, 1);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let registry = SessionRegistry::new(Duration::days(1));
        let (_, handle) = registry.open(None).await;
        let mut context = handle.lock().await;
        context.storage.set(USER_KEY, "{}".to_string());
        context.draft.bill_id = Some("key".to_string());
        context.reset();
        assert_eq!(context.storage.get(USER_KEY), None);
        assert_eq!(context.draft, NewBillDraft::default());
    }
}
