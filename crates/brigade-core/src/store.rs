//! In-memory session store.
//!
//! Sessions are kept behind a per-session mutex inside a map guarded by a
//! read-write lock. The map lock is held only long enough to find or insert
//! an entry; reads and writes of one session are serialized by that
//! session's own mutex, so dispatches for different sessions never wait on
//! each other.

use std::{collections::HashMap, sync::Arc};

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::{
    error::{KitchenError, Result},
    machine::MachineState,
    models::Session,
};

/// What the store keeps per session: the session value plus the discrete
/// machine state it is in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session: Session,
    pub state: MachineState,
}

impl SessionRecord {
    pub fn new(session: Session, state: MachineState) -> Self {
        Self { session, state }
    }
}

type Entry = Arc<Mutex<SessionRecord>>;

#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Entry>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a new session.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::Conflict` if the ID is taken.
    pub async fn create(&self, id: &str, record: SessionRecord) -> Result<SessionRecord> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(id) {
            return Err(KitchenError::Conflict { id: id.to_string() });
        }
        sessions.insert(id.to_string(), Arc::new(Mutex::new(record.clone())));
        Ok(record)
    }

    /// Current value of a session, or `None` if it does not exist.
    pub async fn get(&self, id: &str) -> Option<SessionRecord> {
        let entry = self.entry(id).await.ok()?;
        let record = entry.lock().await;
        Some(record.clone())
    }

    /// Like [`get`](Self::get) but absence is an error.
    pub async fn state_of(&self, id: &str) -> Result<SessionRecord> {
        let entry = self.entry(id).await?;
        let record = entry.lock().await;
        Ok(record.clone())
    }

    /// Replaces an existing session.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::SessionNotFound` if the ID is unknown.
    pub async fn update(&self, id: &str, record: SessionRecord) -> Result<SessionRecord> {
        let entry = self.entry(id).await?;
        let mut current = entry.lock().await;
        *current = record.clone();
        Ok(record)
    }

    /// Removes a session.
    ///
    /// # Errors
    ///
    /// Returns `KitchenError::SessionNotFound` if the ID is unknown.
    pub async fn delete(&self, id: &str) -> Result<()> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| KitchenError::SessionNotFound { id: id.to_string() })
    }

    /// All session IDs, sorted.
    pub async fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Locks one session for a read-modify-write sequence.
    ///
    /// Writes go through the returned guard; other readers and writers of
    /// the same session wait until it is dropped.
    pub(crate) async fn lock(&self, id: &str) -> Result<OwnedMutexGuard<SessionRecord>> {
        let entry = self.entry(id).await?;
        Ok(entry.lock_owned().await)
    }

    async fn entry(&self, id: &str) -> Result<Entry> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| KitchenError::SessionNotFound { id: id.to_string() })
    }
}
