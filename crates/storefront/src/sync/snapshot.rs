//! Guest snapshots.
//!
//! While nobody is signed in, each collection is persisted as one JSON value
//! in a named slot (`cart`, `wishlist`). Reads and writes are whole-value.
//! A slot that cannot be decoded reads as empty.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tower_sessions::Session;

use crate::models::session_keys;

/// A named snapshot slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SnapshotSlot {
    Cart,
    Wishlist,
}

impl SnapshotSlot {
    /// Storage key for the slot.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cart => session_keys::CART_SNAPSHOT,
            Self::Wishlist => session_keys::WISHLIST_SNAPSHOT,
        }
    }
}

impl std::fmt::Display for SnapshotSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Errors from snapshot persistence.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The session store rejected the read or write.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Entries could not be encoded.
    #[error("snapshot encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Whole-value storage for guest snapshots.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// The raw value in `slot`, if any.
    async fn read(&self, slot: SnapshotSlot) -> Result<Option<String>, SnapshotError>;

    /// Overwrite `slot`.
    async fn write(&self, slot: SnapshotSlot, value: String) -> Result<(), SnapshotError>;

    /// Delete `slot`.
    async fn remove(&self, slot: SnapshotSlot) -> Result<(), SnapshotError>;
}

/// Decode the entries in `slot`.
///
/// Missing, unreadable and malformed snapshots all yield an empty list.
pub async fn load_entries<T: DeserializeOwned>(
    store: &dyn SnapshotStore,
    slot: SnapshotSlot,
) -> Vec<T> {
    let raw = match store.read(slot).await {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(%slot, error = %e, "Failed to read snapshot, treating as empty");
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        tracing::warn!(%slot, error = %e, "Malformed snapshot, treating as empty");
        Vec::new()
    })
}

/// Encode `entries` and overwrite `slot`.
///
/// # Errors
///
/// Returns `SnapshotError` if encoding or the underlying write fails.
pub async fn save_entries<T: Serialize + Sync>(
    store: &dyn SnapshotStore,
    slot: SnapshotSlot,
    entries: &[T],
) -> Result<(), SnapshotError> {
    let value = serde_json::to_string(entries)?;
    store.write(slot, value).await
}

// =============================================================================
// Session-backed store
// =============================================================================

/// Snapshots kept in the visitor's tower-sessions session.
#[derive(Debug, Clone)]
pub struct SessionSnapshots {
    session: Session,
}

impl SessionSnapshots {
    /// Wrap a request's session.
    #[must_use]
    pub const fn new(session: Session) -> Self {
        Self { session }
    }
}

#[async_trait]
impl SnapshotStore for SessionSnapshots {
    async fn read(&self, slot: SnapshotSlot) -> Result<Option<String>, SnapshotError> {
        Ok(self.session.get::<String>(slot.key()).await?)
    }

    async fn write(&self, slot: SnapshotSlot, value: String) -> Result<(), SnapshotError> {
        Ok(self.session.insert(slot.key(), value).await?)
    }

    async fn remove(&self, slot: SnapshotSlot) -> Result<(), SnapshotError> {
        self.session.remove_value(slot.key()).await?;
        Ok(())
    }
}

// =============================================================================
// In-memory store
// =============================================================================

/// Snapshots in a shared map. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshots {
    slots: Arc<Mutex<HashMap<SnapshotSlot, String>>>,
}

impl MemorySnapshots {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The raw value in `slot`.
    #[must_use]
    pub fn raw(&self, slot: SnapshotSlot) -> Option<String> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&slot)
            .cloned()
    }

    /// Put a raw value in `slot`.
    pub fn set_raw(&self, slot: SnapshotSlot, value: impl Into<String>) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(slot, value.into());
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshots {
    async fn read(&self, slot: SnapshotSlot) -> Result<Option<String>, SnapshotError> {
        Ok(self.raw(slot))
    }

    async fn write(&self, slot: SnapshotSlot, value: String) -> Result<(), SnapshotError> {
        self.set_raw(slot, value);
        Ok(())
    }

    async fn remove(&self, slot: SnapshotSlot) -> Result<(), SnapshotError> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&slot);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_malformed_snapshot_reads_as_empty() {
        let store = MemorySnapshots::new();
        store.set_raw(SnapshotSlot::Cart, "{not json");

        let entries: Vec<u32> = load_entries(&store, SnapshotSlot::Cart).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_shape_reads_as_empty() {
        let store = MemorySnapshots::new();
        store.set_raw(SnapshotSlot::Wishlist, r#"{"id": 1}"#);

        let entries: Vec<u32> = load_entries(&store, SnapshotSlot::Wishlist).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = MemorySnapshots::new();
        save_entries(&store, SnapshotSlot::Cart, &[3_u32, 1, 2])
            .await
            .unwrap();

        let entries: Vec<u32> = load_entries(&store, SnapshotSlot::Cart).await;
        assert_eq!(entries, vec![3, 1, 2]);
        assert_eq!(store.raw(SnapshotSlot::Cart).as_deref(), Some("[3,1,2]"));
        assert!(store.raw(SnapshotSlot::Wishlist).is_none());
    }

    #[tokio::test]
    async fn test_session_snapshots_round_trip_and_remove() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        let store = SessionSnapshots::new(session.clone());

        save_entries(&store, SnapshotSlot::Wishlist, &[7_u32])
            .await
            .unwrap();
        let entries: Vec<u32> = load_entries(&store, SnapshotSlot::Wishlist).await;
        assert_eq!(entries, vec![7]);

        store.remove(SnapshotSlot::Wishlist).await.unwrap();
        assert!(store.read(SnapshotSlot::Wishlist).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_session_value_of_wrong_type_reads_as_empty() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);
        session.insert(SnapshotSlot::Cart.key(), 42).await.unwrap();

        let entries: Vec<u32> = load_entries(&SessionSnapshots::new(session), SnapshotSlot::Cart).await;
        assert!(entries.is_empty());
    }
}
