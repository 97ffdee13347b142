//! Keeps the durable store a mirror of the in-memory note collection.
//!
//! Storage failures never propagate to callers: they are logged and recorded
//! in [`SyncStatus`] so a front end can show that changes are not being kept.

use std::fmt;

use time::OffsetDateTime;

use crate::note::{format_timestamp, now_utc, Note};
use crate::storage::NoteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Inactive,
    Synced {
        last_saved_at: Option<OffsetDateTime>,
    },
    /// The last load failed; saves are suspended until a load succeeds.
    Offline {
        message: String,
        occurred_at: OffsetDateTime,
    },
    /// The last save failed; the store holds an older collection.
    Unsaved {
        message: String,
        occurred_at: OffsetDateTime,
    },
}

impl SyncStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, SyncStatus::Offline { .. } | SyncStatus::Unsaved { .. })
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            SyncStatus::Offline { message, .. } | SyncStatus::Unsaved { message, .. } => {
                Some(message)
            }
            _ => None,
        }
    }

    fn last_saved_at(&self) -> Option<OffsetDateTime> {
        match self {
            SyncStatus::Synced { last_saved_at } => *last_saved_at,
            _ => None,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncStatus::Inactive => f.write_str("not loaded"),
            SyncStatus::Synced {
                last_saved_at: Some(at),
            } => write!(f, "saved at {}", format_timestamp(*at)),
            SyncStatus::Synced { last_saved_at: None } => f.write_str("in sync"),
            SyncStatus::Offline {
                message,
                occurred_at,
            } => write!(
                f,
                "offline since {}: {message}",
                format_timestamp(*occurred_at)
            ),
            SyncStatus::Unsaved {
                message,
                occurred_at,
            } => write!(
                f,
                "unsaved changes since {}: {message}",
                format_timestamp(*occurred_at)
            ),
        }
    }
}

#[derive(Debug)]
pub struct NoteSynchronizer<S> {
    store: S,
    status: SyncStatus,
}

impl<S: NoteStore> NoteSynchronizer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            status: SyncStatus::Inactive,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn status(&self) -> &SyncStatus {
        &self.status
    }

    /// Reads every persisted note in store order. A failure yields an empty
    /// collection and puts the synchronizer offline.
    pub fn load(&mut self) -> Vec<Note> {
        match self.store.load_all() {
            Ok(notes) => {
                tracing::debug!(count = notes.len(), "loaded notes");
                self.status = SyncStatus::Synced {
                    last_saved_at: self.status.last_saved_at(),
                };
                notes
            }
            Err(err) => {
                tracing::error!(error = %err, "error loading notes");
                self.status = SyncStatus::Offline {
                    message: err.to_string(),
                    occurred_at: now_utc(),
                };
                Vec::new()
            }
        }
    }

    /// Replaces the store contents with exactly `notes`.
    pub fn save(&mut self, notes: &[Note]) {
        if let SyncStatus::Offline { .. } = self.status {
            tracing::warn!(
                count = notes.len(),
                "note store was not loaded, skipping save"
            );
            return;
        }
        match self.store.replace_all(notes) {
            Ok(()) => {
                self.status = SyncStatus::Synced {
                    last_saved_at: Some(now_utc()),
                };
            }
            Err(err) => {
                tracing::error!(error = %err, count = notes.len(), "error saving notes");
                self.status = SyncStatus::Unsaved {
                    message: err.to_string(),
                    occurred_at: now_utc(),
                };
            }
        }
    }
}
