use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::note::{Note, NoteId};

use super::{NoteStore, StoreError};

/// In-memory store with switchable failures for exercising the sync paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: RefCell<BTreeMap<NoteId, Note>>,
    fail_open: Cell<bool>,
    fail_write: Cell<bool>,
    sweeps: Cell<usize>,
}

impl MemoryStore {
    pub fn with_notes(notes: Vec<Note>) -> Self {
        let store = Self::default();
        store
            .rows
            .borrow_mut()
            .extend(notes.into_iter().map(|note| (note.id, note)));
        store
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.set(fail);
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.fail_write.set(fail);
    }

    pub fn snapshot(&self) -> Vec<Note> {
        self.rows.borrow().values().cloned().collect()
    }

    pub fn sweeps(&self) -> usize {
        self.sweeps.get()
    }

    fn check_open(&self) -> Result<(), StoreError> {
        if self.fail_open.get() {
            return Err(StoreError::Open {
                path: PathBuf::from(":memory:"),
                source: "store unavailable".into(),
            });
        }
        Ok(())
    }
}

impl NoteStore for MemoryStore {
    fn load_all(&self) -> Result<Vec<Note>, StoreError> {
        self.check_open()?;
        Ok(self.snapshot())
    }

    fn replace_all(&self, notes: &[Note]) -> Result<(), StoreError> {
        self.check_open()?;
        if self.fail_write.get() {
            return Err(StoreError::Write {
                operation: "inserting note",
                source: rusqlite::Error::InvalidQuery,
            });
        }
        let mut rows = self.rows.borrow_mut();
        rows.clear();
        rows.extend(notes.iter().map(|note| (note.id, note.clone())));
        self.sweeps.set(self.sweeps.get() + 1);
        Ok(())
    }
}
