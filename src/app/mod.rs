use anyhow::{bail, Result};

use crate::config::NoteOptions;
use crate::note::{allocate_id, now_utc, Note, NoteId};
use crate::search::filter_notes;
use crate::storage::NoteStore;
use crate::sync::{NoteSynchronizer, SyncStatus};

mod actions;
pub mod state;

pub use actions::NoteEdit;
pub use state::AppState;

/// Owns the session state and routes every mutation through a full
/// persistence sweep once the in-memory change is complete.
pub struct NotesApp<S: NoteStore> {
    state: AppState,
    sync: NoteSynchronizer<S>,
    untitled_title: String,
}

impl<S: NoteStore> NotesApp<S> {
    pub fn new(store: S, options: &NoteOptions) -> Self {
        let mut sync = NoteSynchronizer::new(store);
        let notes = sync.load();
        Self {
            state: AppState::from_loaded(notes),
            sync,
            untitled_title: options.untitled_title.clone(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn notes(&self) -> &[Note] {
        &self.state.notes
    }

    pub fn selected(&self) -> Option<&Note> {
        self.state.selected()
    }

    pub fn is_editing(&self) -> bool {
        self.state.editing
    }

    pub fn sync_status(&self) -> &SyncStatus {
        self.sync.status()
    }

    pub fn store(&self) -> &S {
        self.sync.store()
    }

    pub fn create_note(&mut self) -> &Note {
        let now = now_utc();
        let id = allocate_id(now, &self.state.notes);
        self.state
            .prepend(Note::new(id, self.untitled_title.as_str(), now));
        self.state.selected = Some(id);
        self.state.editing = true;
        tracing::debug!(note_id = id, "created note");
        self.persist();
        &self.state.notes[0]
    }

    /// Shows the note for reading; selecting always leaves edit mode.
    pub fn select_note(&mut self, note_id: NoteId) -> Result<&Note> {
        let Some(idx) = self.state.position(note_id) else {
            bail!("note {note_id} not found");
        };
        self.state.selected = Some(note_id);
        self.state.editing = false;
        Ok(&self.state.notes[idx])
    }

    pub fn begin_edit(&mut self) -> bool {
        if self.state.selected().is_none() {
            return false;
        }
        self.state.editing = true;
        true
    }

    pub fn finish_edit(&mut self) {
        self.state.editing = false;
    }

    /// Takes title and content from `edited`; its `id` picks the target and
    /// its timestamps are ignored.
    pub fn update_note(&mut self, edited: Note) -> Result<&Note> {
        let Some(idx) = self.state.position(edited.id) else {
            bail!("note {} not found", edited.id);
        };
        let unchanged = {
            let current = &self.state.notes[idx];
            current.title == edited.title && current.content == edited.content
        };
        if unchanged {
            return Ok(&self.state.notes[idx]);
        }
        {
            let note = &mut self.state.notes[idx];
            note.title = edited.title;
            note.content = edited.content;
            note.touch(now_utc());
        }
        tracing::debug!(note_id = edited.id, "updated note");
        self.persist();
        Ok(&self.state.notes[idx])
    }

    pub fn apply_edit(&mut self, note_id: NoteId, edit: NoteEdit) -> Result<&Note> {
        let Some(mut edited) = self.state.get(note_id).cloned() else {
            bail!("note {note_id} not found");
        };
        edit.apply_to(&mut edited);
        self.update_note(edited)
    }

    pub fn delete_note(&mut self, note_id: NoteId) -> Result<Note> {
        let Some(removed) = self.state.remove(note_id) else {
            bail!("note {note_id} not found");
        };
        tracing::debug!(note_id, "deleted note");
        self.persist();
        Ok(removed)
    }

    pub fn search(&self, query: &str) -> Vec<&Note> {
        filter_notes(&self.state.notes, query)
    }

    pub fn set_search_query(&mut self, query: impl Into<String>) {
        self.state.search_query = query.into();
    }

    pub fn visible_notes(&self) -> Vec<&Note> {
        self.state.visible_notes()
    }

    /// Discards the in-memory collection in favour of a fresh load.
    pub fn reload(&mut self) {
        let notes = self.sync.load();
        self.state.replace_notes(notes);
    }

    fn persist(&mut self) {
        self.sync.save(&self.state.notes);
    }
}
