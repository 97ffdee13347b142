use crate::note::{Note, NoteId};
use crate::search::filter_notes;

/// Everything a session mutates: the note list, the selection, edit mode and
/// the search-box filter.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub notes: Vec<Note>,
    pub selected: Option<NoteId>,
    pub editing: bool,
    pub search_query: String,
}

impl AppState {
    pub fn from_loaded(mut notes: Vec<Note>) -> Self {
        sort_newest_first(&mut notes);
        Self {
            notes,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn position(&self, note_id: NoteId) -> Option<usize> {
        self.notes.iter().position(|note| note.id == note_id)
    }

    pub fn get(&self, note_id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == note_id)
    }

    pub fn selected(&self) -> Option<&Note> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_note_id(&self) -> Option<NoteId> {
        self.selected().map(|note| note.id)
    }

    pub fn prepend(&mut self, note: Note) {
        self.notes.insert(0, note);
    }

    /// Removes the note; a removed selection falls back to the new first note
    /// and leaves edit mode.
    pub fn remove(&mut self, note_id: NoteId) -> Option<Note> {
        let idx = self.position(note_id)?;
        let removed = self.notes.remove(idx);
        if self.selected == Some(note_id) {
            self.selected = self.notes.first().map(|note| note.id);
            self.editing = false;
        }
        Some(removed)
    }

    pub fn replace_notes(&mut self, mut notes: Vec<Note>) {
        sort_newest_first(&mut notes);
        self.notes = notes;
        self.normalize_selection();
    }

    pub fn visible_notes(&self) -> Vec<&Note> {
        filter_notes(&self.notes, &self.search_query)
    }

    fn normalize_selection(&mut self) {
        if self.selected().is_none() {
            self.selected = None;
            self.editing = false;
        }
    }
}

fn sort_newest_first(notes: &mut [Note]) {
    notes.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}
