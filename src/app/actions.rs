use crate::note::Note;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteEdit {
    Title(String),
    Content(String),
}

impl NoteEdit {
    /// Writes the edited field; returns whether the value changed.
    pub fn apply_to(self, note: &mut Note) -> bool {
        let (slot, value) = match self {
            NoteEdit::Title(value) => (&mut note.title, value),
            NoteEdit::Content(value) => (&mut note.content, value),
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }
}
