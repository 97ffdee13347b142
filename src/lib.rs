pub mod app;
pub mod cli;
pub mod config;
pub mod highlight;
pub mod note;
pub mod render;
pub mod search;
pub mod storage;
pub mod sync;

pub use app::NotesApp;
pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use note::{Note, NoteId};
pub use storage::{NoteStore, StorageHandle, StoreError};
pub use sync::{NoteSynchronizer, SyncStatus};
