pub mod manager;
pub mod notes;
pub mod storage;

pub use manager::ProfileManager;
pub use notes::{NoteStore, StoredNote};
pub use storage::StorageManager;
