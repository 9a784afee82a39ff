pub mod backend;
pub mod record;
pub mod store;

pub use backend::{HistoryBackend, JsonFileBackend, MemoryBackend};
pub use record::HistoryRecord;
pub use store::{HistoryStore, HISTORY_CAPACITY};
