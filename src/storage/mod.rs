//! Storage mechanisms for persisting the auth record across reloads

pub mod file;
pub mod memory;
pub mod traits;

// Re-export main components
pub use file::FileStorage;
pub use memory::MemoryStorage;
pub use traits::{PersistedAuth, StateStorage};
