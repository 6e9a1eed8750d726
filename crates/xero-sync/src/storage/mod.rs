//! Settings storage
//!
//! All persisted state (credentials, destination config, sync counters,
//! pending OAuth state) lives in a flat key-value store of scalar strings
//! and small JSON blobs. The trait-based design allows swapping between
//! in-memory and file-backed implementations.

mod json_file;
mod memory;
mod traits;

pub use json_file::JsonFileSettingsStore;
pub use memory::InMemorySettingsStore;
pub use traits::{SettingsStore, SettingsStoreExt};
