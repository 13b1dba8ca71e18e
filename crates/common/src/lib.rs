//! TodoMVC Common Library
//!
//! Data model, persisted storage and a reference behaviour model shared by
//! the end-to-end harness.

pub mod error;
pub mod model;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use model::TodoModel;
pub use storage::{load_list, save_list, BlockedStorage, MemoryStorage, Storage};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
