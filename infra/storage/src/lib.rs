//! Persistence backends behind the configuration store.
//!
//! Every context of an install reads and writes the same entries through a
//! [`PersistenceBackend`]:
//!
//! - **[`FileBackend`]**: one JSON document per storage area, written with an atomic
//!   swap (unique temp write + `fsync` + `rename`) so a crash never leaves a torn file.
//!   Orphaned temp files are purged on connect.
//! - **[`MemoryBackend`]**: shared in-process map for tests and ephemeral installs.
//! - **[`UnavailableBackend`]**: a context with no host persistence; every call fails
//!   with [`StorageError::Unavailable`].
//!
//! Writes are last-write-wins per key. There are no multi-key transactions.

mod area;
mod backend;
mod builder;
mod error;
mod file;
mod maintenance;

pub use area::AreaName;
pub use backend::{MemoryBackend, PersistenceBackend, UnavailableBackend};
pub use builder::FileBackendBuilder;
pub use error::{StorageError, StorageErrorExt};
pub use file::FileBackend;
