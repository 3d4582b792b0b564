//! # storage-adapters
//!
//! Implementations of the `domains` ports that touch disk or a database.
//! Backends are compiled in by feature so the binary only links what it uses.

pub mod convert;
pub mod error;

#[cfg(feature = "media-local")]
pub mod media_local;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use convert::{CommandJpegConverter, RasterJpegConverter};
pub use error::StorageError;
#[cfg(feature = "media-local")]
pub use media_local::LocalMediaStorage;
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteBoulderRepository;
