//! Append-only log of handled API calls.
//!
//! Every configured API route that completes (successfully or with an
//! internal error) produces one immutable [`ApiEvent`]. Events are written
//! as independent units into a storage area and read back newest-first by
//! the dashboard. There is no index: the unit key is the sort key.
//!
//! # Architecture
//!
//! ```text
//! Route dispatcher --append--> EventStore --write_unit--> UnitStorage
//!                                                          |-- FsStorage     (one JSON file per event)
//! Dashboard -------query-----> EventStore --list/read---> +-- MemoryStorage (tests, ephemeral runs)
//! ```
//!
//! The store is a best-effort sink. [`EventStore::append`] has no failure
//! channel and [`EventStore::query_recent`] never fails; absorbed failures
//! are only visible through [`EventStore::stats`].
//!
//! # Modules
//!
//! - [`event`] -- the persisted record and its timestamp encoding
//! - [`key`] -- lexicographically sortable unit keys
//! - [`storage`] -- the storage abstraction and its two backends
//! - [`store`] -- append / query with failure isolation
//! - [`error`] -- storage error types

pub mod error;
pub mod event;
pub mod key;
pub mod storage;
pub mod store;

// Re-export primary types for convenience.
pub use error::StorageError;
pub use event::{ApiEvent, NewEvent, is_success_status};
pub use key::UnitKey;
pub use storage::{FsStorage, MemoryStorage, UnitStorage};
pub use store::{DEFAULT_QUERY_LIMIT, EventStore, StoreStats};
