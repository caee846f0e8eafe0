//! keyvc library crate.
//!
//! The primary interface is the `keyvc` binary. This lib.rs exposes the
//! engine so that integration tests and benches can drive commits, replay
//! chains and inspect history without going through the CLI.
//!
//! | Module | Responsibility |
//! |--------|----------------|
//! | [`repo`] | Working tree + blob store + config facade |
//! | [`orchestrate`] | Full commit: plan, then apply under the lock |
//! | [`chain`] | Per-key commit chains |
//! | [`reconstruct`] | Replaying chains into revisions |
//! | [`index`] | Keys present under a chain root |
//! | [`scan`] | Working tree scan |
//! | [`history`] | History entries in the store |
//! | [`rebuild`] | Writing latest revisions back to the tree |
//! | [`store`] | Blob store trait and backends |
//!
//! Pure types (keys, commit ids, the diff codec) live in `keyvc-core`.

pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod index;
pub mod layout;
pub mod lock;
pub mod orchestrate;
pub mod rebuild;
pub mod reconstruct;
pub mod repo;
pub mod scan;
pub mod store;
pub mod telemetry;

pub use error::{Result, VcError};
pub use repo::Repository;

// Binary-only modules, not re-exported: format
