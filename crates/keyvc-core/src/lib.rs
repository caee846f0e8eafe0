//! Core model for keyvc.
//!
//! Everything in this crate is pure: no filesystem access, no clocks. The
//! `keyvc` crate layers the blob store, commit chains and the whole-tree
//! orchestrator on top of these types.
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model::key`] | Validated, normalized file keys |
//! | [`model::commit_id`] | Structured `<kind><timestamp>+<hash>` commit ids |
//! | [`model::classify`] | Text vs binary content classification |
//! | [`model::diff`] | Edit scripts and pluggable line differs |
//! | [`model::codec`] | On-disk diff format and replay |
//! | [`model::history`] | History entry text format |

pub mod model;
