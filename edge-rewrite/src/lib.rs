//! Viewer-request rewrite for the delivery network edge.
//!
//! Turns `/blobs/<account>/<base>,<start>,<end>` into `/<account>/<base>` plus a
//! `range` header so the storage origin serves only the requested bytes.

pub mod grammar;
pub mod rewrite;

pub use rewrite::{rewrite, EdgeRequest, Rewrite, DEFAULT_PREFIX};
