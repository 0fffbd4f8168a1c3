//! High-level operations.
//!
//! This module contains the implementation of Stitch commands.

pub mod assemble;
pub mod identity;
pub mod rewrite;
pub mod scaffold;
pub mod web;

pub use assemble::{assemble, integrate_workspace, AssembleError, AssembleOptions, AssembleReport};
pub use identity::{DuplicateIdentity, IdentityMap};
pub use rewrite::{rewrite_manifest, RewriteOutcome};
