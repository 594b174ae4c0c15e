//! Shared test utilities for the extman workspace.
//!
//! Dev-dependency only, never published.
//!
//! - [`tree`]: [`ExtensionTree`], a temporary extensions root with helpers
//!   for writing manifests and entry points

pub mod tree;

pub use tree::ExtensionTree;
