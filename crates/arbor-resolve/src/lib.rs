//! Statement graph construction and resolution.
//!
//! This crate owns the mutable middle of the compiler: a builder
//! arena holding every statement of a batch ([`StatementGraph`]), the
//! module registry with the revision-selection rule, and the resolution
//! passes that expand groupings, apply refines, inject augments,
//! resolve types and identities, and finally build the immutable
//! schema types of `arbor-model`.
//!
//! Entry point: fill a [`StatementGraph`], then call [`resolve`].

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod graph;
pub mod registry;
pub mod resolve;
pub mod statements;

pub use arbor_model::error::CompileError;
pub use registry::ModuleRegistry;
pub use resolve::{resolve, ResolveOptions};
pub use statements::StatementGraph;
