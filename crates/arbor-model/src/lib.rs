//! # Arbor schema model
//!
//! Foundation and result types of the arbor schema compiler:
//!
//! - [`foundation`] - qualified names, revisions, paths, constraints
//! - [`types`] - resolved leaf types and typedef chains
//! - [`model`] - the immutable compiled tree
//! - [`error`] - diagnostics shared by every compile pass
//!
//! This crate holds no resolution logic. The mutable statement graph
//! and the passes that transform it live in `arbor-resolve`; what you
//! find here is everything those passes consume and everything they
//! ultimately produce.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod foundation;
pub mod model;
pub mod types;

pub use error::{CompileError, CompileResult, DiagnosticFormatter, ErrorKind, Severity};
pub use foundation::{
    Length, Must, Namespace, NodeConstraints, Pattern, QName, Range, Revision, SchemaPath,
    SourceRef, TypeConstraints,
};
pub use model::{CompiledSchema, Module, SchemaNode};
pub use types::{Builtin, IntWidth, Status, Type, Typedef};
