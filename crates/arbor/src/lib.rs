//! Arbor: a schema compiler for revision-aware modular data models.
//!
//! A batch compiles in two phases. First the caller declares modules
//! and their statements into a [`StatementGraph`]; every statement is
//! checked for legality and name collisions at insertion. Then
//! [`compile`] runs the resolution pipeline, which expands groupings,
//! applies refines, injects augments, resolves types and identities,
//! merges submodules, binds deviations, and builds the immutable
//! [`CompiledSchema`].
//!
//! ```
//! use arbor::{compile, ResolveOptions, StatementGraph, TypeRef};
//!
//! let mut graph = StatementGraph::new();
//! let module = graph.add_module("system", "urn:example:system", None, "sys", 1)?;
//! let host = graph.add_container(module, "host", 2)?;
//! graph.add_leaf(host, "name", TypeRef::named("string", 3), 3)?;
//!
//! let schema = compile(&mut graph, &ResolveOptions::default())
//!     .map_err(|errors| errors.into_iter().next().expect("at least one error"))?;
//! assert!(schema.module("system", None).is_some());
//! # Ok::<(), arbor::CompileError>(())
//! ```

pub use arbor_model::error::{
    CompileError, CompileResult, DiagnosticFormatter, ErrorKind, Severity,
};
pub use arbor_model::foundation::{
    Length, Must, Namespace, NodeConstraints, Pattern, QName, Range, Revision, SchemaPath,
    SourceRef, TypeConstraints,
};
pub use arbor_model::model::{
    Augment, CompiledSchema, Deviation, Extension, Feature, Identity, Module, Notification, Rpc,
    SchemaNode, UnknownNode,
};
pub use arbor_model::types::{Bit, Builtin, EnumValue, IntWidth, Status, Type, Typedef};

pub use arbor_resolve::graph::{PrefixedName, RefineSpec, TypeRef, UnknownSpec};
pub use arbor_resolve::{ModuleRegistry, ResolveOptions, StatementGraph};

/// Crate version, for embedding in tool output.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Compile a statement graph into its schema.
///
/// On failure the full diagnostic list is returned; render it with
/// [`DiagnosticFormatter`]. A successful compilation still carries its
/// warnings on the schema.
pub fn compile(
    graph: &mut StatementGraph,
    options: &ResolveOptions,
) -> Result<CompiledSchema, Vec<CompileError>> {
    arbor_resolve::resolve(graph, options)
}
