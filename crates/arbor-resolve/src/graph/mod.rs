//! The mutable statement graph.
//!
//! Everything resolution works on lives here: the flat node arena, the
//! per-kind builder payloads, statement attachment with its legality
//! and duplicate checks, traversal helpers, and the one-way build into
//! the immutable model.

pub mod arena;
pub mod build;
pub mod module;
pub mod node;
pub mod typestate;
pub mod walk;

pub use arena::{Arena, NodeId};
pub use build::{build_module, build_node, Built};
pub use module::{BelongsTo, Import, Include, ModulePayload, RpcIoDirection};
pub use node::{
    AugmentPayload, ChildSet, ConstraintsBuilder, NodeBuilder, NodePayload, PrefixedName, RawPath,
    RefineSpec, UnknownSpec,
};
pub use typestate::{TypeRef, TypeState};
