//! The immutable compiled model.
//!
//! Everything in this tree is built exactly once from the mutable
//! statement graph and then shared behind `Arc` handles. Repeated
//! builds of the same graph return pointer-identical values.

pub mod deviation;
pub mod extension;
pub mod identity;
pub mod module;
pub mod node;
pub mod operations;
pub mod schema;

pub use deviation::{DeviateKind, Deviation};
pub use extension::{Extension, UnknownNode};
pub use identity::Identity;
pub use module::{Augment, Feature, Import, Module};
pub use node::{AnyXml, Case, Choice, Container, Grouping, Leaf, LeafList, List, SchemaNode};
pub use operations::{Notification, Rpc};
pub use schema::CompiledSchema;
