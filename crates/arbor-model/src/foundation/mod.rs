//! Schema compiler foundation types.
//!
//! Value types shared by the builder graph and the immutable model:
//! qualified names, schema paths, source locations and constraint sets.

pub mod constraints;
pub mod path;
pub mod qname;
pub mod source;

pub use constraints::{
    ConstraintError, Length, Must, NodeConstraints, Pattern, Range, RangeValue, TypeConstraints,
};
pub use path::SchemaPath;
pub use qname::{Namespace, QName, Revision, RevisionParseError};
pub use source::SourceRef;
