//! Deviations.
//!
//! A deviation records that an implementation does not follow the
//! published schema at some target node. The compiler binds the target
//! path and carries the deviation on the declaring module; it does not
//! rewrite the target, since the published tree must stay authoritative
//! for interchange.

use crate::foundation::SchemaPath;

/// How the implementation deviates at the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviateKind {
    /// The target is not implemented at all.
    NotSupported,
    /// Properties are added to the target.
    Add,
    /// Properties of the target are replaced.
    Replace,
    /// Properties are removed from the target.
    Delete,
}

/// A bound deviation.
#[derive(Debug, Clone)]
pub struct Deviation {
    /// Absolute path of the deviated node.
    pub target_path: SchemaPath,
    /// Declared deviate action, if the statement carried one.
    pub deviate: Option<DeviateKind>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
}
