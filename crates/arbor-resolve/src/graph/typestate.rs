//! Builder-side type references.
//!
//! A leaf, leaf-list or typedef starts out holding a [`TypeRef`]: the
//! name the statement wrote, plus whatever inline restrictions it
//! declared. The type pass replaces that with a resolved
//! [`Type`](arbor_model::types::Type); until then the node is "dirty"
//! and keeps showing up in the pass's worklist.

use arbor_model::foundation::{Length, Pattern, Range};
use arbor_model::types::{Bit, EnumValue, Type};

/// Resolution state of a type use.
#[derive(Debug, Clone)]
pub enum TypeState {
    /// Still a textual reference.
    Unresolved(TypeRef),
    /// Fully resolved.
    Resolved(Type),
}

impl TypeState {
    /// True once the reference has been resolved.
    pub fn is_resolved(&self) -> bool {
        matches!(self, TypeState::Resolved(_))
    }

    /// The resolved type, if resolution has happened.
    pub fn resolved(&self) -> Option<&Type> {
        match self {
            TypeState::Resolved(t) => Some(t),
            TypeState::Unresolved(_) => None,
        }
    }
}

/// A type use as written: name plus inline restrictions.
///
/// The name may carry a prefix (`inet:port-number`). Which restriction
/// fields are meaningful depends on what the name resolves to; the
/// type pass rejects families that do not fit the resolved base.
#[derive(Debug, Clone, Default)]
pub struct TypeRef {
    /// The written type name, prefix included.
    pub name: String,
    /// Line of the `type` statement.
    pub line: usize,
    /// Inline range restrictions.
    pub ranges: Vec<Range>,
    /// Inline length restrictions.
    pub lengths: Vec<Length>,
    /// Inline pattern restrictions.
    pub patterns: Vec<Pattern>,
    /// Declared fraction digits (decimal types only).
    pub fraction_digits: Option<u8>,
    /// Declared enumeration values (enumeration only).
    pub enums: Vec<EnumValue>,
    /// Declared flags (bits only).
    pub bits: Vec<Bit>,
    /// Member types (union only).
    pub union_members: Vec<TypeRef>,
    /// Base identity reference (identityref only).
    pub base_identity: Option<String>,
    /// Referenced leaf path (leafref only).
    pub leafref_path: Option<String>,
    /// Whether the referenced instance must exist (instance-identifier).
    pub require_instance: Option<bool>,
}

impl TypeRef {
    /// Bare reference to a named type.
    pub fn named(name: impl Into<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            line,
            ..Self::default()
        }
    }

    /// True if any value-space restriction was written inline.
    pub fn has_restrictions(&self) -> bool {
        !self.ranges.is_empty()
            || !self.lengths.is_empty()
            || !self.patterns.is_empty()
            || self.fraction_digits.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_ref_is_unrestricted() {
        let r = TypeRef::named("inet:port-number", 4);
        assert!(!r.has_restrictions());
        assert_eq!(r.name, "inet:port-number");
        assert_eq!(r.line, 4);
    }

    #[test]
    fn inline_restrictions_are_detected() {
        let mut r = TypeRef::named("int32", 9);
        r.ranges.push(Range::int(0, 10));
        assert!(r.has_restrictions());

        let mut s = TypeRef::named("string", 9);
        s.patterns.push(Pattern::new("[a-z]+"));
        assert!(s.has_restrictions());
    }

    #[test]
    fn state_reports_resolution() {
        let unresolved = TypeState::Unresolved(TypeRef::named("string", 1));
        assert!(!unresolved.is_resolved());
        assert!(unresolved.resolved().is_none());

        let resolved = TypeState::Resolved(Type::Boolean);
        assert!(resolved.is_resolved());
        assert!(matches!(resolved.resolved(), Some(Type::Boolean)));
    }
}
