//! Resolved leaf types.
//!
//! The statement layer hands the compiler type *references*: a name,
//! possibly prefixed, plus inline restrictions. Resolution turns every
//! reference into a [`Type`] value in which only built-in shapes and
//! already-built typedefs appear. Restricting a typedef produces an
//! anonymous derived typedef that wraps the resolved base together
//! with the merged constraint set, so a consumer can always walk
//! `Derived` links down to a built-in.
//!
//! Leafref paths are the one deliberate hole: they are carried as
//! opaque text and stay unbound, see [`Type::is_bound`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::foundation::{Length, Pattern, QName, Range, SchemaPath, TypeConstraints};

/// Statement lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Status {
    /// Valid and current (the default).
    #[default]
    Current,
    /// Obsolescent; still valid but new use is discouraged.
    Deprecated,
    /// No longer valid.
    Obsolete,
}

/// Bit width of an integer type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntWidth {
    /// 8 bits.
    W8,
    /// 16 bits.
    W16,
    /// 32 bits.
    W32,
    /// 64 bits.
    W64,
}

impl IntWidth {
    /// Value range of the signed type of this width.
    pub fn signed_range(self) -> Range {
        match self {
            IntWidth::W8 => Range::int(i8::MIN as i128, i8::MAX as i128),
            IntWidth::W16 => Range::int(i16::MIN as i128, i16::MAX as i128),
            IntWidth::W32 => Range::int(i32::MIN as i128, i32::MAX as i128),
            IntWidth::W64 => Range::int(i64::MIN as i128, i64::MAX as i128),
        }
    }

    /// Value range of the unsigned type of this width.
    pub fn unsigned_range(self) -> Range {
        match self {
            IntWidth::W8 => Range::int(0, u8::MAX as i128),
            IntWidth::W16 => Range::int(0, u16::MAX as i128),
            IntWidth::W32 => Range::int(0, u32::MAX as i128),
            IntWidth::W64 => Range::int(0, u64::MAX as i128),
        }
    }
}

/// One value of an enumeration type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Assigned name.
    pub name: String,
    /// Assigned or auto-allocated value.
    pub value: i32,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

impl EnumValue {
    /// Enumeration value with no extra metadata.
    pub fn new(name: impl Into<String>, value: i32) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
            reference: None,
            status: Status::Current,
        }
    }
}

/// One flag of a bits type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bit {
    /// Assigned name.
    pub name: String,
    /// Bit position.
    pub position: u32,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

impl Bit {
    /// Bit with no extra metadata.
    pub fn new(name: impl Into<String>, position: u32) -> Self {
        Self {
            name: name.into(),
            position,
            description: None,
            reference: None,
            status: Status::Current,
        }
    }
}

/// Classification of built-in type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// Arbitrary octet string.
    Binary,
    /// Set of named flags.
    Bits,
    /// True or false.
    Boolean,
    /// Scaled 64-bit decimal.
    Decimal64,
    /// Valueless leaf.
    Empty,
    /// Closed set of named values.
    Enumeration,
    /// Reference to an identity.
    Identityref,
    /// Reference to a data tree node instance.
    InstanceIdentifier,
    /// Signed integer.
    Int(IntWidth),
    /// Unsigned integer.
    Uint(IntWidth),
    /// Reference to another leaf by path.
    Leafref,
    /// Unicode string.
    String,
    /// One of several member types.
    Union,
}

impl Builtin {
    /// Look a built-in up by its statement name.
    pub fn lookup(name: &str) -> Option<Builtin> {
        Some(match name {
            "binary" => Builtin::Binary,
            "bits" => Builtin::Bits,
            "boolean" => Builtin::Boolean,
            "decimal64" => Builtin::Decimal64,
            "empty" => Builtin::Empty,
            "enumeration" => Builtin::Enumeration,
            "identityref" => Builtin::Identityref,
            "instance-identifier" => Builtin::InstanceIdentifier,
            "int8" => Builtin::Int(IntWidth::W8),
            "int16" => Builtin::Int(IntWidth::W16),
            "int32" => Builtin::Int(IntWidth::W32),
            "int64" => Builtin::Int(IntWidth::W64),
            "uint8" => Builtin::Uint(IntWidth::W8),
            "uint16" => Builtin::Uint(IntWidth::W16),
            "uint32" => Builtin::Uint(IntWidth::W32),
            "uint64" => Builtin::Uint(IntWidth::W64),
            "leafref" => Builtin::Leafref,
            "string" => Builtin::String,
            "union" => Builtin::Union,
            _ => return None,
        })
    }

    /// Statement name of this built-in.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Binary => "binary",
            Builtin::Bits => "bits",
            Builtin::Boolean => "boolean",
            Builtin::Decimal64 => "decimal64",
            Builtin::Empty => "empty",
            Builtin::Enumeration => "enumeration",
            Builtin::Identityref => "identityref",
            Builtin::InstanceIdentifier => "instance-identifier",
            Builtin::Int(IntWidth::W8) => "int8",
            Builtin::Int(IntWidth::W16) => "int16",
            Builtin::Int(IntWidth::W32) => "int32",
            Builtin::Int(IntWidth::W64) => "int64",
            Builtin::Uint(IntWidth::W8) => "uint8",
            Builtin::Uint(IntWidth::W16) => "uint16",
            Builtin::Uint(IntWidth::W32) => "uint32",
            Builtin::Uint(IntWidth::W64) => "uint64",
            Builtin::Leafref => "leafref",
            Builtin::String => "string",
            Builtin::Union => "union",
        }
    }
}

/// Fully resolved type of a leaf or leaf-list.
#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    /// Arbitrary octet string.
    Binary {
        /// Allowed encoded lengths; empty means unrestricted.
        lengths: Vec<Length>,
    },
    /// Set of named flags.
    Bits {
        /// The declared flags.
        bits: Vec<Bit>,
    },
    /// True or false.
    Boolean,
    /// Scaled 64-bit decimal.
    Decimal64 {
        /// Digits after the decimal point, 1..=18.
        fraction_digits: u8,
        /// Allowed value ranges; empty means the full span of the scale.
        ranges: Vec<Range>,
    },
    /// Valueless leaf.
    Empty,
    /// Closed set of named values.
    Enumeration {
        /// The declared values.
        enums: Vec<EnumValue>,
    },
    /// Reference to an identity; values are identities derived from the base.
    Identityref {
        /// Qualified name of the base identity.
        base: QName,
    },
    /// Reference to a data tree node instance.
    InstanceIdentifier {
        /// Whether the referenced instance must exist.
        require_instance: bool,
    },
    /// Signed integer.
    Int {
        /// Bit width.
        width: IntWidth,
        /// Allowed value ranges; empty means the full width.
        ranges: Vec<Range>,
    },
    /// Unsigned integer.
    Uint {
        /// Bit width.
        width: IntWidth,
        /// Allowed value ranges; empty means the full width.
        ranges: Vec<Range>,
    },
    /// Reference to another leaf. The path stays textual, see
    /// [`Type::is_bound`].
    Leafref {
        /// The referencing path expression.
        path: String,
    },
    /// Unicode string.
    String {
        /// Allowed lengths; empty means unrestricted.
        lengths: Vec<Length>,
        /// Patterns the value must match, all of them.
        patterns: Vec<Pattern>,
    },
    /// One of several member types.
    Union {
        /// Resolved member types, in declaration order.
        members: Vec<Type>,
    },
    /// A typedef, named or synthesized from a restriction.
    Derived(Arc<Typedef>),
}

impl Type {
    /// Statement name of this type.
    pub fn name(&self) -> &str {
        match self {
            Type::Binary { .. } => "binary",
            Type::Bits { .. } => "bits",
            Type::Boolean => "boolean",
            Type::Decimal64 { .. } => "decimal64",
            Type::Empty => "empty",
            Type::Enumeration { .. } => "enumeration",
            Type::Identityref { .. } => "identityref",
            Type::InstanceIdentifier { .. } => "instance-identifier",
            Type::Int { width, .. } => Builtin::Int(*width).name(),
            Type::Uint { width, .. } => Builtin::Uint(*width).name(),
            Type::Leafref { .. } => "leafref",
            Type::String { .. } => "string",
            Type::Union { .. } => "union",
            Type::Derived(typedef) => &typedef.qname.local_name,
        }
    }

    /// Follow `Derived` links down to the underlying built-in shape.
    pub fn root(&self) -> &Type {
        let mut t = self;
        while let Type::Derived(typedef) = t {
            t = &typedef.base;
        }
        t
    }

    /// Whether every reference inside this type is resolved.
    ///
    /// Leafref paths are carried verbatim and bound later by data tree
    /// tooling, so a leafref reports `false`. Everything else, unions
    /// included, reports `true` once it exists as a `Type` at all.
    pub fn is_bound(&self) -> bool {
        match self {
            Type::Leafref { .. } => false,
            Type::Union { members } => members.iter().all(Type::is_bound),
            Type::Derived(typedef) => typedef.base.is_bound(),
            _ => true,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named or synthesized type derivation.
///
/// Named typedefs come from `typedef` statements. Synthesized ones are
/// created when a leaf restricts a named type inline; they take the
/// name of the restricted type and the location of the restricting
/// statement.
#[derive(Debug, Clone, PartialEq)]
pub struct Typedef {
    /// Qualified name.
    pub qname: QName,
    /// Where the typedef sits in the schema tree.
    pub path: SchemaPath,
    /// The resolved base this derivation narrows.
    pub base: Type,
    /// Effective constraints, merged over the whole chain below.
    pub constraints: TypeConstraints,
    /// Units of the value, inherited by users of the typedef.
    pub units: Option<String>,
    /// Default value in string form.
    pub default: Option<String>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Namespace;

    fn typedef(name: &str, base: Type) -> Arc<Typedef> {
        Arc::new(Typedef {
            qname: QName::new(Namespace::new("urn:test"), None, name),
            path: SchemaPath::root(),
            base,
            constraints: TypeConstraints::new(),
            units: None,
            default: None,
            description: None,
            reference: None,
            status: Status::Current,
        })
    }

    #[test]
    fn builtin_lookup_round_trips() {
        for name in [
            "binary",
            "bits",
            "boolean",
            "decimal64",
            "empty",
            "enumeration",
            "identityref",
            "instance-identifier",
            "int8",
            "int16",
            "int32",
            "int64",
            "uint8",
            "uint16",
            "uint32",
            "uint64",
            "leafref",
            "string",
            "union",
        ] {
            let builtin = Builtin::lookup(name).unwrap();
            assert_eq!(builtin.name(), name);
        }
        assert!(Builtin::lookup("my-type").is_none());
    }

    #[test]
    fn width_ranges_cover_the_declared_span() {
        assert_eq!(IntWidth::W8.signed_range(), Range::int(-128, 127));
        assert_eq!(IntWidth::W16.unsigned_range(), Range::int(0, 65_535));
        assert_eq!(
            IntWidth::W64.signed_range(),
            Range::int(i64::MIN as i128, i64::MAX as i128)
        );
    }

    #[test]
    fn root_unwraps_derivation_chains() {
        let base = Type::Uint {
            width: IntWidth::W16,
            ranges: vec![],
        };
        let mid = Type::Derived(typedef("port", base));
        let top = Type::Derived(typedef("listen-port", mid));
        assert!(matches!(
            top.root(),
            Type::Uint {
                width: IntWidth::W16,
                ..
            }
        ));
        assert_eq!(top.name(), "listen-port");
    }

    #[test]
    fn leafref_stays_unbound() {
        let leafref = Type::Leafref {
            path: "../config/name".into(),
        };
        assert!(!leafref.is_bound());

        let union = Type::Union {
            members: vec![Type::Boolean, leafref],
        };
        assert!(!union.is_bound());
        assert!(Type::Boolean.is_bound());

        let wrapped = Type::Derived(typedef(
            "node-ref",
            Type::Leafref {
                path: "../name".into(),
            },
        ));
        assert!(!wrapped.is_bound());
    }
}
