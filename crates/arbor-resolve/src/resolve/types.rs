//! Type resolution and constraint merging.
//!
//! Leaves, leaf-lists and typedefs start out with a textual type
//! reference. This pass turns each reference into a resolved
//! [`Type`]: built-in names become built-in shapes with their inline
//! restrictions validated, typedef names become `Derived` links to the
//! built typedef, and a restricted typedef use synthesizes an anonymous
//! derived typedef carrying the merged constraint set.
//!
//! Typedefs resolve in dependency order without explicit scheduling:
//! a reference to a typedef that has not resolved yet simply stays
//! pending until the next round of the fixed-point loop.
//!
//! # Narrowing
//!
//! Constraint sets accumulate derived-first along the chain; the first
//! non-empty set of each family is effective and every later, more
//! basic set must contain it. The implicit value range of an integer
//! width participates as the outermost set, so `uint8 { range 0..999 }`
//! fails the same way an over-wide typedef restriction does.

use std::sync::Arc;

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::foundation::{ConstraintError, SourceRef, TypeConstraints};
use arbor_model::types::{Builtin, Status, Type, Typedef};

use crate::graph::arena::{Arena, NodeId};
use crate::graph::build::Built;
use crate::graph::node::{NodeBuilder, NodePayload, PrefixedName};
use crate::graph::typestate::{TypeRef, TypeState};
use crate::graph::walk::ancestors;
use crate::registry::ModuleRegistry;
use crate::resolve::identity::find_identity;

/// One resolution round over every node that still carries a textual
/// type reference. Returns the number still unresolved.
pub fn run(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    diagnostics: &mut Vec<CompileError>,
) -> usize {
    let dirty: Vec<NodeId> = arena
        .ids()
        .filter(|&id| pending_ref(arena.node(id)).is_some())
        .collect();

    for id in dirty {
        let Some(type_ref) = pending_ref(arena.node(id)).cloned() else {
            continue;
        };
        let at = {
            let n = arena.node(id);
            SourceRef::new(n.source.module.clone(), type_ref.line)
        };
        match resolve_ref(arena, registry, id, &type_ref, &at, diagnostics) {
            Ok(Some(ty)) => install(arena, id, ty),
            Ok(None) => {}
            Err(err) => diagnostics.push(err),
        }
    }

    arena
        .ids()
        .filter(|&id| pending_ref(arena.node(id)).is_some())
        .count()
}

/// The unresolved reference of a type-bearing node, if any.
pub fn pending_ref(node: &NodeBuilder) -> Option<&TypeRef> {
    let state = match &node.payload {
        NodePayload::Leaf(l) => &l.type_state,
        NodePayload::LeafList(l) => &l.type_state,
        NodePayload::Typedef(t) => &t.type_state,
        _ => return None,
    };
    match state {
        TypeState::Unresolved(r) => Some(r),
        TypeState::Resolved(_) => None,
    }
}

fn install(arena: &mut Arena, id: NodeId, ty: Type) {
    if matches!(arena.node(id).payload, NodePayload::Typedef(_)) {
        let arc = {
            let n = arena.node(id);
            let NodePayload::Typedef(p) = &n.payload else {
                return;
            };
            Arc::new(Typedef {
                qname: n.qname.clone(),
                path: n.path.clone(),
                base: ty.clone(),
                constraints: effective_constraints(&ty),
                units: p.units.clone(),
                default: p.default.clone(),
                description: n.description.clone(),
                reference: n.reference.clone(),
                status: n.status,
            })
        };
        arena.node_mut(id).built = Some(Built::Typedef(arc));
    }
    let n = arena.node_mut(id);
    match &mut n.payload {
        NodePayload::Leaf(l) => l.type_state = TypeState::Resolved(ty),
        NodePayload::LeafList(l) => l.type_state = TypeState::Resolved(ty),
        NodePayload::Typedef(t) => t.type_state = TypeState::Resolved(ty),
        _ => {}
    }
}

/// Resolve one textual reference.
///
/// `Ok(None)` means a dependency (typedef, union member) is not ready
/// yet; hard errors are restriction and reference failures that no
/// retry can heal.
fn resolve_ref(
    arena: &Arena,
    registry: &ModuleRegistry,
    owner: NodeId,
    r: &TypeRef,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) -> CompileResult<Option<Type>> {
    let name = PrefixedName::parse(&r.name).ok_or_else(|| {
        CompileError::new(
            ErrorKind::UnknownType,
            at.clone(),
            format!("Invalid type name '{}'.", r.name),
        )
    })?;

    if name.prefix.is_none() {
        if let Some(builtin) = Builtin::lookup(&name.name) {
            return builtin_type(arena, registry, owner, builtin, r, at, diagnostics);
        }
    }

    let Some(td) = find_typedef(arena, registry, owner, &name, at, diagnostics)? else {
        return Ok(None);
    };
    let arc = match &arena.node(td).built {
        Some(Built::Typedef(arc)) => arc.clone(),
        _ => return Ok(None), // the typedef itself has not resolved yet
    };
    if !r.has_restrictions() {
        return Ok(Some(Type::Derived(arc)));
    }
    let constraints = merge_restrictions(&arc, r, at)?;
    let owner_node = arena.node(owner);
    let wrapper = Arc::new(Typedef {
        qname: arc.qname.clone(),
        path: owner_node.path.clone(),
        base: Type::Derived(arc),
        constraints,
        units: None,
        default: None,
        description: None,
        reference: None,
        status: Status::Current,
    });
    Ok(Some(Type::Derived(wrapper)))
}

fn scope_typedefs(node: &NodeBuilder) -> &[NodeId] {
    match &node.payload {
        NodePayload::Rpc(r) => &r.typedefs,
        payload => payload
            .child_set()
            .map(|cs| cs.typedefs.as_slice())
            .unwrap_or(&[]),
    }
}

/// Typedef lookup: innermost scope first for bare names, the imported
/// module's top level for prefixed ones.
fn find_typedef(
    arena: &Arena,
    registry: &ModuleRegistry,
    owner: NodeId,
    name: &PrefixedName,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) -> CompileResult<Option<NodeId>> {
    if let Some(prefix) = &name.prefix {
        let module = crate::graph::walk::parent_module(arena, owner).ok_or_else(|| {
            CompileError::new(
                ErrorKind::Internal,
                at.clone(),
                "type reference from a detached node".to_string(),
            )
        })?;
        let target = registry.module_for_prefix(arena, module, Some(prefix), at, diagnostics)?;
        let top = {
            let NodePayload::Module(m) = &arena.node(target).payload else {
                return Ok(None);
            };
            m.body.typedefs.clone()
        };
        return Ok(top
            .into_iter()
            .find(|&td| arena.node(td).qname.local_name == name.name));
    }

    for scope in ancestors(arena, owner).into_iter().skip(1) {
        let hit = scope_typedefs(arena.node(scope))
            .iter()
            .copied()
            .find(|&td| arena.node(td).qname.local_name == name.name);
        if hit.is_some() {
            return Ok(hit);
        }
    }
    Ok(None)
}

fn illegal(builtin: Builtin, family: &str, at: &SourceRef) -> CompileError {
    CompileError::new(
        ErrorKind::InvalidRestriction,
        at.clone(),
        format!(
            "Restriction '{family}' is not valid for type '{}'.",
            builtin.name()
        ),
    )
}

fn narrowing(err: ConstraintError, at: &SourceRef) -> CompileError {
    CompileError::new(ErrorKind::InvalidRestriction, at.clone(), err.to_string())
}

fn builtin_type(
    arena: &Arena,
    registry: &ModuleRegistry,
    owner: NodeId,
    builtin: Builtin,
    r: &TypeRef,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) -> CompileResult<Option<Type>> {
    if !r.lengths.is_empty() && !matches!(builtin, Builtin::String | Builtin::Binary) {
        return Err(illegal(builtin, "length", at));
    }
    if !r.patterns.is_empty() && builtin != Builtin::String {
        return Err(illegal(builtin, "pattern", at));
    }
    if !r.ranges.is_empty()
        && !matches!(
            builtin,
            Builtin::Int(_) | Builtin::Uint(_) | Builtin::Decimal64
        )
    {
        return Err(illegal(builtin, "range", at));
    }
    if r.fraction_digits.is_some() && builtin != Builtin::Decimal64 {
        return Err(illegal(builtin, "fraction-digits", at));
    }

    Ok(Some(match builtin {
        Builtin::Int(width) => {
            let mut c = TypeConstraints::new();
            c.add_ranges(&r.ranges).map_err(|e| narrowing(e, at))?;
            c.add_ranges(&[width.signed_range()])
                .map_err(|e| narrowing(e, at))?;
            Type::Int {
                width,
                ranges: r.ranges.clone(),
            }
        }
        Builtin::Uint(width) => {
            let mut c = TypeConstraints::new();
            c.add_ranges(&r.ranges).map_err(|e| narrowing(e, at))?;
            c.add_ranges(&[width.unsigned_range()])
                .map_err(|e| narrowing(e, at))?;
            Type::Uint {
                width,
                ranges: r.ranges.clone(),
            }
        }
        Builtin::Decimal64 => {
            let digits = r.fraction_digits.ok_or_else(|| {
                CompileError::new(
                    ErrorKind::InvalidRestriction,
                    at.clone(),
                    "decimal64 requires fraction-digits.".to_string(),
                )
            })?;
            if !(1..=18).contains(&digits) {
                return Err(CompileError::new(
                    ErrorKind::InvalidRestriction,
                    at.clone(),
                    format!("fraction-digits {digits} is out of range 1..18."),
                ));
            }
            Type::Decimal64 {
                fraction_digits: digits,
                ranges: r.ranges.clone(),
            }
        }
        Builtin::String => Type::String {
            lengths: r.lengths.clone(),
            patterns: r.patterns.clone(),
        },
        Builtin::Binary => Type::Binary {
            lengths: r.lengths.clone(),
        },
        Builtin::Boolean => Type::Boolean,
        Builtin::Empty => Type::Empty,
        Builtin::Enumeration => {
            if r.enums.is_empty() {
                return Err(CompileError::new(
                    ErrorKind::InvalidRestriction,
                    at.clone(),
                    "enumeration requires at least one enum value.".to_string(),
                ));
            }
            Type::Enumeration {
                enums: r.enums.clone(),
            }
        }
        Builtin::Bits => {
            if r.bits.is_empty() {
                return Err(CompileError::new(
                    ErrorKind::InvalidRestriction,
                    at.clone(),
                    "bits requires at least one bit.".to_string(),
                ));
            }
            Type::Bits {
                bits: r.bits.clone(),
            }
        }
        Builtin::Union => {
            if r.union_members.is_empty() {
                return Err(CompileError::new(
                    ErrorKind::InvalidRestriction,
                    at.clone(),
                    "union requires at least one member type.".to_string(),
                ));
            }
            let mut members = Vec::with_capacity(r.union_members.len());
            for member in &r.union_members {
                let member_at = SourceRef::new(at.module.clone(), member.line);
                match resolve_ref(arena, registry, owner, member, &member_at, diagnostics)? {
                    Some(ty) => members.push(ty),
                    None => return Ok(None),
                }
            }
            Type::Union { members }
        }
        Builtin::Identityref => {
            let base_name = r.base_identity.as_deref().ok_or_else(|| {
                CompileError::new(
                    ErrorKind::InvalidRestriction,
                    at.clone(),
                    "identityref requires a base identity.".to_string(),
                )
            })?;
            let base_ref = PrefixedName::parse(base_name).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UnknownIdentity,
                    at.clone(),
                    format!("Invalid base identity reference '{base_name}'."),
                )
            })?;
            let base = find_identity(arena, registry, owner, &base_ref, at, diagnostics)?
                .ok_or_else(|| {
                    CompileError::new(
                        ErrorKind::UnknownIdentity,
                        at.clone(),
                        format!("Failed to find base identity '{base_ref}'"),
                    )
                })?;
            Type::Identityref {
                base: arena.node(base).qname.clone(),
            }
        }
        Builtin::InstanceIdentifier => Type::InstanceIdentifier {
            require_instance: r.require_instance.unwrap_or(true),
        },
        Builtin::Leafref => {
            let path = r.leafref_path.clone().ok_or_else(|| {
                CompileError::new(
                    ErrorKind::InvalidRestriction,
                    at.clone(),
                    "leafref requires a path.".to_string(),
                )
            })?;
            // The path stays textual; binding it is a data tree concern.
            Type::Leafref { path }
        }
    }))
}

/// Merge inline restrictions against a typedef's derivation chain.
///
/// The inline sets go in first (most derived), then the typedef's
/// accumulated constraints, then the implicit envelope of the root
/// built-in. Any containment failure along the way is fatal.
fn merge_restrictions(
    base: &Arc<Typedef>,
    r: &TypeRef,
    at: &SourceRef,
) -> CompileResult<TypeConstraints> {
    let root = base.base.root().clone();
    let family_ok = match &root {
        Type::Int { .. } | Type::Uint { .. } | Type::Decimal64 { .. } => {
            r.lengths.is_empty() && r.patterns.is_empty()
        }
        Type::String { .. } => r.ranges.is_empty() && r.fraction_digits.is_none(),
        Type::Binary { .. } => {
            r.ranges.is_empty() && r.patterns.is_empty() && r.fraction_digits.is_none()
        }
        _ => !r.has_restrictions(),
    };
    if !family_ok {
        return Err(CompileError::new(
            ErrorKind::InvalidRestriction,
            at.clone(),
            format!(
                "Restrictions on '{}' do not fit its base type '{}'.",
                base.qname.local_name,
                root.name()
            ),
        ));
    }

    let mut c = TypeConstraints::new();
    c.add_ranges(&r.ranges).map_err(|e| narrowing(e, at))?;
    c.add_lengths(&r.lengths).map_err(|e| narrowing(e, at))?;
    c.add_patterns(&r.patterns);
    if let Some(digits) = r.fraction_digits {
        c.set_fraction_digits(digits).map_err(|e| narrowing(e, at))?;
    }

    c.add_ranges(base.constraints.ranges())
        .map_err(|e| narrowing(e, at))?;
    c.add_lengths(base.constraints.lengths())
        .map_err(|e| narrowing(e, at))?;
    c.add_patterns(base.constraints.patterns());
    if let Some(digits) = base.constraints.fraction_digits() {
        c.set_fraction_digits(digits).map_err(|e| narrowing(e, at))?;
    }

    match &root {
        Type::Int { width, .. } => c
            .add_ranges(&[width.signed_range()])
            .map_err(|e| narrowing(e, at))?,
        Type::Uint { width, .. } => c
            .add_ranges(&[width.unsigned_range()])
            .map_err(|e| narrowing(e, at))?,
        Type::Decimal64 {
            fraction_digits, ..
        } => c
            .set_fraction_digits(*fraction_digits)
            .map_err(|e| narrowing(e, at))?,
        _ => {}
    }
    Ok(c)
}

/// The effective constraint set of a resolved type, for recording on a
/// typedef built over it.
fn effective_constraints(ty: &Type) -> TypeConstraints {
    let mut c = TypeConstraints::new();
    match ty {
        Type::Derived(arc) => c = arc.constraints.clone(),
        // The first set into an empty accumulator cannot fail.
        Type::Int { ranges, .. } | Type::Uint { ranges, .. } => {
            let _ = c.add_ranges(ranges);
        }
        Type::Decimal64 {
            fraction_digits,
            ranges,
        } => {
            let _ = c.add_ranges(ranges);
            let _ = c.set_fraction_digits(*fraction_digits);
        }
        Type::String { lengths, patterns } => {
            let _ = c.add_lengths(lengths);
            c.add_patterns(patterns);
        }
        Type::Binary { lengths } => {
            let _ = c.add_lengths(lengths);
        }
        _ => {}
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::foundation::Range;
    use crate::statements::StatementGraph;

    fn graph_with_module() -> (StatementGraph, NodeId) {
        let mut graph = StatementGraph::new();
        let module = graph.add_module("test", "urn:test", None, "t", 1).unwrap();
        (graph, module)
    }

    fn resolve_all(graph: &mut StatementGraph) -> (usize, Vec<CompileError>) {
        let mut diags = Vec::new();
        let mut left = usize::MAX;
        for _ in 0..4 {
            left = run(&mut graph.arena, &graph.registry, &mut diags);
            if left == 0 || !diags.is_empty() {
                break;
            }
        }
        (left, diags)
    }

    #[test]
    fn builtin_reference_resolves_directly() {
        let (mut graph, module) = graph_with_module();
        let leaf = graph
            .add_leaf(module, "mtu", TypeRef::named("uint16", 2), 2)
            .unwrap();

        let (left, diags) = resolve_all(&mut graph);
        assert_eq!(left, 0);
        assert!(diags.is_empty());
        let NodePayload::Leaf(p) = &graph.arena.node(leaf).payload else {
            panic!("leaf expected");
        };
        assert!(matches!(p.type_state.resolved(), Some(Type::Uint { .. })));
    }

    #[test]
    fn typedef_chain_resolves_over_rounds() {
        let (mut graph, module) = graph_with_module();
        // Declared in use-before-definition order on purpose.
        let leaf = graph
            .add_leaf(module, "port", TypeRef::named("listen-port", 2), 2)
            .unwrap();
        let mut narrow = TypeRef::named("port-number", 4);
        narrow.ranges.push(Range::int(1024, 65_535));
        graph.add_typedef(module, "listen-port", narrow, 4).unwrap();
        let mut base = TypeRef::named("uint16", 6);
        base.ranges.push(Range::int(1, 65_535));
        graph.add_typedef(module, "port-number", base, 6).unwrap();

        let (left, diags) = resolve_all(&mut graph);
        assert_eq!(left, 0);
        assert!(diags.is_empty());

        let NodePayload::Leaf(p) = &graph.arena.node(leaf).payload else {
            panic!("leaf expected");
        };
        let Some(Type::Derived(td)) = p.type_state.resolved() else {
            panic!("derived type expected");
        };
        assert_eq!(td.qname.local_name, "listen-port");
        assert_eq!(td.constraints.ranges(), &[Range::int(1024, 65_535)]);
        assert!(matches!(td.base.root(), Type::Uint { .. }));
    }

    #[test]
    fn widening_restriction_is_fatal() {
        let (mut graph, module) = graph_with_module();
        let mut base = TypeRef::named("uint8", 2);
        base.ranges.push(Range::int(0, 10));
        graph.add_typedef(module, "small", base, 2).unwrap();
        let mut wide = TypeRef::named("small", 4);
        wide.ranges.push(Range::int(0, 100));
        graph.add_leaf(module, "x", wide, 4).unwrap();

        let (_, diags) = resolve_all(&mut graph);
        assert!(diags
            .iter()
            .any(|d| d.kind == ErrorKind::InvalidRestriction));
    }

    #[test]
    fn range_beyond_the_width_is_fatal() {
        let (mut graph, module) = graph_with_module();
        let mut r = TypeRef::named("uint8", 2);
        r.ranges.push(Range::int(0, 999));
        graph.add_leaf(module, "x", r, 2).unwrap();

        let (_, diags) = resolve_all(&mut graph);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::InvalidRestriction);
    }

    #[test]
    fn wrong_restriction_family_is_fatal() {
        let (mut graph, module) = graph_with_module();
        let mut r = TypeRef::named("string", 2);
        r.ranges.push(Range::int(0, 10));
        graph.add_leaf(module, "x", r, 2).unwrap();

        let (_, diags) = resolve_all(&mut graph);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::InvalidRestriction);
        assert!(diags[0].message.contains("'range'"));
    }

    #[test]
    fn prefixed_typedef_resolves_in_the_imported_module() {
        let mut graph = StatementGraph::new();
        let lib = graph.add_module("lib", "urn:lib", None, "l", 1).unwrap();
        graph
            .add_typedef(lib, "percent", TypeRef::named("uint8", 2), 2)
            .unwrap();
        let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
        graph.add_import(app, "lib", "l", None, 2).unwrap();
        let leaf = graph
            .add_leaf(app, "load", TypeRef::named("l:percent", 3), 3)
            .unwrap();

        let (left, diags) = resolve_all(&mut graph);
        assert_eq!(left, 0);
        assert!(diags.is_empty());
        let NodePayload::Leaf(p) = &graph.arena.node(leaf).payload else {
            panic!("leaf expected");
        };
        let Some(Type::Derived(td)) = p.type_state.resolved() else {
            panic!("derived type expected");
        };
        assert_eq!(td.qname.local_name, "percent");
        assert_eq!(td.qname.namespace.as_str(), "urn:lib");
    }

    #[test]
    fn union_members_resolve_independently() {
        let (mut graph, module) = graph_with_module();
        let mut r = TypeRef::named("union", 2);
        r.union_members.push(TypeRef::named("uint16", 2));
        r.union_members.push(TypeRef::named("string", 2));
        let leaf = graph.add_leaf(module, "value", r, 2).unwrap();

        let (left, diags) = resolve_all(&mut graph);
        assert_eq!(left, 0);
        assert!(diags.is_empty());
        let NodePayload::Leaf(p) = &graph.arena.node(leaf).payload else {
            panic!("leaf expected");
        };
        let Some(Type::Union { members }) = p.type_state.resolved() else {
            panic!("union expected");
        };
        assert_eq!(members.len(), 2);
    }

    #[test]
    fn identityref_binds_its_base() {
        let (mut graph, module) = graph_with_module();
        graph.add_identity(module, "protocol", None, 2).unwrap();
        let mut r = TypeRef::named("identityref", 3);
        r.base_identity = Some("protocol".to_string());
        let leaf = graph.add_leaf(module, "proto", r, 3).unwrap();

        let (left, diags) = resolve_all(&mut graph);
        assert_eq!(left, 0);
        assert!(diags.is_empty());
        let NodePayload::Leaf(p) = &graph.arena.node(leaf).payload else {
            panic!("leaf expected");
        };
        let Some(Type::Identityref { base }) = p.type_state.resolved() else {
            panic!("identityref expected");
        };
        assert_eq!(base.local_name, "protocol");
    }

    #[test]
    fn leafref_keeps_its_path_unbound() {
        let (mut graph, module) = graph_with_module();
        let mut r = TypeRef::named("leafref", 2);
        r.leafref_path = Some("../config/name".to_string());
        let leaf = graph.add_leaf(module, "ref", r, 2).unwrap();

        let (left, diags) = resolve_all(&mut graph);
        assert_eq!(left, 0);
        assert!(diags.is_empty());
        let NodePayload::Leaf(p) = &graph.arena.node(leaf).payload else {
            panic!("leaf expected");
        };
        let ty = p.type_state.resolved().unwrap();
        assert!(matches!(ty, Type::Leafref { .. }));
        assert!(!ty.is_bound());
    }

    #[test]
    fn unknown_type_stays_pending() {
        let (mut graph, module) = graph_with_module();
        graph
            .add_leaf(module, "x", TypeRef::named("no-such-type", 2), 2)
            .unwrap();

        let mut diags = Vec::new();
        let left = run(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(left, 1);
        assert!(diags.is_empty());
    }
}
