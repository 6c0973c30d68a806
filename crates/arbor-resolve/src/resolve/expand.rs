//! Grouping binding and expansion.
//!
//! Every `uses` statement names a grouping and, once the grouping is
//! found, is replaced by an independent copy of the grouping's
//! contents at the uses site. Expansion is gated: a grouping whose own
//! subtree still contains unexpanded uses is not ready, so uses inside
//! groupings expand before uses of those groupings. The gate makes the
//! order self-organizing under the fixed-point loop; a genuine cycle
//! simply never becomes ready and is reported when the pass budget
//! runs out.
//!
//! # Lookup
//!
//! A prefixed grouping name searches the prefix-resolved module's
//! top-level groupings. A bare name walks the enclosing scopes outward
//! from the uses site (container, list, rpc and friends each own a
//! grouping namespace), module scope last.

use arbor_model::error::{CompileError, CompileResult, ErrorKind};

use crate::graph::arena::{Arena, NodeId};
use crate::graph::module::{attach_child, attach_grouping, attach_typedef};
use crate::graph::node::{NodeBuilder, NodePayload};
use crate::graph::walk::{ancestors, contained_ids, mark_added_by_uses, parent_module};
use crate::registry::ModuleRegistry;
use crate::resolve::copy::copy_subtree;

/// One expansion round. Binds unbound uses, expands every ready one,
/// and returns the number still pending.
pub fn run(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    diagnostics: &mut Vec<CompileError>,
) -> usize {
    let mut pending: Vec<NodeId> = arena
        .ids()
        .filter(|&id| matches!(&arena.node(id).payload, NodePayload::Uses(u) if !u.expanded))
        .collect();
    // Grouping-scoped uses first, then deepest site first, so one round
    // usually suffices for straight-line dependency chains.
    pending.sort_by_key(|&id| {
        let depth = arena.node(id).path.len();
        (!inside_grouping(arena, id), usize::MAX - depth, id)
    });

    for uses in pending {
        let bound = match &arena.node(uses).payload {
            NodePayload::Uses(u) if u.expanded => continue,
            NodePayload::Uses(u) => u.grouping,
            _ => continue,
        };
        let grouping = match bound {
            Some(g) => g,
            None => match bind_grouping(arena, registry, uses, diagnostics) {
                Ok(Some(g)) => {
                    if let NodePayload::Uses(u) = &mut arena.node_mut(uses).payload {
                        u.grouping = Some(g);
                    }
                    g
                }
                Ok(None) => continue,
                Err(err) => {
                    diagnostics.push(err);
                    // A broken prefix never heals; stop retrying.
                    if let NodePayload::Uses(u) = &mut arena.node_mut(uses).payload {
                        u.expanded = true;
                    }
                    continue;
                }
            },
        };
        if grouping_ready(arena, grouping) {
            instantiate(arena, uses, grouping, diagnostics);
        }
    }

    arena
        .ids()
        .filter(|&id| matches!(&arena.node(id).payload, NodePayload::Uses(u) if !u.expanded))
        .count()
}

fn inside_grouping(arena: &Arena, uses: NodeId) -> bool {
    ancestors(arena, uses)
        .into_iter()
        .skip(1)
        .any(|id| matches!(arena.node(id).payload, NodePayload::Grouping(_)))
}

fn scope_groupings(node: &NodeBuilder) -> &[NodeId] {
    match &node.payload {
        NodePayload::Rpc(r) => &r.groupings,
        payload => payload
            .child_set()
            .map(|cs| cs.groupings.as_slice())
            .unwrap_or(&[]),
    }
}

/// Find the grouping a uses refers to.
///
/// `Ok(None)` means "not visible yet, retry"; a broken prefix is a hard
/// error.
pub fn bind_grouping(
    arena: &Arena,
    registry: &ModuleRegistry,
    uses: NodeId,
    diagnostics: &mut Vec<CompileError>,
) -> CompileResult<Option<NodeId>> {
    let (gref, at) = {
        let u = arena.node(uses);
        let NodePayload::Uses(payload) = &u.payload else {
            return Ok(None);
        };
        (payload.grouping_ref.clone(), u.source.clone())
    };

    if let Some(prefix) = &gref.prefix {
        let module = parent_module(arena, uses).ok_or_else(|| {
            CompileError::new(
                ErrorKind::Internal,
                at.clone(),
                "uses is not attached to a module".to_string(),
            )
        })?;
        let target =
            registry.module_for_prefix(arena, module, Some(prefix), &at, diagnostics)?;
        let top = {
            let NodePayload::Module(m) = &arena.node(target).payload else {
                return Ok(None);
            };
            m.body.groupings.clone()
        };
        return Ok(top
            .into_iter()
            .find(|&g| arena.node(g).qname.local_name == gref.name));
    }

    for scope in ancestors(arena, uses).into_iter().skip(1) {
        let hit = scope_groupings(arena.node(scope))
            .iter()
            .copied()
            .find(|&g| arena.node(g).qname.local_name == gref.name);
        if hit.is_some() {
            return Ok(hit);
        }
    }
    Ok(None)
}

/// True when the grouping's subtree holds no unexpanded uses.
pub fn grouping_ready(arena: &Arena, grouping: NodeId) -> bool {
    let mut stack = contained_ids(arena.node(grouping));
    while let Some(id) = stack.pop() {
        if matches!(&arena.node(id).payload, NodePayload::Uses(u) if !u.expanded) {
            return false;
        }
        stack.extend(contained_ids(arena.node(id)));
    }
    true
}

/// Copy the grouping's contents to the uses site and mark the products.
fn instantiate(
    arena: &mut Arena,
    uses: NodeId,
    grouping: NodeId,
    diagnostics: &mut Vec<CompileError>,
) {
    let Some(parent) = arena.node(uses).parent else {
        return;
    };
    let (children, typedefs, groupings, nested_uses) = {
        let NodePayload::Grouping(cs) = &arena.node(grouping).payload else {
            return;
        };
        (
            cs.children.clone(),
            cs.typedefs.clone(),
            cs.groupings.clone(),
            cs.uses.clone(),
        )
    };
    let unknowns = arena.node(grouping).unknown_nodes.clone();

    tracing::debug!(
        grouping = %arena.node(grouping).qname.local_name,
        site = %arena.node(parent).path,
        "expanding grouping"
    );

    for child in children {
        match copy_subtree(arena, child, parent, true) {
            Ok(copy) => {
                if let Err(err) = attach_child(arena, parent, copy) {
                    diagnostics.push(err);
                    continue;
                }
                mark_added_by_uses(arena, copy);
            }
            Err(err) => diagnostics.push(err),
        }
    }
    for typedef in typedefs {
        match copy_subtree(arena, typedef, parent, true) {
            Ok(copy) => {
                if let Err(err) = attach_typedef(arena, parent, copy) {
                    diagnostics.push(err);
                }
            }
            Err(err) => diagnostics.push(err),
        }
    }
    for nested in groupings {
        match copy_subtree(arena, nested, parent, true) {
            Ok(copy) => {
                if let Err(err) = attach_grouping(arena, parent, copy) {
                    diagnostics.push(err);
                }
            }
            Err(err) => diagnostics.push(err),
        }
    }
    for nested in nested_uses {
        // A uses at grouping top level re-expands at the new site.
        match copy_subtree(arena, nested, parent, true) {
            Ok(copy) => {
                if let Some(cs) = arena.node_mut(parent).payload.child_set_mut() {
                    cs.uses.push(copy);
                }
                arena.node_mut(copy).added_by_uses = true;
            }
            Err(err) => diagnostics.push(err),
        }
    }
    for unknown in unknowns {
        match copy_subtree(arena, unknown, parent, true) {
            Ok(copy) => {
                arena.node_mut(parent).unknown_nodes.push(copy);
                mark_added_by_uses(arena, copy);
            }
            Err(err) => diagnostics.push(err),
        }
    }

    if let NodePayload::Uses(u) = &mut arena.node_mut(uses).payload {
        u.expanded = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeRef;
    use crate::statements::StatementGraph;

    fn graph_with_module() -> (StatementGraph, NodeId) {
        let mut graph = StatementGraph::new();
        let module = graph.add_module("test", "urn:test", None, "t", 1).unwrap();
        (graph, module)
    }

    #[test]
    fn expansion_copies_children_to_the_uses_site() {
        let (mut graph, module) = graph_with_module();
        let g = graph.add_grouping(module, "endpoint", 2).unwrap();
        graph
            .add_leaf(g, "port", TypeRef::named("uint16", 3), 3)
            .unwrap();
        let c = graph.add_container(module, "server", 5).unwrap();
        graph.add_uses(c, "endpoint", 6).unwrap();

        let mut diags = Vec::new();
        let pending = run(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(pending, 0);
        assert!(diags.is_empty());

        let NodePayload::Container(payload) = &graph.arena.node(c).payload else {
            panic!("container expected");
        };
        assert_eq!(payload.body.children.len(), 1);
        let leaf = graph.arena.node(payload.body.children[0]);
        assert_eq!(leaf.qname.local_name, "port");
        assert_eq!(leaf.path.to_string(), "/server/port");
        assert!(leaf.added_by_uses);

        // The template itself is untouched.
        let NodePayload::Grouping(cs) = &graph.arena.node(g).payload else {
            panic!("grouping expected");
        };
        assert!(!graph.arena.node(cs.children[0]).added_by_uses);
    }

    #[test]
    fn nested_grouping_dependencies_expand_inside_out() {
        let (mut graph, module) = graph_with_module();
        let inner = graph.add_grouping(module, "address", 2).unwrap();
        graph
            .add_leaf(inner, "ip", TypeRef::named("string", 3), 3)
            .unwrap();
        let outer = graph.add_grouping(module, "endpoint", 5).unwrap();
        graph.add_uses(outer, "address", 6).unwrap();
        let c = graph.add_container(module, "server", 8).unwrap();
        graph.add_uses(c, "endpoint", 9).unwrap();

        let mut diags = Vec::new();
        let mut pending = usize::MAX;
        for _ in 0..4 {
            pending = run(&mut graph.arena, &graph.registry, &mut diags);
            if pending == 0 {
                break;
            }
        }
        assert_eq!(pending, 0);
        assert!(diags.is_empty());

        let NodePayload::Container(payload) = &graph.arena.node(c).payload else {
            panic!("container expected");
        };
        assert_eq!(payload.body.children.len(), 1);
        let ip = graph.arena.node(payload.body.children[0]);
        assert_eq!(ip.qname.local_name, "ip");
        assert!(ip.added_by_uses);
    }

    #[test]
    fn prefixed_uses_searches_the_imported_module() {
        let mut graph = StatementGraph::new();
        let lib = graph.add_module("lib", "urn:lib", None, "l", 1).unwrap();
        let g = graph.add_grouping(lib, "endpoint", 2).unwrap();
        graph
            .add_leaf(g, "port", TypeRef::named("uint16", 3), 3)
            .unwrap();
        let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
        graph.add_import(app, "lib", "l", None, 2).unwrap();
        graph.add_uses(app, "l:endpoint", 4).unwrap();

        let mut diags = Vec::new();
        let pending = run(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(pending, 0);
        assert!(diags.is_empty());

        let NodePayload::Module(m) = &graph.arena.node(app).payload else {
            panic!("module expected");
        };
        let port = graph.arena.node(m.body.children[0]);
        assert_eq!(port.qname.local_name, "port");
        // Instantiated nodes belong to the using module.
        assert_eq!(port.qname.namespace.as_str(), "urn:app");
    }

    #[test]
    fn missing_grouping_stays_pending() {
        let (mut graph, module) = graph_with_module();
        graph.add_uses(module, "nothing", 2).unwrap();

        let mut diags = Vec::new();
        let pending = run(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(pending, 1);
        assert!(diags.is_empty());
    }

    #[test]
    fn unknown_prefix_is_fatal_and_not_retried() {
        let (mut graph, module) = graph_with_module();
        graph.add_uses(module, "nope:endpoint", 2).unwrap();

        let mut diags = Vec::new();
        let pending = run(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(pending, 0);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::UndefinedPrefix);

        let again = run(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(again, 0);
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn expansion_collision_with_declared_sibling_is_reported() {
        let (mut graph, module) = graph_with_module();
        let g = graph.add_grouping(module, "names", 2).unwrap();
        graph
            .add_leaf(g, "host", TypeRef::named("string", 3), 3)
            .unwrap();
        let c = graph.add_container(module, "box", 5).unwrap();
        graph
            .add_leaf(c, "host", TypeRef::named("string", 6), 6)
            .unwrap();
        graph.add_uses(c, "names", 7).unwrap();

        let mut diags = Vec::new();
        run(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::DuplicateNode);
    }

    #[test]
    fn self_referential_grouping_never_becomes_ready() {
        let (mut graph, module) = graph_with_module();
        let g = graph.add_grouping(module, "loop", 2).unwrap();
        graph.add_uses(g, "loop", 3).unwrap();
        let c = graph.add_container(module, "box", 5).unwrap();
        graph.add_uses(c, "loop", 6).unwrap();

        let mut diags = Vec::new();
        for _ in 0..4 {
            run(&mut graph.arena, &graph.registry, &mut diags);
        }
        let pending = run(&mut graph.arena, &graph.registry, &mut diags);
        assert!(pending > 0);
    }
}
