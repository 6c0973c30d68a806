//! The structural copier.
//!
//! Grouping expansion and augment injection both duplicate builder
//! subtrees instead of aliasing them, so a copied node can be mutated
//! (refined, augmented, config-flagged) without touching its source.
//! The copier clones a subtree onto a new parent and never mutates its
//! input: the copy is allocated fresh and the source keeps its own
//! child lists and parent link.
//!
//! # Qualified names
//!
//! With `update_qname = true` the copy is rebased onto the new parent's
//! module identity: local names survive, namespace and revision come
//! from the parent. That is grouping instantiation, where library nodes
//! become nodes of the using module. With `update_qname = false` the
//! identity is kept and only the schema path is re-anchored, which is
//! augment injection: injected nodes stay nodes of the augmenting
//! module.
//!
//! # Originals
//!
//! Every copy records the node it was made from. Chains collapse: a
//! copy of a copy points at the first source, so provenance is always
//! one hop.

use arbor_model::error::{CompileError, CompileResult, ErrorKind};

use crate::graph::arena::{Arena, NodeId};
use crate::graph::node::{
    AugmentPayload, ChildSet, ChoicePayload, ContainerPayload, LeafListPayload, LeafPayload,
    ListPayload, NodeBuilder, NodePayload, RpcPayload, TypedefPayload, UnknownPayload, UsesPayload,
};

/// Deep-copy a builder subtree onto a new parent.
///
/// The copy is allocated but NOT inserted into the parent's child
/// lists; callers attach it through the checked attachment functions so
/// duplicate-name detection still applies.
pub fn copy_subtree(
    arena: &mut Arena,
    source: NodeId,
    new_parent: NodeId,
    update_qname: bool,
) -> CompileResult<NodeId> {
    let qname = {
        let src = arena.node(source);
        if update_qname {
            let parent = arena.node(new_parent);
            src.qname
                .rebase(parent.qname.namespace.clone(), parent.qname.revision)
        } else {
            src.qname.clone()
        }
    };
    let path = arena.node(new_parent).path.child(qname.clone());
    let payload = shell_payload(arena, source)?;

    let copy = {
        let src = arena.node(source);
        let mut node = NodeBuilder::new(qname, path, src.source.clone(), Some(new_parent), payload);
        node.original = Some(src.original.unwrap_or(source));
        node.augmenting = src.augmenting;
        node.added_by_uses = src.added_by_uses;
        node.config = src.config;
        node.description = src.description.clone();
        node.reference = src.reference.clone();
        node.status = src.status;
        node.constraints = src.constraints.clone();
        node
    };
    let copy = arena.alloc(copy);
    copy_contents(arena, source, copy, update_qname)?;
    Ok(copy)
}

/// The copy's payload with scalar state cloned and child lists empty;
/// [`copy_contents`] fills the lists afterwards.
fn shell_payload(arena: &Arena, source: NodeId) -> CompileResult<NodePayload> {
    Ok(match &arena.node(source).payload {
        NodePayload::Container(c) => NodePayload::Container(ContainerPayload {
            presence: c.presence,
            body: ChildSet::default(),
        }),
        NodePayload::Leaf(l) => NodePayload::Leaf(LeafPayload {
            type_state: l.type_state.clone(),
            default: l.default.clone(),
            units: l.units.clone(),
        }),
        NodePayload::LeafList(l) => NodePayload::LeafList(LeafListPayload {
            type_state: l.type_state.clone(),
            user_ordered: l.user_ordered,
        }),
        NodePayload::List(l) => NodePayload::List(ListPayload {
            keys: l.keys.clone(),
            user_ordered: l.user_ordered,
            body: ChildSet::default(),
        }),
        NodePayload::Choice(c) => NodePayload::Choice(ChoicePayload {
            cases: Vec::new(),
            default_case: c.default_case.clone(),
        }),
        NodePayload::Case(_) => NodePayload::Case(ChildSet::default()),
        NodePayload::AnyXml => NodePayload::AnyXml,
        NodePayload::Grouping(_) => NodePayload::Grouping(ChildSet::default()),
        NodePayload::Uses(u) => NodePayload::Uses(UsesPayload {
            grouping_ref: u.grouping_ref.clone(),
            // The binding survives the copy; the expansion does not.
            grouping: u.grouping,
            augments: Vec::new(),
            refines: u.refines.clone(),
            expanded: false,
        }),
        NodePayload::Typedef(t) => NodePayload::Typedef(TypedefPayload {
            type_state: t.type_state.clone(),
            units: t.units.clone(),
            default: t.default.clone(),
        }),
        NodePayload::Rpc(_) => NodePayload::Rpc(RpcPayload::default()),
        NodePayload::RpcIo(_) => NodePayload::RpcIo(ChildSet::default()),
        NodePayload::Notification(_) => NodePayload::Notification(ChildSet::default()),
        NodePayload::Augment(a) => NodePayload::Augment(AugmentPayload {
            target: a.target.clone(),
            target_path: None,
            target_node: None,
            body: ChildSet::default(),
            when: a.when.clone(),
            resolved: false,
            unsupported: false,
        }),
        NodePayload::Unknown(u) => NodePayload::Unknown(UnknownPayload {
            keyword: u.keyword.clone(),
            node_type: u.node_type.clone(),
            argument: u.argument.clone(),
            extension: u.extension,
        }),
        other => {
            return Err(CompileError::new(
                ErrorKind::CopyFailed,
                arena.node(source).source.clone(),
                format!(
                    "Failed to copy node: unknown node kind '{}'.",
                    other.kind_name()
                ),
            ))
        }
    })
}

#[derive(Default)]
struct Contents {
    children: Vec<NodeId>,
    typedefs: Vec<NodeId>,
    groupings: Vec<NodeId>,
    uses: Vec<NodeId>,
    cases: Vec<NodeId>,
    input: Option<NodeId>,
    output: Option<NodeId>,
    augments: Vec<NodeId>,
    unknowns: Vec<NodeId>,
}

fn copy_contents(
    arena: &mut Arena,
    source: NodeId,
    copy: NodeId,
    update_qname: bool,
) -> CompileResult<()> {
    let mut src_lists = Contents {
        unknowns: arena.node(source).unknown_nodes.clone(),
        ..Contents::default()
    };
    match &arena.node(source).payload {
        NodePayload::Choice(c) => src_lists.cases = c.cases.clone(),
        NodePayload::Rpc(r) => {
            src_lists.input = r.input;
            src_lists.output = r.output;
            src_lists.typedefs = r.typedefs.clone();
            src_lists.groupings = r.groupings.clone();
        }
        NodePayload::Uses(u) => src_lists.augments = u.augments.clone(),
        payload => {
            if let Some(cs) = payload.child_set() {
                src_lists.children = cs.children.clone();
                src_lists.typedefs = cs.typedefs.clone();
                src_lists.groupings = cs.groupings.clone();
                src_lists.uses = cs.uses.clone();
            }
        }
    }

    let copy_list = |arena: &mut Arena, ids: &[NodeId]| -> CompileResult<Vec<NodeId>> {
        ids.iter()
            .map(|&id| copy_subtree(arena, id, copy, update_qname))
            .collect()
    };

    let children = copy_list(arena, &src_lists.children)?;
    let typedefs = copy_list(arena, &src_lists.typedefs)?;
    let groupings = copy_list(arena, &src_lists.groupings)?;
    let uses = copy_list(arena, &src_lists.uses)?;
    let cases = copy_list(arena, &src_lists.cases)?;
    let augments = copy_list(arena, &src_lists.augments)?;
    let unknowns = copy_list(arena, &src_lists.unknowns)?;
    let input = match src_lists.input {
        Some(io) => Some(copy_subtree(arena, io, copy, update_qname)?),
        None => None,
    };
    let output = match src_lists.output {
        Some(io) => Some(copy_subtree(arena, io, copy, update_qname)?),
        None => None,
    };

    match &mut arena.node_mut(copy).payload {
        NodePayload::Choice(c) => c.cases = cases,
        NodePayload::Rpc(r) => {
            r.input = input;
            r.output = output;
            r.typedefs = typedefs;
            r.groupings = groupings;
        }
        NodePayload::Uses(u) => u.augments = augments,
        payload => {
            if let Some(cs) = payload.child_set_mut() {
                cs.children = children;
                cs.typedefs = typedefs;
                cs.groupings = groupings;
                cs.uses = uses;
            }
        }
    }
    arena.node_mut(copy).unknown_nodes = unknowns;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeRef;
    use crate::statements::StatementGraph;

    fn two_modules() -> (StatementGraph, NodeId, NodeId) {
        let mut graph = StatementGraph::new();
        let lib = graph.add_module("lib", "urn:lib", None, "l", 1).unwrap();
        let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
        (graph, lib, app)
    }

    #[test]
    fn rebasing_copy_takes_the_new_module_identity() {
        let (mut graph, lib, app) = two_modules();
        let c = graph.add_container(lib, "endpoint", 2).unwrap();
        graph
            .add_leaf(c, "port", TypeRef::named("uint16", 3), 3)
            .unwrap();

        let copy = copy_subtree(&mut graph.arena, c, app, true).unwrap();
        let copied = graph.arena.node(copy);
        assert_eq!(copied.qname.namespace.as_str(), "urn:app");
        assert_eq!(copied.path.to_string(), "/endpoint");
        assert_eq!(copied.parent, Some(app));
        assert_eq!(copied.original, Some(c));

        let NodePayload::Container(payload) = &copied.payload else {
            panic!("container copy expected");
        };
        let leaf = graph.arena.node(payload.body.children[0]);
        assert_eq!(leaf.qname.namespace.as_str(), "urn:app");
        assert_eq!(leaf.path.to_string(), "/endpoint/port");
        assert_eq!(leaf.parent, Some(copy));
    }

    #[test]
    fn non_rebasing_copy_keeps_the_identity() {
        let (mut graph, lib, app) = two_modules();
        let c = graph.add_container(lib, "endpoint", 2).unwrap();
        let target = graph.add_container(app, "system", 2).unwrap();

        let copy = copy_subtree(&mut graph.arena, c, target, false).unwrap();
        let copied = graph.arena.node(copy);
        assert_eq!(copied.qname.namespace.as_str(), "urn:lib");
        // The path is re-anchored regardless.
        assert_eq!(copied.path.to_string(), "/system/endpoint");
    }

    #[test]
    fn source_subtree_is_untouched() {
        let (mut graph, lib, app) = two_modules();
        let c = graph.add_container(lib, "endpoint", 2).unwrap();
        graph
            .add_leaf(c, "port", TypeRef::named("uint16", 3), 3)
            .unwrap();

        copy_subtree(&mut graph.arena, c, app, true).unwrap();
        let src = graph.arena.node(c);
        assert_eq!(src.parent, Some(lib));
        assert_eq!(src.qname.namespace.as_str(), "urn:lib");
        assert!(src.original.is_none());
        let NodePayload::Container(payload) = &src.payload else {
            panic!("container expected");
        };
        assert_eq!(payload.body.children.len(), 1);
    }

    #[test]
    fn copy_of_a_copy_points_at_the_first_source() {
        let (mut graph, lib, app) = two_modules();
        let c = graph.add_container(lib, "endpoint", 2).unwrap();

        let first = copy_subtree(&mut graph.arena, c, app, true).unwrap();
        let second = copy_subtree(&mut graph.arena, first, app, true).unwrap();
        assert_eq!(graph.arena.node(first).original, Some(c));
        assert_eq!(graph.arena.node(second).original, Some(c));
    }

    #[test]
    fn module_copies_are_rejected() {
        let (mut graph, lib, app) = two_modules();
        let err = copy_subtree(&mut graph.arena, lib, app, true).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CopyFailed);
        assert!(err.message.contains("module"));
    }
}
