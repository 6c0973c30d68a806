//! Augment target resolution and injection.
//!
//! An augment names a target node and carries a body of data nodes to
//! inject there. Module-level augments use absolute paths and may cross
//! module boundaries; uses-level augments use relative paths into the
//! grouping content instantiated at the site.
//!
//! The pass is incremental: a target that does not exist yet is left
//! pending, because a grouping expansion or another augment in a later
//! round may create it. Targets that resolve to an extension-defined
//! node are out of reach structurally; the augment settles as
//! unsupported with a warning instead of failing the batch.

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::foundation::{QName, SchemaPath, SourceRef};

use crate::graph::arena::{Arena, NodeId};
use crate::graph::module::attach_child;
use crate::graph::node::{ChildSet, NodeBuilder, NodePayload, RawPath};
use crate::graph::walk::{find_data_child, mark_added_by_uses, mark_augmenting, parent_module};
use crate::registry::ModuleRegistry;
use crate::resolve::copy::copy_subtree;

/// One resolution round over every unresolved augment, in declaration
/// order. Returns the number still unresolved.
pub fn run(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    diagnostics: &mut Vec<CompileError>,
) -> usize {
    let todo: Vec<NodeId> = arena.ids().filter(|&id| unresolved(arena, id)).collect();
    for id in todo {
        step(arena, registry, id, diagnostics);
    }
    arena.ids().filter(|&id| unresolved(arena, id)).count()
}

fn unresolved(arena: &Arena, id: NodeId) -> bool {
    matches!(&arena.node(id).payload, NodePayload::Augment(a) if !a.resolved)
}

/// Where a bound target path landed.
enum Hit {
    Found(NodeId),
    Extension(NodeId),
    Missing,
}

fn step(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    id: NodeId,
    diagnostics: &mut Vec<CompileError>,
) {
    let (parent, at, target, body_uses) = {
        let n = arena.node(id);
        let NodePayload::Augment(a) = &n.payload else {
            return;
        };
        (n.parent, n.source.clone(), a.target.clone(), a.body.uses.clone())
    };

    // The body is not final while its own uses are pending, and a
    // uses-level augment has no anchor until the uses expands.
    if let Some(p) = parent {
        if matches!(&arena.node(p).payload, NodePayload::Uses(u) if !u.expanded) {
            return;
        }
    }
    for u in body_uses {
        if matches!(&arena.node(u).payload, NodePayload::Uses(up) if !up.expanded) {
            return;
        }
    }

    let Some(module) = parent_module(arena, id) else {
        return;
    };

    // Bind the written path to qualified names once; the bound path is
    // kept even when the target later turns out unsupported.
    let bound = match bound_path(arena, id) {
        Some(path) => path,
        None => match bind_path(arena, registry, module, &target, &at, diagnostics) {
            Ok(path) => {
                if let NodePayload::Augment(a) = &mut arena.node_mut(id).payload {
                    a.target_path = Some(path.clone());
                }
                path
            }
            Err(err) => {
                diagnostics.push(err);
                settle(arena, id, None, false);
                return;
            }
        },
    };

    let hit = if target.absolute {
        let start = match registry.module_for_prefix(
            arena,
            module,
            target.segments[0].prefix.as_deref(),
            &at,
            diagnostics,
        ) {
            Ok(m) => m,
            Err(err) => {
                diagnostics.push(err);
                settle(arena, id, None, false);
                return;
            }
        };
        locate_from_module(arena, start, bound.segments())
    } else {
        // Relative to the node the enclosing uses instantiates into.
        let anchor = parent.and_then(|uses| arena.node(uses).parent);
        match anchor {
            Some(a) => locate(arena, a, bound.segments()),
            None => Hit::Missing,
        }
    };

    match hit {
        Hit::Missing => {} // a later expansion or augment may create it
        Hit::Extension(ext) => {
            let keyword = match &arena.node(ext).payload {
                NodePayload::Unknown(u) => u.keyword.to_string(),
                _ => arena.node(ext).qname.local_name.clone(),
            };
            tracing::warn!(
                target_path = %bound,
                keyword = %keyword,
                "augment target is an extension-defined node; not applied"
            );
            diagnostics.push(CompileError::warning(
                ErrorKind::UnsupportedTarget,
                at,
                format!("Augment target '{bound}' is defined by extension '{keyword}'; the augment was not applied."),
            ));
            settle(arena, id, Some(ext), true);
        }
        Hit::Found(node) => inject(arena, id, node, module, &at, diagnostics),
    }
}

fn bound_path(arena: &Arena, id: NodeId) -> Option<SchemaPath> {
    match &arena.node(id).payload {
        NodePayload::Augment(a) => a.target_path.clone(),
        _ => None,
    }
}

fn settle(arena: &mut Arena, id: NodeId, target_node: Option<NodeId>, unsupported: bool) {
    if let NodePayload::Augment(a) = &mut arena.node_mut(id).payload {
        a.resolved = true;
        a.unsupported = unsupported;
        a.target_node = target_node;
    }
}

/// Qualify every written segment with the namespace and revision of
/// the module its prefix resolves to.
fn bind_path(
    arena: &Arena,
    registry: &ModuleRegistry,
    module: NodeId,
    target: &RawPath,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) -> CompileResult<SchemaPath> {
    let mut qnames = Vec::with_capacity(target.segments.len());
    for seg in &target.segments {
        let m = registry.module_for_prefix(arena, module, seg.prefix.as_deref(), at, diagnostics)?;
        let mq = &arena.node(m).qname;
        qnames.push(QName::new(mq.namespace.clone(), mq.revision, &seg.name));
    }
    Ok(SchemaPath::new(qnames, target.absolute))
}

fn extension_child(arena: &Arena, parent: NodeId, seg: &QName) -> Option<NodeId> {
    arena
        .node(parent)
        .unknown_nodes
        .iter()
        .copied()
        .find(|&u| arena.node(u).qname.local_name == seg.local_name)
}

fn locate_from_module(arena: &mut Arena, module: NodeId, segments: &[QName]) -> Hit {
    let Some(first) = segments.first() else {
        return Hit::Missing;
    };
    let top: Vec<NodeId> = {
        let NodePayload::Module(m) = &arena.node(module).payload else {
            return Hit::Missing;
        };
        let mut ids = m.body.children.clone();
        ids.extend_from_slice(&m.notifications);
        ids.extend_from_slice(&m.rpcs);
        ids
    };
    let start = top
        .into_iter()
        .find(|&id| arena.node(id).qname.same_node(first));
    match start {
        Some(node) => locate(arena, node, &segments[1..]),
        None => match extension_child(arena, module, first) {
            Some(ext) => Hit::Extension(ext),
            None => Hit::Missing,
        },
    }
}

fn locate(arena: &mut Arena, start: NodeId, segments: &[QName]) -> Hit {
    let mut current = start;
    for seg in segments {
        match find_data_child(arena, current, seg) {
            Some(next) => current = next,
            None => {
                return match extension_child(arena, current, seg) {
                    Some(ext) => Hit::Extension(ext),
                    None => Hit::Missing,
                }
            }
        }
    }
    Hit::Found(current)
}

fn inject(
    arena: &mut Arena,
    id: NodeId,
    target: NodeId,
    module: NodeId,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) {
    let accepted = matches!(
        arena.node(target).payload,
        NodePayload::Container(_)
            | NodePayload::List(_)
            | NodePayload::Choice(_)
            | NodePayload::Case(_)
            | NodePayload::RpcIo(_)
            | NodePayload::Notification(_)
    );
    if !accepted {
        let t = arena.node(target);
        diagnostics.push(CompileError::new(
            ErrorKind::IllegalAugment,
            at.clone(),
            format!("Cannot augment {} '{}'.", t.kind_name(), t.qname.local_name),
        ));
        settle(arena, id, Some(target), false);
        return;
    }

    let (children, body_uses) = {
        let NodePayload::Augment(a) = &arena.node(id).payload else {
            return;
        };
        (a.body.children.clone(), a.body.uses.clone())
    };

    // A node injected across a module boundary must not be mandatory;
    // it would invalidate existing data of the target module.
    let cross_module = parent_module(arena, target)
        .map(|tm| arena.node(tm).qname.namespace != arena.node(module).qname.namespace)
        .unwrap_or(false);
    if cross_module {
        if let Some(bad) = children
            .iter()
            .copied()
            .find(|&c| arena.node(c).constraints.is_mandatory())
        {
            diagnostics.push(CompileError::new(
                ErrorKind::IllegalAugment,
                at.clone(),
                format!(
                    "Cannot augment mandatory node '{}' into another module.",
                    arena.node(bad).qname.local_name
                ),
            ));
            settle(arena, id, Some(target), false);
            return;
        }
    }

    let from_uses = arena
        .node(id)
        .parent
        .map(|p| matches!(arena.node(p).payload, NodePayload::Uses(_)))
        .unwrap_or(false);

    if matches!(arena.node(target).payload, NodePayload::Choice(_)) {
        // Grouping content has no case structure to merge into a choice.
        if !body_uses.is_empty() {
            diagnostics.push(CompileError::new(
                ErrorKind::IllegalAugment,
                at.clone(),
                format!(
                    "Cannot augment choice '{}' with nodes from a grouping.",
                    arena.node(target).qname.local_name
                ),
            ));
            settle(arena, id, Some(target), false);
            return;
        }
        for child in children {
            if let Err(err) = inject_into_choice(arena, child, target, from_uses) {
                diagnostics.push(err);
            }
        }
    } else {
        for child in children {
            let injected = copy_subtree(arena, child, target, false)
                .and_then(|copy| attach_child(arena, target, copy).map(|()| copy));
            match injected {
                Ok(copy) => {
                    mark_augmenting(arena, copy);
                    if from_uses {
                        mark_added_by_uses(arena, copy);
                    }
                }
                Err(err) => diagnostics.push(err),
            }
        }
    }

    tracing::debug!(
        target = %arena.node(target).path,
        module = %arena.node(module).qname.local_name,
        "augment applied"
    );
    settle(arena, id, Some(target), false);
}

/// Case children merge directly; anything else gets a shorthand case
/// named after the node, holding it as the single child.
fn inject_into_choice(
    arena: &mut Arena,
    child: NodeId,
    choice: NodeId,
    from_uses: bool,
) -> CompileResult<()> {
    let injected = if matches!(arena.node(child).payload, NodePayload::Case(_)) {
        let copy = copy_subtree(arena, child, choice, false)?;
        attach_child(arena, choice, copy)?;
        copy
    } else {
        let (qname, source) = {
            let c = arena.node(child);
            (c.qname.clone(), c.source.clone())
        };
        let path = arena.node(choice).path.child(qname.clone());
        let case = arena.alloc(NodeBuilder::new(
            qname,
            path,
            source,
            Some(choice),
            NodePayload::Case(ChildSet::default()),
        ));
        attach_child(arena, choice, case)?;
        let copy = copy_subtree(arena, child, case, false)?;
        attach_child(arena, case, copy)?;
        case
    };
    mark_augmenting(arena, injected);
    if from_uses {
        mark_added_by_uses(arena, injected);
    }
    Ok(())
}
