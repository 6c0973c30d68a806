//! Refine application.
//!
//! A refine overlays statement properties onto one node of the
//! expanded grouping content: defaults, mandatory flags, element
//! bounds, guards, documentation. Refines run after their uses has
//! expanded and are consumed in the process, so a second round never
//! re-applies them.
//!
//! A refine whose target does not exist in the expanded content is a
//! warning, not an error: the grouping author may have removed the
//! node, and dropping the overlay keeps the rest of the module usable.
//! Applying a property to a node kind that cannot carry it is fatal.

use arbor_model::error::{CompileError, ErrorKind};
use arbor_model::foundation::{QName, SourceRef};

use crate::graph::arena::{Arena, NodeId};
use crate::graph::node::{NodeBuilder, NodePayload, RawPath, RefineSpec, UnknownPayload};
use crate::graph::walk::{find_data_child, parent_module};
use crate::graph::PrefixedName;

/// Apply and consume the refines of every expanded uses.
pub fn run(arena: &mut Arena, diagnostics: &mut Vec<CompileError>) {
    let ready: Vec<NodeId> = arena
        .ids()
        .filter(|&id| {
            matches!(
                &arena.node(id).payload,
                NodePayload::Uses(u) if u.expanded && !u.refines.is_empty()
            )
        })
        .collect();

    for uses in ready {
        let refines = match &mut arena.node_mut(uses).payload {
            NodePayload::Uses(u) => std::mem::take(&mut u.refines),
            _ => continue,
        };
        for spec in refines {
            apply(arena, uses, &spec, diagnostics);
        }
    }
}

fn apply(arena: &mut Arena, uses: NodeId, spec: &RefineSpec, diagnostics: &mut Vec<CompileError>) {
    let at = SourceRef::new(arena.node(uses).source.module.clone(), spec.line);
    let target = match locate(arena, uses, spec, &at, diagnostics) {
        Ok(Some(target)) => target,
        Ok(None) => {
            tracing::warn!(target = %spec.target, "refine target not found; overlay dropped");
            diagnostics.push(CompileError::warning(
                ErrorKind::RefineTargetNotFound,
                at,
                format!("Refine target '{}' not found.", spec.target),
            ));
            return;
        }
        Err(err) => {
            diagnostics.push(err);
            return;
        }
    };

    if let Some(default) = &spec.default {
        match &mut arena.node_mut(target).payload {
            NodePayload::Leaf(l) => l.default = Some(default.clone()),
            _ => {
                diagnostics.push(illegal(arena.node(target), "default", &at));
                return;
            }
        }
    }
    if let Some(mandatory) = spec.mandatory {
        match arena.node(target).payload {
            NodePayload::Leaf(_) | NodePayload::Choice(_) | NodePayload::AnyXml => {
                arena.node_mut(target).constraints.set_mandatory(mandatory);
            }
            _ => {
                diagnostics.push(illegal(arena.node(target), "mandatory", &at));
                return;
            }
        }
    }
    if let Some(presence) = spec.presence {
        match &mut arena.node_mut(target).payload {
            NodePayload::Container(c) => c.presence = presence,
            _ => {
                diagnostics.push(illegal(arena.node(target), "presence", &at));
                return;
            }
        }
    }
    if spec.min_elements.is_some() || spec.max_elements.is_some() {
        if !matches!(
            arena.node(target).payload,
            NodePayload::List(_) | NodePayload::LeafList(_)
        ) {
            let attr = if spec.min_elements.is_some() {
                "min-elements"
            } else {
                "max-elements"
            };
            diagnostics.push(illegal(arena.node(target), attr, &at));
            return;
        }
        let constraints = &mut arena.node_mut(target).constraints;
        if let Some(min) = spec.min_elements {
            constraints.set_min_elements(min);
        }
        if let Some(max) = spec.max_elements {
            constraints.set_max_elements(max);
        }
    }
    if !spec.musts.is_empty() {
        match arena.node(target).payload {
            NodePayload::Leaf(_)
            | NodePayload::LeafList(_)
            | NodePayload::Container(_)
            | NodePayload::List(_)
            | NodePayload::AnyXml => {
                let constraints = &mut arena.node_mut(target).constraints;
                for must in &spec.musts {
                    constraints.add_must(must.clone());
                }
            }
            _ => {
                diagnostics.push(illegal(arena.node(target), "must", &at));
                return;
            }
        }
    }
    if let Some(default_case) = &spec.default_case {
        match &mut arena.node_mut(target).payload {
            NodePayload::Choice(c) => c.default_case = Some(default_case.clone()),
            _ => {
                diagnostics.push(illegal(arena.node(target), "default", &at));
                return;
            }
        }
    }

    // Documentation and config apply to any kind.
    {
        let node = arena.node_mut(target);
        if let Some(description) = &spec.description {
            node.description = Some(description.clone());
        }
        if let Some(reference) = &spec.reference {
            node.reference = Some(reference.clone());
        }
        if let Some(config) = spec.config {
            node.config = Some(config);
        }
    }

    for unknown in &spec.unknown_nodes {
        let Some(keyword) = PrefixedName::parse(&unknown.keyword) else {
            diagnostics.push(CompileError::new(
                ErrorKind::InvalidPath,
                SourceRef::new(at.module.clone(), unknown.line),
                format!("Invalid extension keyword '{}'.", unknown.keyword),
            ));
            continue;
        };
        let (qname, path, source) = {
            let t = arena.node(target);
            let qname = QName::new(t.qname.namespace.clone(), t.qname.revision, &keyword.name);
            (
                qname.clone(),
                t.path.child(qname),
                SourceRef::new(at.module.clone(), unknown.line),
            )
        };
        let id = arena.alloc(NodeBuilder::new(
            qname,
            path,
            source,
            Some(target),
            NodePayload::Unknown(UnknownPayload {
                keyword,
                node_type: None,
                argument: unknown.argument.clone(),
                extension: None,
            }),
        ));
        arena.node_mut(target).unknown_nodes.push(id);
    }
}

/// Walk the relative target path from the node holding the uses.
fn locate(
    arena: &mut Arena,
    uses: NodeId,
    spec: &RefineSpec,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) -> Result<Option<NodeId>, CompileError> {
    let raw = RawPath::parse(&spec.target, at)?;
    if raw.absolute {
        return Err(CompileError::new(
            ErrorKind::InvalidPath,
            at.clone(),
            format!("Refine target '{}' must be relative.", spec.target),
        ));
    }
    let Some(module) = parent_module(arena, uses) else {
        return Ok(None);
    };
    let (namespace, revision) = {
        let m = arena.node(module);
        (m.qname.namespace.clone(), m.qname.revision)
    };
    for seg in &raw.segments {
        if seg.prefix.is_some() {
            diagnostics.push(CompileError::warning(
                ErrorKind::RefineTargetNotFound,
                at.clone(),
                format!("Refine target '{}' uses a prefix; grouping content is local.", spec.target),
            ));
            return Ok(None);
        }
    }

    let Some(mut current) = arena.node(uses).parent else {
        return Ok(None);
    };
    for seg in &raw.segments {
        let qname = QName::new(namespace.clone(), revision, &seg.name);
        match find_data_child(arena, current, &qname) {
            Some(next) => current = next,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

fn illegal(target: &NodeBuilder, attr: &str, at: &SourceRef) -> CompileError {
    CompileError::new(
        ErrorKind::IllegalRefine,
        at.clone(),
        format!("Can not refine '{attr}' for '{}'.", target.payload.kind_name()),
    )
}
