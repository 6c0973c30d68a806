//! Module payloads and statement attachment.
//!
//! A module root is a [`NodeBuilder`] like any other node; the
//! [`ModulePayload`] carries the header statements plus the top-level
//! collections. Attachment goes through [`attach_child`] and friends
//! so that every insertion point runs the same legality and duplicate
//! checks, whether the child comes from the builder API, a grouping
//! expansion, or an augment.

use std::sync::Arc;

use indexmap::IndexMap;

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::foundation::{QName, Revision, SourceRef};
use arbor_model::model::Module;

use super::arena::{Arena, NodeId};
use super::node::{ChildSet, NodeBuilder, NodePayload};

/// An import of another module, keyed in the payload by its prefix.
#[derive(Debug, Clone)]
pub struct Import {
    /// Name of the imported module.
    pub module_name: String,
    /// Prefix the importing module uses for it.
    pub prefix: String,
    /// Requested revision, if pinned.
    pub revision: Option<Revision>,
    /// Line of the import statement.
    pub line: usize,
}

/// An include of a submodule.
#[derive(Debug, Clone)]
pub struct Include {
    /// Name of the included submodule.
    pub name: String,
    /// Line of the include statement.
    pub line: usize,
}

/// The parent-module declaration of a submodule.
#[derive(Debug, Clone)]
pub struct BelongsTo {
    /// Name of the owning module.
    pub module: String,
    /// Prefix the submodule uses for the owning module.
    pub prefix: String,
}

/// Direction of an operation payload container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcIoDirection {
    /// The request subtree.
    Input,
    /// The reply subtree.
    Output,
}

impl RpcIoDirection {
    /// Local name of the container.
    pub fn name(self) -> &'static str {
        match self {
            RpcIoDirection::Input => "input",
            RpcIoDirection::Output => "output",
        }
    }
}

/// Header statements and top-level collections of a module root.
///
/// The root node's qname is the source of truth for name, namespace
/// and revision. Submodules carry a placeholder namespace until the
/// merge pass rebases them onto the owning module.
#[derive(Debug)]
pub struct ModulePayload {
    /// Prefix the module declares for itself.
    pub prefix: String,
    /// Declared language version, if any.
    pub language_version: Option<String>,
    /// Owning organization.
    pub organization: Option<String>,
    /// Contact information.
    pub contact: Option<String>,
    /// Set for submodules only.
    pub belongs_to: Option<BelongsTo>,
    /// Imports keyed by prefix, in declaration order.
    pub imports: IndexMap<String, Import>,
    /// Included submodules.
    pub includes: Vec<Include>,
    /// Top-level data nodes, typedefs, groupings and uses.
    pub body: ChildSet,
    /// Operations.
    pub rpcs: Vec<NodeId>,
    /// Events.
    pub notifications: Vec<NodeId>,
    /// Hierarchy members.
    pub identities: Vec<NodeId>,
    /// Extension keyword declarations.
    pub extensions: Vec<NodeId>,
    /// Conditional-capability flags.
    pub features: Vec<NodeId>,
    /// Implementation deviation records.
    pub deviations: Vec<NodeId>,
    /// Module-level augments.
    pub augments: Vec<NodeId>,
    /// True once all included submodules have been merged in.
    pub merged: bool,
    /// Memoized build result.
    pub built: Option<Arc<Module>>,
}

impl ModulePayload {
    /// Payload with the given self-prefix and nothing declared yet.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            language_version: None,
            organization: None,
            contact: None,
            belongs_to: None,
            imports: IndexMap::new(),
            includes: Vec::new(),
            body: ChildSet::default(),
            rpcs: Vec::new(),
            notifications: Vec::new(),
            identities: Vec::new(),
            extensions: Vec::new(),
            features: Vec::new(),
            deviations: Vec::new(),
            augments: Vec::new(),
            merged: false,
            built: None,
        }
    }

    /// True for submodule roots.
    pub fn is_submodule(&self) -> bool {
        self.belongs_to.is_some()
    }

    /// The import declared under `prefix`, if any.
    pub fn import_for_prefix(&self, prefix: &str) -> Option<&Import> {
        self.imports.get(prefix)
    }
}

pub(crate) fn duplicate_error(
    kind: &str,
    name: &str,
    prior: &SourceRef,
    at: SourceRef,
) -> CompileError {
    CompileError::new(
        ErrorKind::DuplicateNode,
        at,
        format!(
            "{kind} with same name '{name}' already declared at line {}.",
            prior.line
        ),
    )
    .with_label(prior.clone(), "first declared here".to_string())
}

pub(crate) fn illegal_parent(parent: &NodeBuilder, child: &NodeBuilder) -> CompileError {
    CompileError::new(
        ErrorKind::IllegalParent,
        child.source.clone(),
        format!(
            "Cannot add {} '{}' under {} '{}'.",
            child.kind_name(),
            child.qname.local_name,
            parent.kind_name(),
            parent.qname.local_name
        ),
    )
}

/// Attach a data node (or case) under `parent`.
///
/// Checks that the parent kind can hold the child kind, that no
/// sibling of any kind already uses the same qualified name, and sets
/// the child's parent link. Module parents also hold operations and
/// events in the same top-level namespace, so those count as siblings.
pub fn attach_child(arena: &mut Arena, parent: NodeId, child: NodeId) -> CompileResult<()> {
    let (child_qname, child_is_case) = {
        let c = arena.node(child);
        (c.qname.clone(), matches!(c.payload, NodePayload::Case(_)))
    };

    // Legality and the sibling set both depend on the parent kind.
    let siblings: Vec<NodeId> = {
        let p = arena.node(parent);
        match &p.payload {
            NodePayload::Module(m) => {
                let mut ids = m.body.children.clone();
                ids.extend_from_slice(&m.rpcs);
                ids.extend_from_slice(&m.notifications);
                ids
            }
            NodePayload::Container(c) => c.body.children.clone(),
            NodePayload::List(l) => l.body.children.clone(),
            NodePayload::Case(cs)
            | NodePayload::Grouping(cs)
            | NodePayload::RpcIo(cs)
            | NodePayload::Notification(cs) => cs.children.clone(),
            NodePayload::Augment(a) => a.body.children.clone(),
            NodePayload::Choice(c) => {
                if !child_is_case {
                    return Err(illegal_parent(p, arena.node(child)));
                }
                c.cases.clone()
            }
            _ => return Err(illegal_parent(p, arena.node(child))),
        }
    };

    for sib in siblings {
        if arena.node(sib).qname == child_qname {
            let (kind, prior) = {
                let s = arena.node(sib);
                (arena.node(child).kind_name(), s.source.clone())
            };
            let at = arena.node(child).source.clone();
            return Err(duplicate_error(kind, &child_qname.local_name, &prior, at));
        }
    }

    match &mut arena.node_mut(parent).payload {
        NodePayload::Choice(c) => c.cases.push(child),
        payload => {
            if let Some(cs) = payload.child_set_mut() {
                cs.children.push(child);
            }
        }
    }
    arena.node_mut(child).parent = Some(parent);
    Ok(())
}

/// Attach a typedef to the scope of `parent`.
pub fn attach_typedef(arena: &mut Arena, parent: NodeId, typedef: NodeId) -> CompileResult<()> {
    let name = arena.node(typedef).qname.clone();
    let existing: Vec<NodeId> = {
        let p = arena.node(parent);
        match &p.payload {
            NodePayload::Module(m) => m.body.typedefs.clone(),
            NodePayload::Container(c) => c.body.typedefs.clone(),
            NodePayload::List(l) => l.body.typedefs.clone(),
            NodePayload::Grouping(cs) | NodePayload::RpcIo(cs) | NodePayload::Notification(cs) => {
                cs.typedefs.clone()
            }
            NodePayload::Rpc(r) => r.typedefs.clone(),
            _ => return Err(illegal_parent(p, arena.node(typedef))),
        }
    };
    for prior in existing {
        if arena.node(prior).qname == name {
            let prior_src = arena.node(prior).source.clone();
            let at = arena.node(typedef).source.clone();
            return Err(duplicate_error("typedef", &name.local_name, &prior_src, at));
        }
    }

    match &mut arena.node_mut(parent).payload {
        NodePayload::Rpc(r) => r.typedefs.push(typedef),
        payload => {
            if let Some(cs) = payload.child_set_mut() {
                cs.typedefs.push(typedef);
            }
        }
    }
    arena.node_mut(typedef).parent = Some(parent);
    Ok(())
}

/// Attach a grouping to the scope of `parent`.
pub fn attach_grouping(arena: &mut Arena, parent: NodeId, grouping: NodeId) -> CompileResult<()> {
    let name = arena.node(grouping).qname.clone();
    let existing: Vec<NodeId> = {
        let p = arena.node(parent);
        match &p.payload {
            NodePayload::Module(m) => m.body.groupings.clone(),
            NodePayload::Container(c) => c.body.groupings.clone(),
            NodePayload::List(l) => l.body.groupings.clone(),
            NodePayload::Grouping(cs) | NodePayload::RpcIo(cs) | NodePayload::Notification(cs) => {
                cs.groupings.clone()
            }
            NodePayload::Rpc(r) => r.groupings.clone(),
            _ => return Err(illegal_parent(p, arena.node(grouping))),
        }
    };
    for prior in existing {
        if arena.node(prior).qname == name {
            let prior_src = arena.node(prior).source.clone();
            let at = arena.node(grouping).source.clone();
            return Err(duplicate_error(
                "grouping",
                &name.local_name,
                &prior_src,
                at,
            ));
        }
    }

    match &mut arena.node_mut(parent).payload {
        NodePayload::Rpc(r) => r.groupings.push(grouping),
        payload => {
            if let Some(cs) = payload.child_set_mut() {
                cs.groupings.push(grouping);
            }
        }
    }
    arena.node_mut(grouping).parent = Some(parent);
    Ok(())
}

/// The input or output container of an operation, created on first
/// reference.
///
/// Declaring `input {}` in a module and augmenting `rpc-name/input`
/// from another both land here, so both see the same node.
pub fn ensure_rpc_io(
    arena: &mut Arena,
    rpc: NodeId,
    direction: RpcIoDirection,
    line: usize,
) -> NodeId {
    if let NodePayload::Rpc(r) = &arena.node(rpc).payload {
        let existing = match direction {
            RpcIoDirection::Input => r.input,
            RpcIoDirection::Output => r.output,
        };
        if let Some(id) = existing {
            return id;
        }
    }

    let (qname, path, module_name) = {
        let r = arena.node(rpc);
        let qname = QName::new(r.qname.namespace.clone(), r.qname.revision, direction.name());
        let path = r.path.child(qname.clone());
        (qname, path, r.source.module.clone())
    };
    let io = arena.alloc(NodeBuilder::new(
        qname,
        path,
        SourceRef::new(module_name, line),
        Some(rpc),
        NodePayload::RpcIo(ChildSet::default()),
    ));
    if let NodePayload::Rpc(r) = &mut arena.node_mut(rpc).payload {
        match direction {
            RpcIoDirection::Input => r.input = Some(io),
            RpcIoDirection::Output => r.output = Some(io),
        }
    }
    io
}

#[cfg(test)]
mod tests {
    use super::*;
    use arbor_model::foundation::{Namespace, QName, SchemaPath};

    fn new_arena_with_module() -> (Arena, NodeId) {
        let mut arena = Arena::new();
        let qname = QName::new(Namespace::new("urn:test"), None, "test");
        let module = arena.alloc(NodeBuilder::new(
            qname.clone(),
            SchemaPath::root(),
            SourceRef::new("test", 1),
            None,
            NodePayload::Module(Box::new(ModulePayload::new("t"))),
        ));
        (arena, module)
    }

    fn leaf(arena: &mut Arena, module: NodeId, name: &str, line: usize) -> NodeId {
        let qname = {
            let m = arena.node(module);
            QName::new(m.qname.namespace.clone(), m.qname.revision, name)
        };
        let path = SchemaPath::root().child(qname.clone());
        arena.alloc(NodeBuilder::new(
            qname,
            path,
            SourceRef::new("test", line),
            None,
            NodePayload::Leaf(super::super::node::LeafPayload {
                type_state: crate::graph::typestate::TypeState::Unresolved(
                    crate::graph::typestate::TypeRef::named("string", line),
                ),
                default: None,
                units: None,
            }),
        ))
    }

    #[test]
    fn attach_sets_parent_and_orders_children() {
        let (mut arena, module) = new_arena_with_module();
        let a = leaf(&mut arena, module, "a", 2);
        let b = leaf(&mut arena, module, "b", 3);
        attach_child(&mut arena, module, a).unwrap();
        attach_child(&mut arena, module, b).unwrap();

        assert_eq!(arena.node(a).parent, Some(module));
        if let NodePayload::Module(m) = &arena.node(module).payload {
            assert_eq!(m.body.children, vec![a, b]);
        } else {
            panic!("module payload expected");
        }
    }

    #[test]
    fn duplicate_sibling_name_is_rejected() {
        let (mut arena, module) = new_arena_with_module();
        let first = leaf(&mut arena, module, "mtu", 2);
        let second = leaf(&mut arena, module, "mtu", 9);
        attach_child(&mut arena, module, first).unwrap();

        let err = attach_child(&mut arena, module, second).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateNode);
        assert!(err.message.contains("'mtu'"));
        assert!(err.message.contains("line 2"));
    }

    #[test]
    fn choice_rejects_non_case_children() {
        let (mut arena, module) = new_arena_with_module();
        let choice_qname = {
            let m = arena.node(module);
            QName::new(m.qname.namespace.clone(), m.qname.revision, "proto")
        };
        let choice = arena.alloc(NodeBuilder::new(
            choice_qname.clone(),
            SchemaPath::root().child(choice_qname),
            SourceRef::new("test", 2),
            None,
            NodePayload::Choice(super::super::node::ChoicePayload::default()),
        ));
        attach_child(&mut arena, module, choice).unwrap();

        let stray = leaf(&mut arena, module, "oops", 3);
        let err = attach_child(&mut arena, choice, stray).unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalParent);
    }

    #[test]
    fn rpc_io_is_created_once() {
        let (mut arena, module) = new_arena_with_module();
        let rpc_qname = {
            let m = arena.node(module);
            QName::new(m.qname.namespace.clone(), m.qname.revision, "reset")
        };
        let rpc = arena.alloc(NodeBuilder::new(
            rpc_qname.clone(),
            SchemaPath::root().child(rpc_qname),
            SourceRef::new("test", 4),
            Some(module),
            NodePayload::Rpc(super::super::node::RpcPayload::default()),
        ));

        let first = ensure_rpc_io(&mut arena, rpc, RpcIoDirection::Input, 5);
        let again = ensure_rpc_io(&mut arena, rpc, RpcIoDirection::Input, 7);
        assert_eq!(first, again);
        assert_eq!(arena.node(first).qname.local_name, "input");
        assert_eq!(arena.node(first).parent, Some(rpc));

        let output = ensure_rpc_io(&mut arena, rpc, RpcIoDirection::Output, 6);
        assert_ne!(first, output);
    }
}
