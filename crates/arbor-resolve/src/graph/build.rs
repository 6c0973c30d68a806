//! Finalizing builder nodes into the immutable model.
//!
//! `build` here is the one-way conversion from the mutable statement
//! graph to the `arbor-model` types. Every node is built exactly once:
//! the result is memoized on the builder and later calls return clones
//! of the same `Arc` handles, which is what makes the finished model
//! reference-stable.
//!
//! Building assumes resolution is complete. A type that is still a
//! textual reference or a typedef without its memoized form is a
//! pipeline bug and surfaces as an internal error, never a panic.

use std::sync::{Arc, Weak};

use indexmap::IndexMap;

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::model::{
    AnyXml, Augment, Case, Choice, Container, Deviation, Extension, Feature, Grouping, Identity,
    Import, Leaf, LeafList, List, Module, Notification, Rpc, SchemaNode, UnknownNode,
};
use arbor_model::types::Typedef;

use super::arena::{Arena, NodeId};
use super::node::NodePayload;

/// Memoized build result of a non-module builder node.
#[derive(Debug, Clone)]
pub enum Built {
    /// A data node (container, leaf, list, choice, case, anyxml).
    Node(SchemaNode),
    /// A reusable template.
    Grouping(Arc<Grouping>),
    /// A named type derivation.
    Typedef(Arc<Typedef>),
    /// An operation.
    Rpc(Arc<Rpc>),
    /// An event.
    Notification(Arc<Notification>),
    /// A hierarchy member.
    Identity(Arc<Identity>),
    /// An extension keyword declaration.
    Extension(Arc<Extension>),
    /// A statement using an extension keyword.
    Unknown(UnknownNode),
}

fn internal(arena: &Arena, id: NodeId, message: impl Into<String>) -> CompileError {
    CompileError::new(
        ErrorKind::Internal,
        arena.node(id).source.clone(),
        message.into(),
    )
}

/// Build a builder node into its immutable form.
///
/// `inherited_config` is the effective configuration flag of the parent;
/// a node without its own `config` statement takes it over. The first
/// call freezes the node; the memoized handles are returned afterwards
/// no matter what `inherited_config` says, because a built node must
/// never change.
pub fn build_node(arena: &mut Arena, id: NodeId, inherited_config: bool) -> CompileResult<Built> {
    if let Some(built) = &arena.node(id).built {
        return Ok(built.clone());
    }
    let config = arena.node(id).config.unwrap_or(inherited_config);
    let built = match &arena.node(id).payload {
        NodePayload::Container(_) | NodePayload::RpcIo(_) => build_container(arena, id, config)?,
        NodePayload::Leaf(_) => build_leaf(arena, id, config)?,
        NodePayload::LeafList(_) => build_leaf_list(arena, id, config)?,
        NodePayload::List(_) => build_list(arena, id, config)?,
        NodePayload::Choice(_) => build_choice(arena, id, config)?,
        NodePayload::Case(_) => build_case(arena, id, config)?,
        NodePayload::AnyXml => build_anyxml(arena, id, config)?,
        NodePayload::Grouping(_) => Built::Grouping(build_grouping(arena, id)?),
        NodePayload::Typedef(_) => Built::Typedef(built_typedef(arena, id)?),
        NodePayload::Rpc(_) => build_rpc(arena, id)?,
        NodePayload::Notification(_) => build_notification(arena, id)?,
        NodePayload::Identity(_) => Built::Identity(build_identity(arena, id)?),
        NodePayload::Extension(_) => Built::Extension(build_extension(arena, id)?),
        NodePayload::Unknown(_) => Built::Unknown(build_unknown(arena, id)?),
        NodePayload::Module(_) => {
            return Err(internal(arena, id, "modules are built through build_module"))
        }
        NodePayload::Uses(_)
        | NodePayload::Augment(_)
        | NodePayload::Feature
        | NodePayload::Deviation(_) => {
            let kind = arena.node(id).kind_name();
            return Err(internal(
                arena,
                id,
                format!("{kind} statements have no standalone built form"),
            ));
        }
    };
    arena.node_mut(id).built = Some(built.clone());
    Ok(built)
}

fn build_children(
    arena: &mut Arena,
    ids: &[NodeId],
    config: bool,
) -> CompileResult<Vec<SchemaNode>> {
    let mut out = Vec::with_capacity(ids.len());
    for &id in ids {
        match build_node(arena, id, config)? {
            Built::Node(node) => out.push(node),
            _ => {
                let kind = arena.node(id).kind_name();
                return Err(internal(
                    arena,
                    id,
                    format!("{kind} found in a data child list"),
                ));
            }
        }
    }
    Ok(out)
}

/// The memoized typedef form, installed by the type resolution pass.
pub fn built_typedef(arena: &Arena, id: NodeId) -> CompileResult<Arc<Typedef>> {
    match &arena.node(id).built {
        Some(Built::Typedef(arc)) => Ok(arc.clone()),
        _ => Err(internal(
            arena,
            id,
            format!(
                "typedef '{}' built before its type was resolved",
                arena.node(id).qname.local_name
            ),
        )),
    }
}

fn built_typedefs(arena: &Arena, ids: &[NodeId]) -> CompileResult<Vec<Arc<Typedef>>> {
    ids.iter().map(|&id| built_typedef(arena, id)).collect()
}

fn build_groupings(arena: &mut Arena, ids: &[NodeId]) -> CompileResult<Vec<Arc<Grouping>>> {
    ids.iter()
        .map(|&id| build_grouping(arena, id))
        .collect()
}

fn build_unknowns(arena: &mut Arena, owner: NodeId) -> CompileResult<Vec<UnknownNode>> {
    let ids = arena.node(owner).unknown_nodes.clone();
    ids.into_iter()
        .map(|id| build_unknown(arena, id))
        .collect()
}

fn build_container(arena: &mut Arena, id: NodeId, config: bool) -> CompileResult<Built> {
    let (child_ids, typedef_ids, grouping_ids, presence) = match &arena.node(id).payload {
        NodePayload::Container(c) => (
            c.body.children.clone(),
            c.body.typedefs.clone(),
            c.body.groupings.clone(),
            c.presence,
        ),
        NodePayload::RpcIo(cs) => (
            cs.children.clone(),
            cs.typedefs.clone(),
            cs.groupings.clone(),
            false,
        ),
        _ => return Err(internal(arena, id, "container payload expected")),
    };
    let children = build_children(arena, &child_ids, config)?;
    let typedefs = built_typedefs(arena, &typedef_ids)?;
    let groupings = build_groupings(arena, &grouping_ids)?;
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    Ok(Built::Node(SchemaNode::Container(Arc::new(Container {
        qname: n.qname.clone(),
        path: n.path.clone(),
        presence,
        config,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        constraints: n.constraints.build(),
        children,
        typedefs,
        groupings,
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    }))))
}

fn build_leaf(arena: &mut Arena, id: NodeId, config: bool) -> CompileResult<Built> {
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    let NodePayload::Leaf(payload) = &n.payload else {
        return Err(internal(arena, id, "leaf payload expected"));
    };
    let leaf_type = payload.type_state.resolved().cloned().ok_or_else(|| {
        internal(
            arena,
            id,
            format!("leaf '{}' built with an unresolved type", n.qname.local_name),
        )
    })?;
    Ok(Built::Node(SchemaNode::Leaf(Arc::new(Leaf {
        qname: n.qname.clone(),
        path: n.path.clone(),
        leaf_type,
        default: payload.default.clone(),
        units: payload.units.clone(),
        config,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        constraints: n.constraints.build(),
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    }))))
}

fn build_leaf_list(arena: &mut Arena, id: NodeId, config: bool) -> CompileResult<Built> {
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    let NodePayload::LeafList(payload) = &n.payload else {
        return Err(internal(arena, id, "leaf-list payload expected"));
    };
    let element_type = payload.type_state.resolved().cloned().ok_or_else(|| {
        internal(
            arena,
            id,
            format!(
                "leaf-list '{}' built with an unresolved type",
                n.qname.local_name
            ),
        )
    })?;
    Ok(Built::Node(SchemaNode::LeafList(Arc::new(LeafList {
        qname: n.qname.clone(),
        path: n.path.clone(),
        element_type,
        user_ordered: payload.user_ordered,
        config,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        constraints: n.constraints.build(),
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    }))))
}

fn build_list(arena: &mut Arena, id: NodeId, config: bool) -> CompileResult<Built> {
    let (child_ids, typedef_ids, grouping_ids, keys, user_ordered) =
        match &arena.node(id).payload {
            NodePayload::List(l) => (
                l.body.children.clone(),
                l.body.typedefs.clone(),
                l.body.groupings.clone(),
                l.keys.clone(),
                l.user_ordered,
            ),
            _ => return Err(internal(arena, id, "list payload expected")),
        };
    let children = build_children(arena, &child_ids, config)?;
    let typedefs = built_typedefs(arena, &typedef_ids)?;
    let groupings = build_groupings(arena, &grouping_ids)?;
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    Ok(Built::Node(SchemaNode::List(Arc::new(List {
        qname: n.qname.clone(),
        path: n.path.clone(),
        keys,
        user_ordered,
        config,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        constraints: n.constraints.build(),
        children,
        typedefs,
        groupings,
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    }))))
}

fn build_choice(arena: &mut Arena, id: NodeId, config: bool) -> CompileResult<Built> {
    let (case_ids, default_case) = match &arena.node(id).payload {
        NodePayload::Choice(c) => (c.cases.clone(), c.default_case.clone()),
        _ => return Err(internal(arena, id, "choice payload expected")),
    };
    let case_nodes = build_children(arena, &case_ids, config)?;
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    Ok(Built::Node(SchemaNode::Choice(Arc::new(Choice {
        qname: n.qname.clone(),
        path: n.path.clone(),
        case_nodes,
        default_case,
        config,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        constraints: n.constraints.build(),
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    }))))
}

fn build_case(arena: &mut Arena, id: NodeId, config: bool) -> CompileResult<Built> {
    let child_ids = match &arena.node(id).payload {
        NodePayload::Case(cs) => cs.children.clone(),
        _ => return Err(internal(arena, id, "case payload expected")),
    };
    let children = build_children(arena, &child_ids, config)?;
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    Ok(Built::Node(SchemaNode::Case(Arc::new(Case {
        qname: n.qname.clone(),
        path: n.path.clone(),
        config,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        constraints: n.constraints.build(),
        children,
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    }))))
}

fn build_anyxml(arena: &mut Arena, id: NodeId, config: bool) -> CompileResult<Built> {
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    Ok(Built::Node(SchemaNode::AnyXml(Arc::new(AnyXml {
        qname: n.qname.clone(),
        path: n.path.clone(),
        config,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        constraints: n.constraints.build(),
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    }))))
}

fn build_grouping(arena: &mut Arena, id: NodeId) -> CompileResult<Arc<Grouping>> {
    if let Some(Built::Grouping(arc)) = &arena.node(id).built {
        return Ok(arc.clone());
    }
    let (child_ids, typedef_ids, grouping_ids) = match &arena.node(id).payload {
        NodePayload::Grouping(cs) => (
            cs.children.clone(),
            cs.typedefs.clone(),
            cs.groupings.clone(),
        ),
        _ => return Err(internal(arena, id, "grouping payload expected")),
    };
    // Template children never appear in data trees, so config is moot;
    // the copies instantiated at each uses site carry the real flag.
    let children = build_children(arena, &child_ids, true)?;
    let typedefs = built_typedefs(arena, &typedef_ids)?;
    let groupings = build_groupings(arena, &grouping_ids)?;
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    let arc = Arc::new(Grouping {
        qname: n.qname.clone(),
        path: n.path.clone(),
        children,
        typedefs,
        groupings,
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    });
    arena.node_mut(id).built = Some(Built::Grouping(arc.clone()));
    Ok(arc)
}

fn build_rpc(arena: &mut Arena, id: NodeId) -> CompileResult<Built> {
    let (input_id, output_id, typedef_ids, grouping_ids) = match &arena.node(id).payload {
        NodePayload::Rpc(r) => (r.input, r.output, r.typedefs.clone(), r.groupings.clone()),
        _ => return Err(internal(arena, id, "rpc payload expected")),
    };
    let input = match input_id {
        Some(io) => Some(build_io_container(arena, io)?),
        None => None,
    };
    let output = match output_id {
        Some(io) => Some(build_io_container(arena, io)?),
        None => None,
    };
    let typedefs = built_typedefs(arena, &typedef_ids)?;
    let groupings = build_groupings(arena, &grouping_ids)?;
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    Ok(Built::Rpc(Arc::new(Rpc {
        qname: n.qname.clone(),
        path: n.path.clone(),
        input,
        output,
        typedefs,
        groupings,
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    })))
}

fn build_io_container(arena: &mut Arena, id: NodeId) -> CompileResult<Arc<Container>> {
    match build_node(arena, id, true)? {
        Built::Node(SchemaNode::Container(arc)) => Ok(arc),
        _ => Err(internal(arena, id, "operation payload is not a container")),
    }
}

fn build_notification(arena: &mut Arena, id: NodeId) -> CompileResult<Built> {
    let (child_ids, typedef_ids, grouping_ids) = match &arena.node(id).payload {
        NodePayload::Notification(cs) => (
            cs.children.clone(),
            cs.typedefs.clone(),
            cs.groupings.clone(),
        ),
        _ => return Err(internal(arena, id, "notification payload expected")),
    };
    let children = build_children(arena, &child_ids, true)?;
    let typedefs = built_typedefs(arena, &typedef_ids)?;
    let groupings = build_groupings(arena, &grouping_ids)?;
    let unknown_nodes = build_unknowns(arena, id)?;
    let n = arena.node(id);
    Ok(Built::Notification(Arc::new(Notification {
        qname: n.qname.clone(),
        path: n.path.clone(),
        children,
        typedefs,
        groupings,
        unknown_nodes,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    })))
}

/// Build an identity, base first.
///
/// The base link is an owning `Arc` set at construction; building a
/// derived identity therefore forces its whole base chain. The downward
/// derived sets are installed afterwards by
/// [`link_derived_identities`], once every identity of the batch exists.
pub fn build_identity(arena: &mut Arena, id: NodeId) -> CompileResult<Arc<Identity>> {
    if let Some(Built::Identity(arc)) = &arena.node(id).built {
        return Ok(arc.clone());
    }
    let base_id = match &arena.node(id).payload {
        NodePayload::Identity(p) => {
            if p.base_ref.is_some() && p.base.is_none() {
                return Err(internal(
                    arena,
                    id,
                    format!(
                        "identity '{}' built before its base was resolved",
                        arena.node(id).qname.local_name
                    ),
                ));
            }
            p.base
        }
        _ => return Err(internal(arena, id, "identity payload expected")),
    };
    let base = match base_id {
        Some(b) => Some(build_identity(arena, b)?),
        None => None,
    };
    let n = arena.node(id);
    let arc = Arc::new(Identity::new(
        n.qname.clone(),
        base,
        n.description.clone(),
        n.reference.clone(),
        n.status,
    ));
    arena.node_mut(id).built = Some(Built::Identity(arc.clone()));
    Ok(arc)
}

/// Install every identity's derived set.
///
/// Must run after all modules of the batch are built: the sets are
/// write-once and only the full batch knows all derivations.
pub fn link_derived_identities(arena: &Arena) {
    let mut derived: IndexMap<NodeId, Vec<Weak<Identity>>> = IndexMap::new();
    for id in arena.ids() {
        if let NodePayload::Identity(p) = &arena.node(id).payload {
            if let (Some(base), Some(Built::Identity(arc))) = (p.base, &arena.node(id).built) {
                derived.entry(base).or_default().push(Arc::downgrade(arc));
            }
        }
    }
    for (base, list) in derived {
        if let Some(Built::Identity(arc)) = &arena.node(base).built {
            arc.link_derived(list);
        }
    }
}

fn build_extension(arena: &mut Arena, id: NodeId) -> CompileResult<Arc<Extension>> {
    if let Some(Built::Extension(arc)) = &arena.node(id).built {
        return Ok(arc.clone());
    }
    let n = arena.node(id);
    let NodePayload::Extension(payload) = &n.payload else {
        return Err(internal(arena, id, "extension payload expected"));
    };
    let arc = Arc::new(Extension {
        qname: n.qname.clone(),
        argument: payload.argument.clone(),
        yin_element: payload.yin_element,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    });
    arena.node_mut(id).built = Some(Built::Extension(arc.clone()));
    Ok(arc)
}

fn build_unknown(arena: &mut Arena, id: NodeId) -> CompileResult<UnknownNode> {
    if let Some(Built::Unknown(node)) = &arena.node(id).built {
        return Ok(node.clone());
    }
    let extension_id = match &arena.node(id).payload {
        NodePayload::Unknown(p) => p.extension,
        _ => return Err(internal(arena, id, "unknown-node payload expected")),
    };
    let extension = match extension_id {
        Some(e) => Some(build_extension(arena, e)?),
        None => None,
    };
    let n = arena.node(id);
    let NodePayload::Unknown(payload) = &n.payload else {
        return Err(internal(arena, id, "unknown-node payload expected"));
    };
    let node = UnknownNode {
        qname: n.qname.clone(),
        path: n.path.clone(),
        node_type: payload.node_type.clone().unwrap_or_else(|| n.qname.clone()),
        argument: payload.argument.clone(),
        extension,
        augmenting: n.augmenting,
        added_by_uses: n.added_by_uses,
        description: n.description.clone(),
        reference: n.reference.clone(),
        status: n.status,
    };
    arena.node_mut(id).built = Some(Built::Unknown(node.clone()));
    Ok(node)
}

/// Build a module root into its immutable form, memoized.
pub fn build_module(arena: &mut Arena, id: NodeId) -> CompileResult<Arc<Module>> {
    let lists = {
        let NodePayload::Module(m) = &arena.node(id).payload else {
            return Err(internal(arena, id, "module payload expected"));
        };
        if let Some(built) = &m.built {
            return Ok(built.clone());
        }
        ModuleLists {
            children: m.body.children.clone(),
            typedefs: m.body.typedefs.clone(),
            groupings: m.body.groupings.clone(),
            rpcs: m.rpcs.clone(),
            notifications: m.notifications.clone(),
            identities: m.identities.clone(),
            extensions: m.extensions.clone(),
            features: m.features.clone(),
            deviations: m.deviations.clone(),
            augments: m.augments.clone(),
            imports: m.imports.values().cloned().collect(),
            includes: m.includes.iter().map(|i| i.name.clone()).collect(),
            prefix: m.prefix.clone(),
            language_version: m.language_version.clone(),
            organization: m.organization.clone(),
            contact: m.contact.clone(),
        }
    };

    let children = build_children(arena, &lists.children, true)?;
    let typedefs = built_typedefs(arena, &lists.typedefs)?;
    let groupings = build_groupings(arena, &lists.groupings)?;

    let mut rpcs = Vec::with_capacity(lists.rpcs.len());
    for rpc in &lists.rpcs {
        match build_node(arena, *rpc, true)? {
            Built::Rpc(arc) => rpcs.push(arc),
            _ => return Err(internal(arena, *rpc, "rpc expected in operation list")),
        }
    }
    let mut notifications = Vec::with_capacity(lists.notifications.len());
    for n in &lists.notifications {
        match build_node(arena, *n, true)? {
            Built::Notification(arc) => notifications.push(arc),
            _ => return Err(internal(arena, *n, "notification expected in event list")),
        }
    }
    let identities = lists
        .identities
        .iter()
        .map(|&i| build_identity(arena, i))
        .collect::<CompileResult<Vec<_>>>()?;
    let extensions = lists
        .extensions
        .iter()
        .map(|&e| build_extension(arena, e))
        .collect::<CompileResult<Vec<_>>>()?;

    let mut features = Vec::with_capacity(lists.features.len());
    for &f in &lists.features {
        let n = arena.node(f);
        features.push(Feature {
            qname: n.qname.clone(),
            description: n.description.clone(),
            reference: n.reference.clone(),
            status: n.status,
        });
    }

    let mut deviations = Vec::with_capacity(lists.deviations.len());
    for &d in &lists.deviations {
        let n = arena.node(d);
        let NodePayload::Deviation(payload) = &n.payload else {
            return Err(internal(arena, d, "deviation payload expected"));
        };
        let target_path = payload.bound.clone().ok_or_else(|| {
            internal(
                arena,
                d,
                format!("deviation '{}' built before its target was bound", payload.target),
            )
        })?;
        deviations.push(Deviation {
            target_path,
            deviate: payload.deviate,
            description: n.description.clone(),
            reference: n.reference.clone(),
        });
    }

    let mut augments = Vec::with_capacity(lists.augments.len());
    for &a in &lists.augments {
        let n = arena.node(a);
        let NodePayload::Augment(payload) = &n.payload else {
            return Err(internal(arena, a, "augment payload expected"));
        };
        if let Some(target_path) = &payload.target_path {
            augments.push(Augment {
                target_path: target_path.clone(),
                when: payload.when.clone(),
                applied: payload.resolved && !payload.unsupported,
                description: n.description.clone(),
                reference: n.reference.clone(),
            });
        }
    }

    let unknown_nodes = build_unknowns(arena, id)?;

    let n = arena.node(id);
    let module = Arc::new(Module {
        name: n.qname.local_name.clone(),
        qname: n.qname.clone(),
        prefix: lists.prefix,
        language_version: lists.language_version,
        organization: lists.organization,
        contact: lists.contact,
        description: n.description.clone(),
        reference: n.reference.clone(),
        imports: lists
            .imports
            .into_iter()
            .map(|i| Import {
                module_name: i.module_name,
                prefix: i.prefix,
                revision: i.revision,
            })
            .collect(),
        includes: lists.includes,
        children,
        typedefs,
        groupings,
        rpcs,
        notifications,
        identities,
        extensions,
        features,
        deviations,
        augments,
        unknown_nodes,
    });
    if let NodePayload::Module(m) = &mut arena.node_mut(id).payload {
        m.built = Some(module.clone());
    }
    Ok(module)
}

struct ModuleLists {
    children: Vec<NodeId>,
    typedefs: Vec<NodeId>,
    groupings: Vec<NodeId>,
    rpcs: Vec<NodeId>,
    notifications: Vec<NodeId>,
    identities: Vec<NodeId>,
    extensions: Vec<NodeId>,
    features: Vec<NodeId>,
    deviations: Vec<NodeId>,
    augments: Vec<NodeId>,
    imports: Vec<super::module::Import>,
    includes: Vec<String>,
    prefix: String,
    language_version: Option<String>,
    organization: Option<String>,
    contact: Option<String>,
}
