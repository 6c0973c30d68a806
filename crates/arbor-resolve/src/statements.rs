//! The inbound statement API.
//!
//! The grammar parser is an external collaborator: it reads module
//! source and replays it here as ordered construction calls, one per
//! statement. Every `add_*` call verifies the parent kind is legal,
//! checks the relevant name namespace for duplicates, parents the new
//! builder and registers it in the module-level indexes, then returns
//! the `NodeId` so the parser can keep attaching substatement detail
//! (description, status, config, constraints) through
//! [`Arena::node_mut`].
//!
//! Name namespaces at one scope:
//!
//! - data nodes, operations and events share one namespace,
//! - groupings, typedefs, identities, features and extensions each
//!   have their own.

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::foundation::{Namespace, QName, Revision, SchemaPath, SourceRef};

use crate::graph::module::{
    attach_child, attach_grouping, attach_typedef, duplicate_error, ensure_rpc_io, illegal_parent,
    BelongsTo, Import, Include, ModulePayload, RpcIoDirection,
};
use crate::graph::node::{
    AugmentPayload, ChildSet, ChoicePayload, ContainerPayload, ExtensionPayload, IdentityPayload,
    LeafListPayload, LeafPayload, ListPayload, RefineSpec, RpcPayload, TypedefPayload,
    UnknownPayload, UsesPayload,
};
use crate::graph::walk::parent_module;
use crate::graph::{Arena, NodeBuilder, NodeId, NodePayload, PrefixedName, RawPath, TypeRef,
    TypeState};
use crate::registry::ModuleRegistry;

/// The statement graph of one resolution batch: the node arena plus the
/// module registry over it.
///
/// Passes borrow the two fields independently, which is why they are
/// public rather than hidden behind accessors.
#[derive(Debug, Default)]
pub struct StatementGraph {
    /// All builder nodes.
    pub arena: Arena,
    /// Module indexes over the arena.
    pub registry: ModuleRegistry,
}

impl StatementGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    fn module_identity(&self, scope: NodeId) -> CompileResult<(Namespace, Option<Revision>)> {
        let module = parent_module(&self.arena, scope).ok_or_else(|| {
            CompileError::new(
                ErrorKind::Internal,
                self.arena.node(scope).source.clone(),
                "statement scope is not attached to a module".to_string(),
            )
        })?;
        let q = &self.arena.node(module).qname;
        Ok((q.namespace.clone(), q.revision))
    }

    fn new_node(
        &mut self,
        parent: NodeId,
        name: &str,
        line: usize,
        payload: NodePayload,
    ) -> CompileResult<NodeId> {
        let (namespace, revision) = self.module_identity(parent)?;
        let qname = QName::new(namespace, revision, name);
        let p = self.arena.node(parent);
        let path = p.path.child(qname.clone());
        let source = SourceRef::new(p.source.module.clone(), line);
        Ok(self
            .arena
            .alloc(NodeBuilder::new(qname, path, source, Some(parent), payload)))
    }

    /// Register a new module root.
    pub fn add_module(
        &mut self,
        name: &str,
        namespace: &str,
        revision: Option<Revision>,
        prefix: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let qname = QName::new(Namespace::new(namespace), revision, name);
        let id = self.arena.alloc(NodeBuilder::new(
            qname,
            SchemaPath::root(),
            SourceRef::new(name, line),
            None,
            NodePayload::Module(Box::new(ModulePayload::new(prefix))),
        ));
        self.registry.register(&self.arena, id)?;
        Ok(id)
    }

    /// Register a new submodule root.
    ///
    /// Submodules carry a placeholder namespace until the merge pass
    /// rebases their contents onto the owning module.
    pub fn add_submodule(
        &mut self,
        name: &str,
        belongs_to: &str,
        prefix: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let mut payload = ModulePayload::new(prefix);
        payload.belongs_to = Some(BelongsTo {
            module: belongs_to.to_string(),
            prefix: prefix.to_string(),
        });
        let qname = QName::new(Namespace::new(format!("urn:submodule:{name}")), None, name);
        let id = self.arena.alloc(NodeBuilder::new(
            qname,
            SchemaPath::root(),
            SourceRef::new(name, line),
            None,
            NodePayload::Module(Box::new(payload)),
        ));
        self.registry.register(&self.arena, id)?;
        Ok(id)
    }

    /// Record an import on a module.
    pub fn add_import(
        &mut self,
        module: NodeId,
        module_name: &str,
        prefix: &str,
        revision: Option<Revision>,
        line: usize,
    ) -> CompileResult<()> {
        let source = {
            let n = self.arena.node(module);
            SourceRef::new(n.source.module.clone(), line)
        };
        let NodePayload::Module(payload) = &mut self.arena.node_mut(module).payload else {
            return Err(CompileError::new(
                ErrorKind::IllegalParent,
                source,
                "import is only legal under a module".to_string(),
            ));
        };
        if let Some(prior) = payload.imports.get(prefix) {
            return Err(duplicate_error(
                "import",
                prefix,
                &SourceRef::new(source.module.clone(), prior.line),
                source,
            ));
        }
        payload.imports.insert(
            prefix.to_string(),
            Import {
                module_name: module_name.to_string(),
                prefix: prefix.to_string(),
                revision,
                line,
            },
        );
        Ok(())
    }

    /// Record a submodule include on a module.
    pub fn add_include(&mut self, module: NodeId, name: &str, line: usize) -> CompileResult<()> {
        let source = {
            let n = self.arena.node(module);
            SourceRef::new(n.source.module.clone(), line)
        };
        let NodePayload::Module(payload) = &mut self.arena.node_mut(module).payload else {
            return Err(CompileError::new(
                ErrorKind::IllegalParent,
                source,
                "include is only legal under a module".to_string(),
            ));
        };
        payload.includes.push(Include {
            name: name.to_string(),
            line,
        });
        Ok(())
    }

    /// Add a container under `parent`.
    pub fn add_container(
        &mut self,
        parent: NodeId,
        name: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(
            parent,
            name,
            line,
            NodePayload::Container(ContainerPayload::default()),
        )?;
        attach_child(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a leaf under `parent`.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        name: &str,
        leaf_type: TypeRef,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(
            parent,
            name,
            line,
            NodePayload::Leaf(LeafPayload {
                type_state: TypeState::Unresolved(leaf_type),
                default: None,
                units: None,
            }),
        )?;
        attach_child(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a leaf-list under `parent`.
    pub fn add_leaf_list(
        &mut self,
        parent: NodeId,
        name: &str,
        element_type: TypeRef,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(
            parent,
            name,
            line,
            NodePayload::LeafList(LeafListPayload {
                type_state: TypeState::Unresolved(element_type),
                user_ordered: false,
            }),
        )?;
        attach_child(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a list under `parent`.
    pub fn add_list(&mut self, parent: NodeId, name: &str, line: usize) -> CompileResult<NodeId> {
        let id = self.new_node(parent, name, line, NodePayload::List(ListPayload::default()))?;
        attach_child(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a choice under `parent`.
    pub fn add_choice(
        &mut self,
        parent: NodeId,
        name: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(
            parent,
            name,
            line,
            NodePayload::Choice(ChoicePayload::default()),
        )?;
        attach_child(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a case under a choice.
    pub fn add_case(&mut self, choice: NodeId, name: &str, line: usize) -> CompileResult<NodeId> {
        let id = self.new_node(choice, name, line, NodePayload::Case(ChildSet::default()))?;
        attach_child(&mut self.arena, choice, id)?;
        Ok(id)
    }

    /// Add an anyxml node under `parent`.
    pub fn add_any_xml(
        &mut self,
        parent: NodeId,
        name: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(parent, name, line, NodePayload::AnyXml)?;
        attach_child(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a grouping to the scope of `parent`.
    pub fn add_grouping(
        &mut self,
        parent: NodeId,
        name: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(parent, name, line, NodePayload::Grouping(ChildSet::default()))?;
        attach_grouping(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a typedef to the scope of `parent`.
    pub fn add_typedef(
        &mut self,
        parent: NodeId,
        name: &str,
        base_type: TypeRef,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(
            parent,
            name,
            line,
            NodePayload::Typedef(TypedefPayload {
                type_state: TypeState::Unresolved(base_type),
                units: None,
                default: None,
            }),
        )?;
        attach_typedef(&mut self.arena, parent, id)?;
        Ok(id)
    }

    /// Add a uses statement under `parent`.
    pub fn add_uses(
        &mut self,
        parent: NodeId,
        grouping: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let source = {
            let p = self.arena.node(parent);
            SourceRef::new(p.source.module.clone(), line)
        };
        let grouping_ref = PrefixedName::parse(grouping).ok_or_else(|| {
            CompileError::new(
                ErrorKind::InvalidPath,
                source.clone(),
                format!("Invalid grouping reference '{grouping}'."),
            )
        })?;
        let id = self.new_node(
            parent,
            grouping,
            line,
            NodePayload::Uses(UsesPayload {
                grouping_ref,
                grouping: None,
                augments: Vec::new(),
                refines: Vec::new(),
                expanded: false,
            }),
        )?;
        if self.arena.node(parent).payload.child_set().is_none() {
            return Err(illegal_parent(self.arena.node(parent), self.arena.node(id)));
        }
        if let Some(cs) = self.arena.node_mut(parent).payload.child_set_mut() {
            cs.uses.push(id);
        }
        self.arena.node_mut(id).parent = Some(parent);
        Ok(id)
    }

    /// Add an augment under a module (absolute target) or a uses
    /// (relative target).
    pub fn add_augment(
        &mut self,
        parent: NodeId,
        target: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let source = {
            let p = self.arena.node(parent);
            SourceRef::new(p.source.module.clone(), line)
        };
        let path = RawPath::parse(target, &source)?;
        match &self.arena.node(parent).payload {
            NodePayload::Module(_) if !path.absolute => {
                return Err(CompileError::new(
                    ErrorKind::InvalidPath,
                    source,
                    format!("Augment target '{target}' of a module-level augment must be absolute."),
                ));
            }
            NodePayload::Uses(_) if path.absolute => {
                return Err(CompileError::new(
                    ErrorKind::InvalidPath,
                    source,
                    format!("Augment target '{target}' under a uses must be relative."),
                ));
            }
            NodePayload::Module(_) | NodePayload::Uses(_) => {}
            _ => {
                return Err(CompileError::new(
                    ErrorKind::IllegalParent,
                    source,
                    "augment is only legal under a module or a uses".to_string(),
                ));
            }
        }
        let id = self.new_node(parent, target, line, NodePayload::Augment(AugmentPayload::new(path)))?;
        match &mut self.arena.node_mut(parent).payload {
            NodePayload::Module(m) => m.augments.push(id),
            NodePayload::Uses(u) => u.augments.push(id),
            _ => {}
        }
        Ok(id)
    }

    /// Attach a refine overlay to a uses.
    pub fn add_refine(&mut self, uses: NodeId, refine: RefineSpec) -> CompileResult<()> {
        let source = {
            let u = self.arena.node(uses);
            SourceRef::new(u.source.module.clone(), refine.line)
        };
        match &mut self.arena.node_mut(uses).payload {
            NodePayload::Uses(u) => {
                u.refines.push(refine);
                Ok(())
            }
            _ => Err(CompileError::new(
                ErrorKind::IllegalParent,
                source,
                "refine is only legal under a uses".to_string(),
            )),
        }
    }

    fn attach_top_level(
        &mut self,
        module: NodeId,
        id: NodeId,
        push: impl FnOnce(&mut ModulePayload, NodeId),
    ) -> CompileResult<()> {
        // Operations and events share the module's data-node namespace.
        let qname = self.arena.node(id).qname.clone();
        let siblings: Vec<NodeId> = {
            let NodePayload::Module(m) = &self.arena.node(module).payload else {
                return Err(illegal_parent(
                    self.arena.node(module),
                    self.arena.node(id),
                ));
            };
            let mut ids = m.body.children.clone();
            ids.extend_from_slice(&m.rpcs);
            ids.extend_from_slice(&m.notifications);
            ids
        };
        for sib in siblings {
            if self.arena.node(sib).qname == qname {
                let kind = self.arena.node(id).kind_name();
                let prior = self.arena.node(sib).source.clone();
                let at = self.arena.node(id).source.clone();
                return Err(duplicate_error(kind, &qname.local_name, &prior, at));
            }
        }
        if let NodePayload::Module(m) = &mut self.arena.node_mut(module).payload {
            push(m, id);
        }
        self.arena.node_mut(id).parent = Some(module);
        Ok(())
    }

    fn attach_named_module_item(
        &mut self,
        module: NodeId,
        id: NodeId,
        kind: &'static str,
        existing: impl Fn(&ModulePayload) -> &[NodeId],
        push: impl FnOnce(&mut ModulePayload, NodeId),
    ) -> CompileResult<()> {
        let qname = self.arena.node(id).qname.clone();
        let prior_ids: Vec<NodeId> = {
            let NodePayload::Module(m) = &self.arena.node(module).payload else {
                return Err(illegal_parent(
                    self.arena.node(module),
                    self.arena.node(id),
                ));
            };
            existing(m).to_vec()
        };
        for prior in prior_ids {
            if self.arena.node(prior).qname == qname {
                let prior_src = self.arena.node(prior).source.clone();
                let at = self.arena.node(id).source.clone();
                return Err(duplicate_error(kind, &qname.local_name, &prior_src, at));
            }
        }
        if let NodePayload::Module(m) = &mut self.arena.node_mut(module).payload {
            push(m, id);
        }
        self.arena.node_mut(id).parent = Some(module);
        Ok(())
    }

    /// Add an operation under a module.
    pub fn add_rpc(&mut self, module: NodeId, name: &str, line: usize) -> CompileResult<NodeId> {
        let id = self.new_node(module, name, line, NodePayload::Rpc(RpcPayload::default()))?;
        self.attach_top_level(module, id, |m, id| m.rpcs.push(id))?;
        Ok(id)
    }

    /// The input container of an operation, created on first reference.
    pub fn add_rpc_input(&mut self, rpc: NodeId, line: usize) -> NodeId {
        ensure_rpc_io(&mut self.arena, rpc, RpcIoDirection::Input, line)
    }

    /// The output container of an operation, created on first reference.
    pub fn add_rpc_output(&mut self, rpc: NodeId, line: usize) -> NodeId {
        ensure_rpc_io(&mut self.arena, rpc, RpcIoDirection::Output, line)
    }

    /// Add an event under a module.
    pub fn add_notification(
        &mut self,
        module: NodeId,
        name: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(
            module,
            name,
            line,
            NodePayload::Notification(ChildSet::default()),
        )?;
        self.attach_top_level(module, id, |m, id| m.notifications.push(id))?;
        Ok(id)
    }

    /// Add an identity under a module.
    pub fn add_identity(
        &mut self,
        module: NodeId,
        name: &str,
        base: Option<&str>,
        line: usize,
    ) -> CompileResult<NodeId> {
        let source = {
            let m = self.arena.node(module);
            SourceRef::new(m.source.module.clone(), line)
        };
        let base_ref = match base {
            Some(text) => Some(PrefixedName::parse(text).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::InvalidPath,
                    source,
                    format!("Invalid base identity reference '{text}'."),
                )
            })?),
            None => None,
        };
        let id = self.new_node(
            module,
            name,
            line,
            NodePayload::Identity(IdentityPayload {
                base_ref,
                base: None,
            }),
        )?;
        self.attach_named_module_item(module, id, "identity", |m| &m.identities, |m, id| {
            m.identities.push(id)
        })?;
        Ok(id)
    }

    /// Add an extension keyword declaration under a module.
    pub fn add_extension(
        &mut self,
        module: NodeId,
        name: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(
            module,
            name,
            line,
            NodePayload::Extension(ExtensionPayload {
                argument: None,
                yin_element: false,
            }),
        )?;
        self.attach_named_module_item(module, id, "extension", |m| &m.extensions, |m, id| {
            m.extensions.push(id)
        })?;
        Ok(id)
    }

    /// Add a feature under a module.
    pub fn add_feature(
        &mut self,
        module: NodeId,
        name: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let id = self.new_node(module, name, line, NodePayload::Feature)?;
        self.attach_named_module_item(module, id, "feature", |m| &m.features, |m, id| {
            m.features.push(id)
        })?;
        Ok(id)
    }

    /// Add a deviation under a module.
    pub fn add_deviation(
        &mut self,
        module: NodeId,
        target: &str,
        line: usize,
    ) -> CompileResult<NodeId> {
        let source = {
            let m = self.arena.node(module);
            SourceRef::new(m.source.module.clone(), line)
        };
        let path = RawPath::parse(target, &source)?;
        if !path.absolute {
            return Err(CompileError::new(
                ErrorKind::InvalidPath,
                source,
                format!("Deviation target '{target}' must be absolute."),
            ));
        }
        if !matches!(self.arena.node(module).payload, NodePayload::Module(_)) {
            return Err(CompileError::new(
                ErrorKind::IllegalParent,
                source,
                "deviation is only legal under a module".to_string(),
            ));
        }
        let id = self.new_node(
            module,
            target,
            line,
            NodePayload::Deviation(crate::graph::node::DeviationPayload {
                target: path,
                deviate: None,
                bound: None,
                target_node: None,
            }),
        )?;
        if let NodePayload::Module(m) = &mut self.arena.node_mut(module).payload {
            m.deviations.push(id);
        }
        self.arena.node_mut(id).parent = Some(module);
        Ok(id)
    }

    /// Attach an extension-keyword statement to any node.
    pub fn add_unknown_node(
        &mut self,
        parent: NodeId,
        keyword: &str,
        argument: Option<&str>,
        line: usize,
    ) -> CompileResult<NodeId> {
        let source = {
            let p = self.arena.node(parent);
            SourceRef::new(p.source.module.clone(), line)
        };
        let keyword = PrefixedName::parse(keyword).ok_or_else(|| {
            CompileError::new(
                ErrorKind::InvalidPath,
                source,
                format!("Invalid extension keyword '{keyword}'."),
            )
        })?;
        let id = self.new_node(
            parent,
            &keyword.name.clone(),
            line,
            NodePayload::Unknown(UnknownPayload {
                keyword,
                node_type: None,
                argument: argument.map(str::to_string),
                extension: None,
            }),
        )?;
        self.arena.node_mut(parent).unknown_nodes.push(id);
        self.arena.node_mut(id).parent = Some(parent);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with_module() -> (StatementGraph, NodeId) {
        let mut graph = StatementGraph::new();
        let module = graph
            .add_module("test", "urn:test", None, "t", 1)
            .unwrap();
        (graph, module)
    }

    #[test]
    fn children_take_the_module_identity() {
        let (mut graph, module) = graph_with_module();
        let c = graph.add_container(module, "system", 2).unwrap();
        let l = graph
            .add_leaf(c, "hostname", TypeRef::named("string", 3), 3)
            .unwrap();
        let leaf = graph.arena.node(l);
        assert_eq!(leaf.qname.namespace.as_str(), "urn:test");
        assert_eq!(leaf.path.to_string(), "/system/hostname");
        assert_eq!(leaf.parent, Some(c));
    }

    #[test]
    fn rpc_and_leaf_share_the_top_level_namespace() {
        let (mut graph, module) = graph_with_module();
        graph
            .add_leaf(module, "reset", TypeRef::named("string", 2), 2)
            .unwrap();
        let err = graph.add_rpc(module, "reset", 5).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateNode);
        assert!(err.message.contains("line 2"));
    }

    #[test]
    fn kind_namespaces_are_independent() {
        let (mut graph, module) = graph_with_module();
        graph.add_grouping(module, "endpoint", 2).unwrap();
        // A data node may reuse a grouping's name.
        graph.add_container(module, "endpoint", 3).unwrap();
        // But a second grouping may not.
        let err = graph.add_grouping(module, "endpoint", 4).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateNode);
    }

    #[test]
    fn module_augment_must_be_absolute() {
        let (mut graph, module) = graph_with_module();
        let err = graph.add_augment(module, "system/login", 2).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);

        let ok = graph.add_augment(module, "/system/login", 3).unwrap();
        assert!(matches!(
            graph.arena.node(ok).payload,
            NodePayload::Augment(_)
        ));
    }

    #[test]
    fn uses_augment_must_be_relative() {
        let (mut graph, module) = graph_with_module();
        let uses = graph.add_uses(module, "endpoints", 2).unwrap();
        let err = graph.add_augment(uses, "/system", 3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidPath);
        graph.add_augment(uses, "endpoint/port", 4).unwrap();
    }

    #[test]
    fn refine_requires_a_uses_parent() {
        let (mut graph, module) = graph_with_module();
        let c = graph.add_container(module, "box", 2).unwrap();
        let err = graph
            .add_refine(c, RefineSpec::new("x", 3))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::IllegalParent);
    }

    #[test]
    fn duplicate_import_prefix_is_rejected() {
        let (mut graph, module) = graph_with_module();
        graph.add_import(module, "dep", "d", None, 2).unwrap();
        let err = graph.add_import(module, "other", "d", None, 3).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateNode);
    }

    #[test]
    fn duplicate_feature_is_rejected() {
        let (mut graph, module) = graph_with_module();
        graph.add_feature(module, "ipv6", 2).unwrap();
        let err = graph.add_feature(module, "ipv6", 4).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateNode);
    }
}
