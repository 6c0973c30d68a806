//! The resolution pipeline.
//!
//! Resolution runs in rounds because the passes feed each other:
//! expanding a grouping can surface new uses, augments and type
//! references, an applied augment can create the target another augment
//! waits for, and typedef chains resolve one link per round. Each round
//! runs every pass once and reports how much work is left; the loop
//! ends when nothing is pending, when a round produced a fatal
//! diagnostic, or when the pass budget runs out.
//!
//! Work that is still pending after a clean loop is a real error in
//! the input: an unexpanded uses means an unknown grouping or a cycle,
//! an unresolved augment means a target that never appeared, and so on.
//! These are reported by [`report_leftovers`] with one diagnostic per
//! offending statement.
//!
//! Submodules merge exactly once before the loop, and deviation targets
//! bind after it, when the schema tree has its final shape.

use arbor_model::error::{CompileError, ErrorKind};
use arbor_model::foundation::{QName, SchemaPath, SourceRef};
use arbor_model::model::CompiledSchema;

use crate::graph::arena::{Arena, NodeId};
use crate::graph::build::{build_module, link_derived_identities};
use crate::graph::module::{attach_child, attach_grouping, attach_typedef, duplicate_error};
use crate::graph::node::{NodePayload, RawPath};
use crate::graph::walk::{find_node_in_module, parent_module, rebase_subtree};
use crate::registry::ModuleRegistry;
use crate::resolve::{augment, expand, identity, refine, types};
use crate::statements::StatementGraph;

/// Knobs of one resolution run.
#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Upper bound on resolution rounds. Each round can only leave
    /// work pending when the input nests groupings or chains typedefs
    /// deeper than this.
    pub max_passes: usize,
    /// Treat every warning as an error.
    pub warnings_as_errors: bool,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            max_passes: 8,
            warnings_as_errors: false,
        }
    }
}

/// Resolve a statement graph into its compiled schema.
///
/// On failure every diagnostic gathered so far is returned, warnings
/// included, so callers render one coherent report.
pub fn resolve(
    graph: &mut StatementGraph,
    options: &ResolveOptions,
) -> Result<CompiledSchema, Vec<CompileError>> {
    let arena = &mut graph.arena;
    let registry = &graph.registry;
    let mut diagnostics = Vec::new();

    merge_submodules(arena, registry, &mut diagnostics);

    if !has_fatal(&diagnostics) {
        for pass in 0..options.max_passes.max(1) {
            let pending_uses = expand::run(arena, registry, &mut diagnostics);
            refine::run(arena, &mut diagnostics);
            bind_extensions(arena, registry, &mut diagnostics);
            let pending_augments = augment::run(arena, registry, &mut diagnostics);
            let pending_types = types::run(arena, registry, &mut diagnostics);
            identity::bind_identity_bases(arena, registry, &mut diagnostics);

            tracing::debug!(
                pass,
                pending_uses,
                pending_augments,
                pending_types,
                "resolution round finished"
            );
            if has_fatal(&diagnostics) {
                break;
            }
            if pending_uses == 0 && pending_augments == 0 && pending_types == 0 {
                break;
            }
        }
    }

    if !has_fatal(&diagnostics) {
        report_leftovers(arena, &mut diagnostics);
    }
    if !has_fatal(&diagnostics) {
        bind_deviations(arena, registry, &mut diagnostics);
    }

    if has_fatal(&diagnostics) || (options.warnings_as_errors && !diagnostics.is_empty()) {
        return Err(diagnostics);
    }

    let mut modules = Vec::new();
    for id in registry.modules(arena) {
        match build_module(arena, id) {
            Ok(module) => modules.push(module),
            Err(err) => {
                diagnostics.push(err);
                return Err(diagnostics);
            }
        }
    }
    link_derived_identities(arena);
    Ok(CompiledSchema::new(modules, diagnostics))
}

fn has_fatal(diagnostics: &[CompileError]) -> bool {
    diagnostics.iter().any(CompileError::is_fatal)
}

/// Fold every included submodule into its owning module.
///
/// Definitions are rebased onto the module's namespace and revision and
/// attached through the checked attachment points, so a submodule
/// redeclaring a module-level name fails the same way a duplicate
/// sibling would.
fn merge_submodules(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    diagnostics: &mut Vec<CompileError>,
) {
    for module in registry.modules(arena) {
        let (includes, merged) = {
            let NodePayload::Module(m) = &arena.node(module).payload else {
                continue;
            };
            (m.includes.clone(), m.merged)
        };
        if merged {
            continue;
        }
        for include in includes {
            let at = SourceRef::new(arena.node(module).source.module.clone(), include.line);
            let sub = registry.find_by_name(arena, &include.name, None, &at, diagnostics);
            let Some(sub) = sub else {
                diagnostics.push(CompileError::new(
                    ErrorKind::UnknownModule,
                    at,
                    format!("Included submodule '{}' not found.", include.name),
                ));
                continue;
            };
            if !matches!(&arena.node(sub).payload, NodePayload::Module(m) if m.is_submodule()) {
                diagnostics.push(CompileError::new(
                    ErrorKind::UnknownModule,
                    at,
                    format!("Included '{}' is not a submodule.", include.name),
                ));
                continue;
            }
            merge_one(arena, module, sub, diagnostics);
        }
        if let NodePayload::Module(m) = &mut arena.node_mut(module).payload {
            m.merged = true;
        }
    }

    // A submodule nobody merged has an owner outside the batch.
    for &root in registry.roots() {
        let NodePayload::Module(m) = &arena.node(root).payload else {
            continue;
        };
        let Some(belongs) = &m.belongs_to else {
            continue;
        };
        if !m.merged {
            diagnostics.push(CompileError::new(
                ErrorKind::UnknownModule,
                arena.node(root).source.clone(),
                format!(
                    "Submodule '{}' belongs to module '{}', which is not in the batch.",
                    arena.node(root).qname.local_name,
                    belongs.module
                ),
            ));
        }
    }
}

fn merge_one(arena: &mut Arena, module: NodeId, sub: NodeId, diagnostics: &mut Vec<CompileError>) {
    let (namespace, revision) = {
        let q = &arena.node(module).qname;
        (q.namespace.clone(), q.revision)
    };
    let unknowns = std::mem::take(&mut arena.node_mut(sub).unknown_nodes);
    let Some(taken) = take_module_contents(arena, sub) else {
        return;
    };
    let root = SchemaPath::root();

    for child in taken.children {
        rebase_subtree(arena, child, &namespace, revision, &root);
        if let Err(err) = attach_child(arena, module, child) {
            diagnostics.push(err);
        }
    }
    for typedef in taken.typedefs {
        rebase_subtree(arena, typedef, &namespace, revision, &root);
        if let Err(err) = attach_typedef(arena, module, typedef) {
            diagnostics.push(err);
        }
    }
    for grouping in taken.groupings {
        rebase_subtree(arena, grouping, &namespace, revision, &root);
        if let Err(err) = attach_grouping(arena, module, grouping) {
            diagnostics.push(err);
        }
    }
    for uses in taken.uses {
        rebase_subtree(arena, uses, &namespace, revision, &root);
        arena.node_mut(uses).parent = Some(module);
        if let NodePayload::Module(m) = &mut arena.node_mut(module).payload {
            m.body.uses.push(uses);
        }
    }
    for rpc in taken.rpcs {
        rebase_subtree(arena, rpc, &namespace, revision, &root);
        merge_top_level(arena, module, rpc, |m, id| m.rpcs.push(id), diagnostics);
    }
    for notification in taken.notifications {
        rebase_subtree(arena, notification, &namespace, revision, &root);
        merge_top_level(
            arena,
            module,
            notification,
            |m, id| m.notifications.push(id),
            diagnostics,
        );
    }
    merge_named(arena, module, taken.identities, "identity", |m| m.identities.as_slice(), |m, id| m.identities.push(id), &namespace, revision, diagnostics);
    merge_named(arena, module, taken.extensions, "extension", |m| m.extensions.as_slice(), |m, id| m.extensions.push(id), &namespace, revision, diagnostics);
    merge_named(arena, module, taken.features, "feature", |m| m.features.as_slice(), |m, id| m.features.push(id), &namespace, revision, diagnostics);

    for deviation in taken.deviations {
        rebase_subtree(arena, deviation, &namespace, revision, &root);
        arena.node_mut(deviation).parent = Some(module);
        if let NodePayload::Module(m) = &mut arena.node_mut(module).payload {
            m.deviations.push(deviation);
        }
    }
    for aug in taken.augments {
        rebase_subtree(arena, aug, &namespace, revision, &root);
        arena.node_mut(aug).parent = Some(module);
        if let NodePayload::Module(m) = &mut arena.node_mut(module).payload {
            m.augments.push(aug);
        }
    }
    for unknown in unknowns {
        rebase_subtree(arena, unknown, &namespace, revision, &root);
        arena.node_mut(unknown).parent = Some(module);
        arena.node_mut(module).unknown_nodes.push(unknown);
    }
    // The module's own import wins on a prefix collision.
    if let NodePayload::Module(m) = &mut arena.node_mut(module).payload {
        for (prefix, import) in taken.imports {
            m.imports.entry(prefix).or_insert(import);
        }
    }

    tracing::debug!(
        submodule = %arena.node(sub).qname.local_name,
        module = %arena.node(module).qname.local_name,
        "submodule merged"
    );
}

struct TakenContents {
    children: Vec<NodeId>,
    typedefs: Vec<NodeId>,
    groupings: Vec<NodeId>,
    uses: Vec<NodeId>,
    rpcs: Vec<NodeId>,
    notifications: Vec<NodeId>,
    identities: Vec<NodeId>,
    extensions: Vec<NodeId>,
    features: Vec<NodeId>,
    deviations: Vec<NodeId>,
    augments: Vec<NodeId>,
    imports: indexmap::IndexMap<String, crate::graph::module::Import>,
}

fn take_module_contents(arena: &mut Arena, sub: NodeId) -> Option<TakenContents> {
    let NodePayload::Module(m) = &mut arena.node_mut(sub).payload else {
        return None;
    };
    m.merged = true;
    let body = std::mem::take(&mut m.body);
    Some(TakenContents {
        children: body.children,
        typedefs: body.typedefs,
        groupings: body.groupings,
        uses: body.uses,
        rpcs: std::mem::take(&mut m.rpcs),
        notifications: std::mem::take(&mut m.notifications),
        identities: std::mem::take(&mut m.identities),
        extensions: std::mem::take(&mut m.extensions),
        features: std::mem::take(&mut m.features),
        deviations: std::mem::take(&mut m.deviations),
        augments: std::mem::take(&mut m.augments),
        imports: std::mem::take(&mut m.imports),
    })
}

/// Attach an operation or event at module top level; the name shares
/// the module's data-node namespace.
fn merge_top_level(
    arena: &mut Arena,
    module: NodeId,
    id: NodeId,
    push: impl FnOnce(&mut crate::graph::module::ModulePayload, NodeId),
    diagnostics: &mut Vec<CompileError>,
) {
    let qname = arena.node(id).qname.clone();
    let siblings: Vec<NodeId> = {
        let NodePayload::Module(m) = &arena.node(module).payload else {
            return;
        };
        let mut ids = m.body.children.clone();
        ids.extend_from_slice(&m.rpcs);
        ids.extend_from_slice(&m.notifications);
        ids
    };
    for sib in siblings {
        if arena.node(sib).qname == qname {
            let prior = arena.node(sib).source.clone();
            let (kind, at) = {
                let n = arena.node(id);
                (n.kind_name(), n.source.clone())
            };
            diagnostics.push(duplicate_error(kind, &qname.local_name, &prior, at));
            return;
        }
    }
    arena.node_mut(id).parent = Some(module);
    if let NodePayload::Module(m) = &mut arena.node_mut(module).payload {
        push(m, id);
    }
}

#[allow(clippy::too_many_arguments)]
fn merge_named(
    arena: &mut Arena,
    module: NodeId,
    items: Vec<NodeId>,
    kind: &str,
    existing: impl Fn(&crate::graph::module::ModulePayload) -> &[NodeId],
    push: impl Fn(&mut crate::graph::module::ModulePayload, NodeId),
    namespace: &arbor_model::foundation::Namespace,
    revision: Option<arbor_model::foundation::Revision>,
    diagnostics: &mut Vec<CompileError>,
) {
    for id in items {
        rebase_subtree(arena, id, namespace, revision, &SchemaPath::root());
        let name = arena.node(id).qname.local_name.clone();
        let prior = {
            let NodePayload::Module(m) = &arena.node(module).payload else {
                continue;
            };
            existing(m)
                .iter()
                .copied()
                .find(|&e| arena.node(e).qname.local_name == name)
        };
        if let Some(prior) = prior {
            let prior_src = arena.node(prior).source.clone();
            let at = arena.node(id).source.clone();
            diagnostics.push(duplicate_error(kind, &name, &prior_src, at));
            continue;
        }
        arena.node_mut(id).parent = Some(module);
        if let NodePayload::Module(m) = &mut arena.node_mut(module).payload {
            push(m, id);
        }
    }
}

/// Bind every extension-keyword statement to its declaring module and,
/// when one exists, to the extension definition.
///
/// Runs every round: refines and expansions keep producing new unknown
/// nodes. A keyword whose module carries no matching extension
/// declaration stays unbound; the node is still carried through the
/// build.
fn bind_extensions(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    diagnostics: &mut Vec<CompileError>,
) {
    let unbound: Vec<NodeId> = arena
        .ids()
        .filter(|&id| {
            matches!(
                &arena.node(id).payload,
                NodePayload::Unknown(u) if u.node_type.is_none()
            )
        })
        .collect();

    for id in unbound {
        let (keyword, at) = {
            let n = arena.node(id);
            let NodePayload::Unknown(u) = &n.payload else {
                continue;
            };
            (u.keyword.clone(), n.source.clone())
        };
        let Some(module) = parent_module(arena, id) else {
            continue;
        };
        let target =
            match registry.module_for_prefix(arena, module, keyword.prefix.as_deref(), &at, diagnostics) {
                Ok(target) => target,
                Err(_) => {
                    diagnostics.push(CompileError::new(
                        ErrorKind::UnknownExtension,
                        at,
                        format!("Failed to find extension '{keyword}'."),
                    ));
                    continue;
                }
            };
        let (node_type, extension) = {
            let NodePayload::Module(m) = &arena.node(target).payload else {
                continue;
            };
            let q = &arena.node(target).qname;
            let extension = m
                .extensions
                .iter()
                .copied()
                .find(|&e| arena.node(e).qname.local_name == keyword.name);
            (
                QName::new(q.namespace.clone(), q.revision, &keyword.name),
                extension,
            )
        };
        if extension.is_none() {
            tracing::debug!(keyword = %keyword, "no extension declaration for keyword");
        }
        if let NodePayload::Unknown(u) = &mut arena.node_mut(id).payload {
            u.node_type = Some(node_type);
            u.extension = extension;
        }
    }
}

/// Turn work that survived a clean fixed-point loop into diagnostics.
fn report_leftovers(arena: &Arena, diagnostics: &mut Vec<CompileError>) {
    for id in arena.ids() {
        let node = arena.node(id);
        match &node.payload {
            NodePayload::Uses(u) if !u.expanded => {
                if u.grouping.is_some() {
                    diagnostics.push(CompileError::new(
                        ErrorKind::CyclicDependency,
                        node.source.clone(),
                        format!(
                            "Grouping '{}' never becomes ready to expand; its uses form a cycle.",
                            u.grouping_ref
                        ),
                    ));
                } else {
                    diagnostics.push(CompileError::new(
                        ErrorKind::UnknownGrouping,
                        node.source.clone(),
                        format!("Referenced grouping '{}' not found.", u.grouping_ref),
                    ));
                }
            }
            NodePayload::Augment(a) if !a.resolved => {
                diagnostics.push(CompileError::new(
                    ErrorKind::AugmentTargetNotFound,
                    node.source.clone(),
                    format!("failed to find augment target: {}", a.target),
                ));
            }
            _ => {}
        }
        if let Some(r) = types::pending_ref(node) {
            diagnostics.push(CompileError::new(
                ErrorKind::UnknownType,
                SourceRef::new(node.source.module.clone(), r.line),
                format!("Referenced type '{}' not found.", r.name),
            ));
        }
    }
}

/// Bind deviation targets against the final tree shape.
fn bind_deviations(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    diagnostics: &mut Vec<CompileError>,
) {
    let todo: Vec<NodeId> = arena
        .ids()
        .filter(|&id| {
            matches!(
                &arena.node(id).payload,
                NodePayload::Deviation(d) if d.target_node.is_none()
            )
        })
        .collect();

    for id in todo {
        let (target, at) = {
            let n = arena.node(id);
            let NodePayload::Deviation(d) = &n.payload else {
                continue;
            };
            (d.target.clone(), n.source.clone())
        };
        let Some(module) = parent_module(arena, id) else {
            continue;
        };
        match bind_deviation_target(arena, registry, module, &target, &at, diagnostics) {
            Ok(Some((path, node))) => {
                if let NodePayload::Deviation(d) = &mut arena.node_mut(id).payload {
                    d.bound = Some(path);
                    d.target_node = Some(node);
                }
            }
            Ok(None) => diagnostics.push(
                CompileError::new(
                    ErrorKind::DeviationTargetNotFound,
                    at.clone(),
                    "Failed to find deviation target.".to_string(),
                )
                .with_note(format!("no node matches '{target}'")),
            ),
            Err(err) => diagnostics.push(err),
        }
    }
}

type BoundTarget = Option<(SchemaPath, NodeId)>;

fn bind_deviation_target(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    module: NodeId,
    target: &RawPath,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) -> Result<BoundTarget, CompileError> {
    let mut qnames = Vec::with_capacity(target.segments.len());
    for seg in &target.segments {
        let m = registry.module_for_prefix(arena, module, seg.prefix.as_deref(), at, diagnostics)?;
        let q = &arena.node(m).qname;
        qnames.push(QName::new(q.namespace.clone(), q.revision, &seg.name));
    }
    let start = registry.module_for_prefix(
        arena,
        module,
        target.segments[0].prefix.as_deref(),
        at,
        diagnostics,
    )?;
    let path = SchemaPath::new(qnames, true);
    Ok(find_node_in_module(arena, start, &path).map(|node| (path, node)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeRef;
    use arbor_model::foundation::Revision;
    use std::sync::Arc;

    fn resolve_default(graph: &mut StatementGraph) -> Result<CompiledSchema, Vec<CompileError>> {
        resolve(graph, &ResolveOptions::default())
    }

    #[test]
    fn full_batch_resolves_end_to_end() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        graph
            .add_typedef(m, "port", TypeRef::named("uint16", 2), 2)
            .unwrap();
        let grp = graph.add_grouping(m, "endpoint", 3).unwrap();
        let server = graph.add_container(grp, "server", 4).unwrap();
        graph
            .add_leaf(server, "port", TypeRef::named("port", 5), 5)
            .unwrap();
        let north = graph.add_container(m, "north", 7).unwrap();
        graph.add_uses(north, "endpoint", 8).unwrap();
        let aug = graph.add_augment(m, "/north/server", 9).unwrap();
        graph
            .add_leaf(aug, "timeout", TypeRef::named("uint32", 10), 10)
            .unwrap();

        let schema = resolve_default(&mut graph).unwrap();
        assert!(schema.warnings.is_empty());
        let module = schema.module("net", None).unwrap();
        let timeout = module.descendant(&["north", "server", "timeout"]);
        assert!(timeout.is_some());
        assert_eq!(module.augments.len(), 1);
        assert!(module.augments[0].applied);
    }

    #[test]
    fn builds_are_memoized_across_calls() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        graph
            .add_leaf(m, "mtu", TypeRef::named("uint16", 2), 2)
            .unwrap();

        let first = resolve_default(&mut graph).unwrap();
        let second = resolve_default(&mut graph).unwrap();
        assert!(Arc::ptr_eq(&first.modules()[0], &second.modules()[0]));
    }

    #[test]
    fn submodule_content_merges_under_the_module() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("sys", "urn:sys", None, "s", 1).unwrap();
        graph.add_include(m, "sys-hw", 2).unwrap();
        let sub = graph.add_submodule("sys-hw", "sys", "s", 1).unwrap();
        let hw = graph.add_container(sub, "hardware", 2).unwrap();
        graph
            .add_leaf(hw, "model", TypeRef::named("string", 3), 3)
            .unwrap();

        let schema = resolve_default(&mut graph).unwrap();
        let module = schema.module("sys", None).unwrap();
        let model = module.descendant(&["hardware", "model"]).unwrap();
        assert_eq!(model.qname().namespace.as_str(), "urn:sys");
    }

    #[test]
    fn missing_included_submodule_is_fatal() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("sys", "urn:sys", None, "s", 1).unwrap();
        graph.add_include(m, "no-such-sub", 2).unwrap();

        let errors = resolve_default(&mut graph).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ErrorKind::UnknownModule && e.message.contains("'no-such-sub'")));
    }

    #[test]
    fn leftover_unknown_grouping_is_reported() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        graph.add_uses(m, "no-such-grouping", 2).unwrap();

        let errors = resolve_default(&mut graph).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::UnknownGrouping);
        assert!(errors[0].message.contains("'no-such-grouping'"));
    }

    #[test]
    fn self_referential_grouping_is_a_cycle_error() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        let grp = graph.add_grouping(m, "recursive", 2).unwrap();
        graph.add_uses(grp, "recursive", 3).unwrap();
        graph.add_uses(m, "recursive", 5).unwrap();

        let errors = resolve_default(&mut graph).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.kind == ErrorKind::CyclicDependency));
    }

    #[test]
    fn leftover_augment_target_is_reported() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        let aug = graph.add_augment(m, "/never-exists", 2).unwrap();
        graph
            .add_leaf(aug, "x", TypeRef::named("string", 3), 3)
            .unwrap();

        let errors = resolve_default(&mut graph).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::AugmentTargetNotFound);
        assert!(errors[0].message.contains("/never-exists"));
    }

    #[test]
    fn leftover_unknown_type_is_reported() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        graph
            .add_leaf(m, "x", TypeRef::named("no-such-type", 2), 2)
            .unwrap();

        let errors = resolve_default(&mut graph).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::UnknownType);
        assert!(errors[0].message.contains("'no-such-type'"));
    }

    #[test]
    fn revision_fallback_is_a_warning_by_default() {
        let mut graph = StatementGraph::new();
        let dep = graph
            .add_module(
                "dep",
                "urn:dep",
                Revision::parse("2021-06-01").ok(),
                "d",
                1,
            )
            .unwrap();
        graph.add_grouping(dep, "g", 2).unwrap();
        let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
        graph
            .add_import(
                app,
                "dep",
                "d",
                Revision::parse("2030-01-01").ok(),
                2,
            )
            .unwrap();
        graph.add_uses(app, "d:g", 3).unwrap();

        let schema = resolve_default(&mut graph).unwrap();
        assert_eq!(schema.warnings.len(), 1);
        assert_eq!(schema.warnings[0].kind, ErrorKind::RevisionFallback);
    }

    #[test]
    fn warnings_as_errors_fails_the_batch() {
        let mut graph = StatementGraph::new();
        let dep = graph
            .add_module(
                "dep",
                "urn:dep",
                Revision::parse("2021-06-01").ok(),
                "d",
                1,
            )
            .unwrap();
        graph.add_grouping(dep, "g", 2).unwrap();
        let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
        graph
            .add_import(
                app,
                "dep",
                "d",
                Revision::parse("2030-01-01").ok(),
                2,
            )
            .unwrap();
        graph.add_uses(app, "d:g", 3).unwrap();

        let options = ResolveOptions {
            warnings_as_errors: true,
            ..ResolveOptions::default()
        };
        let errors = resolve(&mut graph, &options).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::RevisionFallback);
    }

    #[test]
    fn deviation_targets_bind_after_the_loop() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        graph.add_container(m, "system", 2).unwrap();
        graph.add_deviation(m, "/system", 3).unwrap();

        let schema = resolve_default(&mut graph).unwrap();
        let module = schema.module("net", None).unwrap();
        assert_eq!(module.deviations.len(), 1);
        assert_eq!(module.deviations[0].target_path.to_string(), "/system");
    }

    #[test]
    fn missing_deviation_target_is_fatal() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        graph.add_deviation(m, "/absent", 2).unwrap();

        let errors = resolve_default(&mut graph).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::DeviationTargetNotFound);
    }

    #[test]
    fn extension_keywords_bind_to_their_declarations() {
        let mut graph = StatementGraph::new();
        let m = graph.add_module("net", "urn:net", None, "n", 1).unwrap();
        graph.add_extension(m, "annotation", 2).unwrap();
        let c = graph.add_container(m, "box", 3).unwrap();
        let unknown = graph
            .add_unknown_node(c, "n:annotation", Some("note"), 4)
            .unwrap();

        resolve_default(&mut graph).unwrap();
        let NodePayload::Unknown(u) = &graph.arena.node(unknown).payload else {
            panic!("unknown node expected");
        };
        assert!(u.extension.is_some());
        let node_type = u.node_type.as_ref().unwrap();
        assert_eq!(node_type.namespace.as_str(), "urn:net");
        assert_eq!(node_type.local_name, "annotation");
    }
}
