//! Identity base resolution.
//!
//! Identities form hierarchies: each one may name a base identity,
//! in-module by bare name or imported by prefixed name. This pass binds
//! every declared base to its builder node and rejects cycles, so the
//! build pass can later construct the chains base-first and install the
//! derived sets in one sweep.

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::foundation::SourceRef;

use crate::graph::arena::{Arena, NodeId};
use crate::graph::node::{NodePayload, PrefixedName};
use crate::graph::walk::parent_module;
use crate::registry::ModuleRegistry;

/// Find an identity by (possibly prefixed) name, looking from `from`.
///
/// Bare names search the enclosing module; prefixed names search the
/// prefix-resolved module. `Ok(None)` means no such identity exists.
pub fn find_identity(
    arena: &Arena,
    registry: &ModuleRegistry,
    from: NodeId,
    name: &PrefixedName,
    at: &SourceRef,
    diagnostics: &mut Vec<CompileError>,
) -> CompileResult<Option<NodeId>> {
    let module = parent_module(arena, from).ok_or_else(|| {
        CompileError::new(
            ErrorKind::Internal,
            at.clone(),
            "identity reference from a detached node".to_string(),
        )
    })?;
    let target =
        registry.module_for_prefix(arena, module, name.prefix.as_deref(), at, diagnostics)?;
    let identities = {
        let NodePayload::Module(m) = &arena.node(target).payload else {
            return Ok(None);
        };
        m.identities.clone()
    };
    Ok(identities
        .into_iter()
        .find(|&id| arena.node(id).qname.local_name == name.name))
}

/// Bind every declared base identity and reject derivation cycles.
///
/// Identities only ever come from module statements, so an unresolved
/// base is fatal immediately; there is nothing a later pass could add.
/// Idempotent: already-bound identities are skipped.
pub fn bind_identity_bases(
    arena: &mut Arena,
    registry: &ModuleRegistry,
    diagnostics: &mut Vec<CompileError>,
) {
    let unbound: Vec<NodeId> = arena
        .ids()
        .filter(|&id| {
            matches!(
                &arena.node(id).payload,
                NodePayload::Identity(p) if p.base_ref.is_some() && p.base.is_none()
            )
        })
        .collect();

    for id in unbound {
        let (base_ref, at) = {
            let n = arena.node(id);
            let NodePayload::Identity(p) = &n.payload else {
                continue;
            };
            let Some(base_ref) = p.base_ref.clone() else {
                continue;
            };
            (base_ref, n.source.clone())
        };
        match find_identity(arena, registry, id, &base_ref, &at, diagnostics) {
            Ok(Some(base)) => {
                if let NodePayload::Identity(p) = &mut arena.node_mut(id).payload {
                    p.base = Some(base);
                }
            }
            Ok(None) => diagnostics.push(CompileError::new(
                ErrorKind::UnknownIdentity,
                at,
                format!("Failed to find base identity '{base_ref}'"),
            )),
            Err(err) => diagnostics.push(err),
        }
    }

    check_cycles(arena, diagnostics);
}

fn check_cycles(arena: &Arena, diagnostics: &mut Vec<CompileError>) {
    for id in arena.ids() {
        if !matches!(arena.node(id).payload, NodePayload::Identity(_)) {
            continue;
        }
        let mut current = id;
        let mut seen = vec![id];
        loop {
            let NodePayload::Identity(p) = &arena.node(current).payload else {
                break;
            };
            let Some(base) = p.base else { break };
            if base == id {
                let n = arena.node(id);
                diagnostics.push(CompileError::new(
                    ErrorKind::CyclicDependency,
                    n.source.clone(),
                    format!(
                        "Identity '{}' derives from itself through its base chain.",
                        n.qname.local_name
                    ),
                ));
                break;
            }
            if seen.contains(&base) {
                break; // cycle not through `id`; reported at its own entry
            }
            seen.push(base);
            current = base;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statements::StatementGraph;

    #[test]
    fn bare_base_binds_in_module() {
        let mut graph = StatementGraph::new();
        let module = graph.add_module("test", "urn:test", None, "t", 1).unwrap();
        let base = graph
            .add_identity(module, "interface-type", None, 2)
            .unwrap();
        let eth = graph
            .add_identity(module, "ethernet", Some("interface-type"), 3)
            .unwrap();

        let mut diags = Vec::new();
        bind_identity_bases(&mut graph.arena, &graph.registry, &mut diags);
        assert!(diags.is_empty());
        let NodePayload::Identity(p) = &graph.arena.node(eth).payload else {
            panic!("identity expected");
        };
        assert_eq!(p.base, Some(base));
    }

    #[test]
    fn prefixed_base_binds_in_the_imported_module() {
        let mut graph = StatementGraph::new();
        let lib = graph.add_module("lib", "urn:lib", None, "l", 1).unwrap();
        let base = graph.add_identity(lib, "algorithm", None, 2).unwrap();
        let app = graph.add_module("app", "urn:app", None, "a", 1).unwrap();
        graph.add_import(app, "lib", "l", None, 2).unwrap();
        let derived = graph
            .add_identity(app, "sha-256", Some("l:algorithm"), 3)
            .unwrap();

        let mut diags = Vec::new();
        bind_identity_bases(&mut graph.arena, &graph.registry, &mut diags);
        assert!(diags.is_empty());
        let NodePayload::Identity(p) = &graph.arena.node(derived).payload else {
            panic!("identity expected");
        };
        assert_eq!(p.base, Some(base));
    }

    #[test]
    fn missing_base_is_fatal() {
        let mut graph = StatementGraph::new();
        let module = graph.add_module("test", "urn:test", None, "t", 1).unwrap();
        graph
            .add_identity(module, "ethernet", Some("no-such-base"), 2)
            .unwrap();

        let mut diags = Vec::new();
        bind_identity_bases(&mut graph.arena, &graph.registry, &mut diags);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].kind, ErrorKind::UnknownIdentity);
        assert!(diags[0].message.contains("'no-such-base'"));
    }

    #[test]
    fn derivation_cycles_are_rejected() {
        let mut graph = StatementGraph::new();
        let module = graph.add_module("test", "urn:test", None, "t", 1).unwrap();
        graph.add_identity(module, "a", Some("b"), 2).unwrap();
        graph.add_identity(module, "b", Some("a"), 3).unwrap();

        let mut diags = Vec::new();
        bind_identity_bases(&mut graph.arena, &graph.registry, &mut diags);
        assert!(diags
            .iter()
            .any(|d| d.kind == ErrorKind::CyclicDependency));
    }
}
