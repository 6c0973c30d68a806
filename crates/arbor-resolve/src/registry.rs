//! The module registry.
//!
//! All modules of one resolution batch are registered here, indexed by
//! namespace and by name, each index holding every registered revision.
//! The registry answers the two lookups the passes need: a module by
//! name or namespace with the revision-selection rule applied, and a
//! dependent module through an import prefix recorded on the referring
//! module.
//!
//! # Revision selection
//!
//! Without a requested revision the latest registered one wins. With a
//! requested revision the match must be exact, except when the request
//! is newer than anything registered: then the latest is returned and a
//! warning diagnostic is emitted, so a batch compiled against slightly
//! older dependencies still resolves.

use indexmap::IndexMap;

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::foundation::{Namespace, Revision, SourceRef};

use crate::graph::{Arena, NodeId, NodePayload};

/// Index of every module builder in a resolution batch.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Module roots in registration order, submodules included.
    roots: Vec<NodeId>,
    /// Module name to registered revisions of it.
    by_name: IndexMap<String, Vec<NodeId>>,
    /// Namespace to registered revisions bound to it.
    by_namespace: IndexMap<Namespace, Vec<NodeId>>,
}

impl ModuleRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module (or submodule) root.
    ///
    /// Rejects a second registration of the same name and revision.
    pub fn register(&mut self, arena: &Arena, id: NodeId) -> CompileResult<()> {
        let node = arena.node(id);
        let name = node.qname.local_name.clone();
        let revision = node.qname.revision;

        let entries = self.by_name.entry(name.clone()).or_default();
        for &prior in entries.iter() {
            if arena.node(prior).qname.revision == revision {
                return Err(CompileError::new(
                    ErrorKind::DuplicateModule,
                    node.source.clone(),
                    match revision {
                        Some(rev) => {
                            format!("Module '{name}' revision {rev} already registered.")
                        }
                        None => format!("Module '{name}' already registered."),
                    },
                )
                .with_label(
                    arena.node(prior).source.clone(),
                    "first registered here".to_string(),
                ));
            }
        }
        entries.push(id);
        self.by_namespace
            .entry(node.qname.namespace.clone())
            .or_default()
            .push(id);
        self.roots.push(id);
        Ok(())
    }

    /// Every registered root in registration order, submodules included.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Registered module roots that are not submodules.
    pub fn modules(&self, arena: &Arena) -> Vec<NodeId> {
        self.roots
            .iter()
            .copied()
            .filter(|&id| match &arena.node(id).payload {
                NodePayload::Module(m) => !m.is_submodule(),
                _ => false,
            })
            .collect()
    }

    /// Find a module by name with the revision-selection rule.
    ///
    /// `at` is the statement asking, used when a fallback warning has to
    /// be attributed to someone.
    pub fn find_by_name(
        &self,
        arena: &Arena,
        name: &str,
        revision: Option<Revision>,
        at: &SourceRef,
        diagnostics: &mut Vec<CompileError>,
    ) -> Option<NodeId> {
        let entries = self.by_name.get(name)?;
        self.select(arena, entries, name, revision, at, diagnostics)
    }

    /// Find a module by namespace with the revision-selection rule.
    pub fn find_by_namespace(
        &self,
        arena: &Arena,
        namespace: &Namespace,
        revision: Option<Revision>,
        at: &SourceRef,
        diagnostics: &mut Vec<CompileError>,
    ) -> Option<NodeId> {
        let entries = self.by_namespace.get(namespace)?;
        self.select(arena, entries, namespace.as_str(), revision, at, diagnostics)
    }

    fn select(
        &self,
        arena: &Arena,
        entries: &[NodeId],
        shown_as: &str,
        revision: Option<Revision>,
        at: &SourceRef,
        diagnostics: &mut Vec<CompileError>,
    ) -> Option<NodeId> {
        let latest = entries
            .iter()
            .copied()
            .max_by_key(|&id| arena.node(id).qname.revision)?;
        let requested = match revision {
            None => return Some(latest),
            Some(rev) => rev,
        };
        if let Some(exact) = entries
            .iter()
            .copied()
            .find(|&id| arena.node(id).qname.revision == Some(requested))
        {
            return Some(exact);
        }
        let newest_known = arena.node(latest).qname.revision;
        if newest_known.is_none() || newest_known < Some(requested) {
            // The request outruns the registry; take the newest we have.
            diagnostics.push(CompileError::warning(
                ErrorKind::RevisionFallback,
                at.clone(),
                match newest_known {
                    Some(known) => format!(
                        "Revision {requested} of '{shown_as}' is not registered; \
                         falling back to latest known revision {known}."
                    ),
                    None => format!(
                        "Revision {requested} of '{shown_as}' is not registered; \
                         falling back to the unrevisioned module."
                    ),
                },
            ));
            tracing::warn!(module = shown_as, requested = %requested, "revision fallback");
            return Some(latest);
        }
        None
    }

    /// Resolve a prefix written in `from` to the module it names.
    ///
    /// The module's own prefix (or no prefix at all) answers with the
    /// module itself; anything else must match an import.
    pub fn module_for_prefix(
        &self,
        arena: &Arena,
        from: NodeId,
        prefix: Option<&str>,
        at: &SourceRef,
        diagnostics: &mut Vec<CompileError>,
    ) -> CompileResult<NodeId> {
        let NodePayload::Module(payload) = &arena.node(from).payload else {
            return Err(CompileError::new(
                ErrorKind::Internal,
                at.clone(),
                "prefix lookup from a non-module node".to_string(),
            ));
        };
        let prefix = match prefix {
            None => return Ok(from),
            Some(p) if p == payload.prefix => return Ok(from),
            Some(p) => p,
        };
        let import = payload.import_for_prefix(prefix).ok_or_else(|| {
            CompileError::new(
                ErrorKind::UndefinedPrefix,
                at.clone(),
                format!("No import found with prefix '{prefix}'."),
            )
        })?;
        let (name, revision) = (import.module_name.clone(), import.revision);
        self.find_by_name(arena, &name, revision, at, diagnostics)
            .ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UnknownModule,
                    at.clone(),
                    format!("Imported module '{name}' not found in the registry."),
                )
            })
    }
}
