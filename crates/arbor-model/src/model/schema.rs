//! The compiled schema.

use std::sync::Arc;

use crate::error::CompileError;
use crate::foundation::{Namespace, Revision};

use super::module::Module;

/// Every module of a successful compilation, plus the warnings the
/// passes tolerated along the way.
#[derive(Debug, Clone, Default)]
pub struct CompiledSchema {
    modules: Vec<Arc<Module>>,
    /// Diagnostics below error severity: revision fallbacks, skipped
    /// refines, unsupported augment targets.
    pub warnings: Vec<CompileError>,
}

impl CompiledSchema {
    /// Assemble a schema from built modules.
    pub fn new(modules: Vec<Arc<Module>>, warnings: Vec<CompileError>) -> Self {
        Self { modules, warnings }
    }

    /// All modules in registration order.
    pub fn modules(&self) -> &[Arc<Module>] {
        &self.modules
    }

    /// Find a module by name. Without a revision the newest wins.
    pub fn module(&self, name: &str, revision: Option<&Revision>) -> Option<&Arc<Module>> {
        let mut candidates: Vec<&Arc<Module>> =
            self.modules.iter().filter(|m| m.name == name).collect();
        match revision {
            Some(rev) => candidates
                .into_iter()
                .find(|m| m.revision() == Some(rev)),
            None => {
                candidates.sort_by_key(|m| m.qname.revision);
                candidates.pop()
            }
        }
    }

    /// All modules bound to a namespace, any revision.
    pub fn modules_for_namespace(&self, namespace: &Namespace) -> Vec<&Arc<Module>> {
        self.modules
            .iter()
            .filter(|m| m.namespace() == namespace)
            .collect()
    }
}
