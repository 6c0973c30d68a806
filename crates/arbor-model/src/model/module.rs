//! Compiled modules.
//!
//! A [`Module`] is the immutable result of building one module's
//! statement graph after all cross-module work (submodule merging,
//! grouping expansion, augmentation, type and identity resolution) has
//! finished. Submodules never appear here; their contents were merged
//! into the parent module before building.

use std::sync::Arc;

use crate::foundation::{Namespace, QName, Revision, SchemaPath};
use crate::types::{Status, Typedef};

use super::deviation::Deviation;
use super::extension::{Extension, UnknownNode};
use super::identity::Identity;
use super::node::{Grouping, SchemaNode};
use super::operations::{Notification, Rpc};

/// A dependency on another module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Name of the imported module.
    pub module_name: String,
    /// Prefix the importing module uses for it.
    pub prefix: String,
    /// Exact revision requested, or `None` for the latest.
    pub revision: Option<Revision>,
}

/// A conditional-capability flag declared by a module.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Qualified name.
    pub qname: QName,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

/// Record of an augment a module declared.
///
/// The injected nodes live in the target module's tree (flagged as
/// augmenting); this record preserves where the module reached into.
#[derive(Debug, Clone)]
pub struct Augment {
    /// Absolute path of the target node.
    pub target_path: SchemaPath,
    /// Conditional presence expression guarding the injected nodes.
    pub when: Option<String>,
    /// False when the target kind cannot be augmented and the augment
    /// was skipped.
    pub applied: bool,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
}

/// An immutable compiled module.
#[derive(Debug, Clone)]
pub struct Module {
    /// Module name.
    pub name: String,
    /// Module identity: namespace, revision and name.
    pub qname: QName,
    /// Prefix the module uses for itself.
    pub prefix: String,
    /// Declared modeling language version.
    pub language_version: Option<String>,
    /// Organization owning the module.
    pub organization: Option<String>,
    /// Contact for the module.
    pub contact: Option<String>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Imports in declaration order.
    pub imports: Vec<Import>,
    /// Names of submodules whose contents were merged in.
    pub includes: Vec<String>,
    /// Top-level data nodes in declaration order.
    pub children: Vec<SchemaNode>,
    /// Module-level typedefs.
    pub typedefs: Vec<Arc<Typedef>>,
    /// Module-level groupings.
    pub groupings: Vec<Arc<Grouping>>,
    /// Operations.
    pub rpcs: Vec<Arc<Rpc>>,
    /// Notifications.
    pub notifications: Vec<Arc<Notification>>,
    /// Identities declared by the module.
    pub identities: Vec<Arc<Identity>>,
    /// Extension keywords declared by the module.
    pub extensions: Vec<Arc<Extension>>,
    /// Features declared by the module.
    pub features: Vec<Feature>,
    /// Deviations declared by the module.
    pub deviations: Vec<Deviation>,
    /// Augments declared by the module.
    pub augments: Vec<Augment>,
    /// Unmodeled statements attached to the module itself.
    pub unknown_nodes: Vec<UnknownNode>,
}

impl Module {
    /// Namespace of the module.
    pub fn namespace(&self) -> &Namespace {
        &self.qname.namespace
    }

    /// Revision of the module, if declared.
    pub fn revision(&self) -> Option<&Revision> {
        self.qname.revision.as_ref()
    }

    /// Look a top-level data node up by local name.
    pub fn child(&self, local_name: &str) -> Option<&SchemaNode> {
        self.children
            .iter()
            .find(|c| c.qname().local_name == local_name)
    }

    /// Look a module-level grouping up by local name.
    pub fn grouping(&self, local_name: &str) -> Option<&Arc<Grouping>> {
        self.groupings
            .iter()
            .find(|g| g.qname.local_name == local_name)
    }

    /// Look a module-level typedef up by local name.
    pub fn typedef(&self, local_name: &str) -> Option<&Arc<Typedef>> {
        self.typedefs
            .iter()
            .find(|t| t.qname.local_name == local_name)
    }

    /// Look an identity up by local name.
    pub fn identity(&self, local_name: &str) -> Option<&Arc<Identity>> {
        self.identities
            .iter()
            .find(|i| i.qname.local_name == local_name)
    }

    /// Look an extension up by local name.
    pub fn extension(&self, local_name: &str) -> Option<&Arc<Extension>> {
        self.extensions
            .iter()
            .find(|e| e.qname.local_name == local_name)
    }

    /// Look an operation up by local name.
    pub fn rpc(&self, local_name: &str) -> Option<&Arc<Rpc>> {
        self.rpcs.iter().find(|r| r.qname.local_name == local_name)
    }

    /// Look a notification up by local name.
    pub fn notification(&self, local_name: &str) -> Option<&Arc<Notification>> {
        self.notifications
            .iter()
            .find(|n| n.qname.local_name == local_name)
    }

    /// Walk an absolute path of local names through the data tree.
    pub fn descendant(&self, path: &[&str]) -> Option<&SchemaNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.child(first)?;
        for name in rest {
            node = node.child(name)?;
        }
        Some(node)
    }
}
