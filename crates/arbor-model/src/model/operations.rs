//! Operations and notifications.
//!
//! An operation has at most one input and one output container. Both
//! are ordinary containers named with the literal local names `input`
//! and `output`; the compiler materializes them on demand when a
//! statement or an augment first addresses them.

use std::sync::Arc;

use crate::foundation::{QName, SchemaPath};
use crate::types::{Status, Typedef};

use super::extension::UnknownNode;
use super::node::{Container, Grouping, SchemaNode};

/// An operation offered by a module.
#[derive(Debug, Clone)]
pub struct Rpc {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Input container, if the operation takes arguments.
    pub input: Option<Arc<Container>>,
    /// Output container, if the operation returns data.
    pub output: Option<Arc<Container>>,
    /// Typedefs scoped to this operation.
    pub typedefs: Vec<Arc<Typedef>>,
    /// Groupings scoped to this operation.
    pub groupings: Vec<Arc<Grouping>>,
    /// Unmodeled statements attached to this node.
    pub unknown_nodes: Vec<UnknownNode>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

/// An event a module can emit.
#[derive(Debug, Clone)]
pub struct Notification {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Payload nodes in declaration order.
    pub children: Vec<SchemaNode>,
    /// Typedefs scoped to this notification.
    pub typedefs: Vec<Arc<Typedef>>,
    /// Groupings scoped to this notification.
    pub groupings: Vec<Arc<Grouping>>,
    /// Unmodeled statements attached to this node.
    pub unknown_nodes: Vec<UnknownNode>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

impl Notification {
    /// Look a direct payload node up by local name.
    pub fn child(&self, local_name: &str) -> Option<&SchemaNode> {
        self.children
            .iter()
            .find(|c| c.qname().local_name == local_name)
    }
}
