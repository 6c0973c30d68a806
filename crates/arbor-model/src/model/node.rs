//! Immutable data nodes.
//!
//! These are the values `build()` produces from the mutable builder
//! graph. Each kind is its own struct behind an `Arc`; the [`SchemaNode`]
//! enum is the uniform handle passed around in child lists. Cloning a
//! `SchemaNode` clones the handle, never the node, which is what makes
//! memoized builds reference-stable.
//!
//! Parent links are deliberately absent. The builder graph owns the
//! upward edges; the finished model is a plain tree that can be shared
//! and dropped without cycles.

use std::sync::Arc;

use crate::foundation::{NodeConstraints, QName, SchemaPath};
use crate::types::{Status, Type, Typedef};

use super::extension::UnknownNode;

/// Uniform handle to an immutable data node.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// Interior node holding other nodes.
    Container(Arc<Container>),
    /// Scalar node.
    Leaf(Arc<Leaf>),
    /// Repeated scalar node.
    LeafList(Arc<LeafList>),
    /// Repeated interior node with optional keys.
    List(Arc<List>),
    /// Exactly one of several cases.
    Choice(Arc<Choice>),
    /// One alternative of a choice. Appears only under [`Choice::cases`].
    Case(Arc<Case>),
    /// Opaque subtree carried without further modeling.
    AnyXml(Arc<AnyXml>),
}

macro_rules! for_each_kind {
    ($self:ident, $node:ident => $body:expr) => {
        match $self {
            SchemaNode::Container($node) => $body,
            SchemaNode::Leaf($node) => $body,
            SchemaNode::LeafList($node) => $body,
            SchemaNode::List($node) => $body,
            SchemaNode::Choice($node) => $body,
            SchemaNode::Case($node) => $body,
            SchemaNode::AnyXml($node) => $body,
        }
    };
}

impl SchemaNode {
    /// Qualified name of the node.
    pub fn qname(&self) -> &QName {
        for_each_kind!(self, n => &n.qname)
    }

    /// Absolute path of the node.
    pub fn path(&self) -> &SchemaPath {
        for_each_kind!(self, n => &n.path)
    }

    /// True if the node was injected by an augment.
    pub fn is_augmenting(&self) -> bool {
        for_each_kind!(self, n => n.augmenting)
    }

    /// True if the node was instantiated from a grouping.
    pub fn is_added_by_uses(&self) -> bool {
        for_each_kind!(self, n => n.added_by_uses)
    }

    /// Effective configuration flag.
    pub fn is_config(&self) -> bool {
        for_each_kind!(self, n => n.config)
    }

    /// Data tree constraints.
    pub fn constraints(&self) -> &NodeConstraints {
        for_each_kind!(self, n => &n.constraints)
    }

    /// Statement description.
    pub fn description(&self) -> Option<&str> {
        for_each_kind!(self, n => n.description.as_deref())
    }

    /// Lifecycle status.
    pub fn status(&self) -> Status {
        for_each_kind!(self, n => n.status)
    }

    /// Statement keyword of the node kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            SchemaNode::Container(_) => "container",
            SchemaNode::Leaf(_) => "leaf",
            SchemaNode::LeafList(_) => "leaf-list",
            SchemaNode::List(_) => "list",
            SchemaNode::Choice(_) => "choice",
            SchemaNode::Case(_) => "case",
            SchemaNode::AnyXml(_) => "anyxml",
        }
    }

    /// Child nodes, empty for kinds that cannot hold any.
    ///
    /// Choice alternatives are not children; see [`Choice::cases`].
    pub fn children(&self) -> &[SchemaNode] {
        match self {
            SchemaNode::Container(n) => &n.children,
            SchemaNode::List(n) => &n.children,
            SchemaNode::Case(n) => &n.children,
            _ => &[],
        }
    }

    /// Look a direct child up by local name. Choices search their cases.
    pub fn child(&self, local_name: &str) -> Option<&SchemaNode> {
        if let SchemaNode::Choice(choice) = self {
            return choice.case(local_name).map(|c| &choice.case_nodes[c]);
        }
        self.children()
            .iter()
            .find(|c| c.qname().local_name == local_name)
    }

    /// True when two handles point at the same node.
    pub fn ptr_eq(&self, other: &SchemaNode) -> bool {
        match (self, other) {
            (SchemaNode::Container(a), SchemaNode::Container(b)) => Arc::ptr_eq(a, b),
            (SchemaNode::Leaf(a), SchemaNode::Leaf(b)) => Arc::ptr_eq(a, b),
            (SchemaNode::LeafList(a), SchemaNode::LeafList(b)) => Arc::ptr_eq(a, b),
            (SchemaNode::List(a), SchemaNode::List(b)) => Arc::ptr_eq(a, b),
            (SchemaNode::Choice(a), SchemaNode::Choice(b)) => Arc::ptr_eq(a, b),
            (SchemaNode::Case(a), SchemaNode::Case(b)) => Arc::ptr_eq(a, b),
            (SchemaNode::AnyXml(a), SchemaNode::AnyXml(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Interior node holding other nodes.
#[derive(Debug, Clone)]
pub struct Container {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Presence container: its existence alone carries meaning.
    pub presence: bool,
    /// Effective configuration flag.
    pub config: bool,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Data tree constraints.
    pub constraints: NodeConstraints,
    /// Child nodes in declaration order.
    pub children: Vec<SchemaNode>,
    /// Typedefs scoped to this container.
    pub typedefs: Vec<Arc<Typedef>>,
    /// Groupings scoped to this container.
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

/// Scalar node.
#[derive(Debug, Clone)]
pub struct Leaf {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Resolved value type.
    pub leaf_type: Type,
    /// Default value in string form.
    pub default: Option<String>,
    /// Units of the value.
    pub units: Option<String>,
    /// Effective configuration flag.
    pub config: bool,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Data tree constraints.
    pub constraints: NodeConstraints,
    /// Unmodeled statements attached to this node.
    pub unknown_nodes: Vec<UnknownNode>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

/// Repeated scalar node.
#[derive(Debug, Clone)]
pub struct LeafList {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Resolved element type.
    pub element_type: Type,
    /// Elements keep their insertion order in data trees.
    pub user_ordered: bool,
    /// Effective configuration flag.
    pub config: bool,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Data tree constraints.
    pub constraints: NodeConstraints,
    /// Unmodeled statements attached to this node.
    pub unknown_nodes: Vec<UnknownNode>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

/// Repeated interior node with optional keys.
#[derive(Debug, Clone)]
pub struct List {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Local names of the key leaves, in key order.
    pub keys: Vec<String>,
    /// Entries keep their insertion order in data trees.
    pub user_ordered: bool,
    /// Effective configuration flag.
    pub config: bool,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Data tree constraints.
    pub constraints: NodeConstraints,
    /// Child nodes in declaration order.
    pub children: Vec<SchemaNode>,
    /// Typedefs scoped to this list.
    pub typedefs: Vec<Arc<Typedef>>,
    /// Groupings scoped to this list.
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

/// Exactly one of several cases.
#[derive(Debug, Clone)]
pub struct Choice {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// The alternatives, wrapped as `SchemaNode::Case` handles.
    pub case_nodes: Vec<SchemaNode>,
    /// Local name of the default case, if declared.
    pub default_case: Option<String>,
    /// Effective configuration flag.
    pub config: bool,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Data tree constraints.
    pub constraints: NodeConstraints,
    /// Unmodeled statements attached to this node.
    pub unknown_nodes: Vec<UnknownNode>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

impl Choice {
    /// Index of the case with the given local name.
    fn case(&self, local_name: &str) -> Option<usize> {
        self.case_nodes
            .iter()
            .position(|c| c.qname().local_name == local_name)
    }

    /// The alternatives as case structs.
    pub fn cases(&self) -> impl Iterator<Item = &Arc<Case>> {
        self.case_nodes.iter().filter_map(|n| match n {
            SchemaNode::Case(c) => Some(c),
            _ => None,
        })
    }
}

/// One alternative of a choice.
#[derive(Debug, Clone)]
pub struct Case {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Effective configuration flag, inherited from the choice.
    pub config: bool,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Data tree constraints.
    pub constraints: NodeConstraints,
    /// Child nodes in declaration order.
    pub children: Vec<SchemaNode>,
    /// Unmodeled statements attached to this node.
    pub unknown_nodes: Vec<UnknownNode>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

/// Opaque subtree carried without further modeling.
#[derive(Debug, Clone)]
pub struct AnyXml {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Effective configuration flag.
    pub config: bool,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Data tree constraints.
    pub constraints: NodeConstraints,
    /// Unmodeled statements attached to this node.
    pub unknown_nodes: Vec<UnknownNode>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

/// Reusable block of nodes, instantiated by `uses`.
///
/// A grouping is a template: its children keep the namespace of the
/// declaring module and never appear in data trees themselves. The
/// copies made at each `uses` site are what end up in the tree.
#[derive(Debug, Clone)]
pub struct Grouping {
    /// Qualified name.
    pub qname: QName,
    /// Absolute path.
    pub path: SchemaPath,
    /// Template child nodes.
    pub children: Vec<SchemaNode>,
    /// Typedefs scoped to this grouping.
    pub typedefs: Vec<Arc<Typedef>>,
    /// Groupings nested in this grouping.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Namespace;

    fn qname(name: &str) -> QName {
        QName::new(Namespace::new("urn:test"), None, name)
    }

    fn leaf(name: &str) -> SchemaNode {
        SchemaNode::Leaf(Arc::new(Leaf {
            qname: qname(name),
            path: SchemaPath::root().child(qname(name)),
            leaf_type: Type::Boolean,
            default: None,
            units: None,
            config: true,
            augmenting: false,
            added_by_uses: false,
            constraints: NodeConstraints::default(),
            unknown_nodes: vec![],
            description: None,
            reference: None,
            status: Status::Current,
        }))
    }

    fn container(name: &str, children: Vec<SchemaNode>) -> SchemaNode {
        SchemaNode::Container(Arc::new(Container {
            qname: qname(name),
            path: SchemaPath::root().child(qname(name)),
            presence: false,
            config: true,
            augmenting: false,
            added_by_uses: false,
            constraints: NodeConstraints::default(),
            children,
            typedefs: vec![],
            groupings: vec![],
            unknown_nodes: vec![],
            description: None,
            reference: None,
            status: Status::Current,
        }))
    }

    #[test]
    fn child_lookup_finds_by_local_name() {
        let c = container("box", vec![leaf("a"), leaf("b")]);
        assert!(c.child("b").is_some());
        assert!(c.child("missing").is_none());
        assert_eq!(c.children().len(), 2);
    }

    #[test]
    fn leaves_have_no_children() {
        let l = leaf("a");
        assert!(l.children().is_empty());
        assert!(l.child("anything").is_none());
        assert_eq!(l.kind_name(), "leaf");
    }

    #[test]
    fn ptr_eq_is_handle_identity() {
        let a = leaf("a");
        let a2 = a.clone();
        let b = leaf("a");
        assert!(a.ptr_eq(&a2));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn choice_cases_are_reachable_through_child() {
        let case = SchemaNode::Case(Arc::new(Case {
            qname: qname("ethernet"),
            path: SchemaPath::root(),
            config: true,
            augmenting: false,
            added_by_uses: false,
            constraints: NodeConstraints::default(),
            children: vec![leaf("speed")],
            unknown_nodes: vec![],
            description: None,
            reference: None,
            status: Status::Current,
        }));
        let choice = SchemaNode::Choice(Arc::new(Choice {
            qname: qname("transport"),
            path: SchemaPath::root(),
            case_nodes: vec![case],
            default_case: None,
            config: true,
            augmenting: false,
            added_by_uses: false,
            constraints: NodeConstraints::default(),
            unknown_nodes: vec![],
            description: None,
            reference: None,
            status: Status::Current,
        }));
        let found = choice.child("ethernet").unwrap();
        assert_eq!(found.kind_name(), "case");
        assert!(found.child("speed").is_some());
    }
}
