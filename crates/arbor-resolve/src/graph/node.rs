//! Builder nodes.
//!
//! Every statement that survives to resolution is a [`NodeBuilder`]: a
//! common header shared by all kinds, plus a [`NodePayload`] variant
//! for the kind-specific state. Module is a node kind like any other,
//! so every parent chain terminates at a module node and "which module
//! does this node belong to" is a chain walk, not a stored field.
//!
//! # Design
//!
//! - One tagged enum instead of a trait object: the structural copier
//!   and the build pass both dispatch on kind, and exhaustive matches
//!   catch a forgotten kind at compile time.
//! - Kind-specific child lists (`ChildSet`) hold ids, never nodes, so
//!   a subtree can be restitched under a new parent without moving
//!   allocations.
//! - `original` chains point at the node a copy was made from; chains
//!   collapse to the first source at copy time.

use arbor_model::error::{CompileError, CompileResult, ErrorKind};
use arbor_model::foundation::{Must, NodeConstraints, QName, SchemaPath, SourceRef};
use arbor_model::model::DeviateKind;
use arbor_model::types::Status;

use super::arena::NodeId;
use super::build::Built;
use super::module::ModulePayload;
use super::typestate::TypeState;

/// A name as written, with its optional prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixedName {
    /// Prefix before the colon, if any.
    pub prefix: Option<String>,
    /// The local part.
    pub name: String,
}

impl PrefixedName {
    /// Split `name` or `prefix:name`. Returns `None` for empty parts
    /// or more than one colon.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, _) if !name.is_empty() => Some(Self {
                prefix: None,
                name: name.to_string(),
            }),
            (Some(prefix), Some(name), None) if !prefix.is_empty() && !name.is_empty() => {
                Some(Self {
                    prefix: Some(prefix.to_string()),
                    name: name.to_string(),
                })
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for PrefixedName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.prefix {
            Some(p) => write!(f, "{}:{}", p, self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// A target path as written: segments with their prefixes, not yet
/// bound to namespaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPath {
    /// True when the path starts with `/`.
    pub absolute: bool,
    /// Path segments, outermost first.
    pub segments: Vec<PrefixedName>,
}

impl RawPath {
    /// Parse a slash-separated node identifier path.
    pub fn parse(text: &str, source: &SourceRef) -> CompileResult<Self> {
        let absolute = text.starts_with('/');
        let body = text.strip_prefix('/').unwrap_or(text);
        if body.is_empty() {
            return Err(CompileError::new(
                ErrorKind::InvalidPath,
                source.clone(),
                format!("Invalid path '{text}': no node identifiers."),
            ));
        }
        let mut segments = Vec::new();
        for part in body.split('/') {
            match PrefixedName::parse(part) {
                Some(seg) => segments.push(seg),
                None => {
                    return Err(CompileError::new(
                        ErrorKind::InvalidPath,
                        source.clone(),
                        format!("Invalid path '{text}': bad node identifier '{part}'."),
                    ))
                }
            }
        }
        Ok(Self { absolute, segments })
    }
}

impl std::fmt::Display for RawPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if self.absolute || i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

/// Data tree constraints under construction.
///
/// Setting `min-elements` above zero forces `mandatory`: a node that
/// must have elements must itself be present.
#[derive(Debug, Clone, Default)]
pub struct ConstraintsBuilder {
    mandatory: Option<bool>,
    min_elements: Option<u32>,
    max_elements: Option<u32>,
    musts: Vec<Must>,
    when: Option<String>,
}

impl ConstraintsBuilder {
    /// Explicit mandatory flag, if one was declared or implied.
    pub fn mandatory(&self) -> Option<bool> {
        self.mandatory
    }

    /// True when the node must be present.
    pub fn is_mandatory(&self) -> bool {
        self.mandatory.unwrap_or(false)
    }

    /// Declare the mandatory flag.
    pub fn set_mandatory(&mut self, mandatory: bool) {
        self.mandatory = Some(mandatory);
    }

    /// Declared minimum element count.
    pub fn min_elements(&self) -> Option<u32> {
        self.min_elements
    }

    /// Declare the minimum element count. A minimum above zero implies
    /// the node is mandatory.
    pub fn set_min_elements(&mut self, min: u32) {
        self.min_elements = Some(min);
        if min > 0 {
            self.mandatory = Some(true);
        }
    }

    /// Declared maximum element count.
    pub fn max_elements(&self) -> Option<u32> {
        self.max_elements
    }

    /// Declare the maximum element count.
    pub fn set_max_elements(&mut self, max: u32) {
        self.max_elements = Some(max);
    }

    /// Declared guards.
    pub fn musts(&self) -> &[Must] {
        &self.musts
    }

    /// Attach a guard.
    pub fn add_must(&mut self, must: Must) {
        self.musts.push(must);
    }

    /// Declared conditional presence expression.
    pub fn when(&self) -> Option<&str> {
        self.when.as_deref()
    }

    /// Declare the conditional presence expression.
    pub fn set_when(&mut self, when: impl Into<String>) {
        self.when = Some(when.into());
    }

    /// Freeze into the immutable form.
    pub fn build(&self) -> NodeConstraints {
        NodeConstraints {
            mandatory: self.is_mandatory(),
            min_elements: self.min_elements,
            max_elements: self.max_elements,
            musts: self.musts.clone(),
            when: self.when.clone(),
        }
    }
}

/// An extension use carried inside a refine, copied onto the refine
/// target as a real unknown node when the refine applies.
#[derive(Debug, Clone)]
pub struct UnknownSpec {
    /// The prefixed keyword as written.
    pub keyword: String,
    /// Argument text, if any.
    pub argument: Option<String>,
    /// Line of the statement.
    pub line: usize,
}

/// A refine statement under a `uses`.
#[derive(Debug, Clone)]
pub struct RefineSpec {
    /// Slash path of the target, relative to the node holding the uses.
    pub target: String,
    /// Line of the refine statement.
    pub line: usize,
    /// New default value (leaf, choice via `default_case`).
    pub default: Option<String>,
    /// New mandatory flag.
    pub mandatory: Option<bool>,
    /// New presence flag (container).
    pub presence: Option<bool>,
    /// New minimum element count (list, leaf-list).
    pub min_elements: Option<u32>,
    /// New maximum element count (list, leaf-list).
    pub max_elements: Option<u32>,
    /// Guards to add.
    pub musts: Vec<Must>,
    /// New default case (choice).
    pub default_case: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New reference.
    pub reference: Option<String>,
    /// New configuration flag.
    pub config: Option<bool>,
    /// Extension uses to copy onto the target.
    pub unknown_nodes: Vec<UnknownSpec>,
}

impl RefineSpec {
    /// Refine of `target` with nothing overridden yet.
    pub fn new(target: impl Into<String>, line: usize) -> Self {
        Self {
            target: target.into(),
            line,
            default: None,
            mandatory: None,
            presence: None,
            min_elements: None,
            max_elements: None,
            musts: Vec::new(),
            default_case: None,
            description: None,
            reference: None,
            config: None,
            unknown_nodes: Vec::new(),
        }
    }
}

/// Child collections of a node that can hold other statements.
#[derive(Debug, Clone, Default)]
pub struct ChildSet {
    /// Data children in declaration order.
    pub children: Vec<NodeId>,
    /// Scoped typedefs.
    pub typedefs: Vec<NodeId>,
    /// Scoped groupings.
    pub groupings: Vec<NodeId>,
    /// Uses statements awaiting expansion.
    pub uses: Vec<NodeId>,
}

/// Kind-specific state of a builder node.
#[derive(Debug)]
pub enum NodePayload {
    /// A module or submodule root.
    Module(Box<ModulePayload>),
    /// Interior data node.
    Container(ContainerPayload),
    /// Scalar data node.
    Leaf(LeafPayload),
    /// Repeated scalar data node.
    LeafList(LeafListPayload),
    /// Repeated interior data node.
    List(ListPayload),
    /// Alternative selector.
    Choice(ChoicePayload),
    /// One alternative of a choice.
    Case(ChildSet),
    /// Opaque subtree.
    AnyXml,
    /// Reusable template.
    Grouping(ChildSet),
    /// Instantiation point of a grouping.
    Uses(UsesPayload),
    /// Named type derivation.
    Typedef(TypedefPayload),
    /// Operation.
    Rpc(RpcPayload),
    /// Operation input or output container.
    RpcIo(ChildSet),
    /// Event.
    Notification(ChildSet),
    /// Hierarchy member.
    Identity(IdentityPayload),
    /// Extension keyword declaration.
    Extension(ExtensionPayload),
    /// Conditional-capability flag.
    Feature,
    /// Implementation deviation record.
    Deviation(DeviationPayload),
    /// Injection of nodes into a target elsewhere.
    Augment(AugmentPayload),
    /// Statement using an extension keyword.
    Unknown(UnknownPayload),
}

/// Interior data node state.
#[derive(Debug, Default)]
pub struct ContainerPayload {
    /// Presence container flag.
    pub presence: bool,
    /// Child collections.
    pub body: ChildSet,
}

/// Scalar data node state.
#[derive(Debug)]
pub struct LeafPayload {
    /// Declared or resolved type.
    pub type_state: TypeState,
    /// Default value.
    pub default: Option<String>,
    /// Units of the value.
    pub units: Option<String>,
}

/// Repeated scalar data node state.
#[derive(Debug)]
pub struct LeafListPayload {
    /// Declared or resolved element type.
    pub type_state: TypeState,
    /// Elements keep insertion order.
    pub user_ordered: bool,
}

/// Repeated interior data node state.
#[derive(Debug, Default)]
pub struct ListPayload {
    /// Key leaf names in key order.
    pub keys: Vec<String>,
    /// Entries keep insertion order.
    pub user_ordered: bool,
    /// Child collections.
    pub body: ChildSet,
}

/// Alternative selector state.
#[derive(Debug, Default)]
pub struct ChoicePayload {
    /// Case nodes in declaration order.
    pub cases: Vec<NodeId>,
    /// Local name of the default case.
    pub default_case: Option<String>,
}

/// Instantiation point of a grouping.
#[derive(Debug)]
pub struct UsesPayload {
    /// The grouping name as written.
    pub grouping_ref: PrefixedName,
    /// The bound grouping node, once found.
    pub grouping: Option<NodeId>,
    /// Augments declared under this uses.
    pub augments: Vec<NodeId>,
    /// Refines declared under this uses.
    pub refines: Vec<RefineSpec>,
    /// True once the grouping has been instantiated here.
    pub expanded: bool,
}

/// Named type derivation state.
#[derive(Debug)]
pub struct TypedefPayload {
    /// Declared or resolved base type.
    pub type_state: TypeState,
    /// Units of values of this type.
    pub units: Option<String>,
    /// Default value.
    pub default: Option<String>,
}

/// Operation state.
#[derive(Debug, Default)]
pub struct RpcPayload {
    /// Input container node, if one exists yet.
    pub input: Option<NodeId>,
    /// Output container node, if one exists yet.
    pub output: Option<NodeId>,
    /// Scoped typedefs.
    pub typedefs: Vec<NodeId>,
    /// Scoped groupings.
    pub groupings: Vec<NodeId>,
}

/// Hierarchy member state.
#[derive(Debug)]
pub struct IdentityPayload {
    /// Base identity as written.
    pub base_ref: Option<PrefixedName>,
    /// The bound base identity node, once found.
    pub base: Option<NodeId>,
}

/// Extension keyword declaration state.
#[derive(Debug)]
pub struct ExtensionPayload {
    /// Name of the argument the keyword takes.
    pub argument: Option<String>,
    /// Argument carried as child element in XML renderings.
    pub yin_element: bool,
}

/// Implementation deviation record state.
#[derive(Debug)]
pub struct DeviationPayload {
    /// Target path as written.
    pub target: RawPath,
    /// Declared deviate action.
    pub deviate: Option<DeviateKind>,
    /// Target path bound to namespaces, once resolved.
    pub bound: Option<SchemaPath>,
    /// The target node, once resolved.
    pub target_node: Option<NodeId>,
}

/// Injection of nodes into a target elsewhere.
#[derive(Debug)]
pub struct AugmentPayload {
    /// Target path as written. Absolute for module-level augments,
    /// relative for augments under a uses.
    pub target: RawPath,
    /// Target path bound to namespaces.
    pub target_path: Option<SchemaPath>,
    /// The target node, once found.
    pub target_node: Option<NodeId>,
    /// Nodes to inject.
    pub body: ChildSet,
    /// Conditional presence expression.
    pub when: Option<String>,
    /// True once the injection happened or was skipped.
    pub resolved: bool,
    /// True when the target kind cannot be augmented.
    pub unsupported: bool,
}

impl AugmentPayload {
    /// Fresh augment of `target`.
    pub fn new(target: RawPath) -> Self {
        Self {
            target,
            target_path: None,
            target_node: None,
            body: ChildSet::default(),
            when: None,
            resolved: false,
            unsupported: false,
        }
    }
}

/// Statement using an extension keyword.
#[derive(Debug)]
pub struct UnknownPayload {
    /// The keyword as written.
    pub keyword: PrefixedName,
    /// Keyword qualified onto the declaring module, once bound.
    pub node_type: Option<QName>,
    /// Argument text.
    pub argument: Option<String>,
    /// The extension definition node, once bound.
    pub extension: Option<NodeId>,
}

impl NodePayload {
    /// Statement keyword of the node kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            NodePayload::Module(m) if m.is_submodule() => "submodule",
            NodePayload::Module(_) => "module",
            NodePayload::Container(_) => "container",
            NodePayload::Leaf(_) => "leaf",
            NodePayload::LeafList(_) => "leaf-list",
            NodePayload::List(_) => "list",
            NodePayload::Choice(_) => "choice",
            NodePayload::Case(_) => "case",
            NodePayload::AnyXml => "anyxml",
            NodePayload::Grouping(_) => "grouping",
            NodePayload::Uses(_) => "uses",
            NodePayload::Typedef(_) => "typedef",
            NodePayload::Rpc(_) => "rpc",
            NodePayload::RpcIo(_) => "rpc-io",
            NodePayload::Notification(_) => "notification",
            NodePayload::Identity(_) => "identity",
            NodePayload::Extension(_) => "extension",
            NodePayload::Feature => "feature",
            NodePayload::Deviation(_) => "deviation",
            NodePayload::Augment(_) => "augment",
            NodePayload::Unknown(_) => "unknown",
        }
    }

    /// Child collections, for kinds that hold statements.
    pub fn child_set(&self) -> Option<&ChildSet> {
        match self {
            NodePayload::Module(m) => Some(&m.body),
            NodePayload::Container(c) => Some(&c.body),
            NodePayload::List(l) => Some(&l.body),
            NodePayload::Case(cs)
            | NodePayload::Grouping(cs)
            | NodePayload::RpcIo(cs)
            | NodePayload::Notification(cs) => Some(cs),
            NodePayload::Augment(a) => Some(&a.body),
            _ => None,
        }
    }

    /// Mutable child collections.
    pub fn child_set_mut(&mut self) -> Option<&mut ChildSet> {
        match self {
            NodePayload::Module(m) => Some(&mut m.body),
            NodePayload::Container(c) => Some(&mut c.body),
            NodePayload::List(l) => Some(&mut l.body),
            NodePayload::Case(cs)
            | NodePayload::Grouping(cs)
            | NodePayload::RpcIo(cs)
            | NodePayload::Notification(cs) => Some(cs),
            NodePayload::Augment(a) => Some(&mut a.body),
            _ => None,
        }
    }

    /// True for kinds that appear in data trees.
    pub fn is_data_kind(&self) -> bool {
        matches!(
            self,
            NodePayload::Container(_)
                | NodePayload::Leaf(_)
                | NodePayload::LeafList(_)
                | NodePayload::List(_)
                | NodePayload::Choice(_)
                | NodePayload::Case(_)
                | NodePayload::AnyXml
        )
    }
}

/// A builder node: shared header plus kind-specific payload.
#[derive(Debug)]
pub struct NodeBuilder {
    /// Qualified name. Provisional for nodes under an unresolved
    /// augment; final after copies are restitched.
    pub qname: QName,
    /// Path from the module root. Recomputed on every structural copy.
    pub path: SchemaPath,
    /// Declaring statement location.
    pub source: SourceRef,
    /// Parent node; `None` only for module roots.
    pub parent: Option<NodeId>,
    /// First source of this node along the copy chain, if it is a copy.
    pub original: Option<NodeId>,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Declared configuration flag; `None` inherits from the parent.
    pub config: Option<bool>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
    /// Data tree constraints under construction.
    pub constraints: ConstraintsBuilder,
    /// Extension-keyword statements attached to this node.
    pub unknown_nodes: Vec<NodeId>,
    /// Kind-specific state.
    pub payload: NodePayload,
    /// Memoized build result. Set exactly once by the build pass;
    /// later builds return the same handles.
    pub built: Option<Built>,
}

impl NodeBuilder {
    /// Node with empty flags and no copy history.
    pub fn new(
        qname: QName,
        path: SchemaPath,
        source: SourceRef,
        parent: Option<NodeId>,
        payload: NodePayload,
    ) -> Self {
        Self {
            qname,
            path,
            source,
            parent,
            original: None,
            augmenting: false,
            added_by_uses: false,
            config: None,
            description: None,
            reference: None,
            status: Status::Current,
            constraints: ConstraintsBuilder::default(),
            unknown_nodes: Vec::new(),
            payload,
            built: None,
        }
    }

    /// Statement keyword of the node kind.
    pub fn kind_name(&self) -> &'static str {
        self.payload.kind_name()
    }
}
