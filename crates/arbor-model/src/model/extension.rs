//! Extensions and the statements that use them.
//!
//! A module can declare extension keywords; statements using them reach
//! the compiler as unknown nodes carrying a prefixed keyword and an
//! optional argument. Resolution rewrites the keyword onto the
//! declaring module's namespace and attaches the extension definition
//! when one exists. A keyword whose module is known but which names no
//! extension there stays unbound rather than failing the build.

use std::sync::Arc;

use crate::foundation::{QName, SchemaPath};
use crate::types::Status;

/// A declared extension keyword.
#[derive(Debug, Clone)]
pub struct Extension {
    /// Qualified name of the keyword.
    pub qname: QName,
    /// Name of the argument the keyword takes, if any.
    pub argument: Option<String>,
    /// Whether the argument is carried as a child element rather than
    /// an attribute in XML renderings.
    pub yin_element: bool,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

/// A statement using an extension keyword.
#[derive(Debug, Clone)]
pub struct UnknownNode {
    /// Qualified name of the statement itself.
    pub qname: QName,
    /// Absolute path of the statement.
    pub path: SchemaPath,
    /// The keyword, qualified with the declaring module's namespace
    /// once resolved.
    pub node_type: QName,
    /// Argument text, if the statement carried one.
    pub argument: Option<String>,
    /// The extension definition, when the declaring module defines one.
    pub extension: Option<Arc<Extension>>,
    /// Injected by an augment.
    pub augmenting: bool,
    /// Instantiated from a grouping.
    pub added_by_uses: bool,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
}

impl UnknownNode {
    /// True once the keyword has a definition attached.
    pub fn is_bound(&self) -> bool {
        self.extension.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Namespace;

    #[test]
    fn binding_is_visible() {
        let ns = Namespace::new("urn:meta");
        let ext = Arc::new(Extension {
            qname: QName::new(ns.clone(), None, "annotation"),
            argument: Some("name".into()),
            yin_element: false,
            description: None,
            reference: None,
            status: Status::Current,
        });
        let mut unknown = UnknownNode {
            qname: QName::new(ns.clone(), None, "annotation"),
            path: SchemaPath::root(),
            node_type: QName::new(ns, None, "annotation"),
            argument: Some("last-modified".into()),
            extension: None,
            augmenting: false,
            added_by_uses: false,
            description: None,
            reference: None,
            status: Status::Current,
        };
        assert!(!unknown.is_bound());
        unknown.extension = Some(ext);
        assert!(unknown.is_bound());
    }
}
