//! Schema paths.
//!
//! A [`SchemaPath`] locates a node in the compiled tree as the sequence
//! of qualified names from the module root down to the node. Paths are
//! recomputed whenever a subtree is copied to a new parent, so they are
//! plain values with no sharing.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::qname::QName;

/// Absolute or relative location of a schema node.
///
/// Absolute paths start at a module root (`/interfaces/interface/mtu`),
/// relative paths are resolved against some anchor node, which is how
/// augments declared under a `uses` address nodes of the expanded
/// grouping.
///
/// # Examples
///
/// ```
/// # use arbor_model::foundation::{Namespace, QName, SchemaPath};
/// let ns = Namespace::new("urn:test");
/// let root = SchemaPath::root();
/// let child = root.child(QName::new(ns.clone(), None, "system"));
/// let leaf = child.child(QName::new(ns, None, "hostname"));
/// assert_eq!(leaf.to_string(), "/system/hostname");
/// assert_eq!(leaf.parent().unwrap(), child);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaPath {
    segments: Vec<QName>,
    absolute: bool,
}

impl SchemaPath {
    /// The empty absolute path: the conceptual parent of module
    /// top-level nodes.
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
            absolute: true,
        }
    }

    /// Create a path from explicit segments.
    pub fn new(segments: Vec<QName>, absolute: bool) -> Self {
        Self { segments, absolute }
    }

    /// Extend the path by one segment.
    pub fn child(&self, qname: QName) -> Self {
        let mut segments = self.segments.clone();
        segments.push(qname);
        Self {
            segments,
            absolute: self.absolute,
        }
    }

    /// Drop the final segment. Returns `None` at the root.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
            absolute: self.absolute,
        })
    }

    /// The path segments, root first.
    pub fn segments(&self) -> &[QName] {
        &self.segments
    }

    /// The final segment, naming the node itself.
    pub fn last(&self) -> Option<&QName> {
        self.segments.last()
    }

    /// Number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// True when the path starts at a module root.
    pub fn is_absolute(&self) -> bool {
        self.absolute
    }
}

impl fmt::Display for SchemaPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(if self.absolute { "/" } else { "." });
        }
        for (i, q) in self.segments.iter().enumerate() {
            if self.absolute || i > 0 {
                f.write_str("/")?;
            }
            f.write_str(&q.local_name)?;
        }
        Ok(())
    }
}
