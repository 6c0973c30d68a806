//! Qualified names for schema nodes.
//!
//! Every node in a compiled schema is identified by a [`QName`]: the
//! namespace of its owning module, the revision of that module, and a
//! local name. Two leaves named `mtu` in different modules never
//! collide because their namespaces differ; two revisions of the same
//! module produce distinct qualified names for the same statement.
//!
//! # Design
//!
//! - `Namespace` — opaque URI string, compared byte-wise
//! - `Revision` — calendar date, totally ordered so "latest" is well defined
//! - `QName` — (namespace, revision, local name) triple
//!
//! Qualified names are value types. Structural copies made during
//! grouping expansion rebase them onto the instantiating module, which
//! is why they are cheap to clone and carry no back-pointers.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Module namespace URI.
///
/// Namespaces are opaque: the compiler never dereferences them, it only
/// compares them. Ordering is lexicographic and exists so namespaces can
/// key ordered maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Namespace(String);

impl Namespace {
    /// Create a namespace from a URI string.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The namespace URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Namespace {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Module revision date.
///
/// Revisions order chronologically. A module may exist in several
/// revisions at once; imports select one by exact date or take the
/// latest when no date is given.
///
/// # Examples
///
/// ```
/// # use arbor_model::foundation::Revision;
/// let old = Revision::parse("2020-01-01").unwrap();
/// let new = Revision::parse("2021-06-01").unwrap();
/// assert!(old < new);
/// assert_eq!(new.to_string(), "2021-06-01");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Revision(NaiveDate);

/// Error produced when a revision string is not a valid `YYYY-MM-DD` date.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid revision date '{text}': expected YYYY-MM-DD")]
pub struct RevisionParseError {
    /// The offending input.
    pub text: String,
}

impl Revision {
    /// Parse a revision from its canonical `YYYY-MM-DD` form.
    pub fn parse(text: &str) -> Result<Self, RevisionParseError> {
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Self)
            .map_err(|_| RevisionParseError { text: text.to_string() })
    }

    /// Build a revision from calendar components.
    ///
    /// Returns `None` for dates that do not exist (e.g. month 13).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// The underlying date.
    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Qualified name of a schema node.
///
/// The namespace and revision come from the module the node belongs to.
/// Nodes instantiated from a grouping in another module are rebased:
/// they keep their local name but take the namespace and revision of
/// the module that uses the grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    /// Namespace of the owning module.
    pub namespace: Namespace,
    /// Revision of the owning module, if it declares one.
    pub revision: Option<Revision>,
    /// Name local to the namespace.
    pub local_name: String,
}

impl QName {
    /// Create a qualified name.
    pub fn new(
        namespace: Namespace,
        revision: Option<Revision>,
        local_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace,
            revision,
            local_name: local_name.into(),
        }
    }

    /// The same local name under a different module identity.
    ///
    /// This is the rebasing operation used by the structural copier.
    pub fn rebase(&self, namespace: Namespace, revision: Option<Revision>) -> Self {
        Self {
            namespace,
            revision,
            local_name: self.local_name.clone(),
        }
    }

    /// True if `other` names the same node: equal namespace and local
    /// name. Revisions are ignored so that nodes can be addressed
    /// across revisions of the same module.
    pub fn same_node(&self, other: &QName) -> bool {
        self.namespace == other.namespace && self.local_name == other.local_name
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.revision {
            Some(rev) => write!(f, "({}?revision={}){}", self.namespace, rev, self.local_name),
            None => write!(f, "({}){}", self.namespace, self.local_name),
        }
    }
}
