//! Identities.
//!
//! Identities form a global, extensible naming hierarchy: any module
//! can derive new identities from a base declared elsewhere. The
//! compiled form links both directions. The upward link is an owning
//! `Arc` set at construction; the downward link is a list of weak
//! handles filled in exactly once after every module has been built,
//! because only then is the full set of derivations known.

use std::sync::{Arc, OnceLock, Weak};

use crate::foundation::QName;
use crate::types::Status;

/// A compiled identity.
#[derive(Debug)]
pub struct Identity {
    /// Qualified name.
    pub qname: QName,
    /// The identity this one is derived from, if any.
    pub base: Option<Arc<Identity>>,
    /// Statement description.
    pub description: Option<String>,
    /// Statement reference.
    pub reference: Option<String>,
    /// Lifecycle status.
    pub status: Status,
    derived: OnceLock<Vec<Weak<Identity>>>,
}

impl Identity {
    /// Create an identity. The derived set starts unlinked.
    pub fn new(
        qname: QName,
        base: Option<Arc<Identity>>,
        description: Option<String>,
        reference: Option<String>,
        status: Status,
    ) -> Self {
        Self {
            qname,
            base,
            description,
            reference,
            status,
            derived: OnceLock::new(),
        }
    }

    /// Identities directly derived from this one.
    ///
    /// Empty until the compiler links the derived sets; handles to
    /// identities that have been dropped are silently skipped.
    pub fn derived(&self) -> Vec<Arc<Identity>> {
        match self.derived.get() {
            Some(weak) => weak.iter().filter_map(Weak::upgrade).collect(),
            None => Vec::new(),
        }
    }

    /// Install the derived set. Returns false if it was already set;
    /// the first set wins.
    pub fn link_derived(&self, derived: Vec<Weak<Identity>>) -> bool {
        self.derived.set(derived).is_ok()
    }

    /// True if this identity transitively derives from `ancestor`.
    pub fn is_derived_from(&self, ancestor: &Arc<Identity>) -> bool {
        let mut current = self.base.clone();
        while let Some(base) = current {
            if Arc::ptr_eq(&base, ancestor) {
                return true;
            }
            current = base.base.clone();
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::Namespace;

    fn identity(name: &str, base: Option<Arc<Identity>>) -> Arc<Identity> {
        Arc::new(Identity::new(
            QName::new(Namespace::new("urn:test"), None, name),
            base,
            None,
            None,
            Status::Current,
        ))
    }

    #[test]
    fn derived_is_empty_before_linking() {
        let base = identity("interface-type", None);
        assert!(base.derived().is_empty());
    }

    #[test]
    fn link_derived_is_set_once() {
        let base = identity("interface-type", None);
        let eth = identity("ethernet", Some(base.clone()));
        assert!(base.link_derived(vec![Arc::downgrade(&eth)]));
        assert!(!base.link_derived(vec![]));
        let derived = base.derived();
        assert_eq!(derived.len(), 1);
        assert!(Arc::ptr_eq(&derived[0], &eth));
    }

    #[test]
    fn dropped_derivations_disappear() {
        let base = identity("interface-type", None);
        {
            let gone = identity("short-lived", Some(base.clone()));
            assert!(base.link_derived(vec![Arc::downgrade(&gone)]));
        }
        assert!(base.derived().is_empty());
    }

    #[test]
    fn is_derived_from_walks_the_chain() {
        let root = identity("crypto-alg", None);
        let mid = identity("aes", Some(root.clone()));
        let leaf = identity("aes-256", Some(mid.clone()));
        assert!(leaf.is_derived_from(&mid));
        assert!(leaf.is_derived_from(&root));
        assert!(!root.is_derived_from(&leaf));
    }
}
