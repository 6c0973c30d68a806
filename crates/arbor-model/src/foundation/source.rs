//! Source locations for diagnostics.
//!
//! Statements arrive from the statement layer already split into
//! module name and line number, so the location type is just that
//! pair. Line 0 marks nodes the compiler synthesized itself.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Location of a statement inside a module source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceRef {
    /// Name of the module (or submodule) the statement was read from.
    pub module: String,
    /// 1-based line number; 0 for synthesized nodes.
    pub line: usize,
}

impl SourceRef {
    /// Location of a statement at `line` of `module`.
    pub fn new(module: impl Into<String>, line: usize) -> Self {
        Self {
            module: module.into(),
            line,
        }
    }

    /// Location for a node the compiler created with no source form,
    /// such as an operation input container materialized on demand.
    pub fn synthetic(module: impl Into<String>) -> Self {
        Self::new(module, 0)
    }

    /// True for compiler-created nodes.
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_module_colon_line() {
        assert_eq!(SourceRef::new("example", 42).to_string(), "example:42");
    }

    #[test]
    fn synthetic_refs_have_line_zero() {
        let s = SourceRef::synthetic("example");
        assert!(s.is_synthetic());
        assert!(!SourceRef::new("example", 1).is_synthetic());
    }
}
