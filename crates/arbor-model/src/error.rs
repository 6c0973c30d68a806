//! Compile-time error reporting and diagnostics.
//!
//! This module provides the structured error system shared by every
//! compile pass. Errors are rich diagnostics with source locations,
//! messages, and optional hints.
//!
//! # Design
//!
//! - `CompileError` — single diagnostic with a primary location
//! - `ErrorKind` — categorizes errors by the pass that detected them
//! - `Severity` — error, warning, or note
//! - `DiagnosticFormatter` — renders diagnostics for terminals and logs
//!
//! Passes accumulate diagnostics instead of stopping at the first
//! failure; tolerated degradations ride along as warnings in the same
//! vector that carries hard errors.
//!
//! # Examples
//!
//! ```
//! # use arbor_model::error::*;
//! # use arbor_model::foundation::SourceRef;
//! let error = CompileError::new(
//!     ErrorKind::UnknownGrouping,
//!     SourceRef::new("example", 12),
//!     "Referenced grouping 'endpoints' not found.".to_string(),
//! );
//! assert_eq!(error.to_string(), "error: unknown grouping: Referenced grouping 'endpoints' not found.");
//! ```

use std::fmt;

use crate::foundation::SourceRef;

/// Compilation diagnostic with source location and message.
///
/// Each diagnostic has:
/// - Primary location (where the statement at fault was declared)
/// - Error kind (categorizes the error)
/// - Message (human-readable explanation)
/// - Optional secondary labels (related statements)
/// - Optional notes (additional context or suggestions)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileError {
    /// Category of this error
    pub kind: ErrorKind,
    /// Severity level
    pub severity: Severity,
    /// Primary source location
    pub source: SourceRef,
    /// Primary error message
    pub message: String,
    /// Additional labeled locations
    pub labels: Vec<Label>,
    /// Additional notes or hints
    pub notes: Vec<String>,
}

/// Category of compilation error.
///
/// Errors are categorized by the compile pass that detected them. This
/// enables filtering, statistics, and pass-specific recovery.
///
/// # Invariant
///
/// The discriminant values must match the ERROR_KIND_NAMES array indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorKind {
    // Statement graph construction
    /// Sibling with the same qualified name already declared
    DuplicateNode = 0,
    /// Statement declared under a parent that cannot hold it
    IllegalParent = 1,
    /// Malformed node identifier or path argument
    InvalidPath = 2,
    /// Module with the same name and revision already registered
    DuplicateModule = 3,

    // Reference resolution
    /// Prefix with no matching import
    UndefinedPrefix = 4,
    /// Import or include names a module the registry does not hold
    UnknownModule = 5,
    /// `uses` names a grouping that is not in scope
    UnknownGrouping = 6,
    /// Named type is neither built in nor a visible typedef
    UnknownType = 7,
    /// Base identity reference does not resolve
    UnknownIdentity = 8,
    /// Extension prefix does not resolve to any module
    UnknownExtension = 9,
    /// Augment target still absent after the retry rounds
    AugmentTargetNotFound = 10,
    /// Deviation target path does not resolve
    DeviationTargetNotFound = 11,
    /// Refine path does not name a node of the expanded grouping
    RefineTargetNotFound = 12,

    // Semantic validation
    /// Refine attribute not legal for the target node kind
    IllegalRefine = 13,
    /// Augment breaks a structural rule of its target
    IllegalAugment = 14,
    /// Restriction not expressible on the base type
    InvalidRestriction = 15,
    /// Groupings, typedefs or identities form a cycle
    CyclicDependency = 16,

    // Tolerated degradations
    /// Import asked for a revision newer than any known
    RevisionFallback = 17,
    /// Augment points at a node kind that cannot be augmented
    UnsupportedTarget = 18,

    // Generic
    /// Structural copy hit a node kind it cannot reproduce
    CopyFailed = 19,
    /// Internal compiler error (bug in the compiler)
    Internal = 20,
}

/// Human-readable names for error kinds.
///
/// Index matches ErrorKind discriminant.
const ERROR_KIND_NAMES: &[&str] = &[
    "duplicate node",              // 0: DuplicateNode
    "illegal parent",              // 1: IllegalParent
    "invalid path",                // 2: InvalidPath
    "duplicate module",            // 3: DuplicateModule
    "undefined prefix",            // 4: UndefinedPrefix
    "unknown module",              // 5: UnknownModule
    "unknown grouping",            // 6: UnknownGrouping
    "unknown type",                // 7: UnknownType
    "unknown identity",            // 8: UnknownIdentity
    "unknown extension",           // 9: UnknownExtension
    "augment target not found",    // 10: AugmentTargetNotFound
    "deviation target not found",  // 11: DeviationTargetNotFound
    "refine target not found",     // 12: RefineTargetNotFound
    "illegal refine",              // 13: IllegalRefine
    "illegal augment",             // 14: IllegalAugment
    "invalid restriction",         // 15: InvalidRestriction
    "cyclic dependency",           // 16: CyclicDependency
    "revision fallback",           // 17: RevisionFallback
    "unsupported target",          // 18: UnsupportedTarget
    "copy failed",                 // 19: CopyFailed
    "internal compiler error",     // 20: Internal
];

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// Informational note (not an error)
    Note,
    /// Warning (schema is usable but degraded)
    Warning,
    /// Error (compilation cannot produce a schema)
    Error,
}

/// Secondary labeled location in a diagnostic.
///
/// Used to point to related statements (e.g., "first declared here").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Source location
    pub source: SourceRef,
    /// Label text
    pub message: String,
}

impl CompileError {
    /// Creates a new error diagnostic.
    ///
    /// # Parameters
    ///
    /// * `kind` - Error category
    /// * `source` - Primary source location
    /// * `message` - Human-readable error message
    ///
    /// # Returns
    ///
    /// A new error with severity `Error` and no secondary labels or notes.
    pub fn new(kind: ErrorKind, source: SourceRef, message: String) -> Self {
        Self::with_severity(kind, Severity::Error, source, message)
    }

    /// Creates a new warning diagnostic.
    pub fn warning(kind: ErrorKind, source: SourceRef, message: String) -> Self {
        Self::with_severity(kind, Severity::Warning, source, message)
    }

    /// Creates a new note diagnostic.
    pub fn note(kind: ErrorKind, source: SourceRef, message: String) -> Self {
        Self::with_severity(kind, Severity::Note, source, message)
    }

    /// Internal constructor with explicit severity.
    fn with_severity(kind: ErrorKind, severity: Severity, source: SourceRef, message: String) -> Self {
        Self {
            kind,
            severity,
            source,
            message,
            labels: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Adds a secondary labeled location.
    ///
    /// # Parameters
    ///
    /// * `source` - Related statement location
    /// * `message` - Label text (e.g., "first declared here")
    ///
    /// # Returns
    ///
    /// Self (for chaining).
    pub fn with_label(mut self, source: SourceRef, message: String) -> Self {
        self.labels.push(Label { source, message });
        self
    }

    /// Adds a note or hint.
    pub fn with_note(mut self, note: String) -> Self {
        self.notes.push(note);
        self
    }

    /// True when this diagnostic stops compilation.
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl ErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn name(self) -> &'static str {
        ERROR_KIND_NAMES[self as usize]
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}: {}",
            self.severity,
            self.kind.name(),
            self.message
        )
    }
}

impl std::error::Error for CompileError {}

/// Result type for compilation operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// Formats diagnostics for terminals and logs.
///
/// Produces messages of the form:
///
/// ```text
/// error: unknown grouping: Referenced grouping 'endpoints' not found.
///   --> example:12
///    = note: uses declared here (example:12)
///    = help: groupings must be declared before the end of the enclosing module
/// ```
///
/// Statements reach the compiler already detached from their source
/// text, so no snippet is printed, only locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagnosticFormatter;

impl DiagnosticFormatter {
    /// Creates a formatter.
    pub fn new() -> Self {
        Self
    }

    /// Formats a single diagnostic.
    pub fn format(&self, error: &CompileError) -> String {
        let mut out = String::new();
        out.push_str(&error.to_string());
        out.push('\n');
        out.push_str(&format!("  --> {}\n", error.source));
        for label in &error.labels {
            out.push_str(&format!("   = note: {} ({})\n", label.message, label.source));
        }
        for note in &error.notes {
            out.push_str(&format!("   = help: {note}\n"));
        }
        out
    }

    /// Formats a batch of diagnostics separated by blank lines.
    pub fn format_all(&self, errors: &[CompileError]) -> String {
        errors
            .iter()
            .map(|e| self.format(e))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
