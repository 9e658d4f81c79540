use serde::Serialize;

use crate::types::{Diagnostic, DiagnosticSeverity};

/// Process outcome of a generation run. Numeric codes are stable and are
/// what build scripts key off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitStatus {
    Success,
    Failure,
    TypeMismatch,
    GenerationFailed,
    ReferenceWiring,
    MissingConfigProperty,
    InvalidParentReference,
    Usage,
    PathNotFound,
}

impl ExitStatus {
    pub fn code(self) -> i32 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Failure => 1,
            ExitStatus::TypeMismatch => 2,
            ExitStatus::GenerationFailed => 3,
            ExitStatus::ReferenceWiring => 4,
            ExitStatus::MissingConfigProperty => 5,
            ExitStatus::InvalidParentReference => 7,
            ExitStatus::Usage => 100,
            ExitStatus::PathNotFound => 101,
        }
    }

    /// Severity used to pick the status reported for a run with several
    /// failures. Independent of the numeric code.
    fn rank(self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::InvalidParentReference => 1,
            ExitStatus::ReferenceWiring => 2,
            ExitStatus::GenerationFailed => 3,
            ExitStatus::TypeMismatch => 4,
            ExitStatus::MissingConfigProperty => 5,
            ExitStatus::Failure => 6,
            ExitStatus::PathNotFound => 7,
            ExitStatus::Usage => 8,
        }
    }

    pub fn worst(self, other: ExitStatus) -> ExitStatus {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }

    pub fn is_success(self) -> bool {
        self == ExitStatus::Success
    }
}

/// Diagnostics and running status for one generation run.
///
/// Per-class failures are recorded here and processing moves on to the next
/// class; only the worst status survives to the exit code.
#[derive(Debug, Clone)]
pub struct BuildContext {
    diagnostics: Vec<Diagnostic>,
    status: ExitStatus,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildContext {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
            status: ExitStatus::Success,
        }
    }

    /// Records an error diagnostic and folds its status into the run.
    pub fn fail(&mut self, diagnostic: Diagnostic, status: ExitStatus) {
        tracing::error!(
            code = %diagnostic.code,
            namespace = %diagnostic.namespace,
            class = diagnostic.class.as_deref().unwrap_or(""),
            "{}",
            diagnostic.message
        );
        self.record(diagnostic, status);
    }

    /// Like [`BuildContext::fail`] without logging; the caller has already
    /// reported it at its own level.
    pub fn record(&mut self, diagnostic: Diagnostic, status: ExitStatus) {
        self.status = self.status.worst(status);
        self.diagnostics.push(diagnostic);
    }

    pub fn warn(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(code = %diagnostic.code, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    pub fn status(&self) -> ExitStatus {
        self.status
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}
