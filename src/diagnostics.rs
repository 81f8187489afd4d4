//! Conversion diagnostics - collection and output

use crate::ast::SourceRange;
use crate::error::ConvertError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticSpan {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    pub line: usize,
    pub column: usize,
    pub end_line: usize,
    pub end_column: usize,
}

impl DiagnosticSpan {
    pub fn from_range(file: Option<&str>, range: SourceRange) -> Self {
        Self {
            file: file.map(str::to_string),
            line: range.start.line,
            column: range.start.column,
            end_line: range.end.line,
            end_column: range.end.column,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// What went wrong, independent of the wording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Identifier or member not bound; the construct degrades
    UnresolvedSymbol,
    /// No rule for a node kind under the active pair; a placeholder is emitted
    UnsupportedConstruct,
    /// The input did not parse cleanly; nothing is converted
    MalformedInput,
    /// More than one reading was possible; the conservative one was used
    AmbiguousSemantics,
    Io,
    Config,
}

impl DiagnosticKind {
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticKind::UnresolvedSymbol => "CLR-UNRESOLVED-SYMBOL",
            DiagnosticKind::UnsupportedConstruct => "CLR-UNSUPPORTED-CONSTRUCT",
            DiagnosticKind::MalformedInput => "CLR-MALFORMED-INPUT",
            DiagnosticKind::AmbiguousSemantics => "CLR-AMBIGUOUS-SEMANTICS",
            DiagnosticKind::Io => "CLR-IO-ERROR",
            DiagnosticKind::Config => "CLR-CONFIG-ERROR",
        }
    }

    pub fn default_severity(&self) -> DiagnosticSeverity {
        match self {
            DiagnosticKind::UnresolvedSymbol | DiagnosticKind::AmbiguousSemantics => {
                DiagnosticSeverity::Warning
            }
            DiagnosticKind::UnsupportedConstruct
            | DiagnosticKind::MalformedInput
            | DiagnosticKind::Io
            | DiagnosticKind::Config => DiagnosticSeverity::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub kind: DiagnosticKind,
    pub message: String,
    pub severity: DiagnosticSeverity,
    pub span: DiagnosticSpan,
    pub phase: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: String, span: DiagnosticSpan, phase: &str) -> Self {
        Self {
            code: kind.code().to_string(),
            kind,
            message,
            severity: kind.default_severity(),
            span,
            phase: phase.to_string(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == DiagnosticSeverity::Error
    }
}

/// Ordered diagnostics of one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    pub diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| !d.is_error())
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Record `diag` unless an identical one is already present
    pub fn add(&mut self, diag: Diagnostic) {
        let duplicate = self.diagnostics.iter().any(|d| {
            d.code == diag.code && d.span == diag.span && d.message == diag.message
        });
        if !duplicate {
            self.diagnostics.push(diag);
        }
    }

    pub fn extend(&mut self, other: Diagnostics) {
        for diag in other.diagnostics {
            self.add(diag);
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for diag in &self.diagnostics {
            let file = diag.span.file.as_deref().unwrap_or("<input>");
            let severity = match diag.severity {
                DiagnosticSeverity::Error => "error",
                DiagnosticSeverity::Warning => "warning",
            };
            out.push_str(&format!(
                "[{}] {}:{}:{} {}: {}\n",
                diag.code, file, diag.span.line, diag.span.column, severity, diag.message
            ));
        }
        out
    }
}

/// Turn a run-level error into the single fatal diagnostic reported for it
pub fn from_error(err: &ConvertError, file: Option<&str>) -> Diagnostics {
    let mut diags = Diagnostics::new();
    let (kind, line, phase) = match err {
        ConvertError::MalformedInput { line, .. } => (DiagnosticKind::MalformedInput, *line, "parse"),
        ConvertError::PendingForwardRefs(_)
        | ConvertError::InvalidLanguagePair { .. }
        | ConvertError::Catalog(_)
        | ConvertError::Config(_) => (DiagnosticKind::Config, 1, "resolve"),
        ConvertError::Json(_) => (DiagnosticKind::MalformedInput, 1, "parse"),
        ConvertError::Io(_) => (DiagnosticKind::Io, 1, "parse"),
    };
    let span = DiagnosticSpan::from_range(file, SourceRange::on_line(line.max(1), 1, 1));
    diags.add(Diagnostic::new(kind, format!("{err}"), span, phase));
    diags
}
