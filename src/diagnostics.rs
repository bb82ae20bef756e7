//! Diagnostics shared by every pipeline stage.
//!
//! Stages never throw for malformed input; they append [`Diagnostic`] values
//! to their output and keep going. Only a genuine internal invariant
//! violation (a pipeline bug, not bad user input) may panic.

use serde::Serialize;
use std::fmt;

/// Identifies one source file inside a compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FileId(pub u32);

impl FileId {
    pub const ZERO: FileId = FileId(0);
}

/// Byte range inside one source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(file: FileId, start: usize, end: usize) -> Self {
        Span { file, start, end }
    }

    pub fn point(file: FileId, at: usize) -> Self {
        Span {
            file,
            start: at,
            end: at,
        }
    }

    /// Smallest span covering both `self` and `other`.
    ///
    /// Panics if the spans belong to different files; merging across files is
    /// a pipeline bug.
    pub fn merge(self, other: Span) -> Span {
        assert_eq!(self.file, other.file, "span merge across files");
        Span {
            file: self.file,
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// Pipeline stage a diagnostic originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Lexer,
    Parser,
    AstBuilder,
    Symbols,
    Resolver,
    Validator,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Lexer => "lexer",
            Stage::Parser => "parser",
            Stage::AstBuilder => "ast",
            Stage::Symbols => "symbols",
            Stage::Resolver => "resolver",
            Stage::Validator => "validator",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Error,
}

/// One accumulated problem report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub stage: Stage,
    pub span: Span,
    pub message: String,
}

impl Diagnostic {
    pub fn error(stage: Stage, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Error,
            stage,
            span,
            message: message.into(),
        }
    }

    pub fn warning(stage: Stage, span: Span, message: impl Into<String>) -> Self {
        Diagnostic {
            severity: Severity::Warning,
            stage,
            span,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

/// Orders diagnostics by source position (file, then byte offset).
pub fn sort_by_position(diags: &mut [Diagnostic]) {
    diags.sort_by_key(|d| (d.span.file, d.span.start, d.span.end));
}

/// Precomputed newline offsets for byte-offset to line:column conversion.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        LineIndex { line_starts }
    }

    /// 1-based line and column for a byte offset.
    pub fn locate(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(l) => l,
            Err(l) => l - 1,
        };
        let col = offset - self.line_starts[line];
        (line as u32 + 1, col as u32 + 1)
    }
}

/// Maps file ids back to names and line indexes for rendering.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    files: Vec<(String, LineIndex)>,
}

impl SourceMap {
    pub fn new() -> Self {
        SourceMap { files: Vec::new() }
    }

    pub fn add(&mut self, name: impl Into<String>, text: &str) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push((name.into(), LineIndex::new(text)));
        id
    }

    pub fn name(&self, file: FileId) -> &str {
        &self.files[file.0 as usize].0
    }

    /// Renders a diagnostic as `file:line:col: severity: message`.
    pub fn render(&self, diag: &Diagnostic) -> String {
        let (name, index) = &self.files[diag.span.file.0 as usize];
        let (line, col) = index.locate(diag.span.start);
        let severity = match diag.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        format!("{}:{}:{}: {}: {}", name, line, col, severity, diag.message)
    }
}
