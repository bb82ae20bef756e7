//! Pipeline driver: sources in, resolved IR and diagnostics out.
//!
//! [`Compilation`] owns the whole run and enforces the stage order with an
//! explicit state machine. The per-file front half (lex, parse, AST build)
//! is independent per source and fans out across scoped threads; everything
//! from the symbol table on is project-global and runs on the calling
//! thread.

use thiserror::Error;

use crate::ast::{self, Document};
use crate::diagnostics::{self, Diagnostic, FileId, SourceMap};
use crate::ir::ResolvedDocument;
use crate::symbols::SymbolTable;
use crate::{lexer, parser, resolve, validate};

/// Where a [`Compilation`] is in its lifecycle. No state is ever skipped;
/// stages that produce error diagnostics still advance so one run reports
/// as much as possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentState {
    /// No sources yet.
    Empty,
    /// Sources registered, front half pending.
    Parsing,
    /// Per-file front half done; documents exist.
    Parsed,
    /// Symbol table built.
    SymbolsBuilt,
    /// References bound; IR exists.
    Resolved,
    /// Validation ran; the IR is final.
    Validated,
    /// IR handed over to a generator.
    Finalized,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot {action}: compilation is {state:?}")]
    InvalidState {
        action: &'static str,
        state: DocumentState,
    },
    #[error("cannot finalize: {count} error diagnostic(s) present")]
    ErrorsPresent { count: usize },
}

/// One compilation of a set of veld sources.
pub struct Compilation {
    sources: Vec<String>,
    source_map: SourceMap,
    state: DocumentState,
    documents: Vec<Document>,
    diagnostics: Vec<Diagnostic>,
    resolved: Option<ResolvedDocument>,
}

impl Compilation {
    pub fn new() -> Self {
        Compilation {
            sources: Vec::new(),
            source_map: SourceMap::new(),
            state: DocumentState::Empty,
            documents: Vec::new(),
            diagnostics: Vec::new(),
            resolved: None,
        }
    }

    pub fn state(&self) -> DocumentState {
        self.state
    }

    /// Registers a source file. Only legal before [`Self::run`].
    pub fn add_source(
        &mut self,
        name: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<FileId, PipelineError> {
        match self.state {
            DocumentState::Empty | DocumentState::Parsing => {}
            state => {
                return Err(PipelineError::InvalidState {
                    action: "add a source",
                    state,
                });
            }
        }
        let text = text.into();
        let id = self.source_map.add(name, &text);
        self.sources.push(text);
        self.state = DocumentState::Parsing;
        Ok(id)
    }

    /// Runs every stage. Diagnostics accumulate; the run itself only fails
    /// on state misuse, never on malformed input.
    pub fn run(&mut self) -> Result<(), PipelineError> {
        if self.state != DocumentState::Parsing {
            return Err(PipelineError::InvalidState {
                action: "run the pipeline",
                state: self.state,
            });
        }

        let fronts = front_half(&self.sources);
        for (document, mut diags) in fronts {
            self.documents.push(document);
            self.diagnostics.append(&mut diags);
        }
        self.state = DocumentState::Parsed;

        let (table, mut diags) = SymbolTable::build(&self.documents);
        self.diagnostics.append(&mut diags);
        self.state = DocumentState::SymbolsBuilt;

        let (resolved, mut diags) = resolve::resolve(&table);
        self.diagnostics.append(&mut diags);
        self.state = DocumentState::Resolved;

        let mut diags = validate::validate(&table, &resolved);
        self.diagnostics.append(&mut diags);
        self.resolved = Some(resolved);
        self.state = DocumentState::Validated;

        diagnostics::sort_by_position(&mut self.diagnostics);
        Ok(())
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Rendered diagnostics, one line each, in source order.
    pub fn render_diagnostics(&self) -> Vec<String> {
        self.diagnostics
            .iter()
            .map(|d| self.source_map.render(d))
            .collect()
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    /// Parsed documents, available from [`DocumentState::Parsed`] on.
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// The IR, available once resolved; may still carry unresolved markers
    /// when there are error diagnostics.
    pub fn resolved(&self) -> Option<&ResolvedDocument> {
        self.resolved.as_ref()
    }

    /// Hands the IR over to a generator. Refuses while error diagnostics are
    /// present: the IR behind a failed run is for tooling (editors, linters),
    /// not for code generation.
    pub fn finalize(mut self) -> Result<ResolvedDocument, PipelineError> {
        if self.state != DocumentState::Validated {
            return Err(PipelineError::InvalidState {
                action: "finalize",
                state: self.state,
            });
        }
        let count = self.diagnostics.iter().filter(|d| d.is_error()).count();
        if count > 0 {
            return Err(PipelineError::ErrorsPresent { count });
        }
        self.state = DocumentState::Finalized;
        Ok(self.resolved.expect("validated compilation has IR"))
    }
}

impl Default for Compilation {
    fn default() -> Self {
        Compilation::new()
    }
}

/// Lex, parse, and build ASTs for every file, one scoped thread per file.
/// Output order matches input order regardless of thread scheduling.
fn front_half(sources: &[String]) -> Vec<(Document, Vec<Diagnostic>)> {
    if sources.len() == 1 {
        return vec![front_half_one(FileId(0), &sources[0])];
    }
    std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                scope.spawn(move || front_half_one(FileId(i as u32), source))
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("front-half worker panicked"))
            .collect()
    })
}

fn front_half_one(file: FileId, source: &str) -> (Document, Vec<Diagnostic>) {
    let (tokens, mut diags) = lexer::tokenize(file, source);
    let (cst, mut parse_diags) = parser::parse(file, source, tokens);
    diags.append(&mut parse_diags);
    let (document, mut build_diags) = ast::build(source, cst);
    diags.append(&mut build_diags);
    (document, diags)
}

/// Compiles a single in-memory source. The common entry point for tests and
/// small embedders.
pub fn compile_source(name: &str, text: &str) -> Compilation {
    let mut compilation = Compilation::new();
    compilation
        .add_source(name, text)
        .expect("fresh compilation accepts sources");
    compilation.run().expect("loaded compilation runs");
    compilation
}

/// Compiles a set of named sources as one project.
pub fn compile_project<'a>(
    sources: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Compilation {
    let mut compilation = Compilation::new();
    for (name, text) in sources {
        compilation
            .add_source(name, text)
            .expect("fresh compilation accepts sources");
    }
    compilation.run().expect("loaded compilation runs");
    compilation
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_sources() {
        let mut compilation = Compilation::new();
        let err = compilation.run().unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InvalidState {
                state: DocumentState::Empty,
                ..
            }
        ));
    }

    #[test]
    fn add_source_after_run_is_rejected() {
        let mut compilation = Compilation::new();
        compilation.add_source("a.veld", "#A\n x : int\n").unwrap();
        compilation.run().unwrap();
        assert!(compilation.add_source("b.veld", "").is_err());
    }

    #[test]
    fn finalize_refuses_errors() {
        let compilation = compile_source("bad.veld", "#A\n x : nonsense_kind\n");
        assert!(compilation.has_errors());
        let err = compilation.finalize().unwrap_err();
        assert!(matches!(err, PipelineError::ErrorsPresent { .. }));
    }

    #[test]
    fn finalize_hands_over_clean_ir() {
        let compilation = compile_source("ok.veld", "#A\n x : int\n");
        assert!(!compilation.has_errors(), "{:?}", compilation.diagnostics());
        let ir = compilation.finalize().unwrap();
        assert_eq!(ir.collections.len(), 1);
    }

    #[test]
    fn states_advance_in_order() {
        let mut compilation = Compilation::new();
        assert_eq!(compilation.state(), DocumentState::Empty);
        compilation.add_source("a.veld", "#A\n x : int\n").unwrap();
        assert_eq!(compilation.state(), DocumentState::Parsing);
        compilation.run().unwrap();
        assert_eq!(compilation.state(), DocumentState::Validated);
    }
}
