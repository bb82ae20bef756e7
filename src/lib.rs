//! Compiler front end for the veld application-modeling DSL.
//!
//! veld source files declare data models ("collections") and routable UI
//! pages. This crate turns them into a fully cross-referenced, validated
//! in-memory application model (the [`ir::ResolvedDocument`]) that downstream
//! code generators can consume without re-validating.
//!
//! The pipeline is strictly linear; every stage accumulates diagnostics
//! instead of aborting on malformed input:
//!
//! ```text
//! Lexer → Parser (CST) → AST Builder → Symbol Table → Resolver → Validator → IR
//! ```
//!
//! Entry points live in the [`pipeline`] module; [`pipeline::compile_source`]
//! runs the whole pipeline over a single file.

pub mod ast;
pub mod cst;
pub mod diagnostics;
pub mod ir;
pub mod lexer;
pub mod parser;
pub mod pipeline;
pub mod resolve;
pub mod symbols;
pub mod testing;
pub mod validate;

pub use diagnostics::{Diagnostic, Severity, Span};
pub use ir::ResolvedDocument;
pub use pipeline::{compile_project, compile_source, Compilation, DocumentState, PipelineError};
