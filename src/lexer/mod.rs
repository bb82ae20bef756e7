//! Lexer for the veld DSL.
//!
//! Tokenization is handled by logos; the driver in [`lexer_impl`] adds the
//! lexer-mode stack needed for the two embedded raw sub-languages (inline
//! `= <code>` and balanced `{ ... }` blocks), which are captured verbatim
//! and never interpreted.

pub mod lexer_impl;
pub mod raw;
pub mod tokens;

pub use lexer_impl::{tokenize, Spanned};
pub use tokens::Token;
