//! Lexer driver: logos plus the mode stack for embedded raw code.
//!
//! The driver never aborts on malformed input. Unrecognized characters
//! become single [`Token::Error`] tokens (with a diagnostic) so the parser
//! can keep going.
//!
//! Mode decisions:
//!
//! * `=` at paren depth zero, directly after an identifier, `)` or `:`,
//!   starts inline raw code running to the end of the line. Anywhere else
//!   (notably at line start) it is the opaque `=` modifier sigil.
//! * `{` after a structured annotation name (`@admin`, `@rest`, the crud
//!   family, ...) opens a structured block that is lexed normally. `{` after
//!   a raw-body annotation name (`@clean`, `@get`, ...), after `)` (function
//!   bodies) or in trailing field-extension position opens verbatim capture.
//!   Inside a structured block, `{` directly after `:` is a structured
//!   sub-view override body.

use logos::Logos;

use super::raw::{capture_block, capture_line};
use super::tokens::{is_raw_body_annotation, is_structured_annotation, Token};
use crate::diagnostics::{Diagnostic, FileId, Span, Stage};

/// Token paired with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Prev {
    Start,
    Newline,
    Ident,
    RParen,
    Colon,
    Str,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BraceMode {
    Raw,
    Structured,
}

/// Tokenizes one source file. Total: every input produces a token stream.
pub fn tokenize(file: FileId, source: &str) -> (Vec<Spanned>, Vec<Diagnostic>) {
    let mut inner = Token::lexer(source);
    let mut out: Vec<Spanned> = Vec::new();
    let mut diags: Vec<Diagnostic> = Vec::new();

    let mut prev = Prev::Start;
    let mut paren_depth = 0usize;
    let mut structured_depth = 0usize;
    let mut pending_brace: Option<BraceMode> = None;
    let mut after_at = false;

    while let Some(result) = inner.next() {
        let range = inner.span();
        let span = Span::new(file, range.start, range.end);

        let token = match result {
            Err(()) => {
                let slice = &source[range.clone()];
                let message = if slice.starts_with('"') || slice.starts_with('\'') {
                    "unterminated string literal".to_string()
                } else {
                    format!("unrecognized character {:?}", slice)
                };
                diags.push(Diagnostic::error(Stage::Lexer, span, message));
                out.push(Spanned {
                    token: Token::Error,
                    span,
                });
                prev = Prev::Other;
                continue;
            }
            Ok(token) => token,
        };

        match token {
            Token::Assign
                if paren_depth == 0
                    && matches!(prev, Prev::Ident | Prev::RParen | Prev::Colon | Prev::Str) =>
            {
                let cap = capture_line(inner.remainder());
                inner.bump(cap.consumed);
                out.push(Spanned {
                    token: Token::InlineCode(cap.text),
                    span: Span::new(file, range.start, range.end + cap.consumed),
                });
                prev = Prev::Other;
            }
            Token::LBrace => {
                let structured = match pending_brace {
                    Some(BraceMode::Structured) => true,
                    Some(BraceMode::Raw) => false,
                    None => structured_depth > 0 && prev == Prev::Colon,
                };
                pending_brace = None;
                if structured {
                    structured_depth += 1;
                    out.push(Spanned { token, span });
                } else {
                    let cap = capture_block(inner.remainder());
                    inner.bump(cap.consumed);
                    if !cap.terminated {
                        diags.push(Diagnostic::error(
                            Stage::Lexer,
                            span,
                            "unterminated raw code block",
                        ));
                    }
                    out.push(Spanned {
                        token: Token::BlockCode(cap.text.trim().to_string()),
                        span: Span::new(file, range.start, range.end + cap.consumed),
                    });
                }
                prev = Prev::Other;
            }
            Token::RBrace => {
                structured_depth = structured_depth.saturating_sub(1);
                out.push(Spanned { token, span });
                prev = Prev::Other;
            }
            Token::LParen => {
                paren_depth += 1;
                out.push(Spanned { token, span });
                prev = Prev::Other;
            }
            Token::RParen => {
                paren_depth = paren_depth.saturating_sub(1);
                out.push(Spanned { token, span });
                prev = Prev::RParen;
            }
            Token::At => {
                after_at = true;
                out.push(Spanned { token, span });
                prev = Prev::Other;
            }
            Token::Ident(ref name) => {
                if after_at {
                    pending_brace = if is_raw_body_annotation(name) {
                        Some(BraceMode::Raw)
                    } else if is_structured_annotation(name) {
                        Some(BraceMode::Structured)
                    } else {
                        None
                    };
                    after_at = false;
                }
                out.push(Spanned { token, span });
                prev = Prev::Ident;
            }
            Token::Newline => {
                pending_brace = None;
                after_at = false;
                out.push(Spanned { token, span });
                prev = Prev::Newline;
            }
            Token::Colon => {
                out.push(Spanned { token, span });
                prev = Prev::Colon;
            }
            // `=` after a verbose/help string starts inline extension code.
            Token::Str(_) => {
                out.push(Spanned { token, span });
                prev = Prev::Str;
            }
            Token::Comment => {
                // Transparent: a trailing comment does not change what the
                // next `=` or `{` means.
                out.push(Spanned { token, span });
            }
            _ => {
                if after_at {
                    // `@` followed by anything but a name; the parser reports it.
                    after_at = false;
                }
                out.push(Spanned { token, span });
                prev = Prev::Other;
            }
        }
    }

    (out, diags)
}
