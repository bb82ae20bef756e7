//! Recursive-descent parser for the veld DSL.
//!
//! LL(k) with bounded lookahead (`peek`/`peek2`). Top-level alternation is
//! decided purely by the leading token: `[` page, `#` collection,
//! `from`/`import` import, `@` stray annotation, newline skip. Recovery is
//! block-level at the top (a malformed declaration skips to the next
//! blank-line boundary) and line- or entry-level inside declaration bodies,
//! so one bad block never blocks otherwise-valid declarations elsewhere.

mod collection;
mod document;
pub mod fieldlist;
mod page;
mod values;

use crate::cst::CstDocument;
use crate::diagnostics::{Diagnostic, FileId, Span, Stage};
use crate::lexer::{Spanned, Token};

/// Parses a token stream into a CST plus recovered-from syntax diagnostics.
pub fn parse(file: FileId, source: &str, tokens: Vec<Spanned>) -> (CstDocument, Vec<Diagnostic>) {
    let tokens = strip_comments(tokens);
    let mut parser = Parser::new(file, source, &tokens);
    let document = document::parse_document(&mut parser);
    (document, parser.diags)
}

/// Drops comment tokens. A line holding only a comment collapses entirely
/// (its newline goes too) so it cannot read as a blank line and terminate a
/// block.
fn strip_comments(tokens: Vec<Spanned>) -> Vec<Spanned> {
    let mut out: Vec<Spanned> = Vec::with_capacity(tokens.len());
    let mut line_has_content = false;
    let mut swallow_newline = false;
    for spanned in tokens {
        match spanned.token {
            Token::Comment => {
                if !line_has_content {
                    swallow_newline = true;
                }
            }
            Token::Newline => {
                if swallow_newline {
                    swallow_newline = false;
                } else {
                    out.push(spanned);
                }
                line_has_content = false;
            }
            _ => {
                line_has_content = true;
                swallow_newline = false;
                out.push(spanned);
            }
        }
    }
    out
}

/// Outcome of one parsing rule; the diagnostic has already been recorded
/// when this is `Err`.
pub(crate) type PResult<T> = Result<T, ()>;

pub(crate) struct Parser<'a> {
    file: FileId,
    source: &'a str,
    tokens: &'a [Spanned],
    pos: usize,
    pub(crate) diags: Vec<Diagnostic>,
}

impl<'a> Parser<'a> {
    fn new(file: FileId, source: &'a str, tokens: &'a [Spanned]) -> Self {
        Parser {
            file,
            source,
            tokens,
            pos: 0,
            diags: Vec::new(),
        }
    }

    pub(crate) fn source(&self) -> &'a str {
        self.source
    }

    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    pub(crate) fn peek2(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1).map(|s| &s.token)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub(crate) fn bump(&mut self) -> Option<Spanned> {
        let spanned = self.tokens.get(self.pos).cloned();
        if spanned.is_some() {
            self.pos += 1;
        }
        spanned
    }

    /// Span of the current token, or a zero-width span at end of input.
    pub(crate) fn cur_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(s) => s.span,
            None => {
                let at = self
                    .tokens
                    .last()
                    .map(|s| s.span.end)
                    .unwrap_or(0);
                Span::point(self.file, at)
            }
        }
    }

    pub(crate) fn prev_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|p| self.tokens.get(p)) {
            Some(s) => s.span,
            None => Span::point(self.file, 0),
        }
    }

    /// Consumes the current token when it equals `token` (payload-free
    /// variants only).
    pub(crate) fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, token: Token, context: &str) -> PResult<Span> {
        if self.peek() == Some(&token) {
            let span = self.cur_span();
            self.pos += 1;
            Ok(span)
        } else {
            self.error_here(format!(
                "expected {} {}, found {}",
                token.describe(),
                context,
                self.found_describe()
            ));
            Err(())
        }
    }

    pub(crate) fn expect_ident(&mut self, context: &str) -> PResult<(String, Span)> {
        match self.peek() {
            Some(Token::Ident(_)) => {
                let span = self.cur_span();
                let Some(Spanned {
                    token: Token::Ident(name),
                    ..
                }) = self.bump()
                else {
                    unreachable!("peeked identifier");
                };
                Ok((name, span))
            }
            _ => {
                self.error_here(format!(
                    "expected a name {}, found {}",
                    context,
                    self.found_describe()
                ));
                Err(())
            }
        }
    }

    pub(crate) fn found_describe(&self) -> String {
        match self.peek() {
            Some(token) => token.describe(),
            None => "end of file".to_string(),
        }
    }

    pub(crate) fn error_here(&mut self, message: impl Into<String>) {
        let span = self.cur_span();
        self.error_at(span, message);
    }

    pub(crate) fn error_at(&mut self, span: Span, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::error(Stage::Parser, span, message));
    }

    /// Consumes consecutive newlines.
    pub(crate) fn skip_newlines(&mut self) {
        while self.eat(&Token::Newline) {}
    }

    /// True at a blank line (two consecutive newlines pending) or at EOF.
    pub(crate) fn at_block_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(Token::Newline) => matches!(self.peek2(), Some(Token::Newline) | None),
            _ => false,
        }
    }

    /// Skips to just after the next blank line (or to EOF) and returns the
    /// span of everything skipped. Block-level recovery.
    pub(crate) fn skip_to_blank_line(&mut self) -> Span {
        let start = self.cur_span();
        let mut last = start;
        let mut newline_run = 0usize;
        while let Some(spanned) = self.tokens.get(self.pos) {
            self.pos += 1;
            last = spanned.span;
            if spanned.token == Token::Newline {
                newline_run += 1;
                if newline_run >= 2 {
                    break;
                }
            } else {
                newline_run = 0;
            }
        }
        start.merge(last)
    }

    /// Skips to the end of the current line, leaving the newline unconsumed.
    /// Line-level recovery inside declaration bodies.
    pub(crate) fn skip_to_eol(&mut self) -> Span {
        let start = self.cur_span();
        let mut last = start;
        while let Some(spanned) = self.tokens.get(self.pos) {
            if spanned.token == Token::Newline {
                break;
            }
            last = spanned.span;
            self.pos += 1;
        }
        start.merge(last)
    }

    /// Collects raw source text from the current token to the end of the
    /// line. Used for URLs and template paths, whose tokens are only
    /// interesting as a text slice.
    pub(crate) fn slice_to_eol(&mut self) -> Option<(String, Span)> {
        let start = match self.tokens.get(self.pos) {
            Some(s) if s.token != Token::Newline => s.span,
            _ => return None,
        };
        let mut end = start;
        while let Some(spanned) = self.tokens.get(self.pos) {
            if spanned.token == Token::Newline {
                break;
            }
            end = spanned.span;
            self.pos += 1;
        }
        let span = start.merge(end);
        let text = self.source[span.start..span.end].trim().to_string();
        Some((text, span))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn toks(source: &str) -> Vec<Spanned> {
        tokenize(FileId::ZERO, source).0
    }

    #[test]
    fn comment_only_line_is_not_blank() {
        let stripped = strip_comments(toks("a\n// note\nb\n"));
        let kinds: Vec<&Token> = stripped.iter().map(|s| &s.token).collect();
        assert_eq!(
            kinds,
            vec![
                &Token::Ident("a".into()),
                &Token::Newline,
                &Token::Ident("b".into()),
                &Token::Newline,
            ]
        );
    }

    #[test]
    fn trailing_comment_keeps_its_newline() {
        let stripped = strip_comments(toks("a // note\nb\n"));
        let kinds: Vec<&Token> = stripped.iter().map(|s| &s.token).collect();
        assert_eq!(
            kinds,
            vec![
                &Token::Ident("a".into()),
                &Token::Newline,
                &Token::Ident("b".into()),
                &Token::Newline,
            ]
        );
    }

    #[test]
    fn blank_line_before_comment_line_survives() {
        let stripped = strip_comments(toks("a\n\n// note\nb\n"));
        let kinds: Vec<&Token> = stripped.iter().map(|s| &s.token).collect();
        assert_eq!(
            kinds,
            vec![
                &Token::Ident("a".into()),
                &Token::Newline,
                &Token::Newline,
                &Token::Ident("b".into()),
                &Token::Newline,
            ]
        );
    }
}
