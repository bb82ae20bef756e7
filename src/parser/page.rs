//! Page declaration grammar: `[name]` headers with optional base, alias and
//! URL; body lines (template, computed fields, functions, annotations).
//!
//! The same body-line grammar runs inside crud sub-view override blocks, so
//! it is exposed in a "until closing brace" variant as well.

use super::{values, PResult, Parser};
use crate::cst::{CstError, CstPage, CstPageLine, CstRaw, CstTemplate};
use crate::lexer::Token;

pub(super) fn parse_page(p: &mut Parser) -> PResult<CstPage> {
    let start = p.expect(Token::LBracket, "to start a page")?;
    let (first, first_span) = p.expect_ident("as the page name")?;

    // `[Base -> Name]`: base on the left, declared name on the right.
    let (base, name, name_span) = if p.eat(&Token::Arrow) {
        let (name, name_span) = p.expect_ident("after '->'")?;
        (Some((first, first_span)), name, name_span)
    } else {
        (None, first, first_span)
    };

    let alias = if p.eat(&Token::KwAs) {
        Some(p.expect_ident("after 'as'")?.0)
    } else {
        None
    };

    p.expect(Token::RBracket, "to close the page header")?;

    let url = if p.eat(&Token::Colon) {
        match p.slice_to_eol() {
            Some((text, span)) => Some(CstRaw { text, span }),
            None => {
                p.error_here("expected a URL after ':'");
                return Err(());
            }
        }
    } else {
        None
    };

    match p.peek() {
        None | Some(Token::Newline) => {
            p.eat(&Token::Newline);
        }
        _ => {
            p.error_here(format!(
                "expected end of line after page header, found {}",
                p.found_describe()
            ));
            return Err(());
        }
    }

    let mut lines = Vec::new();
    loop {
        if p.at_block_end() {
            break;
        }
        if matches!(p.peek(), Some(Token::Hash) | Some(Token::LBracket)) {
            break;
        }
        if p.eat(&Token::Newline) {
            continue;
        }
        lines.push(parse_page_line(p));
    }

    Ok(CstPage {
        base,
        name,
        name_span,
        alias,
        url,
        lines,
        span: start.merge(p.prev_span()),
    })
}

/// Body lines of a crud sub-view override: `{ ... }` with the opening brace
/// already consumed. Consumes the closing brace.
pub(super) fn parse_page_lines_until_rbrace(p: &mut Parser) -> PResult<Vec<CstPageLine>> {
    let mut lines = Vec::new();
    loop {
        p.skip_newlines();
        if p.eat(&Token::RBrace) {
            return Ok(lines);
        }
        if p.at_eof() {
            p.error_here("unexpected end of file inside override block");
            return Err(());
        }
        lines.push(parse_page_line(p));
    }
}

fn parse_page_line(p: &mut Parser) -> CstPageLine {
    let result = try_parse_page_line(p);
    match result {
        Ok(line) => line,
        Err(()) => {
            let span = p.skip_to_eol();
            CstPageLine::Error(CstError {
                message: "malformed page body line".to_string(),
                span,
            })
        }
    }
}

fn try_parse_page_line(p: &mut Parser) -> PResult<CstPageLine> {
    match (p.peek(), p.peek2()) {
        (Some(Token::At), _) => {
            let ann = values::parse_annotation(p)?;
            line_end(p)?;
            Ok(CstPageLine::Annotation(ann))
        }
        (Some(Token::Ident(name)), Some(Token::Colon)) if name.as_str() == "template" => {
            let start = p.cur_span();
            p.bump();
            p.bump();
            let value = match p.peek() {
                Some(Token::InlineCode(_)) => {
                    let span = p.cur_span();
                    let Some(crate::lexer::Spanned {
                        token: Token::InlineCode(text),
                        ..
                    }) = p.bump()
                    else {
                        unreachable!("peeked inline code");
                    };
                    CstTemplate::Code(CstRaw { text, span })
                }
                _ => match p.slice_to_eol() {
                    Some((text, _)) => CstTemplate::Path(text),
                    None => {
                        p.error_here("expected a template path after 'template:'");
                        return Err(());
                    }
                },
            };
            let span = start.merge(p.prev_span());
            line_end(p)?;
            Ok(CstPageLine::Template { value, span })
        }
        (Some(Token::Ident(_)), Some(Token::InlineCode(_))) => {
            let start = p.cur_span();
            let (name, _) = p.expect_ident("as the computed field name")?;
            let code_span = p.cur_span();
            let Some(crate::lexer::Spanned {
                token: Token::InlineCode(text),
                ..
            }) = p.bump()
            else {
                unreachable!("peeked inline code");
            };
            let span = start.merge(code_span);
            line_end(p)?;
            Ok(CstPageLine::ComputedField {
                name,
                code: CstRaw {
                    text,
                    span: code_span,
                },
                span,
            })
        }
        (Some(Token::Ident(_)), Some(Token::LParen)) => parse_function(p),
        _ => {
            p.error_here(format!(
                "expected a page body line, found {}",
                p.found_describe()
            ));
            Err(())
        }
    }
}

/// `name(arg, ...)= <code>` or `name(arg, ...) { ... }` or a bodyless
/// declaration `name(arg, ...)`.
fn parse_function(p: &mut Parser) -> PResult<CstPageLine> {
    let start = p.cur_span();
    let (name, _) = p.expect_ident("as the function name")?;
    p.expect(Token::LParen, "to open the argument list")?;

    let mut args = Vec::new();
    loop {
        p.skip_newlines();
        if p.eat(&Token::RParen) {
            break;
        }
        let (arg, _) = p.expect_ident("as a function argument")?;
        args.push(arg);
        p.skip_newlines();
        if !p.eat(&Token::Comma) {
            p.expect(Token::RParen, "to close the argument list")?;
            break;
        }
    }

    let body = match p.peek() {
        Some(Token::InlineCode(_)) | Some(Token::BlockCode(_)) => {
            let span = p.cur_span();
            let text = match p.bump().map(|s| s.token) {
                Some(Token::InlineCode(text)) | Some(Token::BlockCode(text)) => text,
                _ => unreachable!("peeked code"),
            };
            Some(CstRaw { text, span })
        }
        _ => None,
    };

    let span = start.merge(p.prev_span());
    line_end(p)?;
    Ok(CstPageLine::Function {
        name,
        args,
        body,
        span,
    })
}

fn line_end(p: &mut Parser) -> PResult<()> {
    match p.peek() {
        None | Some(Token::Newline) => {
            p.eat(&Token::Newline);
            Ok(())
        }
        // Inside an override block the closing brace may share the line.
        Some(Token::RBrace) => Ok(()),
        _ => {
            p.error_here(format!(
                "expected end of line, found {}",
                p.found_describe()
            ));
            Err(())
        }
    }
}
