//! Top-level document grammar: imports, collections, pages, recovery.

use super::{collection, page, values, Parser};
use crate::cst::{CstDocument, CstError, CstImport, CstItem};
use crate::lexer::Token;

pub(super) fn parse_document(p: &mut Parser) -> CstDocument {
    let mut items = Vec::new();
    let mut seen_declaration = false;

    loop {
        p.skip_newlines();
        match p.peek() {
            None => break,
            Some(Token::KwFrom) | Some(Token::KwImport) => {
                if seen_declaration {
                    let span = p.cur_span();
                    p.error_at(span, "imports must appear before the first declaration");
                }
                match parse_import(p) {
                    Ok(import) => items.push(CstItem::Import(import)),
                    Err(()) => {
                        let span = p.skip_to_blank_line();
                        items.push(CstItem::Error(CstError {
                            message: "malformed import".to_string(),
                            span,
                        }));
                    }
                }
            }
            Some(Token::Hash) => {
                seen_declaration = true;
                match collection::parse_collection(p) {
                    Ok(col) => items.push(CstItem::Collection(col)),
                    Err(()) => {
                        let span = p.skip_to_blank_line();
                        items.push(CstItem::Error(CstError {
                            message: "malformed collection declaration".to_string(),
                            span,
                        }));
                    }
                }
            }
            Some(Token::LBracket) => {
                seen_declaration = true;
                match page::parse_page(p) {
                    Ok(pg) => items.push(CstItem::Page(pg)),
                    Err(()) => {
                        let span = p.skip_to_blank_line();
                        items.push(CstItem::Error(CstError {
                            message: "malformed page declaration".to_string(),
                            span,
                        }));
                    }
                }
            }
            Some(Token::At) => {
                // A stray annotation outside any declaration. Parse it so the
                // cursor lands cleanly past it, then keep only an error node.
                let span = p.cur_span();
                p.error_at(span, "annotation outside of a collection or page");
                let span = match values::parse_annotation(p) {
                    Ok(ann) => ann.span,
                    Err(()) => p.skip_to_blank_line(),
                };
                items.push(CstItem::Error(CstError {
                    message: "stray annotation".to_string(),
                    span,
                }));
            }
            Some(_) => {
                p.error_here(format!(
                    "expected a declaration, found {}",
                    p.found_describe()
                ));
                let span = p.skip_to_blank_line();
                items.push(CstItem::Error(CstError {
                    message: "unrecognized block".to_string(),
                    span,
                }));
            }
        }
    }

    CstDocument { items }
}

/// `from a.b import X as Y, Z` / `from a.b import *` / `import a.b.c`.
fn parse_import(p: &mut Parser) -> super::PResult<CstImport> {
    let start = p.cur_span();

    if p.eat(&Token::KwImport) {
        let module = parse_module_path(p)?;
        let span = start.merge(p.prev_span());
        expect_line_end(p)?;
        return Ok(CstImport {
            module,
            wildcard: false,
            names: Vec::new(),
            span,
        });
    }

    p.expect(Token::KwFrom, "to start an import")?;
    let module = parse_module_path(p)?;
    p.expect(Token::KwImport, "after the module path")?;

    if p.eat(&Token::Star) {
        let span = start.merge(p.prev_span());
        expect_line_end(p)?;
        return Ok(CstImport {
            module,
            wildcard: true,
            names: Vec::new(),
            span,
        });
    }

    let mut names = Vec::new();
    loop {
        let (name, _) = p.expect_ident("in import list")?;
        let alias = if p.eat(&Token::KwAs) {
            Some(p.expect_ident("after 'as'")?.0)
        } else {
            None
        };
        names.push((name, alias));
        if !p.eat(&Token::Comma) {
            break;
        }
        // Trailing comma before the line end.
        if matches!(p.peek(), Some(Token::Newline) | None) {
            break;
        }
    }
    let span = start.merge(p.prev_span());
    expect_line_end(p)?;
    Ok(CstImport {
        module,
        wildcard: false,
        names,
        span,
    })
}

fn parse_module_path(p: &mut Parser) -> super::PResult<Vec<String>> {
    let (first, _) = p.expect_ident("as a module path")?;
    let mut parts = vec![first];
    while p.peek() == Some(&Token::Dot) {
        p.bump();
        parts.push(p.expect_ident("after '.' in module path")?.0);
    }
    Ok(parts)
}

fn expect_line_end(p: &mut Parser) -> super::PResult<()> {
    match p.peek() {
        None | Some(Token::Newline) => {
            p.eat(&Token::Newline);
            Ok(())
        }
        _ => {
            p.error_here(format!(
                "expected end of line, found {}",
                p.found_describe()
            ));
            Err(())
        }
    }
}
