//! Shared sub-grammars: annotations, structured entry bodies, value item
//! lists and anchored references.
//!
//! Every separator-delimited list here tolerates trailing separators and
//! interleaved blank lines; these lists are pervasive and omitting that is
//! the classic source of spurious parse failures.

use super::{page, PResult, Parser};
use crate::cst::{
    CstAnnBody, CstAnnotation, CstEntry, CstKey, CstKeyValue, CstRaw, CstRef, CstValueItem,
};
use crate::lexer::Token;

/// Parses `@name[.descriptor][(args)][body]`. The leading `@` is expected
/// at the current position.
pub(super) fn parse_annotation(p: &mut Parser) -> PResult<CstAnnotation> {
    let at_span = p.expect(Token::At, "to start an annotation")?;
    let (name, name_span) = p.expect_ident("after '@'")?;

    let descriptor = if p.eat(&Token::Dot) {
        Some(p.expect_ident("after '.' in annotation name")?.0)
    } else {
        None
    };

    let mut args = Vec::new();
    if p.eat(&Token::LParen) {
        args = parse_value_items(p, true);
        p.expect(Token::RParen, "to close annotation arguments")?;
    }

    let mut end_span = p.prev_span();
    let body = match p.peek() {
        Some(Token::BlockCode(_)) => {
            let Some(spanned) = p.bump() else {
                unreachable!("peeked block code");
            };
            end_span = spanned.span;
            let Token::BlockCode(text) = spanned.token else {
                unreachable!("peeked block code");
            };
            Some(CstAnnBody::Raw(CstRaw {
                text,
                span: spanned.span,
            }))
        }
        Some(Token::LBrace) => {
            p.bump();
            let entries = parse_entries_until(p, Token::RBrace)?;
            end_span = p.prev_span();
            Some(CstAnnBody::Entries(entries))
        }
        _ => None,
    };

    Ok(CstAnnotation {
        name,
        name_span,
        descriptor,
        args,
        body,
        span: at_span.merge(end_span),
    })
}

/// Parses structured entries up to (and consuming) `terminator`.
///
/// Entries are separated by semicolons, commas or line breaks; blank lines
/// inside the body are fine. Recovery is entry-level: a malformed entry
/// skips to the next separator and leaves a `CstEntry::Error` behind.
pub(super) fn parse_entries_until(p: &mut Parser, terminator: Token) -> PResult<Vec<CstEntry>> {
    let mut entries = Vec::new();
    loop {
        while p.eat(&Token::Newline) || p.eat(&Token::Semicolon) || p.eat(&Token::Comma) {}
        if p.eat(&terminator) {
            return Ok(entries);
        }
        if p.at_eof() {
            p.error_here("unexpected end of file inside annotation body");
            return Err(());
        }

        let entry = parse_entry(p);
        match entry {
            Ok(entry) => entries.push(entry),
            Err(()) => {
                let span = skip_entry(p, &terminator);
                entries.push(CstEntry::Error(crate::cst::CstError {
                    message: "malformed entry".to_string(),
                    span,
                }));
            }
        }
    }
}

fn parse_entry(p: &mut Parser) -> PResult<CstEntry> {
    match p.peek() {
        Some(Token::Hash) => Ok(CstEntry::Target(parse_anchored_ref(p)?)),
        Some(Token::Ident(_)) if p.peek2() == Some(&Token::Colon) => {
            let (name, key_span) = p.expect_ident("as entry key")?;
            p.expect(Token::Colon, "after entry key")?;
            parse_entry_value(p, CstKey::Name(name), key_span)
        }
        Some(Token::Str(_)) if p.peek2() == Some(&Token::Colon) => {
            let key_span = p.cur_span();
            let Some(spanned) = p.bump() else {
                unreachable!("peeked string");
            };
            let Token::Str(label) = spanned.token else {
                unreachable!("peeked string");
            };
            p.expect(Token::Colon, "after entry label")?;
            parse_entry_value(p, CstKey::Label(label), key_span)
        }
        _ => {
            p.error_here(format!(
                "expected an entry, found {}",
                p.found_describe()
            ));
            Err(())
        }
    }
}

fn parse_entry_value(
    p: &mut Parser,
    key: CstKey,
    key_span: crate::diagnostics::Span,
) -> PResult<CstEntry> {
    match p.peek() {
        Some(Token::InlineCode(_)) => {
            let span = p.cur_span();
            let Some(spanned) = p.bump() else {
                unreachable!("peeked inline code");
            };
            let Token::InlineCode(text) = spanned.token else {
                unreachable!("peeked inline code");
            };
            Ok(CstEntry::KeyValue(CstKeyValue {
                key,
                key_span,
                items: vec![CstValueItem::Code(CstRaw { text, span })],
                value_span: span,
            }))
        }
        Some(Token::LBrace) => {
            let open = p.cur_span();
            p.bump();
            let lines = page::parse_page_lines_until_rbrace(p)?;
            let value_span = open.merge(p.prev_span());
            Ok(CstEntry::KeyValue(CstKeyValue {
                key,
                key_span,
                items: vec![CstValueItem::Block(lines, value_span)],
                value_span,
            }))
        }
        _ => {
            let items = parse_value_items(p, false);
            if items.is_empty() {
                p.error_here("missing entry value");
                return Err(());
            }
            let value_span = items
                .iter()
                .map(CstValueItem::span)
                .reduce(|a, b| a.merge(b))
                .unwrap_or(key_span);
            Ok(CstEntry::KeyValue(CstKeyValue {
                key,
                key_span,
                items,
                value_span,
            }))
        }
    }
}

fn skip_entry(p: &mut Parser, terminator: &Token) -> crate::diagnostics::Span {
    let start = p.cur_span();
    let mut last = start;
    while let Some(token) = p.peek() {
        if token == terminator
            || matches!(token, Token::Semicolon | Token::Newline)
        {
            break;
        }
        last = p.cur_span();
        p.bump();
    }
    start.merge(last)
}

/// Parses a comma-separated value item list. With `in_parens` the list may
/// span lines and `key: value` / `key=value` items are permitted; otherwise
/// the list ends at the line break, `;` or `}`.
pub(super) fn parse_value_items(p: &mut Parser, in_parens: bool) -> Vec<CstValueItem> {
    let mut items = Vec::new();
    loop {
        if in_parens {
            p.skip_newlines();
        }
        match p.peek() {
            None => break,
            Some(Token::RParen) if in_parens => break,
            Some(Token::Newline) | Some(Token::Semicolon) | Some(Token::RBrace)
            | Some(Token::RParen)
                if !in_parens =>
            {
                break
            }
            _ => {}
        }
        match parse_one_item(p, in_parens) {
            Ok(item) => items.push(item),
            Err(()) => {
                let span = p.cur_span();
                p.bump();
                items.push(CstValueItem::Error(span));
            }
        }
        if in_parens {
            p.skip_newlines();
        }
        // Separating commas are optional and a trailing one is fine.
        p.eat(&Token::Comma);
    }
    items
}

fn parse_one_item(p: &mut Parser, in_parens: bool) -> PResult<CstValueItem> {
    let span = p.cur_span();
    match p.peek() {
        Some(Token::Star) => {
            p.bump();
            Ok(CstValueItem::Star(span))
        }
        Some(Token::Dash) => {
            p.bump();
            let (name, name_span) = p.expect_ident("after '-' exclusion")?;
            Ok(CstValueItem::Exclude(name, span.merge(name_span)))
        }
        Some(Token::Hash) => Ok(CstValueItem::Ref(parse_anchored_ref(p)?)),
        Some(Token::Str(_)) => {
            let Some(spanned) = p.bump() else {
                unreachable!("peeked string");
            };
            let Token::Str(text) = spanned.token else {
                unreachable!("peeked string");
            };
            Ok(CstValueItem::Str(text, span))
        }
        Some(Token::Int(_)) => {
            let Some(spanned) = p.bump() else {
                unreachable!("peeked int");
            };
            let Token::Int(value) = spanned.token else {
                unreachable!("peeked int");
            };
            Ok(CstValueItem::Int(value, span))
        }
        Some(Token::KwTrue) => {
            p.bump();
            Ok(CstValueItem::Bool(true, span))
        }
        Some(Token::KwFalse) => {
            p.bump();
            Ok(CstValueItem::Bool(false, span))
        }
        Some(Token::Dimensions(_)) => {
            let Some(spanned) = p.bump() else {
                unreachable!("peeked dimensions");
            };
            let Token::Dimensions((w, h)) = spanned.token else {
                unreachable!("peeked dimensions");
            };
            Ok(CstValueItem::Dimensions(w, h, span))
        }
        Some(Token::InlineCode(_)) | Some(Token::BlockCode(_)) => {
            let Some(spanned) = p.bump() else {
                unreachable!("peeked code");
            };
            let text = match spanned.token {
                Token::InlineCode(text) | Token::BlockCode(text) => text,
                _ => unreachable!("peeked code"),
            };
            Ok(CstValueItem::Code(CstRaw { text, span }))
        }
        Some(Token::Ident(_)) => parse_ident_item(p, in_parens, span),
        _ => {
            p.error_here(format!("unexpected {} in value", p.found_describe()));
            Err(())
        }
    }
}

fn parse_ident_item(
    p: &mut Parser,
    in_parens: bool,
    start: crate::diagnostics::Span,
) -> PResult<CstValueItem> {
    let (name, mut last_span) = p.expect_ident("in value")?;

    // `name(entries)`: nested configuration call.
    if p.peek() == Some(&Token::LParen) {
        p.bump();
        let entries = parse_entries_until(p, Token::RParen)?;
        return Ok(CstValueItem::Call {
            name,
            entries,
            span: start.merge(p.prev_span()),
        });
    }

    // `name.*` glob, or a dotted path.
    if p.peek() == Some(&Token::Dot) {
        if p.peek2() == Some(&Token::Star) {
            p.bump();
            last_span = p.cur_span();
            p.bump();
            return Ok(CstValueItem::Name {
                name,
                glob: true,
                span: start.merge(last_span),
            });
        }
        let mut parts = vec![name];
        while p.peek() == Some(&Token::Dot) && matches!(p.peek2(), Some(Token::Ident(_))) {
            p.bump();
            let (part, part_span) = p.expect_ident("after '.'")?;
            parts.push(part);
            last_span = part_span;
        }
        let span = start.merge(last_span);
        if p.eat(&Token::Bang) {
            return Ok(CstValueItem::Ref(CstRef {
                anchored: false,
                parts,
                cascade: true,
                span: span.merge(p.prev_span()),
            }));
        }
        return Ok(CstValueItem::Path(parts, span));
    }

    if in_parens {
        // `key: value` (choice lists) and `key=value` (image sizes).
        if p.peek() == Some(&Token::Colon) || p.peek() == Some(&Token::Assign) {
            p.bump();
            let value = parse_one_item(p, in_parens)?;
            let span = start.merge(value.span());
            return Ok(CstValueItem::KeyValue {
                key: name,
                value: Box::new(value),
                span,
            });
        }
    }

    if p.eat(&Token::Bang) {
        return Ok(CstValueItem::Ref(CstRef {
            anchored: false,
            parts: vec![name],
            cascade: true,
            span: start.merge(p.prev_span()),
        }));
    }

    // Two adjacent bare names form a pair (`auth: read basic`).
    if let Some(Token::Ident(_)) = p.peek() {
        let (second, second_span) = p.expect_ident("in value pair")?;
        return Ok(CstValueItem::Pair(name, second, start.merge(second_span)));
    }

    Ok(CstValueItem::Name {
        name,
        glob: false,
        span: start.merge(last_span),
    })
}

/// `#Name[.part]*[!]`: anchored model/field reference.
pub(super) fn parse_anchored_ref(p: &mut Parser) -> PResult<CstRef> {
    let hash_span = p.expect(Token::Hash, "to start a model reference")?;
    let (first, mut last_span) = p.expect_ident("after '#'")?;
    let mut parts = vec![first];
    while p.peek() == Some(&Token::Dot) && matches!(p.peek2(), Some(Token::Ident(_))) {
        p.bump();
        let (part, part_span) = p.expect_ident("after '.'")?;
        parts.push(part);
        last_span = part_span;
    }
    let cascade = p.eat(&Token::Bang);
    if cascade {
        last_span = p.prev_span();
    }
    Ok(CstRef {
        anchored: true,
        parts,
        cascade,
        span: hash_span.merge(last_span),
    })
}
