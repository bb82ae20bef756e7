//! Collection declaration grammar: `#Name` headers, field lines, model
//! annotations.

use super::{values, PResult, Parser};
use crate::cst::{
    CstColLine, CstCollection, CstError, CstField, CstRaw, InheritKind, SigilToken,
};
use crate::lexer::Token;

pub(super) fn parse_collection(p: &mut Parser) -> PResult<CstCollection> {
    let start = p.expect(Token::Hash, "to start a collection")?;
    let (first, first_span) = p.expect_ident("as the collection name")?;

    // `#Base -> Name` / `#Base ~> Name`: the declared collection is the
    // right-hand name; the left side is its base.
    let (base, name, name_span) = match p.peek() {
        Some(Token::Arrow) => {
            p.bump();
            let (name, name_span) = p.expect_ident("after '->'")?;
            (
                Some((first, InheritKind::Plain, first_span)),
                name,
                name_span,
            )
        }
        Some(Token::CascadeArrow) => {
            p.bump();
            let (name, name_span) = p.expect_ident("after '~>'")?;
            (
                Some((first, InheritKind::Cascade, first_span)),
                name,
                name_span,
            )
        }
        _ => (None, first, first_span),
    };

    match p.peek() {
        None | Some(Token::Newline) => {
            p.eat(&Token::Newline);
        }
        _ => {
            p.error_here(format!(
                "expected end of line after collection header, found {}",
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
        // A new declaration header directly below also ends the block.
        if matches!(p.peek(), Some(Token::Hash) | Some(Token::LBracket)) {
            break;
        }
        match p.peek() {
            Some(Token::Newline) => {
                p.bump();
            }
            Some(Token::At) => match values::parse_annotation(p) {
                Ok(ann) => {
                    end_of_line(p);
                    lines.push(CstColLine::Annotation(ann));
                }
                Err(()) => {
                    let span = p.skip_to_eol();
                    lines.push(CstColLine::Error(CstError {
                        message: "malformed annotation".to_string(),
                        span,
                    }));
                }
            },
            _ => match parse_field(p) {
                Ok(field) => lines.push(CstColLine::Field(field)),
                Err(()) => {
                    let span = p.skip_to_eol();
                    lines.push(CstColLine::Error(CstError {
                        message: "malformed field".to_string(),
                        span,
                    }));
                }
            },
        }
    }

    let span = start.merge(p.prev_span());
    Ok(CstCollection {
        base,
        name,
        name_span,
        lines,
        span,
    })
}

fn sigil_for(token: &Token) -> Option<SigilToken> {
    match token {
        Token::Assign => Some(SigilToken::Eq),
        Token::Dollar => Some(SigilToken::Dollar),
        Token::Amp => Some(SigilToken::Amp),
        Token::Bang => Some(SigilToken::Bang),
        Token::Tilde => Some(SigilToken::Tilde),
        Token::Star => Some(SigilToken::Star),
        Token::Approx => Some(SigilToken::Approx),
        _ => None,
    }
}

/// `[sigils]name : kind[(args)] [-> related] ["verbose"] ["help"] [{ ext }]`
fn parse_field(p: &mut Parser) -> PResult<CstField> {
    let start = p.cur_span();

    let mut sigils = Vec::new();
    while let Some(sigil) = p.peek().and_then(sigil_for) {
        sigils.push(sigil);
        p.bump();
    }

    let (name, name_span) = p.expect_ident("as the field name")?;
    p.expect(Token::Colon, "after the field name")?;
    let (kind, kind_span) = p.expect_ident("as the field kind")?;

    let mut args = Vec::new();
    if p.eat(&Token::LParen) {
        args = values::parse_value_items(p, true);
        p.expect(Token::RParen, "to close field arguments")?;
    }

    let related_name = if p.eat(&Token::Arrow) {
        let (related, related_span) = p.expect_ident("after '->'")?;
        Some((related, related_span))
    } else {
        None
    };

    let mut verbose_name = None;
    let mut help_text = None;
    if let Some(Token::Str(_)) = p.peek() {
        if let Some(crate::lexer::Spanned {
            token: Token::Str(text),
            ..
        }) = p.bump()
        {
            verbose_name = Some(text);
        }
    }
    if let Some(Token::Str(_)) = p.peek() {
        if let Some(crate::lexer::Spanned {
            token: Token::Str(text),
            ..
        }) = p.bump()
        {
            help_text = Some(text);
        }
    }

    // `= <code>` and `{ <code> }` are both extension forms.
    let extension = if let Some(Token::InlineCode(_) | Token::BlockCode(_)) = p.peek() {
        let span = p.cur_span();
        match p.bump() {
            Some(crate::lexer::Spanned {
                token: Token::InlineCode(text) | Token::BlockCode(text),
                ..
            }) => Some(CstRaw { text, span }),
            _ => None,
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
                "expected end of line after field, found {}",
                p.found_describe()
            ));
            return Err(());
        }
    }

    Ok(CstField {
        sigils,
        name,
        name_span,
        kind,
        kind_span,
        args,
        related_name,
        verbose_name,
        help_text,
        extension,
        span: start.merge(p.prev_span()),
    })
}

fn end_of_line(p: &mut Parser) {
    match p.peek() {
        None | Some(Token::Newline) => {
            p.eat(&Token::Newline);
        }
        _ => {
            p.error_here(format!(
                "expected end of line after annotation, found {}",
                p.found_describe()
            ));
            p.skip_to_eol();
        }
    }
}
