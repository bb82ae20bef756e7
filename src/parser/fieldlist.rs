//! Field-list expression mini-grammar, parsed with chumsky.
//!
//! `*, -a, -b` / `title, author, meta.*`: the selection language used by
//! `@admin`, `@rest` and the crud annotations. The surrounding grammar hands
//! the raw value text over; entry spans are offset back into the file.

use chumsky::prelude::*;

use crate::ast::{FieldListEntry, FieldListEntryKind, FieldListExpr};
use crate::diagnostics::{Diagnostic, Span, Stage};

fn entry_parser() -> impl Parser<char, FieldListEntryKind, Error = Simple<char>> {
    let ident = text::ident();
    choice((
        just('*').to(FieldListEntryKind::Wildcard),
        just('-')
            .ignore_then(ident)
            .map(FieldListEntryKind::Exclude),
        ident
            .then(just(".*").or_not())
            .map(|(name, glob): (String, Option<&str>)| FieldListEntryKind::Include {
                name,
                glob: glob.is_some(),
            }),
    ))
}

fn expr_parser(
    span: Span,
) -> impl Parser<char, Vec<FieldListEntry>, Error = Simple<char>> {
    entry_parser()
        .map_with_span(move |kind, range: std::ops::Range<usize>| FieldListEntry {
            kind,
            span: Span::new(span.file, span.start + range.start, span.start + range.end),
        })
        .padded()
        .separated_by(just(','))
        .allow_trailing()
        .then_ignore(end())
}

/// Parses the raw text of a field-list expression. `span` locates `text`
/// inside its file.
pub fn parse_field_list(text: &str, span: Span) -> Result<FieldListExpr, Diagnostic> {
    match expr_parser(span).parse(text) {
        Ok(entries) if entries.is_empty() => Err(Diagnostic::error(
            Stage::AstBuilder,
            span,
            "empty field-list expression",
        )),
        Ok(entries) => Ok(FieldListExpr { entries, span }),
        Err(_) => Err(Diagnostic::error(
            Stage::AstBuilder,
            span,
            format!("invalid field-list expression '{}'", text.trim()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::FileId;

    fn parse(text: &str) -> Result<Vec<FieldListEntryKind>, Diagnostic> {
        parse_field_list(text, Span::new(FileId::ZERO, 0, text.len()))
            .map(|e| e.entries.into_iter().map(|x| x.kind).collect())
    }

    #[test]
    fn wildcard_with_excludes() {
        assert_eq!(
            parse("*, -a, -b").unwrap(),
            vec![
                FieldListEntryKind::Wildcard,
                FieldListEntryKind::Exclude("a".into()),
                FieldListEntryKind::Exclude("b".into()),
            ]
        );
    }

    #[test]
    fn explicit_names_and_globs() {
        assert_eq!(
            parse("title, meta.*").unwrap(),
            vec![
                FieldListEntryKind::Include {
                    name: "title".into(),
                    glob: false,
                },
                FieldListEntryKind::Include {
                    name: "meta".into(),
                    glob: true,
                },
            ]
        );
    }

    #[test]
    fn trailing_comma_is_tolerated() {
        assert_eq!(parse("a, b,").unwrap().len(), 2);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse("a b").is_err());
        assert!(parse("").is_err());
    }
}
