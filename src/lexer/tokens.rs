//! Token definitions for the veld DSL.
//!
//! The base token set is defined with the logos derive macro. Newlines are
//! significant (statement separators); other whitespace is skipped. The
//! `InlineCode`, `BlockCode` and `Error` variants are never produced by logos
//! itself; the driver in [`super::lexer_impl`] emits them.

use logos::Logos;

fn parse_dimensions(slice: &str) -> Option<(u32, u32)> {
    let (w, h) = slice.split_once('x')?;
    Some((w.parse().ok()?, h.parse().ok()?))
}

fn unescape(slice: &str) -> String {
    let inner = &slice[1..slice.len() - 1];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => break,
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// All tokens of the veld grammar.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r]+")]
pub enum Token {
    #[token("\n")]
    Newline,

    // Comments are kept as tokens: a comment-only line is not a blank line
    // and must not terminate a declaration block.
    #[regex(r"//[^\n]*")]
    Comment,

    #[token("from")]
    KwFrom,
    #[token("import")]
    KwImport,
    #[token("as")]
    KwAs,
    #[token("true")]
    KwTrue,
    #[token("false")]
    KwFalse,

    #[token("->")]
    Arrow,
    #[token("~>")]
    CascadeArrow,

    #[token("#")]
    Hash,
    #[token("@")]
    At,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("*")]
    Star,
    #[token("-")]
    Dash,
    #[token("=")]
    Assign,
    #[token("!")]
    Bang,
    #[token("$")]
    Dollar,
    #[token("&")]
    Amp,
    #[token("~")]
    Tilde,
    #[token("≈")]
    Approx,
    #[token("/")]
    Slash,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,

    #[regex(r"[0-9]+x[0-9]+", |lex| parse_dimensions(lex.slice()), priority = 3)]
    Dimensions((u32, u32)),

    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),

    #[regex(r#""([^"\\\n]|\\.)*""#, |lex| unescape(lex.slice()))]
    #[regex(r"'([^'\\\n]|\\.)*'", |lex| unescape(lex.slice()))]
    Str(String),

    // Identifiers permit internal dashes (page names like `article-list`)
    // but a dash must be followed by an alphanumeric, so `a->b` still lexes
    // as `a`, `->`, `b`.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*(-[a-zA-Z0-9_]+)*", |lex| lex.slice().to_string())]
    Ident(String),

    /// `= <rest of line>` raw code, emitted by the driver.
    InlineCode(String),
    /// `{ ... }` balanced raw code, emitted by the driver.
    BlockCode(String),
    /// Single unrecognized character; parsing continues past it.
    Error,
}

impl Token {
    /// Description used in "expected X, found Y" diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Token::Newline => "end of line".into(),
            Token::Comment => "comment".into(),
            Token::Ident(name) => format!("'{}'", name),
            Token::Int(value) => format!("'{}'", value),
            Token::Str(_) => "string literal".into(),
            Token::Dimensions(_) => "dimensions".into(),
            Token::InlineCode(_) => "inline code".into(),
            Token::BlockCode(_) => "code block".into(),
            Token::Error => "unrecognized character".into(),
            Token::KwFrom => "'from'".into(),
            Token::KwImport => "'import'".into(),
            Token::KwAs => "'as'".into(),
            Token::KwTrue => "'true'".into(),
            Token::KwFalse => "'false'".into(),
            Token::Arrow => "'->'".into(),
            Token::CascadeArrow => "'~>'".into(),
            Token::Hash => "'#'".into(),
            Token::At => "'@'".into(),
            Token::LBracket => "'['".into(),
            Token::RBracket => "']'".into(),
            Token::LBrace => "'{'".into(),
            Token::RBrace => "'}'".into(),
            Token::LParen => "'('".into(),
            Token::RParen => "')'".into(),
            Token::Colon => "':'".into(),
            Token::Semicolon => "';'".into(),
            Token::Comma => "','".into(),
            Token::Dot => "'.'".into(),
            Token::Star => "'*'".into(),
            Token::Dash => "'-'".into(),
            Token::Assign => "'='".into(),
            Token::Bang => "'!'".into(),
            Token::Dollar => "'$'".into(),
            Token::Amp => "'&'".into(),
            Token::Tilde => "'~'".into(),
            Token::Approx => "'≈'".into(),
            Token::Slash => "'/'".into(),
            Token::Lt => "'<'".into(),
            Token::Gt => "'>'".into(),
        }
    }
}

/// Annotations whose `{ ... }` body is opaque raw code.
pub fn is_raw_body_annotation(name: &str) -> bool {
    matches!(
        name,
        "clean"
            | "pre_delete"
            | "post_delete"
            | "pre_save"
            | "post_save"
            | "m2m_changed"
            | "get"
            | "post"
            | "error"
            | "react"
            | "html"
            | "markdown"
    )
}

/// Annotations whose `{ ... }` body is structured and lexed normally.
pub fn is_structured_annotation(name: &str) -> bool {
    matches!(
        name,
        "admin"
            | "rest"
            | "menu"
            | "stream"
            | "crud"
            | "crud_create"
            | "crud_edit"
            | "crud_delete"
            | "crud_list"
            | "crud_detail"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use logos::Logos;

    fn lex(source: &str) -> Vec<Token> {
        Token::lexer(source).filter_map(|r| r.ok()).collect()
    }

    #[test]
    fn dashed_identifiers_do_not_swallow_arrows() {
        assert_eq!(
            lex("article-list"),
            vec![Token::Ident("article-list".into())]
        );
        assert_eq!(
            lex("a->b"),
            vec![
                Token::Ident("a".into()),
                Token::Arrow,
                Token::Ident("b".into()),
            ]
        );
    }

    #[test]
    fn cascade_arrow_beats_tilde() {
        assert_eq!(
            lex("A ~> B"),
            vec![
                Token::Ident("A".into()),
                Token::CascadeArrow,
                Token::Ident("B".into()),
            ]
        );
    }

    #[test]
    fn dimensions_beat_int() {
        assert_eq!(lex("100x60"), vec![Token::Dimensions((100, 60))]);
        assert_eq!(
            lex("100x"),
            vec![Token::Int(100), Token::Ident("x".into())]
        );
    }

    #[test]
    fn strings_unescape_both_quote_styles() {
        assert_eq!(lex(r#""a \"b\"""#), vec![Token::Str("a \"b\"".into())]);
        assert_eq!(lex(r"'it\'s'"), vec![Token::Str("it's".into())]);
    }

    #[test]
    fn keywords_win_over_identifiers() {
        assert_eq!(
            lex("from x import y as z"),
            vec![
                Token::KwFrom,
                Token::Ident("x".into()),
                Token::KwImport,
                Token::Ident("y".into()),
                Token::KwAs,
                Token::Ident("z".into()),
            ]
        );
    }

    #[test]
    fn comment_is_kept_as_a_token() {
        assert_eq!(
            lex("a // trailing\nb"),
            vec![
                Token::Ident("a".into()),
                Token::Comment,
                Token::Newline,
                Token::Ident("b".into()),
            ]
        );
    }
}
