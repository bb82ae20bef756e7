//! Concrete parse tree produced by the recursive-descent parser.
//!
//! The CST resolves the surface shape of the grammar (blocks, headers,
//! entries, argument lists) without interpreting it: field kinds are still
//! `(name, args)` pairs, annotation payloads are generic entry lists, and
//! field-list expressions are kept as raw value spans. The AST builder in
//! [`crate::ast::build`] projects this tree onto the typed AST and is where
//! arity and shape checks happen.
//!
//! Error recovery leaves explicit [`CstError`] nodes behind so later stages
//! can report "not validated due to earlier syntax error" instead of a
//! cascade of unrelated errors.

use crate::diagnostics::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct CstDocument {
    pub items: Vec<CstItem>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstItem {
    Import(CstImport),
    Collection(CstCollection),
    Page(CstPage),
    /// A block the parser gave up on; covers everything up to the next
    /// blank-line boundary.
    Error(CstError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstError {
    pub message: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstImport {
    /// Dotted module path, one segment per element.
    pub module: Vec<String>,
    pub wildcard: bool,
    /// `(name, alias)` pairs; empty when `wildcard` is set.
    pub names: Vec<(String, Option<String>)>,
    pub span: Span,
}

/// `plain ->` vs `cascading ~>` inheritance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InheritKind {
    Plain,
    Cascade,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstCollection {
    /// `#Base -> Name`: base on the left, declared name on the right.
    pub base: Option<(String, InheritKind, Span)>,
    pub name: String,
    pub name_span: Span,
    pub lines: Vec<CstColLine>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstColLine {
    Field(CstField),
    Annotation(CstAnnotation),
    Error(CstError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigilToken {
    Eq,
    Dollar,
    Amp,
    Bang,
    Tilde,
    Star,
    Approx,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstField {
    pub sigils: Vec<SigilToken>,
    pub name: String,
    pub name_span: Span,
    pub kind: String,
    pub kind_span: Span,
    pub args: Vec<CstValueItem>,
    /// `-> name` after a relation kind.
    pub related_name: Option<(String, Span)>,
    pub verbose_name: Option<String>,
    pub help_text: Option<String>,
    /// Trailing `{ ... }` extension, verbatim.
    pub extension: Option<CstRaw>,
    pub span: Span,
}

/// Verbatim raw code with the span of the whole capture.
#[derive(Debug, Clone, PartialEq)]
pub struct CstRaw {
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstAnnotation {
    pub name: String,
    pub name_span: Span,
    /// `@crud_list.acrud` → `Some("acrud")`.
    pub descriptor: Option<String>,
    /// `@order(a, b)` / `@error(404)` parenthesized arguments.
    pub args: Vec<CstValueItem>,
    pub body: Option<CstAnnBody>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstAnnBody {
    /// Opaque `{ ... }` capture.
    Raw(CstRaw),
    /// Structured `{ entry; entry ... }` body.
    Entries(Vec<CstEntry>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstEntry {
    /// Leading `#Model[.field]` target line (crud family, `@stream`).
    Target(CstRef),
    KeyValue(CstKeyValue),
    Error(CstError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstKeyValue {
    /// Menu entries use a quoted label as the key.
    pub key: CstKey,
    pub key_span: Span,
    pub items: Vec<CstValueItem>,
    /// Span of the raw value text; field-list expressions are re-read from
    /// the source through this.
    pub value_span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstKey {
    Name(String),
    Label(String),
}

impl CstKey {
    pub fn as_name(&self) -> Option<&str> {
        match self {
            CstKey::Name(name) => Some(name),
            CstKey::Label(_) => None,
        }
    }
}

/// `#Name[.field][!]` anchored reference or dotted class path.
#[derive(Debug, Clone, PartialEq)]
pub struct CstRef {
    pub anchored: bool,
    pub parts: Vec<String>,
    pub cascade: bool,
    pub span: Span,
}

/// One item of a comma-separated value list (annotation entry values and
/// parenthesized argument lists share this shape).
#[derive(Debug, Clone, PartialEq)]
pub enum CstValueItem {
    Star(Span),
    /// `-name` exclusion.
    Exclude(String, Span),
    /// Bare name, `name.*` glob.
    Name {
        name: String,
        glob: bool,
        span: Span,
    },
    /// Dotted path with two or more segments.
    Path(Vec<String>, Span),
    /// Two adjacent bare names (`auth: read basic`).
    Pair(String, String, Span),
    Str(String, Span),
    Int(i64, Span),
    Bool(bool, Span),
    Dimensions(u32, u32, Span),
    Ref(CstRef),
    Code(CstRaw),
    /// `name(entries...)`: nested configuration (`inline: comments(fields: *)`).
    Call {
        name: String,
        entries: Vec<CstEntry>,
        span: Span,
    },
    /// `key: value` or `key=value` inside argument lists.
    KeyValue {
        key: String,
        value: Box<CstValueItem>,
        span: Span,
    },
    /// Structured `{ ... }` sub-block (crud sub-view overrides).
    Block(Vec<CstPageLine>, Span),
    Error(Span),
}

impl CstValueItem {
    pub fn span(&self) -> Span {
        match self {
            CstValueItem::Star(span)
            | CstValueItem::Exclude(_, span)
            | CstValueItem::Name { span, .. }
            | CstValueItem::Path(_, span)
            | CstValueItem::Pair(_, _, span)
            | CstValueItem::Str(_, span)
            | CstValueItem::Int(_, span)
            | CstValueItem::Bool(_, span)
            | CstValueItem::Dimensions(_, _, span)
            | CstValueItem::Call { span, .. }
            | CstValueItem::KeyValue { span, .. }
            | CstValueItem::Block(_, span)
            | CstValueItem::Error(span) => *span,
            CstValueItem::Ref(r) => r.span,
            CstValueItem::Code(raw) => raw.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CstPage {
    /// `[Base -> Name]`: base on the left, declared name on the right.
    pub base: Option<(String, Span)>,
    pub name: String,
    pub name_span: Span,
    pub alias: Option<String>,
    /// Raw URL text after `]:`, split by the AST builder.
    pub url: Option<CstRaw>,
    pub lines: Vec<CstPageLine>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstPageLine {
    /// `template: path/to/file.html` or `template: = <code>`.
    Template { value: CstTemplate, span: Span },
    /// `name= <code>` computed field.
    ComputedField {
        name: String,
        code: CstRaw,
        span: Span,
    },
    /// `name(arg, ...)= <code>` or `name(arg, ...) { ... }`.
    Function {
        name: String,
        args: Vec<String>,
        body: Option<CstRaw>,
        span: Span,
    },
    Annotation(CstAnnotation),
    Error(CstError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CstTemplate {
    Path(String),
    Code(CstRaw),
}
