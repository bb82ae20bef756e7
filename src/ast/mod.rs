//! Typed AST for the veld DSL.
//!
//! The AST builder ([`build`]) projects the CST onto these types. The
//! document owns its whole tree by value; references between declarations
//! are names (plus spans), resolved later against the symbol table, never
//! ownership, so logically cyclic graphs cannot create ownership cycles.

pub mod build;
pub mod model;
pub mod page;

pub use build::build;

pub use model::{
    AdminConfig, Choice, Collection, Field, FieldKind, ImageSize, ModelAnnotation, RelationArity,
    RelationField, RestAuth, RestConfig, RestInline,
};
pub use page::{
    CrudConfig, CrudKind, MenuConfig, MenuItem, MenuTarget, NextAction, NextRules, Page,
    PageAnnotation, PageBaseRef, PageBody, PageField, PageFunction, SubView, TemplateRef, UrlSpec,
    UrlSegment,
};

use serde::Serialize;

use crate::diagnostics::Span;

/// Root of one parsed source file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub imports: Vec<ImportStatement>,
    pub collections: Vec<Collection>,
    pub pages: Vec<Page>,
    /// Blocks the parser recovered past; kept so later stages can say
    /// "not validated due to earlier syntax error".
    pub errors: Vec<ErrorNode>,
}

impl Document {
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.collections.is_empty()
            && self.pages.is_empty()
            && self.errors.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportStatement {
    /// Dotted module path, verbatim. Whether the module exists is the
    /// external loader's concern.
    pub module: String,
    pub names: ImportNames,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ImportNames {
    /// `import a.b`: the module itself.
    Module,
    /// `from a.b import *`.
    Wildcard,
    Named(Vec<ImportedName>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportedName {
    pub name: String,
    pub alias: Option<String>,
}

impl ImportedName {
    /// Name the import binds in the document symbol space.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// Placeholder for a region the parser recovered past.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorNode {
    pub message: String,
    pub span: Span,
}

/// Opaque embedded host-language code, tagged with the syntactic context it
/// appeared in. Never interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawBlock {
    pub tag: RawTag,
    pub text: String,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RawTag {
    FieldExtension,
    PageComputed,
    PageFunctionBody,
    TemplateCode,
    CrudFilter,
    CrudObjectExpr,
    CrudCanEdit,
    CrudNext,
    SignalBody,
    HandlerBody,
    ReactBody,
    HtmlBody,
    MarkdownBody,
    RestQuery,
}

/// Cross-reference to a collection: anchored `#Name[.field]` shorthand or a
/// dotted class path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRef {
    pub syntax: RefSyntax,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RefSyntax {
    /// `#Model` / `#Model.field`.
    Anchored {
        model: String,
        field: Option<String>,
    },
    /// `auth.User`: arbitrary importable class.
    Path(String),
}

impl ModelRef {
    /// The name looked up in the symbol table.
    pub fn lookup_name(&self) -> &str {
        match &self.syntax {
            RefSyntax::Anchored { model, .. } => model,
            RefSyntax::Path(path) => path.split('.').next().unwrap_or(path),
        }
    }

    pub fn display_name(&self) -> String {
        match &self.syntax {
            RefSyntax::Anchored { model, field: None } => format!("#{}", model),
            RefSyntax::Anchored {
                model,
                field: Some(field),
            } => format!("#{}.{}", model, field),
            RefSyntax::Path(path) => path.clone(),
        }
    }
}

/// Opaque field modifier sigils. Their runtime semantics belong to the code
/// generator; this crate only carries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sigil {
    Eq,
    Dollar,
    Amp,
    Bang,
    Tilde,
    Star,
    Approx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct FieldFlags {
    pub eq: bool,
    pub dollar: bool,
    pub amp: bool,
    pub bang: bool,
    pub tilde: bool,
    pub star: bool,
    pub approx: bool,
}

impl FieldFlags {
    pub fn insert(&mut self, sigil: Sigil) {
        match sigil {
            Sigil::Eq => self.eq = true,
            Sigil::Dollar => self.dollar = true,
            Sigil::Amp => self.amp = true,
            Sigil::Bang => self.bang = true,
            Sigil::Tilde => self.tilde = true,
            Sigil::Star => self.star = true,
            Sigil::Approx => self.approx = true,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == FieldFlags::default()
    }
}

/// Field selection mini-expression, resolved against a collection's declared
/// fields during reference resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldListExpr {
    pub entries: Vec<FieldListEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldListEntry {
    pub kind: FieldListEntryKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldListEntryKind {
    Wildcard,
    Exclude(String),
    Include { name: String, glob: bool },
}
