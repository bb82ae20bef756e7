//! Collection-side AST: fields, field kinds, model annotations.

use serde::Serialize;

use super::{ErrorNode, FieldFlags, FieldListExpr, ModelRef, RawBlock};
use crate::cst::InheritKind;
use crate::diagnostics::Span;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub name: String,
    pub name_span: Span,
    pub base: Option<BaseRef>,
    pub fields: Vec<Field>,
    pub annotations: Vec<ModelAnnotation>,
    pub span: Span,
}

impl Collection {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// `#Base -> Name` reference, by name until resolution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseRef {
    pub name: String,
    pub cascade: bool,
    pub span: Span,
}

impl BaseRef {
    pub fn new(name: String, kind: InheritKind, span: Span) -> Self {
        BaseRef {
            name,
            cascade: kind == InheritKind::Cascade,
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Field {
    pub name: String,
    pub flags: FieldFlags,
    pub kind: FieldKind,
    pub verbose_name: Option<String>,
    pub help_text: Option<String>,
    pub extension: Option<RawBlock>,
    pub span: Span,
}

/// The closed set of field kinds. Dispatched with exhaustive matches in the
/// validator and at the code-generation boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum FieldKind {
    Text {
        max_length: Option<u32>,
        choices: Vec<Choice>,
    },
    LongText,
    Html,
    HtmlMedia,
    Int {
        choices: Vec<Choice>,
    },
    Float,
    Decimal,
    Date,
    DateTime,
    CreateTimestamp,
    UpdateTimestamp,
    Bool {
        default: Option<bool>,
    },
    Slug {
        sources: Vec<String>,
    },
    File,
    FilerFile,
    FilerFolder,
    Image {
        sizes: Vec<ImageSize>,
        filters: Vec<String>,
    },
    FilerImage {
        sizes: Vec<ImageSize>,
        filters: Vec<String>,
    },
    Relation(RelationField),
    /// The kind could not be built; the field slot is preserved so later
    /// stages skip it instead of cascading.
    Error,
}

impl FieldKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            FieldKind::Text { .. } => "str",
            FieldKind::LongText => "text",
            FieldKind::Html => "html",
            FieldKind::HtmlMedia => "html_media",
            FieldKind::Int { .. } => "int",
            FieldKind::Float => "float",
            FieldKind::Decimal => "decimal",
            FieldKind::Date => "date",
            FieldKind::DateTime => "datetime",
            FieldKind::CreateTimestamp => "created",
            FieldKind::UpdateTimestamp => "updated",
            FieldKind::Bool { .. } => "bool",
            FieldKind::Slug { .. } => "slug",
            FieldKind::File => "file",
            FieldKind::FilerFile => "filer_file",
            FieldKind::FilerFolder => "filer_folder",
            FieldKind::Image { .. } => "image",
            FieldKind::FilerImage { .. } => "filer_image",
            FieldKind::Relation(rel) => match rel.arity {
                RelationArity::One => "one",
                RelationArity::OneToOne => "one2one",
                RelationArity::Many => "many",
            },
            FieldKind::Error => "<error>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Choice {
    pub key: String,
    pub label: Option<String>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageSize {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RelationArity {
    One,
    OneToOne,
    Many,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationField {
    pub arity: RelationArity,
    pub target: ModelRef,
    pub cascade_delete: bool,
    pub related_name: Option<String>,
}

/// The closed set of model-level annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ModelAnnotation {
    Admin(AdminConfig),
    Api { descriptor: Option<String> },
    Rest(RestConfig),
    Order { fields: Vec<String>, span: Span },
    Clean(RawBlock),
    PreDelete(RawBlock),
    Tree,
    Mixin { path: String, span: Span },
    DateTree { field: String, span: Span },
    M2mChanged(RawBlock),
    PostSave(RawBlock),
    PreSave(RawBlock),
    PostDelete(RawBlock),
    Sortable { field: String, span: Span },
    /// Annotation the builder could not interpret.
    Error(ErrorNode),
}

impl ModelAnnotation {
    pub fn keyword(&self) -> &'static str {
        match self {
            ModelAnnotation::Admin(_) => "admin",
            ModelAnnotation::Api { .. } => "api",
            ModelAnnotation::Rest(_) => "rest",
            ModelAnnotation::Order { .. } => "order",
            ModelAnnotation::Clean(_) => "clean",
            ModelAnnotation::PreDelete(_) => "pre_delete",
            ModelAnnotation::Tree => "tree",
            ModelAnnotation::Mixin { .. } => "mixin",
            ModelAnnotation::DateTree { .. } => "date_tree",
            ModelAnnotation::M2mChanged(_) => "m2m_changed",
            ModelAnnotation::PostSave(_) => "post_save",
            ModelAnnotation::PreSave(_) => "pre_save",
            ModelAnnotation::PostDelete(_) => "post_delete",
            ModelAnnotation::Sortable { .. } => "sortable",
            ModelAnnotation::Error(_) => "<error>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AdminConfig {
    pub list: Option<FieldListExpr>,
    pub list_editable: Option<FieldListExpr>,
    pub list_filter: Option<FieldListExpr>,
    pub search: Option<FieldListExpr>,
    pub read_only: Option<FieldListExpr>,
    pub fields: Option<FieldListExpr>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestConfig {
    pub descriptor: Option<String>,
    pub fields: Option<FieldListExpr>,
    pub auth: Vec<RestAuth>,
    pub query: Option<RawBlock>,
    pub inlines: Vec<RestInline>,
    pub span: Span,
}

/// `auth: read basic, write token`: access mode paired with a method name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestAuth {
    pub mode: String,
    pub method: String,
    pub span: Span,
}

/// `inline: comments(fields: *)`: nested serializer over a relation field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RestInline {
    pub field: String,
    pub fields: Option<FieldListExpr>,
    pub span: Span,
}
