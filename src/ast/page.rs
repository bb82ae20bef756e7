//! Page-side AST: headers, URLs, page bodies, page annotations.

use serde::Serialize;

use super::{ErrorNode, FieldListExpr, ModelRef, RawBlock};
use crate::diagnostics::Span;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub name: String,
    pub name_span: Span,
    pub alias: Option<String>,
    /// Base page, by name until resolution.
    pub base: Option<PageBaseRef>,
    pub url: Option<UrlSpec>,
    pub body: PageBody,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageBaseRef {
    pub name: String,
    pub span: Span,
}

/// Shared between pages and crud sub-view overrides.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PageBody {
    pub template: Option<TemplateRef>,
    pub fields: Vec<PageField>,
    pub functions: Vec<PageFunction>,
    pub annotations: Vec<PageAnnotation>,
}

impl PageBody {
    pub fn is_empty(&self) -> bool {
        self.template.is_none()
            && self.fields.is_empty()
            && self.functions.is_empty()
            && self.annotations.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TemplateRef {
    Path(String),
    Code(RawBlock),
}

/// Computed page field, raw-code backed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageField {
    pub name: String,
    pub code: RawBlock,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageFunction {
    pub name: String,
    pub args: Vec<String>,
    pub body: Option<RawBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UrlSpec {
    /// `./...` or `$...`: extend the parent page's URL.
    pub relative: bool,
    pub segments: Vec<UrlSegment>,
    pub raw: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum UrlSegment {
    Literal(String),
    Param(String),
}

/// The closed set of page-level annotations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PageAnnotation {
    Stream(StreamConfig),
    React(RawBlock),
    Html(RawBlock),
    Markdown(RawBlock),
    Crud(CrudConfig),
    Menu(MenuConfig),
    Post(RawBlock),
    Auth { descriptor: Option<String> },
    Get(RawBlock),
    Error { status: u16, body: RawBlock, span: Span },
    Priority,
    /// Annotation the builder could not interpret.
    ErrorNode(ErrorNode),
}

impl PageAnnotation {
    pub fn keyword(&self) -> &'static str {
        match self {
            PageAnnotation::Stream(_) => "stream",
            PageAnnotation::React(_) => "react",
            PageAnnotation::Html(_) => "html",
            PageAnnotation::Markdown(_) => "markdown",
            PageAnnotation::Crud(c) => c.kind.keyword(),
            PageAnnotation::Menu(_) => "menu",
            PageAnnotation::Post(_) => "post",
            PageAnnotation::Auth { .. } => "auth",
            PageAnnotation::Get(_) => "get",
            PageAnnotation::Error { .. } => "error",
            PageAnnotation::Priority => "priority",
            PageAnnotation::ErrorNode(_) => "<error>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamConfig {
    pub models: Vec<ModelRef>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuConfig {
    pub descriptor: Option<String>,
    pub items: Vec<MenuItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MenuItem {
    pub label: String,
    pub target: MenuTarget,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MenuTarget {
    /// Reference to a page by name or alias.
    Page(String),
    /// Literal URL (quoted in source).
    Url(String),
}

/// Which of the crud family an annotation is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CrudKind {
    All,
    Create,
    Edit,
    Delete,
    List,
    Detail,
}

impl CrudKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            CrudKind::All => "crud",
            CrudKind::Create => "crud_create",
            CrudKind::Edit => "crud_edit",
            CrudKind::Delete => "crud_delete",
            CrudKind::List => "crud_list",
            CrudKind::Detail => "crud_detail",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SubView {
    Create,
    Edit,
    Delete,
    Detail,
    List,
}

impl SubView {
    pub fn from_name(name: &str) -> Option<SubView> {
        match name {
            "create" => Some(SubView::Create),
            "edit" => Some(SubView::Edit),
            "delete" => Some(SubView::Delete),
            "detail" => Some(SubView::Detail),
            "list" => Some(SubView::List),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SubView::Create => "create",
            SubView::Edit => "edit",
            SubView::Delete => "delete",
            SubView::Detail => "detail",
            SubView::List => "list",
        }
    }
}

/// Next-page transition rules, per lifecycle event.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct NextRules {
    pub all: Option<NextAction>,
    pub create: Option<NextAction>,
    pub edit: Option<NextAction>,
    pub delete: Option<NextAction>,
}

impl NextRules {
    pub fn is_empty(&self) -> bool {
        self.all.is_none() && self.create.is_none() && self.edit.is_none() && self.delete.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NextAction {
    Code(RawBlock),
    Url(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrudConfig {
    pub kind: CrudKind,
    pub descriptor: Option<String>,
    /// Target model; `None` when the builder found no leading `#Model` line
    /// (the validator turns that into an error).
    pub target: Option<ModelRef>,
    pub filter: Option<RawBlock>,
    pub fields: Option<FieldListExpr>,
    pub list_fields: Option<FieldListExpr>,
    pub url_prefix: Option<String>,
    pub link_suffix: Option<String>,
    pub item_name: Option<String>,
    pub object_expr: Option<RawBlock>,
    pub can_edit: Option<RawBlock>,
    pub block: Option<String>,
    pub pk_param: Option<String>,
    pub skip: Vec<SubView>,
    pub list_type: Option<String>,
    pub header: Option<bool>,
    pub next: NextRules,
    pub overrides: Vec<(SubView, PageBody)>,
    pub span: Span,
}

impl CrudConfig {
    pub fn new(kind: CrudKind, span: Span) -> Self {
        CrudConfig {
            kind,
            descriptor: None,
            target: None,
            filter: None,
            fields: None,
            list_fields: None,
            url_prefix: None,
            link_suffix: None,
            item_name: None,
            object_expr: None,
            can_edit: None,
            block: None,
            pk_param: None,
            skip: Vec::new(),
            list_type: None,
            header: None,
            next: NextRules::default(),
            overrides: Vec::new(),
            span,
        }
    }
}
