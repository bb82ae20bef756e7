//! Resolved intermediate representation.
//!
//! The resolver flattens inheritance, binds every cross-reference, and
//! expands field-list expressions into this tree. It is the hand-off surface
//! to code generators: owned, serializable, and never mutated after
//! construction. Unresolvable references are preserved as
//! [`RefTarget::Unresolved`] instead of being dropped, so generators can
//! still walk the rest of the project.

use serde::Serialize;

use crate::ast::{
    FieldFlags, FieldKind, PageField, PageFunction, RawBlock, RelationArity, RestAuth,
    SubView, TemplateRef, UrlSegment,
};
use crate::diagnostics::Span;
use crate::symbols::{CollectionId, PageId};

/// Immutable output of the whole front end, one per project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDocument {
    pub collections: Vec<ResolvedCollection>,
    pub pages: Vec<ResolvedPage>,
}

impl ResolvedDocument {
    pub fn collection(&self, id: CollectionId) -> &ResolvedCollection {
        &self.collections[id.0]
    }

    pub fn page(&self, id: PageId) -> &ResolvedPage {
        &self.pages[id.0]
    }

    pub fn collection_named(&self, name: &str) -> Option<&ResolvedCollection> {
        self.collections.iter().find(|c| c.name == name)
    }

    pub fn page_named(&self, name: &str) -> Option<&ResolvedPage> {
        self.pages
            .iter()
            .find(|p| p.name == name || p.alias.as_deref() == Some(name))
    }
}

/// Where a reference landed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RefTarget {
    Collection(CollectionId),
    /// Dotted class path outside the project (`auth.User`); trusted as-is.
    External { path: String },
    /// Lookup failed; carries the raw reference for diagnostics and
    /// generator placeholders.
    Unresolved { raw: String, span: Span },
}

impl RefTarget {
    pub fn is_resolved(&self) -> bool {
        !matches!(self, RefTarget::Unresolved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCollection {
    pub id: CollectionId,
    pub name: String,
    /// Inheritance chain, root first. Empty for base collections.
    pub bases: Vec<CollectionId>,
    /// Effective fields: base fields first in declaration order, overridden
    /// in place, own fields appended.
    pub fields: Vec<ResolvedField>,
    pub annotations: Vec<ResolvedModelAnnotation>,
    pub span: Span,
}

impl ResolvedCollection {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Fields declared by this collection itself (not inherited).
    pub fn own_fields(&self) -> impl Iterator<Item = &ResolvedField> {
        let id = self.id;
        self.fields.iter().filter(move |f| f.origin == id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub name: String,
    /// Collection whose declaration supplied this field's definition. For an
    /// overridden field this is the overriding collection.
    pub origin: CollectionId,
    pub flags: FieldFlags,
    pub kind: FieldKind,
    /// Bound relation target; `Some` exactly when `kind` is a relation.
    pub relation: Option<ResolvedRelation>,
    pub verbose_name: Option<String>,
    pub help_text: Option<String>,
    pub extension: Option<RawBlock>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRelation {
    pub arity: RelationArity,
    pub target: RefTarget,
    pub cascade_delete: bool,
    pub related_name: Option<String>,
}

/// Model annotations with field-list expressions expanded to concrete field
/// names and raw bodies carried through untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResolvedModelAnnotation {
    Admin(ResolvedAdmin),
    Api { descriptor: Option<String> },
    Rest(ResolvedRest),
    Order { fields: Vec<String>, span: Span },
    Tree,
    Mixin { path: String, span: Span },
    DateTree { field: String, span: Span },
    Sortable { field: String, span: Span },
    Signal { kind: SignalKind, body: RawBlock },
}

/// Model lifecycle hooks with raw code bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SignalKind {
    Clean,
    PreSave,
    PostSave,
    PreDelete,
    PostDelete,
    M2mChanged,
}

impl SignalKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            SignalKind::Clean => "clean",
            SignalKind::PreSave => "pre_save",
            SignalKind::PostSave => "post_save",
            SignalKind::PreDelete => "pre_delete",
            SignalKind::PostDelete => "post_delete",
            SignalKind::M2mChanged => "m2m_changed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedAdmin {
    pub list: Option<Vec<String>>,
    pub list_editable: Option<Vec<String>>,
    pub list_filter: Option<Vec<String>>,
    pub search: Option<Vec<String>>,
    pub read_only: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRest {
    pub descriptor: Option<String>,
    pub fields: Option<Vec<String>>,
    pub auth: Vec<RestAuth>,
    pub query: Option<RawBlock>,
    pub inlines: Vec<ResolvedRestInline>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRestInline {
    pub field: String,
    /// Expanded against the relation target's fields.
    pub fields: Option<Vec<String>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedPage {
    pub id: PageId,
    pub name: String,
    pub alias: Option<String>,
    pub base: Option<PageId>,
    pub url: Option<ResolvedUrl>,
    pub body: ResolvedPageBody,
    pub span: Span,
}

/// URL after relative-prefix composition against the base page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedUrl {
    /// Canonical `/a/b/<c>/` form.
    pub full: String,
    pub segments: Vec<UrlSegment>,
    /// `<param>` names in order of appearance.
    pub params: Vec<String>,
    pub span: Span,
}

/// Page body after base-page merge: the template, computed fields, and
/// functions are the effective set, child declarations winning by name.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedPageBody {
    pub template: Option<TemplateRef>,
    pub fields: Vec<PageField>,
    pub functions: Vec<PageFunction>,
    pub annotations: Vec<ResolvedPageAnnotation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResolvedPageAnnotation {
    Stream { targets: Vec<RefTarget>, span: Span },
    React(RawBlock),
    Html(RawBlock),
    Markdown(RawBlock),
    Get(RawBlock),
    Post(RawBlock),
    Error { status: u16, body: RawBlock, span: Span },
    Auth { descriptor: Option<String> },
    Priority,
    Menu(ResolvedMenu),
    Crud(ResolvedCrud),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMenu {
    pub descriptor: Option<String>,
    pub items: Vec<ResolvedMenuItem>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedMenuItem {
    pub label: String,
    pub target: ResolvedMenuTarget,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResolvedMenuTarget {
    Page(PageId),
    Url(String),
    Unresolved { raw: String, span: Span },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCrud {
    pub kind: crate::ast::CrudKind,
    pub descriptor: Option<String>,
    pub target: RefTarget,
    /// Field component of a `#Model.field` target.
    pub target_field: Option<String>,
    pub filter: Option<RawBlock>,
    pub fields: Option<Vec<String>>,
    pub list_fields: Option<Vec<String>>,
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
    pub next: ResolvedNextRules,
    pub overrides: Vec<(SubView, ResolvedPageBody)>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ResolvedNextRules {
    pub all: Option<crate::ast::NextAction>,
    pub create: Option<crate::ast::NextAction>,
    pub edit: Option<crate::ast::NextAction>,
    pub delete: Option<crate::ast::NextAction>,
}

impl ResolvedNextRules {
    /// Effective action for one sub-view, falling back to the `next` rule.
    pub fn for_view(&self, view: SubView) -> Option<&crate::ast::NextAction> {
        let specific = match view {
            SubView::Create => self.create.as_ref(),
            SubView::Edit => self.edit.as_ref(),
            SubView::Delete => self.delete.as_ref(),
            SubView::Detail | SubView::List => None,
        };
        specific.or(self.all.as_ref())
    }
}
