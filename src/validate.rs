//! Semantic validation over the resolved project.
//!
//! Purely diagnostic: nothing here mutates the IR. Structural checks
//! (annotation multiplicity, payload ranges) run against the AST as
//! declared; field-existence checks run against the effective field sets in
//! the IR so inherited fields count.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ast::{
    Collection, FieldKind, ModelAnnotation, Page, PageAnnotation, UrlSegment,
};
use crate::diagnostics::{Diagnostic, Span, Stage};
use crate::ir::{ResolvedCollection, ResolvedDocument};
use crate::symbols::SymbolTable;

/// How often an annotation may appear on one declaration.
#[derive(Clone, Copy, PartialEq)]
enum Limit {
    Once,
    /// Repeatable when every occurrence carries a distinct descriptor.
    DistinctDescriptors,
    Repeatable,
}

static MODEL_ANNOTATION_LIMITS: Lazy<HashMap<&'static str, Limit>> = Lazy::new(|| {
    let mut limits = HashMap::new();
    limits.insert("admin", Limit::Once);
    limits.insert("api", Limit::Once);
    limits.insert("order", Limit::Once);
    limits.insert("tree", Limit::Once);
    limits.insert("mixin", Limit::Repeatable);
    limits.insert("date_tree", Limit::Once);
    limits.insert("sortable", Limit::Once);
    limits.insert("rest", Limit::DistinctDescriptors);
    limits.insert("clean", Limit::Once);
    limits.insert("pre_save", Limit::Once);
    limits.insert("post_save", Limit::Once);
    limits.insert("pre_delete", Limit::Once);
    limits.insert("post_delete", Limit::Once);
    limits.insert("m2m_changed", Limit::Once);
    limits
});

static PAGE_ANNOTATION_LIMITS: Lazy<HashMap<&'static str, Limit>> = Lazy::new(|| {
    let mut limits = HashMap::new();
    limits.insert("stream", Limit::Once);
    limits.insert("react", Limit::Once);
    limits.insert("html", Limit::Once);
    limits.insert("markdown", Limit::Once);
    limits.insert("get", Limit::Once);
    limits.insert("post", Limit::Once);
    limits.insert("auth", Limit::Once);
    limits.insert("priority", Limit::Once);
    limits.insert("menu", Limit::DistinctDescriptors);
    limits.insert("error", Limit::Repeatable);
    limits.insert("crud", Limit::DistinctDescriptors);
    limits.insert("crud_create", Limit::DistinctDescriptors);
    limits.insert("crud_edit", Limit::DistinctDescriptors);
    limits.insert("crud_delete", Limit::DistinctDescriptors);
    limits.insert("crud_list", Limit::DistinctDescriptors);
    limits.insert("crud_detail", Limit::DistinctDescriptors);
    limits
});

static URL_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._~-]+$").unwrap());

pub fn validate(table: &SymbolTable<'_>, ir: &ResolvedDocument) -> Vec<Diagnostic> {
    let mut validator = Validator { diags: Vec::new() };
    for id in table.collection_ids() {
        validator.collection(table.collection(id), ir.collection(id));
    }
    for id in table.page_ids() {
        validator.page(table.page(id));
    }
    for page in &ir.pages {
        if let Some(url) = &page.url {
            validator.url_segments(&url.segments, url.span);
        }
    }
    validator.diags
}

struct Validator {
    diags: Vec<Diagnostic>,
}

impl Validator {
    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::error(Stage::Validator, span, message));
    }

    fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::warning(Stage::Validator, span, message));
    }

    fn collection(&mut self, collection: &Collection, resolved: &ResolvedCollection) {
        let occurrences: Vec<(&'static str, Option<&str>, Span)> = collection
            .annotations
            .iter()
            .filter_map(|ann| match ann {
                ModelAnnotation::Error(_) => None,
                ModelAnnotation::Rest(config) => {
                    Some((ann.keyword(), config.descriptor.as_deref(), config.span))
                }
                _ => Some((ann.keyword(), None, collection.name_span)),
            })
            .collect();
        self.check_limits(&occurrences, &MODEL_ANNOTATION_LIMITS);

        for field in &collection.fields {
            self.field(field);
        }

        for ann in &collection.annotations {
            match ann {
                ModelAnnotation::DateTree { field, span } => {
                    match resolved.field(field).map(|f| &f.kind) {
                        Some(FieldKind::Date) | Some(FieldKind::DateTime)
                        | Some(FieldKind::CreateTimestamp) | Some(FieldKind::UpdateTimestamp) => {}
                        Some(_) => {
                            self.error(
                                *span,
                                format!("@date_tree field '{}' is not a date field", field),
                            );
                        }
                        None => {
                            self.error(
                                *span,
                                format!("@date_tree names unknown field '{}'", field),
                            );
                        }
                    }
                }
                ModelAnnotation::Sortable { field, span } => {
                    if resolved.field(field).is_none() {
                        self.error(
                            *span,
                            format!("@sortable names unknown field '{}'", field),
                        );
                    }
                }
                _ => {}
            }
        }

        // Slug sources must name effective fields, inherited ones included.
        for field in &resolved.fields {
            if let FieldKind::Slug { sources } = &field.kind {
                for source in sources {
                    if resolved.field(source).is_none() {
                        self.error(
                            field.span,
                            format!("slug source '{}' is not a field", source),
                        );
                    }
                }
            }
        }
    }

    fn field(&mut self, field: &crate::ast::Field) {
        match &field.kind {
            FieldKind::Text { choices, .. } | FieldKind::Int { choices } => {
                let mut seen: HashSet<&str> = HashSet::new();
                for choice in choices {
                    if !seen.insert(choice.key.as_str()) {
                        self.error(
                            choice.span,
                            format!("duplicate choice key '{}'", choice.key),
                        );
                    }
                }
            }
            FieldKind::Image { sizes, .. } | FieldKind::FilerImage { sizes, .. } => {
                let mut seen: HashSet<&str> = HashSet::new();
                for size in sizes {
                    if !seen.insert(size.name.as_str()) {
                        self.error(
                            size.span,
                            format!("duplicate image size '{}'", size.name),
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn page(&mut self, page: &Page) {
        let occurrences: Vec<(&'static str, Option<&str>, Span)> = page
            .body
            .annotations
            .iter()
            .filter_map(|ann| match ann {
                PageAnnotation::ErrorNode(_) => None,
                PageAnnotation::Crud(config) => {
                    Some((ann.keyword(), config.descriptor.as_deref(), config.span))
                }
                PageAnnotation::Menu(config) => {
                    Some((ann.keyword(), config.descriptor.as_deref(), config.span))
                }
                _ => Some((ann.keyword(), None, page.name_span)),
            })
            .collect();
        self.check_limits(&occurrences, &PAGE_ANNOTATION_LIMITS);

        for ann in &page.body.annotations {
            match ann {
                PageAnnotation::Crud(config) => {
                    if config.target.is_none() {
                        self.error(
                            config.span,
                            format!("@{} requires a leading #Model target", config.kind.keyword()),
                        );
                    }
                    for (view, _) in &config.overrides {
                        if config.skip.contains(view) {
                            self.warning(
                                config.span,
                                format!(
                                    "'{}' is both skipped and overridden",
                                    view.keyword()
                                ),
                            );
                        }
                    }
                }
                PageAnnotation::Error { status, span, .. } => {
                    if !(100..=599).contains(status) {
                        self.error(*span, format!("invalid HTTP status {}", status));
                    }
                }
                _ => {}
            }
        }
    }

    fn check_limits(
        &mut self,
        occurrences: &[(&'static str, Option<&str>, Span)],
        limits: &HashMap<&'static str, Limit>,
    ) {
        let mut seen: HashMap<(&str, Option<&str>), u32> = HashMap::new();
        for (keyword, descriptor, span) in occurrences {
            let limit = limits.get(keyword).copied().unwrap_or(Limit::Once);
            let key = match limit {
                Limit::DistinctDescriptors => (*keyword, *descriptor),
                Limit::Once => (*keyword, None),
                Limit::Repeatable => continue,
            };
            let count = seen.entry(key).or_insert(0);
            *count += 1;
            if *count == 2 {
                let message = match (limit, descriptor) {
                    (Limit::DistinctDescriptors, Some(descriptor)) => format!(
                        "duplicate '@{}.{}'; descriptors must be distinct",
                        keyword, descriptor
                    ),
                    (Limit::DistinctDescriptors, None) => format!(
                        "duplicate '@{}'; repeat it with distinct descriptors",
                        keyword
                    ),
                    _ => format!("'@{}' may appear only once", keyword),
                };
                self.error(*span, message);
            }
        }
    }

    fn url_segments(&mut self, segments: &[UrlSegment], span: Span) {
        for segment in segments {
            if let UrlSegment::Literal(text) = segment {
                if !URL_LITERAL.is_match(text) {
                    self.error(span, format!("invalid URL segment '{}'", text));
                }
            }
        }
    }
}
