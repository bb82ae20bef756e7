//! Model and page annotation payloads.
//!
//! Each annotation name maps onto one variant of the closed
//! `ModelAnnotation` / `PageAnnotation` sets; malformed payloads become
//! explicit error nodes so the slot is never silently dropped.

use super::Builder;
use crate::ast::model::{AdminConfig, ModelAnnotation, RestAuth, RestConfig, RestInline};
use crate::ast::page::{
    CrudConfig, CrudKind, MenuConfig, MenuItem, MenuTarget, NextAction, PageAnnotation,
    StreamConfig, SubView,
};
use crate::ast::{ErrorNode, RawBlock, RawTag};
use crate::cst::{CstAnnBody, CstAnnotation, CstEntry, CstKey, CstKeyValue, CstValueItem};

impl<'a> Builder<'a> {
    pub(super) fn model_annotation(&mut self, ann: CstAnnotation) -> ModelAnnotation {
        match ann.name.as_str() {
            "admin" => self.admin(&ann),
            "api" => {
                let descriptor = self.descriptor_of(&ann);
                ModelAnnotation::Api { descriptor }
            }
            "rest" => self.rest(&ann),
            "order" => {
                let fields = self.name_args(&ann);
                if fields.is_empty() {
                    return ModelAnnotation::Error(
                        self.annotation_error(&ann, "@order requires field names"),
                    );
                }
                ModelAnnotation::Order {
                    fields,
                    span: ann.span,
                }
            }
            "tree" => {
                self.expect_bare(&ann);
                ModelAnnotation::Tree
            }
            "date_tree" => match self.single_name_arg(&ann) {
                Some(field) => ModelAnnotation::DateTree {
                    field,
                    span: ann.span,
                },
                None => ModelAnnotation::Error(
                    self.annotation_error(&ann, "@date_tree requires a date field"),
                ),
            },
            "mixin" => match self.path_arg(&ann) {
                Some(path) => ModelAnnotation::Mixin {
                    path,
                    span: ann.span,
                },
                None => ModelAnnotation::Error(
                    self.annotation_error(&ann, "@mixin requires a class path"),
                ),
            },
            "sortable" => match self.single_name_arg(&ann) {
                Some(field) => ModelAnnotation::Sortable {
                    field,
                    span: ann.span,
                },
                None => ModelAnnotation::Error(
                    self.annotation_error(&ann, "@sortable requires an order field"),
                ),
            },
            "clean" => self.signal(&ann, ModelAnnotation::Clean),
            "pre_delete" => self.signal(&ann, ModelAnnotation::PreDelete),
            "post_delete" => self.signal(&ann, ModelAnnotation::PostDelete),
            "pre_save" => self.signal(&ann, ModelAnnotation::PreSave),
            "post_save" => self.signal(&ann, ModelAnnotation::PostSave),
            "m2m_changed" => self.signal(&ann, ModelAnnotation::M2mChanged),
            other => ModelAnnotation::Error(self.annotation_error(
                &ann,
                format!("'@{}' is not a collection annotation", other),
            )),
        }
    }

    fn signal(
        &mut self,
        ann: &CstAnnotation,
        make: fn(RawBlock) -> ModelAnnotation,
    ) -> ModelAnnotation {
        match &ann.body {
            Some(CstAnnBody::Raw(raw)) => make(self.raw_block(raw, RawTag::SignalBody)),
            _ => ModelAnnotation::Error(self.annotation_error(
                ann,
                format!("'@{}' requires a {{ ... }} code body", ann.name),
            )),
        }
    }

    fn admin(&mut self, ann: &CstAnnotation) -> ModelAnnotation {
        let mut config = AdminConfig::default();
        for kv in self.structured_entries(ann) {
            let Some(key) = kv.key.as_name().map(str::to_string) else {
                self.error(kv.key_span, "expected a named entry");
                continue;
            };
            let slot = match key.as_str() {
                "list" => &mut config.list,
                "list_editable" => &mut config.list_editable,
                "list_filter" => &mut config.list_filter,
                "search" => &mut config.search,
                "read_only" => &mut config.read_only,
                "fields" => &mut config.fields,
                other => {
                    self.error(
                        kv.key_span,
                        format!("unknown @admin entry '{}'", other),
                    );
                    continue;
                }
            };
            if slot.is_some() {
                self.error(kv.key_span, format!("duplicate @admin entry '{}'", key));
                continue;
            }
            *slot = self.field_list(&kv);
        }
        ModelAnnotation::Admin(config)
    }

    fn rest(&mut self, ann: &CstAnnotation) -> ModelAnnotation {
        let mut config = RestConfig {
            descriptor: ann.descriptor.clone(),
            fields: None,
            auth: Vec::new(),
            query: None,
            inlines: Vec::new(),
            span: ann.span,
        };
        for kv in self.structured_entries(ann) {
            let Some(key) = kv.key.as_name().map(str::to_string) else {
                self.error(kv.key_span, "expected a named entry");
                continue;
            };
            match key.as_str() {
                "fields" => {
                    config.fields = self.field_list(&kv);
                }
                "auth" => {
                    for item in &kv.items {
                        match item {
                            CstValueItem::Pair(mode, method, span) => {
                                config.auth.push(RestAuth {
                                    mode: mode.clone(),
                                    method: method.clone(),
                                    span: *span,
                                });
                            }
                            other => self.error(
                                other.span(),
                                "auth entries are `<mode> <method>` pairs",
                            ),
                        }
                    }
                }
                "query" => match self.single_item(&kv, "query") {
                    Some(CstValueItem::Code(raw)) => {
                        let raw = raw.clone();
                        config.query = Some(self.raw_block(&raw, RawTag::RestQuery));
                    }
                    Some(other) => {
                        self.error(other.span(), "query must be `= <code>`");
                    }
                    None => {}
                },
                "inline" => {
                    for item in &kv.items {
                        match item {
                            CstValueItem::Call { name, entries, span } => {
                                let fields = self.call_field_list(entries);
                                config.inlines.push(RestInline {
                                    field: name.clone(),
                                    fields,
                                    span: *span,
                                });
                            }
                            other => self.error(
                                other.span(),
                                "inline entries are `relation(fields: ...)`",
                            ),
                        }
                    }
                }
                other => {
                    self.error(kv.key_span, format!("unknown @rest entry '{}'", other));
                }
            }
        }
        ModelAnnotation::Rest(config)
    }

    /// `fields:` inside an `inline: name(...)` call.
    fn call_field_list(&mut self, entries: &[CstEntry]) -> Option<crate::ast::FieldListExpr> {
        for entry in entries {
            match entry {
                CstEntry::KeyValue(kv) if kv.key.as_name() == Some("fields") => {
                    return self.field_list(kv);
                }
                CstEntry::KeyValue(kv) => {
                    self.error(kv.key_span, "only 'fields' is valid here");
                }
                CstEntry::Target(target) => {
                    self.error(target.span, "unexpected model reference");
                }
                CstEntry::Error(_) => {}
            }
        }
        None
    }

    pub(super) fn page_annotation(
        &mut self,
        ann: CstAnnotation,
        errors: &mut Vec<ErrorNode>,
    ) -> PageAnnotation {
        match ann.name.as_str() {
            "stream" => {
                let mut models = Vec::new();
                for entry in self.structured(&ann) {
                    match entry {
                        CstEntry::Target(target) => {
                            if let Some(model_ref) = self.model_ref(&target) {
                                models.push(model_ref);
                            }
                        }
                        CstEntry::KeyValue(kv) => {
                            self.error(kv.key_span, "@stream takes model references");
                        }
                        CstEntry::Error(_) => {}
                    }
                }
                if models.is_empty() {
                    return PageAnnotation::ErrorNode(
                        self.annotation_error(&ann, "@stream requires at least one model"),
                    );
                }
                PageAnnotation::Stream(StreamConfig {
                    models,
                    span: ann.span,
                })
            }
            "react" => self.handler(&ann, RawTag::ReactBody, PageAnnotation::React),
            "html" => self.handler(&ann, RawTag::HtmlBody, PageAnnotation::Html),
            "markdown" => self.handler(&ann, RawTag::MarkdownBody, PageAnnotation::Markdown),
            "get" => self.handler(&ann, RawTag::HandlerBody, PageAnnotation::Get),
            "post" => self.handler(&ann, RawTag::HandlerBody, PageAnnotation::Post),
            "error" => {
                let status = match ann.args.as_slice() {
                    [CstValueItem::Int(status, _)] => *status,
                    _ => {
                        return PageAnnotation::ErrorNode(self.annotation_error(
                            &ann,
                            "@error requires a status code argument",
                        ));
                    }
                };
                let Some(CstAnnBody::Raw(raw)) = &ann.body else {
                    return PageAnnotation::ErrorNode(
                        self.annotation_error(&ann, "@error requires a { ... } code body"),
                    );
                };
                let raw = raw.clone();
                let body = self.raw_block(&raw, RawTag::HandlerBody);
                PageAnnotation::Error {
                    status: status.clamp(0, u16::MAX as i64) as u16,
                    body,
                    span: ann.span,
                }
            }
            "auth" => {
                let descriptor = self.descriptor_of(&ann);
                PageAnnotation::Auth { descriptor }
            }
            "priority" => {
                self.expect_bare(&ann);
                PageAnnotation::Priority
            }
            "menu" => self.menu(&ann),
            "crud" => self.crud(&ann, CrudKind::All, errors),
            "crud_create" => self.crud(&ann, CrudKind::Create, errors),
            "crud_edit" => self.crud(&ann, CrudKind::Edit, errors),
            "crud_delete" => self.crud(&ann, CrudKind::Delete, errors),
            "crud_list" => self.crud(&ann, CrudKind::List, errors),
            "crud_detail" => self.crud(&ann, CrudKind::Detail, errors),
            other => PageAnnotation::ErrorNode(self.annotation_error(
                &ann,
                format!("'@{}' is not a page annotation", other),
            )),
        }
    }

    fn handler(
        &mut self,
        ann: &CstAnnotation,
        tag: RawTag,
        make: fn(RawBlock) -> PageAnnotation,
    ) -> PageAnnotation {
        match &ann.body {
            Some(CstAnnBody::Raw(raw)) => {
                let raw = raw.clone();
                make(self.raw_block(&raw, tag))
            }
            _ => PageAnnotation::ErrorNode(self.annotation_error(
                ann,
                format!("'@{}' requires a {{ ... }} body", ann.name),
            )),
        }
    }

    fn menu(&mut self, ann: &CstAnnotation) -> PageAnnotation {
        let mut items = Vec::new();
        for kv in self.structured_entries(ann) {
            let CstKey::Label(label) = &kv.key else {
                self.error(kv.key_span, "menu entries use a quoted label as key");
                continue;
            };
            let target = match self.single_item(&kv, "menu entry") {
                Some(CstValueItem::Name {
                    name, glob: false, ..
                }) => MenuTarget::Page(name.clone()),
                Some(CstValueItem::Str(url, _)) => MenuTarget::Url(url.clone()),
                Some(other) => {
                    self.error(other.span(), "expected a page name or a quoted URL");
                    continue;
                }
                None => continue,
            };
            items.push(MenuItem {
                label: label.clone(),
                target,
                span: kv.key_span,
            });
        }
        if items.is_empty() {
            return PageAnnotation::ErrorNode(
                self.annotation_error(ann, "@menu requires at least one entry"),
            );
        }
        PageAnnotation::Menu(MenuConfig {
            descriptor: ann.descriptor.clone(),
            items,
            span: ann.span,
        })
    }

    fn crud(
        &mut self,
        ann: &CstAnnotation,
        kind: CrudKind,
        errors: &mut Vec<ErrorNode>,
    ) -> PageAnnotation {
        let mut config = CrudConfig::new(kind, ann.span);
        config.descriptor = ann.descriptor.clone();

        for entry in self.structured(ann) {
            match entry {
                CstEntry::Target(target) => {
                    if config.target.is_some() {
                        self.error(target.span, "duplicate crud target");
                        continue;
                    }
                    config.target = self.model_ref(&target);
                }
                CstEntry::KeyValue(kv) => self.crud_entry(&mut config, kv, errors),
                CstEntry::Error(_) => {}
            }
        }

        PageAnnotation::Crud(config)
    }

    fn crud_entry(
        &mut self,
        config: &mut CrudConfig,
        kv: CstKeyValue,
        errors: &mut Vec<ErrorNode>,
    ) {
        let Some(key) = kv.key.as_name().map(str::to_string) else {
            self.error(kv.key_span, "expected a named entry");
            return;
        };

        // Sub-view override block?
        if let Some(view) = SubView::from_name(&key) {
            match kv.items.into_iter().next() {
                Some(CstValueItem::Block(lines, _)) => {
                    if config.overrides.iter().any(|(v, _)| *v == view) {
                        self.error(kv.key_span, format!("duplicate '{}' override", key));
                        return;
                    }
                    let body = self.page_body(lines, errors);
                    config.overrides.push((view, body));
                }
                _ => {
                    self.error(kv.key_span, "sub-view override expects a { ... } block");
                }
            }
            return;
        }

        match key.as_str() {
            "filter" => self.crud_code(&kv, RawTag::CrudFilter, &mut config.filter),
            "object_expr" => self.crud_code(&kv, RawTag::CrudObjectExpr, &mut config.object_expr),
            "can_edit" => self.crud_code(&kv, RawTag::CrudCanEdit, &mut config.can_edit),
            "fields" => config.fields = self.field_list(&kv),
            "list_fields" => config.list_fields = self.field_list(&kv),
            "url_prefix" => self.crud_str(&kv, &mut config.url_prefix),
            "link_suffix" => self.crud_str(&kv, &mut config.link_suffix),
            "item_name" => self.crud_name(&kv, &mut config.item_name),
            "block" => self.crud_name(&kv, &mut config.block),
            "pk_param" => self.crud_name(&kv, &mut config.pk_param),
            "list_type" => self.crud_name(&kv, &mut config.list_type),
            "header" => match self.single_item(&kv, "header") {
                Some(CstValueItem::Bool(value, _)) => config.header = Some(*value),
                Some(other) => self.error(other.span(), "header is true or false"),
                None => {}
            },
            "skip" => {
                for item in &kv.items {
                    match item {
                        CstValueItem::Name {
                            name, glob: false, span,
                        } => match SubView::from_name(name) {
                            Some(view) if !config.skip.contains(&view) => {
                                config.skip.push(view);
                            }
                            Some(_) => {
                                self.warning(*span, format!("'{}' skipped twice", name));
                            }
                            None => {
                                self.error(*span, format!("unknown sub-view '{}'", name));
                            }
                        },
                        other => self.error(other.span(), "skip takes sub-view names"),
                    }
                }
            }
            "next" => self.crud_next(&kv, |c| &mut c.next.all, config),
            "next_create" => self.crud_next(&kv, |c| &mut c.next.create, config),
            "next_edit" => self.crud_next(&kv, |c| &mut c.next.edit, config),
            "next_delete" => self.crud_next(&kv, |c| &mut c.next.delete, config),
            other => {
                self.error(kv.key_span, format!("unknown crud entry '{}'", other));
            }
        }
    }

    fn crud_code(&mut self, kv: &CstKeyValue, tag: RawTag, slot: &mut Option<RawBlock>) {
        if slot.is_some() {
            self.error(kv.key_span, "duplicate entry");
            return;
        }
        match self.single_item(kv, "this entry") {
            Some(CstValueItem::Code(raw)) => {
                let raw = raw.clone();
                *slot = Some(self.raw_block(&raw, tag));
            }
            Some(other) => self.error(other.span(), "expected `= <code>`"),
            None => {}
        }
    }

    fn crud_str(&mut self, kv: &CstKeyValue, slot: &mut Option<String>) {
        if slot.is_some() {
            self.error(kv.key_span, "duplicate entry");
            return;
        }
        match self.single_item(kv, "this entry") {
            Some(CstValueItem::Str(text, _)) => *slot = Some(text.clone()),
            Some(other) => self.error(other.span(), "expected a quoted string"),
            None => {}
        }
    }

    fn crud_name(&mut self, kv: &CstKeyValue, slot: &mut Option<String>) {
        if slot.is_some() {
            self.error(kv.key_span, "duplicate entry");
            return;
        }
        match self.single_item(kv, "this entry") {
            Some(CstValueItem::Name {
                name, glob: false, ..
            }) => *slot = Some(name.clone()),
            Some(other) => self.error(other.span(), "expected a name"),
            None => {}
        }
    }

    fn crud_next(
        &mut self,
        kv: &CstKeyValue,
        slot: fn(&mut CrudConfig) -> &mut Option<NextAction>,
        config: &mut CrudConfig,
    ) {
        if slot(config).is_some() {
            self.error(kv.key_span, "duplicate entry");
            return;
        }
        let action = match self.single_item(kv, "this entry") {
            Some(CstValueItem::Code(raw)) => {
                let raw = raw.clone();
                Some(NextAction::Code(self.raw_block(&raw, RawTag::CrudNext)))
            }
            Some(CstValueItem::Str(url, span)) => {
                if url.is_empty() {
                    self.error(*span, "next URL must not be empty");
                    None
                } else {
                    Some(NextAction::Url(url.clone()))
                }
            }
            Some(other) => {
                self.error(other.span(), "expected `= <code>` or a quoted URL");
                None
            }
            None => None,
        };
        *slot(config) = action;
    }

    // ------------------------------------------------------------------
    // Shared shape helpers
    // ------------------------------------------------------------------

    /// Entries of a structured body; reports raw bodies and missing bodies.
    fn structured(&mut self, ann: &CstAnnotation) -> Vec<CstEntry> {
        match &ann.body {
            Some(CstAnnBody::Entries(entries)) => entries.clone(),
            Some(CstAnnBody::Raw(raw)) => {
                self.error(
                    raw.span,
                    format!("'@{}' takes a structured body, not raw code", ann.name),
                );
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// Like [`Self::structured`] but pre-filtered to key/value entries.
    fn structured_entries(&mut self, ann: &CstAnnotation) -> Vec<CstKeyValue> {
        let mut out = Vec::new();
        for entry in self.structured(ann) {
            match entry {
                CstEntry::KeyValue(kv) => out.push(kv),
                CstEntry::Target(target) => {
                    self.error(
                        target.span,
                        format!("'@{}' does not take a model reference", ann.name),
                    );
                }
                CstEntry::Error(_) => {}
            }
        }
        out
    }

    fn expect_bare(&mut self, ann: &CstAnnotation) {
        if ann.body.is_some() || !ann.args.is_empty() {
            self.warning(
                ann.span,
                format!("'@{}' takes no payload; payload ignored", ann.name),
            );
        }
    }

    /// Descriptor from `@name.desc` or a single string argument.
    fn descriptor_of(&mut self, ann: &CstAnnotation) -> Option<String> {
        if let Some(descriptor) = &ann.descriptor {
            return Some(descriptor.clone());
        }
        match ann.args.as_slice() {
            [] => None,
            [CstValueItem::Str(text, _)] => Some(text.clone()),
            [CstValueItem::Name {
                name, glob: false, ..
            }] => Some(name.clone()),
            _ => {
                self.error(ann.span, "expected a single descriptor");
                None
            }
        }
    }

    /// Field names for `@order`; `-name` marks descending order.
    fn name_args(&mut self, ann: &CstAnnotation) -> Vec<String> {
        let mut out = Vec::new();
        for arg in &ann.args {
            match arg {
                CstValueItem::Name {
                    name, glob: false, ..
                } => out.push(name.clone()),
                CstValueItem::Exclude(name, _) => out.push(format!("-{}", name)),
                other => self.error(other.span(), "expected a field name"),
            }
        }
        out
    }

    fn single_name_arg(&mut self, ann: &CstAnnotation) -> Option<String> {
        match ann.args.as_slice() {
            [CstValueItem::Name {
                name, glob: false, ..
            }] => Some(name.clone()),
            _ => None,
        }
    }

    fn path_arg(&mut self, ann: &CstAnnotation) -> Option<String> {
        match ann.args.as_slice() {
            [CstValueItem::Path(parts, _)] => Some(parts.join(".")),
            [CstValueItem::Name {
                name, glob: false, ..
            }] => Some(name.clone()),
            _ => None,
        }
    }
}
