//! Page inheritance, URL composition, and page annotation binding.

use std::collections::{HashMap, HashSet};

use super::{walk_bases, Resolver};
use crate::ast::{
    CrudConfig, MenuTarget, PageAnnotation, PageBody, UrlSegment, UrlSpec,
};
use crate::diagnostics::Span;
use crate::ir::{
    RefTarget, ResolvedCollection, ResolvedCrud, ResolvedMenu, ResolvedMenuItem,
    ResolvedMenuTarget, ResolvedNextRules, ResolvedPage, ResolvedPageAnnotation,
    ResolvedPageBody, ResolvedUrl,
};
use crate::symbols::{PageId, Symbol};

impl Resolver<'_, '_> {
    pub(super) fn pages(&mut self, collections: &[ResolvedCollection]) -> Vec<ResolvedPage> {
        let links = self.page_links();

        // Memoized per page; base pages may be declared after their children.
        let mut bodies: Vec<Option<ResolvedPageBody>> = vec![None; self.table.page_count()];
        let mut urls: Vec<Option<Option<ResolvedUrl>>> = vec![None; self.table.page_count()];

        let mut resolved = Vec::with_capacity(self.table.page_count());
        for id in self.table.page_ids() {
            let body = self.page_body(id, &links, collections, &mut bodies);
            let url = self.page_url(id, &links, &mut urls);
            let page = self.table.page(id);
            resolved.push(ResolvedPage {
                id,
                name: page.name.clone(),
                alias: page.alias.clone(),
                base: links.get(&id).copied(),
                url,
                body,
                span: page.span,
            });
        }
        resolved
    }

    /// Base links between pages, with cycle breaking. Cycles are rarer here
    /// than in collections but follow the same rule: one error per cycle,
    /// the offending link dropped.
    fn page_links(&mut self) -> HashMap<PageId, PageId> {
        let mut links = HashMap::new();
        for id in self.table.page_ids() {
            let Some(base) = &self.table.page(id).base else {
                continue;
            };
            match self.table.lookup(&base.name) {
                Some(Symbol::Page(base_id)) => {
                    links.insert(id, *base_id);
                }
                Some(_) => {
                    self.error(
                        base.span,
                        format!("base '{}' is not a page", base.name),
                    );
                }
                None => {
                    self.error(base.span, format!("unknown base page '{}'", base.name));
                }
            }
        }

        let mut reported: HashSet<PageId> = HashSet::new();
        let mut broken: Vec<PageId> = Vec::new();
        for id in self.table.page_ids() {
            let (chain, cycle_at) = walk_bases(id, &links);
            let Some(closer) = cycle_at else { continue };
            let mut members = vec![id];
            members.extend(chain.iter().copied());
            let start = members.iter().position(|&m| m == closer).unwrap_or(0);
            let cycle = &members[start..];
            if !cycle.iter().any(|m| reported.contains(m)) {
                reported.extend(cycle.iter().copied());
                let names: Vec<&str> = cycle
                    .iter()
                    .map(|&m| self.table.page(m).name.as_str())
                    .collect();
                let span = self
                    .table
                    .page(closer)
                    .base
                    .as_ref()
                    .map(|b| b.span)
                    .unwrap_or(self.table.page(closer).name_span);
                self.error(span, format!("page inheritance cycle: {}", names.join(" -> ")));
                broken.push(closer);
            }
        }
        for id in broken {
            links.remove(&id);
        }
        links
    }

    fn page_body(
        &mut self,
        id: PageId,
        links: &HashMap<PageId, PageId>,
        collections: &[ResolvedCollection],
        memo: &mut Vec<Option<ResolvedPageBody>>,
    ) -> ResolvedPageBody {
        if let Some(body) = &memo[id.0] {
            return body.clone();
        }
        let own = self.body(&self.table.page(id).body, collections);
        let merged = match links.get(&id) {
            Some(&base_id) => {
                let base = self.page_body(base_id, links, collections, memo);
                merge_bodies(base, own)
            }
            None => own,
        };
        memo[id.0] = Some(merged.clone());
        merged
    }

    fn page_url(
        &mut self,
        id: PageId,
        links: &HashMap<PageId, PageId>,
        memo: &mut Vec<Option<Option<ResolvedUrl>>>,
    ) -> Option<ResolvedUrl> {
        if let Some(url) = &memo[id.0] {
            return url.clone();
        }
        let page = self.table.page(id);
        let url = match &page.url {
            None => {
                // URL-less pages still pass an inherited URL through to
                // their children.
                match links.get(&id) {
                    Some(&base_id) => self.page_url(base_id, links, memo),
                    None => None,
                }
            }
            Some(spec) => Some(self.compose_url(id, spec, links, memo)),
        };
        memo[id.0] = Some(url.clone());
        url
    }

    fn compose_url(
        &mut self,
        id: PageId,
        spec: &UrlSpec,
        links: &HashMap<PageId, PageId>,
        memo: &mut Vec<Option<Option<ResolvedUrl>>>,
    ) -> ResolvedUrl {
        let mut segments: Vec<UrlSegment> = Vec::new();
        if spec.relative {
            match links.get(&id).copied() {
                Some(base_id) => {
                    if let Some(base_url) = self.page_url(base_id, links, memo) {
                        segments.extend(base_url.segments.iter().cloned());
                    } else {
                        self.warning(
                            spec.span,
                            "relative URL but the base page declares no URL",
                        );
                    }
                }
                None => {
                    self.error(spec.span, "relative URL requires a base page");
                }
            }
        }
        segments.extend(spec.segments.iter().cloned());

        let params = self.check_params(&segments, spec.span);
        ResolvedUrl {
            full: render_url(&segments),
            segments,
            params,
            span: spec.span,
        }
    }

    /// Parameter names in order, with duplicates (own or inherited) reported.
    fn check_params(&mut self, segments: &[UrlSegment], span: Span) -> Vec<String> {
        let mut params: Vec<String> = Vec::new();
        for segment in segments {
            if let UrlSegment::Param(name) = segment {
                if params.contains(name) {
                    self.error(span, format!("duplicate URL parameter '<{}>'", name));
                } else {
                    params.push(name.clone());
                }
            }
        }
        params
    }

    fn body(&mut self, body: &PageBody, collections: &[ResolvedCollection]) -> ResolvedPageBody {
        let mut out = ResolvedPageBody {
            template: body.template.clone(),
            fields: body.fields.clone(),
            functions: body.functions.clone(),
            annotations: Vec::new(),
        };
        for ann in &body.annotations {
            if let Some(resolved) = self.page_annotation(ann, collections) {
                out.annotations.push(resolved);
            }
        }
        out
    }

    fn page_annotation(
        &mut self,
        ann: &PageAnnotation,
        collections: &[ResolvedCollection],
    ) -> Option<ResolvedPageAnnotation> {
        Some(match ann {
            PageAnnotation::Stream(config) => {
                let targets = config
                    .models
                    .iter()
                    .map(|m| self.bind_model_ref(m))
                    .collect();
                ResolvedPageAnnotation::Stream {
                    targets,
                    span: config.span,
                }
            }
            PageAnnotation::React(body) => ResolvedPageAnnotation::React(body.clone()),
            PageAnnotation::Html(body) => ResolvedPageAnnotation::Html(body.clone()),
            PageAnnotation::Markdown(body) => ResolvedPageAnnotation::Markdown(body.clone()),
            PageAnnotation::Get(body) => ResolvedPageAnnotation::Get(body.clone()),
            PageAnnotation::Post(body) => ResolvedPageAnnotation::Post(body.clone()),
            PageAnnotation::Error { status, body, span } => ResolvedPageAnnotation::Error {
                status: *status,
                body: body.clone(),
                span: *span,
            },
            PageAnnotation::Auth { descriptor } => ResolvedPageAnnotation::Auth {
                descriptor: descriptor.clone(),
            },
            PageAnnotation::Priority => ResolvedPageAnnotation::Priority,
            PageAnnotation::Menu(config) => {
                let mut items = Vec::new();
                for item in &config.items {
                    let target = match &item.target {
                        MenuTarget::Url(url) => ResolvedMenuTarget::Url(url.clone()),
                        MenuTarget::Page(name) => match self.table.page_named(name) {
                            Some(page_id) => ResolvedMenuTarget::Page(page_id),
                            None => {
                                self.error(
                                    item.span,
                                    format!("menu entry targets unknown page '{}'", name),
                                );
                                ResolvedMenuTarget::Unresolved {
                                    raw: name.clone(),
                                    span: item.span,
                                }
                            }
                        },
                    };
                    items.push(ResolvedMenuItem {
                        label: item.label.clone(),
                        target,
                        span: item.span,
                    });
                }
                ResolvedPageAnnotation::Menu(ResolvedMenu {
                    descriptor: config.descriptor.clone(),
                    items,
                    span: config.span,
                })
            }
            PageAnnotation::Crud(config) => {
                ResolvedPageAnnotation::Crud(self.crud(config, collections))
            }
            // Already diagnosed by the AST builder.
            PageAnnotation::ErrorNode(_) => return None,
        })
    }

    fn crud(&mut self, config: &CrudConfig, collections: &[ResolvedCollection]) -> ResolvedCrud {
        let target = match &config.target {
            Some(model_ref) => self.bind_model_ref(model_ref),
            // Missing targets are the validator's diagnostic; the IR still
            // carries the slot so generators see a uniform shape.
            None => RefTarget::Unresolved {
                raw: String::new(),
                span: config.span,
            },
        };
        let target_field = config.target.as_ref().and_then(|m| match &m.syntax {
            crate::ast::RefSyntax::Anchored { field, .. } => field.clone(),
            crate::ast::RefSyntax::Path(_) => None,
        });

        let fields = config
            .fields
            .as_ref()
            .map(|e| self.expand_against_target(e, &target, collections));
        let list_fields = config
            .list_fields
            .as_ref()
            .map(|e| self.expand_against_target(e, &target, collections));

        let overrides = config
            .overrides
            .iter()
            .map(|(view, body)| (*view, self.body(body, collections)))
            .collect();

        ResolvedCrud {
            kind: config.kind,
            descriptor: config.descriptor.clone(),
            target,
            target_field,
            filter: config.filter.clone(),
            fields,
            list_fields,
            url_prefix: config.url_prefix.clone(),
            link_suffix: config.link_suffix.clone(),
            item_name: config.item_name.clone(),
            object_expr: config.object_expr.clone(),
            can_edit: config.can_edit.clone(),
            block: config.block.clone(),
            pk_param: config.pk_param.clone(),
            skip: config.skip.clone(),
            list_type: config.list_type.clone(),
            header: config.header,
            next: ResolvedNextRules {
                all: config.next.all.clone(),
                create: config.next.create.clone(),
                edit: config.next.edit.clone(),
                delete: config.next.delete.clone(),
            },
            overrides,
            span: config.span,
        }
    }
}

/// Canonical `/a/b/<c>/` rendering; the root URL is `/`.
fn render_url(segments: &[UrlSegment]) -> String {
    if segments.is_empty() {
        return "/".to_string();
    }
    let mut out = String::new();
    for segment in segments {
        out.push('/');
        match segment {
            UrlSegment::Literal(text) => out.push_str(text),
            UrlSegment::Param(name) => {
                out.push('<');
                out.push_str(name);
                out.push('>');
            }
        }
    }
    out.push('/');
    out
}

/// Child-wins merge of a base page body into a derived one. Base members
/// keep their positions; overriding members replace them in place.
fn merge_bodies(base: ResolvedPageBody, child: ResolvedPageBody) -> ResolvedPageBody {
    let mut merged = base;

    if child.template.is_some() {
        merged.template = child.template;
    }

    for field in child.fields {
        match merged.fields.iter_mut().find(|f| f.name == field.name) {
            Some(slot) => *slot = field,
            None => merged.fields.push(field),
        }
    }

    for function in child.functions {
        match merged
            .functions
            .iter_mut()
            .find(|f| f.name == function.name)
        {
            Some(slot) => *slot = function,
            None => merged.functions.push(function),
        }
    }

    for annotation in child.annotations {
        let key = annotation_key(&annotation);
        match merged
            .annotations
            .iter_mut()
            .find(|a| annotation_key(a) == key)
        {
            Some(slot) => *slot = annotation,
            None => merged.annotations.push(annotation),
        }
    }

    merged
}

/// Identity under which a child annotation overrides a base one. Crud and
/// menu annotations are keyed per kind and descriptor, so `@crud_list.a`
/// and `@crud_list.b` coexist.
fn annotation_key(ann: &ResolvedPageAnnotation) -> String {
    match ann {
        ResolvedPageAnnotation::Stream { .. } => "stream".to_string(),
        ResolvedPageAnnotation::React(_) => "react".to_string(),
        ResolvedPageAnnotation::Html(_) => "html".to_string(),
        ResolvedPageAnnotation::Markdown(_) => "markdown".to_string(),
        ResolvedPageAnnotation::Get(_) => "get".to_string(),
        ResolvedPageAnnotation::Post(_) => "post".to_string(),
        ResolvedPageAnnotation::Error { status, .. } => format!("error:{}", status),
        ResolvedPageAnnotation::Auth { .. } => "auth".to_string(),
        ResolvedPageAnnotation::Priority => "priority".to_string(),
        ResolvedPageAnnotation::Menu(menu) => {
            format!("menu:{}", menu.descriptor.as_deref().unwrap_or(""))
        }
        ResolvedPageAnnotation::Crud(crud) => format!(
            "crud:{}:{}",
            crud.kind.keyword(),
            crud.descriptor.as_deref().unwrap_or("")
        ),
    }
}
