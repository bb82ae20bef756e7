//! Collection inheritance flattening and relation binding.

use std::collections::{HashMap, HashSet};

use super::{walk_bases, Resolver};
use crate::ast::{Field, FieldKind, ModelAnnotation};
use crate::ir::{
    ResolvedAdmin, ResolvedCollection, ResolvedField, ResolvedModelAnnotation, ResolvedRelation,
    ResolvedRest, ResolvedRestInline, SignalKind,
};
use crate::symbols::{CollectionId, Symbol};

impl Resolver<'_, '_> {
    pub(super) fn collections(&mut self) -> Vec<ResolvedCollection> {
        let links = self.base_links();
        let chains = self.chains(&links);

        // First pass: effective field sets. Annotation resolution needs the
        // field sets of forward-referenced collections, so it runs second.
        let mut resolved: Vec<ResolvedCollection> = Vec::new();
        for id in self.table.collection_ids() {
            let collection = self.table.collection(id);
            let chain = &chains[id.0];

            let mut fields: Vec<ResolvedField> = Vec::new();
            // Root-most base first, own fields last; an override replaces the
            // inherited field in place, keeping the base's position.
            for &owner in chain.iter().rev().chain(std::iter::once(&id)) {
                for field in &self.table.collection(owner).fields {
                    let built = self.field(owner, field);
                    match fields.iter_mut().find(|f| f.name == built.name) {
                        Some(slot) => *slot = built,
                        None => fields.push(built),
                    }
                }
            }

            resolved.push(ResolvedCollection {
                id,
                name: collection.name.clone(),
                bases: chain.clone(),
                fields,
                annotations: Vec::new(),
                span: collection.span,
            });
        }

        // Second pass: annotations, with every field set available.
        for id in self.table.collection_ids() {
            let annotations: Vec<ResolvedModelAnnotation> = self
                .table
                .collection(id)
                .annotations
                .clone()
                .into_iter()
                .filter_map(|ann| self.model_annotation(ann, id, &resolved))
                .collect();
            resolved[id.0].annotations = annotations;
        }

        resolved
    }

    /// Base links, keeping only targets that actually name collections.
    fn base_links(&mut self) -> HashMap<CollectionId, CollectionId> {
        let mut links = HashMap::new();
        for id in self.table.collection_ids() {
            let Some(base) = &self.table.collection(id).base else {
                continue;
            };
            match self.table.lookup(&base.name) {
                Some(Symbol::Collection(base_id)) => {
                    links.insert(id, *base_id);
                }
                Some(other) => {
                    let what = match other {
                        Symbol::Page(_) => "a page",
                        Symbol::Imported { .. } => "an imported name",
                        Symbol::Collection(_) => unreachable!(),
                    };
                    self.error(
                        base.span,
                        format!("base '{}' is {}, not a collection", base.name, what),
                    );
                }
                None => {
                    self.error(
                        base.span,
                        format!("unknown base collection '{}'", base.name),
                    );
                }
            }
        }
        links
    }

    /// Inheritance chain per collection, nearest base first, cycles broken
    /// with one error per cycle.
    fn chains(&mut self, links: &HashMap<CollectionId, CollectionId>) -> Vec<Vec<CollectionId>> {
        let mut reported: HashSet<CollectionId> = HashSet::new();
        let mut chains = Vec::with_capacity(self.table.collection_count());

        for id in self.table.collection_ids() {
            let (chain, cycle_at) = walk_bases(id, links);
            if let Some(closer) = cycle_at {
                let mut members: Vec<CollectionId> = vec![id];
                members.extend(chain.iter().copied());
                let start = members.iter().position(|&m| m == closer).unwrap_or(0);
                let cycle = &members[start..];
                if !cycle.iter().any(|m| reported.contains(m)) {
                    reported.extend(cycle.iter().copied());
                    let names: Vec<&str> = cycle
                        .iter()
                        .map(|&m| self.table.collection(m).name.as_str())
                        .collect();
                    let span = self
                        .table
                        .collection(closer)
                        .base
                        .as_ref()
                        .map(|b| b.span)
                        .unwrap_or(self.table.collection(closer).name_span);
                    self.error(
                        span,
                        format!("inheritance cycle: {}", names.join(" -> ")),
                    );
                }
            }
            chains.push(chain);
        }

        chains
    }

    fn field(&mut self, origin: CollectionId, field: &Field) -> ResolvedField {
        let relation = match &field.kind {
            FieldKind::Relation(rel) => Some(ResolvedRelation {
                arity: rel.arity,
                target: self.bind_model_ref(&rel.target),
                cascade_delete: rel.cascade_delete,
                related_name: rel.related_name.clone(),
            }),
            _ => None,
        };
        ResolvedField {
            name: field.name.clone(),
            origin,
            flags: field.flags,
            kind: field.kind.clone(),
            relation,
            verbose_name: field.verbose_name.clone(),
            help_text: field.help_text.clone(),
            extension: field.extension.clone(),
            span: field.span,
        }
    }

    fn model_annotation(
        &mut self,
        ann: ModelAnnotation,
        id: CollectionId,
        resolved: &[ResolvedCollection],
    ) -> Option<ResolvedModelAnnotation> {
        let own_fields = resolved[id.0].fields.clone();
        Some(match ann {
            ModelAnnotation::Admin(config) => {
                let mut admin = ResolvedAdmin::default();
                let expand =
                    |r: &mut Self, expr: &Option<crate::ast::FieldListExpr>| -> Option<Vec<String>> {
                        expr.as_ref().map(|e| r.expand_field_list(e, &own_fields))
                    };
                admin.list = expand(self, &config.list);
                admin.list_editable = expand(self, &config.list_editable);
                admin.list_filter = expand(self, &config.list_filter);
                admin.search = expand(self, &config.search);
                admin.read_only = expand(self, &config.read_only);
                admin.fields = expand(self, &config.fields);
                ResolvedModelAnnotation::Admin(admin)
            }
            ModelAnnotation::Api { descriptor } => ResolvedModelAnnotation::Api { descriptor },
            ModelAnnotation::Rest(config) => {
                let fields = config
                    .fields
                    .as_ref()
                    .map(|e| self.expand_field_list(e, &own_fields));
                let mut inlines = Vec::new();
                for inline in &config.inlines {
                    let target = match own_fields
                        .iter()
                        .find(|f| f.name == inline.field)
                        .and_then(|f| f.relation.as_ref())
                    {
                        Some(rel) => rel.target.clone(),
                        None => {
                            self.error(
                                inline.span,
                                format!("inline '{}' is not a relation field", inline.field),
                            );
                            continue;
                        }
                    };
                    let inline_fields = inline
                        .fields
                        .as_ref()
                        .map(|e| self.expand_against_target(e, &target, resolved));
                    inlines.push(ResolvedRestInline {
                        field: inline.field.clone(),
                        fields: inline_fields,
                        span: inline.span,
                    });
                }
                ResolvedModelAnnotation::Rest(ResolvedRest {
                    descriptor: config.descriptor,
                    fields,
                    auth: config.auth,
                    query: config.query,
                    inlines,
                    span: config.span,
                })
            }
            ModelAnnotation::Order { fields, span } => {
                for name in &fields {
                    let bare = name.strip_prefix('-').unwrap_or(name);
                    if own_fields.iter().all(|f| &f.name != bare) {
                        self.error(
                            span,
                            format!("@order names unknown field '{}'", bare),
                        );
                    }
                }
                ResolvedModelAnnotation::Order { fields, span }
            }
            ModelAnnotation::Tree => ResolvedModelAnnotation::Tree,
            ModelAnnotation::Mixin { path, span } => {
                ResolvedModelAnnotation::Mixin { path, span }
            }
            ModelAnnotation::DateTree { field, span } => {
                ResolvedModelAnnotation::DateTree { field, span }
            }
            ModelAnnotation::Sortable { field, span } => {
                ResolvedModelAnnotation::Sortable { field, span }
            }
            ModelAnnotation::Clean(body) => signal(SignalKind::Clean, body),
            ModelAnnotation::PreSave(body) => signal(SignalKind::PreSave, body),
            ModelAnnotation::PostSave(body) => signal(SignalKind::PostSave, body),
            ModelAnnotation::PreDelete(body) => signal(SignalKind::PreDelete, body),
            ModelAnnotation::PostDelete(body) => signal(SignalKind::PostDelete, body),
            ModelAnnotation::M2mChanged(body) => signal(SignalKind::M2mChanged, body),
            // Already diagnosed by the AST builder.
            ModelAnnotation::Error(_) => return None,
        })
    }
}

fn signal(kind: SignalKind, body: crate::ast::RawBlock) -> ResolvedModelAnnotation {
    ResolvedModelAnnotation::Signal { kind, body }
}
