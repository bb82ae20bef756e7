//! Reference resolution: AST + symbol table → resolved IR.
//!
//! Runs in a fixed order so every pass sees finished output from the one
//! before it: collection inheritance is flattened first, then relation
//! targets are bound, then field-list expressions expand against effective
//! field sets, then page inheritance and URL composition. The pass never
//! aborts on an unresolved reference; it records a diagnostic and an
//! [`RefTarget::Unresolved`] marker and keeps going, so one bad reference
//! cannot hide errors elsewhere in the project.
//!
//! Resolution is deterministic (declaration order in, declaration order out)
//! and idempotent: the IR contains no unresolved names that a second run
//! could bind differently.

mod collections;
mod pages;

use std::collections::HashMap;

use crate::ast::{FieldListEntryKind, FieldListExpr, ModelRef, RefSyntax};
use crate::diagnostics::{Diagnostic, Span, Stage};
use crate::ir::{RefTarget, ResolvedCollection, ResolvedDocument, ResolvedField};
use crate::symbols::{Symbol, SymbolTable};

/// Resolves the whole project against its symbol table.
pub fn resolve(table: &SymbolTable<'_>) -> (ResolvedDocument, Vec<Diagnostic>) {
    let mut resolver = Resolver {
        table,
        diags: Vec::new(),
    };
    let collections = resolver.collections();
    let pages = resolver.pages(&collections);
    (ResolvedDocument { collections, pages }, resolver.diags)
}

struct Resolver<'a, 'b> {
    table: &'a SymbolTable<'b>,
    diags: Vec<Diagnostic>,
}

impl Resolver<'_, '_> {
    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::error(Stage::Resolver, span, message));
    }

    fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::warning(Stage::Resolver, span, message));
    }

    /// Binds a model reference. Anchored references must name a collection;
    /// dotted class paths fall back to external without complaint unless the
    /// leading segment is a known symbol.
    fn bind_model_ref(&mut self, model_ref: &ModelRef) -> RefTarget {
        let name = model_ref.lookup_name();
        match (self.table.lookup(name), &model_ref.syntax) {
            (Some(Symbol::Collection(id)), _) => RefTarget::Collection(*id),
            (Some(Symbol::Imported { module, name }), RefSyntax::Anchored { .. }) => {
                RefTarget::External {
                    path: format!("{}.{}", module, name),
                }
            }
            (_, RefSyntax::Anchored { .. }) => {
                self.error(
                    model_ref.span,
                    format!("unresolved reference '{}'", model_ref.display_name()),
                );
                RefTarget::Unresolved {
                    raw: model_ref.display_name(),
                    span: model_ref.span,
                }
            }
            (Some(Symbol::Imported { module, name }), RefSyntax::Path(path)) => {
                let rest = path.split_once('.').map(|(_, r)| r);
                RefTarget::External {
                    path: match rest {
                        Some(rest) => format!("{}.{}.{}", module, name, rest),
                        None => format!("{}.{}", module, name),
                    },
                }
            }
            (Some(Symbol::Page(_)), RefSyntax::Path(path)) => {
                self.error(
                    model_ref.span,
                    format!("'{}' refers to a page, not a collection", path),
                );
                RefTarget::Unresolved {
                    raw: path.clone(),
                    span: model_ref.span,
                }
            }
            (None, RefSyntax::Path(path)) => RefTarget::External { path: path.clone() },
        }
    }

    /// Expands a field-list expression against a concrete field set.
    ///
    /// Entries apply left to right: `*` appends every declared field not yet
    /// selected, a bare name appends that field, `-name` removes it. A list
    /// of nothing but exclusions starts from the full field set. `name.*`
    /// globs require `name` to be a relation and pass through verbatim for
    /// the generator to expand.
    fn expand_field_list(
        &mut self,
        expr: &FieldListExpr,
        fields: &[ResolvedField],
    ) -> Vec<String> {
        let only_excludes = expr
            .entries
            .iter()
            .all(|e| matches!(e.kind, FieldListEntryKind::Exclude(_)));

        let mut selected: Vec<String> = Vec::new();
        if only_excludes && !expr.entries.is_empty() {
            selected.extend(fields.iter().map(|f| f.name.clone()));
        }

        for entry in &expr.entries {
            match &entry.kind {
                FieldListEntryKind::Wildcard => {
                    for field in fields {
                        if !selected.iter().any(|s| s == &field.name) {
                            selected.push(field.name.clone());
                        }
                    }
                }
                FieldListEntryKind::Include { name, glob: false } => {
                    if fields.iter().all(|f| &f.name != name) {
                        self.error(
                            entry.span,
                            format!("'{}' is not a field of this collection", name),
                        );
                        continue;
                    }
                    if !selected.iter().any(|s| s == name) {
                        selected.push(name.clone());
                    }
                }
                FieldListEntryKind::Include { name, glob: true } => {
                    let is_relation = fields
                        .iter()
                        .any(|f| &f.name == name && f.relation.is_some());
                    if !is_relation {
                        self.error(
                            entry.span,
                            format!("'{}.*' requires '{}' to be a relation field", name, name),
                        );
                        continue;
                    }
                    let glob = format!("{}.*", name);
                    if !selected.contains(&glob) {
                        selected.push(glob);
                    }
                }
                FieldListEntryKind::Exclude(name) => {
                    if fields.iter().all(|f| &f.name != name) {
                        self.error(
                            entry.span,
                            format!("'-{}' excludes a field that does not exist", name),
                        );
                        continue;
                    }
                    selected.retain(|s| s != name);
                }
            }
        }

        selected
    }

    /// Like [`Self::expand_field_list`] but against a reference target that
    /// may not have resolved to a collection. Fields of external targets are
    /// unknowable, so only wildcards survive (verbatim) and includes pass
    /// through unchecked.
    fn expand_against_target(
        &mut self,
        expr: &FieldListExpr,
        target: &RefTarget,
        resolved: &[ResolvedCollection],
    ) -> Vec<String> {
        match target {
            RefTarget::Collection(id) => {
                let fields = &resolved[id.0].fields;
                // Split borrow: clone the field names needed for expansion.
                let fields = fields.clone();
                self.expand_field_list(expr, &fields)
            }
            RefTarget::External { .. } | RefTarget::Unresolved { .. } => expr
                .entries
                .iter()
                .filter_map(|entry| match &entry.kind {
                    FieldListEntryKind::Wildcard => Some("*".to_string()),
                    FieldListEntryKind::Include { name, glob: false } => Some(name.clone()),
                    FieldListEntryKind::Include { name, glob: true } => {
                        Some(format!("{}.*", name))
                    }
                    FieldListEntryKind::Exclude(_) => None,
                })
                .collect(),
        }
    }
}

/// Follows `next` links from `start`, breaking at the first repeat. Returns
/// the chain (excluding `start`) ordered nearest-base first, plus the id that
/// closed a cycle, if any. Shared between collection and page inheritance.
fn walk_bases<T: Copy + Eq + std::hash::Hash>(
    start: T,
    next: &HashMap<T, T>,
) -> (Vec<T>, Option<T>) {
    let mut chain = Vec::new();
    let mut seen = vec![start];
    let mut current = start;
    while let Some(&base) = next.get(&current) {
        if seen.contains(&base) {
            return (chain, Some(base));
        }
        chain.push(base);
        seen.push(base);
        current = base;
    }
    (chain, None)
}
