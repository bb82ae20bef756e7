//! Project-wide symbol table.
//!
//! Collects every collection, page, page alias, and imported name across all
//! documents into one name index. Duplicate declarations are reported here
//! and the first declaration wins, so later stages always see a consistent
//! table even for broken input.

use std::collections::HashMap;

use serde::Serialize;

use crate::ast::{Collection, Document, ImportNames, Page};
use crate::diagnostics::{Diagnostic, Span, Stage};

/// Index into [`SymbolTable::collections`], stable across resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CollectionId(pub usize);

/// Index into [`SymbolTable::pages`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PageId(pub usize);

#[derive(Debug, Clone, PartialEq)]
pub enum Symbol {
    Collection(CollectionId),
    Page(PageId),
    /// Name brought in by an import statement; resolution treats references
    /// to it as external.
    Imported { module: String, name: String },
}

/// Borrowing view over all documents of a project, in declaration order.
pub struct SymbolTable<'a> {
    collections: Vec<&'a Collection>,
    pages: Vec<&'a Page>,
    names: HashMap<&'a str, (Symbol, Span)>,
}

impl<'a> SymbolTable<'a> {
    pub fn build(documents: &'a [Document]) -> (SymbolTable<'a>, Vec<Diagnostic>) {
        let mut table = SymbolTable {
            collections: Vec::new(),
            pages: Vec::new(),
            names: HashMap::new(),
        };
        let mut diags = Vec::new();

        for document in documents {
            for import in &document.imports {
                match &import.names {
                    ImportNames::Named(names) => {
                        for imported in names {
                            let local = imported.local_name();
                            let symbol = Symbol::Imported {
                                module: import.module.clone(),
                                name: imported.name.clone(),
                            };
                            table.declare(local, symbol, import.span, &mut diags);
                        }
                    }
                    // Wildcard and bare-module imports bind nothing locally;
                    // dotted paths through them resolve as external.
                    ImportNames::Wildcard | ImportNames::Module => {}
                }
            }

            for collection in &document.collections {
                let id = CollectionId(table.collections.len());
                table.collections.push(collection);
                table.declare(
                    &collection.name,
                    Symbol::Collection(id),
                    collection.name_span,
                    &mut diags,
                );
            }

            for page in &document.pages {
                let id = PageId(table.pages.len());
                table.pages.push(page);
                table.declare(&page.name, Symbol::Page(id), page.name_span, &mut diags);
                if let Some(alias) = &page.alias {
                    table.declare(alias, Symbol::Page(id), page.name_span, &mut diags);
                }
            }
        }

        (table, diags)
    }

    fn declare(
        &mut self,
        name: &'a str,
        symbol: Symbol,
        span: Span,
        diags: &mut Vec<Diagnostic>,
    ) {
        match self.names.get(name) {
            // First declaration wins.
            Some((existing, _)) => {
                diags.push(Diagnostic::error(
                    Stage::Symbols,
                    span,
                    format!(
                        "'{}' is already declared as a {}",
                        name,
                        describe(existing)
                    ),
                ));
            }
            None => {
                self.names.insert(name, (symbol, span));
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.names.get(name).map(|(symbol, _)| symbol)
    }

    pub fn collection(&self, id: CollectionId) -> &'a Collection {
        self.collections[id.0]
    }

    pub fn page(&self, id: PageId) -> &'a Page {
        self.pages[id.0]
    }

    /// Declaration order across all documents.
    pub fn collection_ids(&self) -> impl Iterator<Item = CollectionId> {
        (0..self.collections.len()).map(CollectionId)
    }

    pub fn page_ids(&self) -> impl Iterator<Item = PageId> {
        (0..self.pages.len()).map(PageId)
    }

    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Collection id for a name, when the name is bound to a collection.
    pub fn collection_named(&self, name: &str) -> Option<CollectionId> {
        match self.lookup(name) {
            Some(Symbol::Collection(id)) => Some(*id),
            _ => None,
        }
    }

    pub fn page_named(&self, name: &str) -> Option<PageId> {
        match self.lookup(name) {
            Some(Symbol::Page(id)) => Some(*id),
            _ => None,
        }
    }
}

fn describe(symbol: &Symbol) -> &'static str {
    match symbol {
        Symbol::Collection(_) => "collection",
        Symbol::Page(_) => "page",
        Symbol::Imported { .. } => "imported name",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast;
    use crate::lexer;
    use crate::parser;

    fn documents(sources: &[&str]) -> Vec<Document> {
        sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let file = crate::diagnostics::FileId(i as u32);
                let (tokens, _) = lexer::tokenize(file, source);
                let (cst, _) = parser::parse(file, source, tokens);
                let (document, _) = ast::build(source, cst);
                document
            })
            .collect()
    }

    #[test]
    fn collections_and_pages_share_one_namespace() {
        let docs = documents(&["#Article\n title : str\n\n[index]\n template: index.html\n"]);
        let (table, diags) = SymbolTable::build(&docs);
        assert!(diags.is_empty());
        assert!(matches!(
            table.lookup("Article"),
            Some(Symbol::Collection(_))
        ));
        assert!(matches!(table.lookup("index"), Some(Symbol::Page(_))));
        assert_eq!(table.collection_count(), 1);
        assert_eq!(table.page_count(), 1);
    }

    #[test]
    fn duplicate_collection_is_reported_and_first_wins() {
        let docs = documents(&[
            "#Article\n title : str\n",
            "#Article\n body : text\n",
        ]);
        let (table, diags) = SymbolTable::build(&docs);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("already declared"));
        let id = table.collection_named("Article").unwrap();
        assert_eq!(table.collection(id).fields[0].name, "title");
    }

    #[test]
    fn page_alias_is_a_symbol() {
        let docs = documents(&["[article-list as list]\n template: list.html\n"]);
        let (table, diags) = SymbolTable::build(&docs);
        assert!(diags.is_empty());
        let by_name = table.page_named("article-list").unwrap();
        let by_alias = table.page_named("list").unwrap();
        assert_eq!(by_name, by_alias);
    }

    #[test]
    fn imported_name_conflicts_with_collection() {
        let docs = documents(&[
            "from app.models import Article\n\n#Article\n title : str\n",
        ]);
        let (_, diags) = SymbolTable::build(&docs);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("imported name"));
    }

    #[test]
    fn declaration_order_is_preserved_across_documents() {
        let docs = documents(&[
            "#B\n x : int\n",
            "#A\n y : int\n",
        ]);
        let (table, _) = SymbolTable::build(&docs);
        let names: Vec<&str> = table
            .collection_ids()
            .map(|id| table.collection(id).name.as_str())
            .collect();
        assert_eq!(names, ["B", "A"]);
    }
}
