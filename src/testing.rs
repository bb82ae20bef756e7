//! Fluent assertion API for compiled projects.
//!
//! What every pipeline test wants is the same shape: compile a source,
//! assert the diagnostics, then drill into the resolved IR. Asserting
//! generalities like node counts alone is not informative; these builders
//! make asserting the full resolved shape cheap enough that tests do it.
//!
//! ```rust-example
//! assert_compiled(&compile("#A\n x : int\n"))
//!     .clean()
//!     .collection("A", |c| {
//!         c.field_names(&["x"]);
//!     });
//! ```

use crate::ir::{
    RefTarget, ResolvedCollection, ResolvedField, ResolvedPage, ResolvedPageAnnotation,
};
use crate::pipeline::{compile_source, Compilation};

/// Compiles one in-memory source under a fixed test file name.
pub fn compile(source: &str) -> Compilation {
    compile_source("test.veld", source)
}

/// Entry point: assertion builder over a finished compilation.
pub fn assert_compiled(compilation: &Compilation) -> CompilationAssertion<'_> {
    CompilationAssertion { compilation }
}

pub struct CompilationAssertion<'a> {
    compilation: &'a Compilation,
}

impl<'a> CompilationAssertion<'a> {
    /// Assert there are no diagnostics at all.
    pub fn clean(self) -> Self {
        assert!(
            self.compilation.diagnostics().is_empty(),
            "expected no diagnostics, got:\n{}",
            self.rendered()
        );
        self
    }

    /// Assert there are no error-level diagnostics (warnings allowed).
    pub fn no_errors(self) -> Self {
        assert!(
            !self.compilation.has_errors(),
            "expected no errors, got:\n{}",
            self.rendered()
        );
        self
    }

    pub fn error_count(self, expected: usize) -> Self {
        let actual = self
            .compilation
            .diagnostics()
            .iter()
            .filter(|d| d.is_error())
            .count();
        assert_eq!(
            actual, expected,
            "expected {} errors, got {}:\n{}",
            expected, actual, self.rendered()
        );
        self
    }

    /// Assert some error message contains the given fragment.
    pub fn has_error_containing(self, fragment: &str) -> Self {
        assert!(
            self.compilation
                .diagnostics()
                .iter()
                .any(|d| d.is_error() && d.message.contains(fragment)),
            "no error contains {:?}; diagnostics:\n{}",
            fragment,
            self.rendered()
        );
        self
    }

    pub fn has_warning_containing(self, fragment: &str) -> Self {
        assert!(
            self.compilation
                .diagnostics()
                .iter()
                .any(|d| !d.is_error() && d.message.contains(fragment)),
            "no warning contains {:?}; diagnostics:\n{}",
            fragment,
            self.rendered()
        );
        self
    }

    /// Assert on a resolved collection by name.
    pub fn collection<F>(self, name: &str, assertion: F) -> Self
    where
        F: FnOnce(CollectionAssertion<'a>),
    {
        let ir = self.compilation.resolved().expect("pipeline ran");
        let collection = ir
            .collection_named(name)
            .unwrap_or_else(|| panic!("no collection '{}' in the IR", name));
        assertion(CollectionAssertion { ir_name: name.to_string(), collection });
        self
    }

    /// Assert on a resolved page by name or alias.
    pub fn page<F>(self, name: &str, assertion: F) -> Self
    where
        F: FnOnce(PageAssertion<'a>),
    {
        let ir = self.compilation.resolved().expect("pipeline ran");
        let page = ir
            .page_named(name)
            .unwrap_or_else(|| panic!("no page '{}' in the IR", name));
        assertion(PageAssertion { page });
        self
    }

    fn rendered(&self) -> String {
        self.compilation.render_diagnostics().join("\n")
    }
}

pub struct CollectionAssertion<'a> {
    ir_name: String,
    collection: &'a ResolvedCollection,
}

impl<'a> CollectionAssertion<'a> {
    /// Assert the effective field names, in order.
    pub fn field_names(self, expected: &[&str]) -> Self {
        let actual: Vec<&str> = self
            .collection
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            actual, expected,
            "effective fields of '{}' differ",
            self.ir_name
        );
        self
    }

    pub fn base_count(self, expected: usize) -> Self {
        assert_eq!(
            self.collection.bases.len(),
            expected,
            "base chain length of '{}'",
            self.ir_name
        );
        self
    }

    /// Assert on one effective field by name.
    pub fn field<F>(self, name: &str, assertion: F) -> Self
    where
        F: FnOnce(FieldAssertion<'a>),
    {
        let field = self
            .collection
            .field(name)
            .unwrap_or_else(|| panic!("'{}' has no field '{}'", self.ir_name, name));
        assertion(FieldAssertion { field });
        self
    }

    pub fn annotation_count(self, expected: usize) -> Self {
        assert_eq!(
            self.collection.annotations.len(),
            expected,
            "annotation count of '{}'",
            self.ir_name
        );
        self
    }
}

pub struct FieldAssertion<'a> {
    field: &'a ResolvedField,
}

impl FieldAssertion<'_> {
    pub fn kind(self, keyword: &str) -> Self {
        assert_eq!(
            self.field.kind.keyword(),
            keyword,
            "kind of field '{}'",
            self.field.name
        );
        self
    }

    /// Assert the relation target resolved to a project collection.
    pub fn relation_resolved(self) -> Self {
        match self.field.relation.as_ref().map(|r| &r.target) {
            Some(RefTarget::Collection(_)) => self,
            other => panic!(
                "field '{}' relation target is {:?}, expected a collection",
                self.field.name, other
            ),
        }
    }

    pub fn relation_external(self, path: &str) -> Self {
        match self.field.relation.as_ref().map(|r| &r.target) {
            Some(RefTarget::External { path: actual }) if actual == path => self,
            other => panic!(
                "field '{}' relation target is {:?}, expected external '{}'",
                self.field.name, other, path
            ),
        }
    }

    pub fn relation_unresolved(self) -> Self {
        match self.field.relation.as_ref().map(|r| &r.target) {
            Some(RefTarget::Unresolved { .. }) => self,
            other => panic!(
                "field '{}' relation target is {:?}, expected unresolved",
                self.field.name, other
            ),
        }
    }

    /// Assert which collection's declaration supplied this field.
    pub fn origin_index(self, expected: usize) -> Self {
        assert_eq!(
            self.field.origin.0, expected,
            "origin of field '{}'",
            self.field.name
        );
        self
    }
}

pub struct PageAssertion<'a> {
    page: &'a ResolvedPage,
}

impl<'a> PageAssertion<'a> {
    pub fn url(self, expected: &str) -> Self {
        let actual = self
            .page
            .url
            .as_ref()
            .map(|u| u.full.as_str())
            .unwrap_or_else(|| panic!("page '{}' has no URL", self.page.name));
        assert_eq!(actual, expected, "URL of page '{}'", self.page.name);
        self
    }

    pub fn url_params(self, expected: &[&str]) -> Self {
        let url = self
            .page
            .url
            .as_ref()
            .unwrap_or_else(|| panic!("page '{}' has no URL", self.page.name));
        let actual: Vec<&str> = url.params.iter().map(String::as_str).collect();
        assert_eq!(actual, expected, "URL params of page '{}'", self.page.name);
        self
    }

    pub fn no_url(self) -> Self {
        assert!(
            self.page.url.is_none(),
            "page '{}' unexpectedly has URL {:?}",
            self.page.name,
            self.page.url.as_ref().map(|u| &u.full)
        );
        self
    }

    pub fn annotation_count(self, expected: usize) -> Self {
        assert_eq!(
            self.page.body.annotations.len(),
            expected,
            "annotation count of page '{}'",
            self.page.name
        );
        self
    }

    /// Assert on the single crud annotation of the page.
    pub fn crud<F>(self, assertion: F) -> Self
    where
        F: FnOnce(&'a crate::ir::ResolvedCrud),
    {
        let crud = self
            .page
            .body
            .annotations
            .iter()
            .find_map(|a| match a {
                ResolvedPageAnnotation::Crud(c) => Some(c),
                _ => None,
            })
            .unwrap_or_else(|| panic!("page '{}' has no crud annotation", self.page.name));
        assertion(crud);
        self
    }

    pub fn computed_field_names(self, expected: &[&str]) -> Self {
        let actual: Vec<&str> = self
            .page
            .body
            .fields
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(
            actual, expected,
            "computed fields of page '{}'",
            self.page.name
        );
        self
    }
}
