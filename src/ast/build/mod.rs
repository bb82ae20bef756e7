//! CST → AST projection.
//!
//! Pure and total: every CST node maps to an AST node or an explicit error
//! node, never a dropped slot. Shape and arity checking happens here (the
//! parser only resolved surface structure); everything semantic (symbol
//! lookup, reference resolution) is deliberately left to later stages.

mod annotations;
mod fields;

use super::{
    Collection, Document, ErrorNode, ImportNames, ImportStatement, ImportedName, Page, PageBaseRef,
    PageBody, RawBlock, RawTag, UrlSegment, UrlSpec,
};
use crate::ast::model::BaseRef;
use crate::cst::{
    CstAnnotation, CstColLine, CstCollection, CstDocument, CstItem, CstKeyValue, CstPage,
    CstPageLine, CstRaw, CstTemplate, CstValueItem,
};
use crate::diagnostics::{Diagnostic, Span, Stage};
use crate::parser::fieldlist;

/// Builds the typed AST for one file.
pub fn build(source: &str, cst: CstDocument) -> (Document, Vec<Diagnostic>) {
    let mut builder = Builder {
        source,
        diags: Vec::new(),
    };
    let document = builder.document(cst);
    (document, builder.diags)
}

pub(crate) struct Builder<'a> {
    source: &'a str,
    diags: Vec<Diagnostic>,
}

impl<'a> Builder<'a> {
    pub(crate) fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::error(Stage::AstBuilder, span, message));
    }

    pub(crate) fn warning(&mut self, span: Span, message: impl Into<String>) {
        self.diags
            .push(Diagnostic::warning(Stage::AstBuilder, span, message));
    }

    pub(crate) fn slice(&self, span: Span) -> &'a str {
        &self.source[span.start..span.end]
    }

    /// Parses a key's value as a field-list expression.
    pub(crate) fn field_list(
        &mut self,
        kv: &CstKeyValue,
    ) -> Option<crate::ast::FieldListExpr> {
        let text = self.slice(kv.value_span);
        match fieldlist::parse_field_list(text, kv.value_span) {
            Ok(expr) => Some(expr),
            Err(diag) => {
                self.diags.push(diag);
                None
            }
        }
    }

    /// Expects exactly one value item for an entry.
    pub(crate) fn single_item<'b>(
        &mut self,
        kv: &'b CstKeyValue,
        what: &str,
    ) -> Option<&'b CstValueItem> {
        if kv.items.len() == 1 {
            Some(&kv.items[0])
        } else {
            self.error(
                kv.value_span,
                format!("'{}' expects a single value", what),
            );
            None
        }
    }

    pub(crate) fn raw_block(&mut self, raw: &CstRaw, tag: RawTag) -> RawBlock {
        RawBlock {
            tag,
            text: raw.text.clone(),
            span: raw.span,
        }
    }

    fn document(&mut self, cst: CstDocument) -> Document {
        let mut document = Document {
            imports: Vec::new(),
            collections: Vec::new(),
            pages: Vec::new(),
            errors: Vec::new(),
        };

        for item in cst.items {
            match item {
                CstItem::Import(import) => {
                    let names = if import.wildcard {
                        ImportNames::Wildcard
                    } else if import.names.is_empty() {
                        ImportNames::Module
                    } else {
                        ImportNames::Named(
                            import
                                .names
                                .into_iter()
                                .map(|(name, alias)| ImportedName { name, alias })
                                .collect(),
                        )
                    };
                    document.imports.push(ImportStatement {
                        module: import.module.join("."),
                        names,
                        span: import.span,
                    });
                }
                CstItem::Collection(col) => {
                    let collection = self.collection(col, &mut document.errors);
                    document.collections.push(collection);
                }
                CstItem::Page(page) => {
                    let page = self.page(page, &mut document.errors);
                    document.pages.push(page);
                }
                CstItem::Error(err) => document.errors.push(ErrorNode {
                    message: err.message,
                    span: err.span,
                }),
            }
        }

        document
    }

    fn collection(&mut self, cst: CstCollection, errors: &mut Vec<ErrorNode>) -> Collection {
        let base = cst
            .base
            .map(|(name, kind, span)| BaseRef::new(name, kind, span));

        let mut fields = Vec::new();
        let mut annotations = Vec::new();
        for line in cst.lines {
            match line {
                CstColLine::Field(field) => fields.push(self.field(field)),
                CstColLine::Annotation(ann) => {
                    annotations.push(self.model_annotation(ann));
                }
                CstColLine::Error(err) => errors.push(ErrorNode {
                    message: err.message,
                    span: err.span,
                }),
            }
        }

        Collection {
            name: cst.name,
            name_span: cst.name_span,
            base,
            fields,
            annotations,
            span: cst.span,
        }
    }

    fn page(&mut self, cst: CstPage, errors: &mut Vec<ErrorNode>) -> Page {
        let base = cst.base.map(|(name, span)| PageBaseRef { name, span });
        let url = cst.url.and_then(|raw| self.url(raw));
        let body = self.page_body(cst.lines, errors);

        Page {
            name: cst.name,
            name_span: cst.name_span,
            alias: cst.alias,
            base,
            url,
            body,
            span: cst.span,
        }
    }

    /// Shared with crud sub-view overrides.
    pub(crate) fn page_body(
        &mut self,
        lines: Vec<CstPageLine>,
        errors: &mut Vec<ErrorNode>,
    ) -> PageBody {
        let mut body = PageBody::default();
        for line in lines {
            match line {
                CstPageLine::Template { value, span } => {
                    if body.template.is_some() {
                        self.error(span, "duplicate template declaration");
                        continue;
                    }
                    body.template = Some(match value {
                        CstTemplate::Path(path) => super::TemplateRef::Path(path),
                        CstTemplate::Code(raw) => {
                            super::TemplateRef::Code(self.raw_block(&raw, RawTag::TemplateCode))
                        }
                    });
                }
                CstPageLine::ComputedField { name, code, span } => {
                    body.fields.push(super::PageField {
                        name,
                        code: self.raw_block(&code, RawTag::PageComputed),
                        span,
                    });
                }
                CstPageLine::Function {
                    name,
                    args,
                    body: fn_body,
                    span,
                } => {
                    let fn_body =
                        fn_body.map(|raw| self.raw_block(&raw, RawTag::PageFunctionBody));
                    body.functions.push(super::PageFunction {
                        name,
                        args,
                        body: fn_body,
                        span,
                    });
                }
                CstPageLine::Annotation(ann) => {
                    let built = self.page_annotation(ann, errors);
                    body.annotations.push(built);
                }
                CstPageLine::Error(err) => errors.push(ErrorNode {
                    message: err.message,
                    span: err.span,
                }),
            }
        }
        body
    }

    fn url(&mut self, raw: CstRaw) -> Option<UrlSpec> {
        let mut text = raw.text.as_str();
        let relative = text.starts_with('.') || text.starts_with('$');
        if relative {
            text = &text[1..];
        }

        let mut segments = Vec::new();
        for part in text.split('/').filter(|p| !p.is_empty()) {
            if let Some(param) = part.strip_prefix('<') {
                match param.strip_suffix('>') {
                    Some(name) if !name.is_empty() => {
                        segments.push(UrlSegment::Param(name.to_string()));
                    }
                    _ => {
                        self.error(raw.span, format!("malformed URL parameter '{}'", part));
                        return None;
                    }
                }
            } else if part.contains('<') || part.contains('>') {
                self.error(raw.span, format!("malformed URL segment '{}'", part));
                return None;
            } else {
                segments.push(UrlSegment::Literal(part.to_string()));
            }
        }

        Some(UrlSpec {
            relative,
            segments,
            raw: raw.text,
            span: raw.span,
        })
    }

    /// Converts a CST annotation that failed shape checks into an error node.
    pub(crate) fn annotation_error(
        &mut self,
        ann: &CstAnnotation,
        message: impl Into<String>,
    ) -> ErrorNode {
        let message = message.into();
        self.error(ann.span, message.clone());
        ErrorNode {
            message,
            span: ann.span,
        }
    }
}
