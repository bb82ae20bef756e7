//! Field kinds: `(name, args)` pairs from the CST become `FieldKind`
//! variants, with arity and shape checks.

use super::Builder;
use crate::ast::model::{
    Choice, Field, FieldKind, ImageSize, RelationArity, RelationField,
};
use crate::ast::{FieldFlags, ModelRef, RawTag, RefSyntax, Sigil};
use crate::cst::{CstField, CstRef, CstValueItem, SigilToken};

impl<'a> Builder<'a> {
    pub(super) fn field(&mut self, cst: CstField) -> Field {
        let mut flags = FieldFlags::default();
        for sigil in &cst.sigils {
            flags.insert(match sigil {
                SigilToken::Eq => Sigil::Eq,
                SigilToken::Dollar => Sigil::Dollar,
                SigilToken::Amp => Sigil::Amp,
                SigilToken::Bang => Sigil::Bang,
                SigilToken::Tilde => Sigil::Tilde,
                SigilToken::Star => Sigil::Star,
                SigilToken::Approx => Sigil::Approx,
            });
        }

        let kind = self.field_kind(&cst);

        if cst.related_name.is_some() && !matches!(kind, FieldKind::Relation(_)) {
            let (_, span) = cst.related_name.as_ref().expect("checked related name");
            self.error(*span, "'->' related name is only valid on relation fields");
        }

        let extension = cst
            .extension
            .as_ref()
            .map(|raw| self.raw_block(raw, RawTag::FieldExtension));

        Field {
            name: cst.name,
            flags,
            kind,
            verbose_name: cst.verbose_name,
            help_text: cst.help_text,
            extension,
            span: cst.span,
        }
    }

    fn field_kind(&mut self, cst: &CstField) -> FieldKind {
        match cst.kind.as_str() {
            "str" => {
                let (max_length, choices) = self.sized_choices(&cst.args);
                FieldKind::Text {
                    max_length,
                    choices,
                }
            }
            "int" => {
                let (size, choices) = self.sized_choices(&cst.args);
                if size.is_some() {
                    self.error(cst.kind_span, "'int' does not take a size argument");
                }
                FieldKind::Int { choices }
            }
            "text" => self.simple_kind(cst, FieldKind::LongText),
            "html" => self.simple_kind(cst, FieldKind::Html),
            "html_media" => self.simple_kind(cst, FieldKind::HtmlMedia),
            "float" => self.simple_kind(cst, FieldKind::Float),
            "decimal" => self.simple_kind(cst, FieldKind::Decimal),
            "date" => self.simple_kind(cst, FieldKind::Date),
            "datetime" => self.simple_kind(cst, FieldKind::DateTime),
            "created" => self.simple_kind(cst, FieldKind::CreateTimestamp),
            "updated" => self.simple_kind(cst, FieldKind::UpdateTimestamp),
            "file" => self.simple_kind(cst, FieldKind::File),
            "filer_file" => self.simple_kind(cst, FieldKind::FilerFile),
            "filer_folder" => self.simple_kind(cst, FieldKind::FilerFolder),
            "bool" => {
                let mut default = None;
                for arg in &cst.args {
                    match arg {
                        CstValueItem::Bool(value, _) if default.is_none() => {
                            default = Some(*value);
                        }
                        other => {
                            self.error(
                                other.span(),
                                "'bool' takes at most one true/false default",
                            );
                        }
                    }
                }
                FieldKind::Bool { default }
            }
            "slug" => {
                let mut sources = Vec::new();
                for arg in &cst.args {
                    match arg {
                        CstValueItem::Name {
                            name, glob: false, ..
                        } => sources.push(name.clone()),
                        other => {
                            self.error(other.span(), "'slug' takes field names");
                        }
                    }
                }
                if sources.is_empty() {
                    self.error(cst.kind_span, "'slug' requires at least one source field");
                }
                FieldKind::Slug { sources }
            }
            "image" => {
                let (sizes, filters) = self.image_args(&cst.args);
                FieldKind::Image { sizes, filters }
            }
            "filer_image" => {
                let (sizes, filters) = self.image_args(&cst.args);
                FieldKind::FilerImage { sizes, filters }
            }
            "one" => self.relation(cst, RelationArity::One),
            "one2one" => self.relation(cst, RelationArity::OneToOne),
            "many" => self.relation(cst, RelationArity::Many),
            other => {
                self.error(cst.kind_span, format!("unknown field kind '{}'", other));
                FieldKind::Error
            }
        }
    }

    fn simple_kind(&mut self, cst: &CstField, kind: FieldKind) -> FieldKind {
        if !cst.args.is_empty() {
            self.error(
                cst.kind_span,
                format!("'{}' does not take arguments", cst.kind),
            );
        }
        kind
    }

    /// `str(100)`, `str(draft: "Draft", live)`: optional size plus choices.
    fn sized_choices(&mut self, args: &[CstValueItem]) -> (Option<u32>, Vec<Choice>) {
        let mut size = None;
        let mut choices = Vec::new();
        for arg in args {
            match arg {
                CstValueItem::Int(value, span) => {
                    if size.is_some() {
                        self.error(*span, "duplicate size argument");
                    } else if *value <= 0 {
                        self.error(*span, "size must be positive");
                    } else {
                        size = Some(*value as u32);
                    }
                }
                CstValueItem::KeyValue { key, value, span } => match value.as_ref() {
                    CstValueItem::Str(label, _) => choices.push(Choice {
                        key: key.clone(),
                        label: Some(label.clone()),
                        span: *span,
                    }),
                    _ => self.error(*span, "choice label must be a string"),
                },
                CstValueItem::Name {
                    name, glob: false, span,
                } => choices.push(Choice {
                    key: name.clone(),
                    label: None,
                    span: *span,
                }),
                other => {
                    self.error(other.span(), "expected a size or a choice");
                }
            }
        }
        (size, choices)
    }

    /// `image(thumb=100x100, big=600x400, crop)`: named sizes plus bare
    /// filter names.
    fn image_args(&mut self, args: &[CstValueItem]) -> (Vec<ImageSize>, Vec<String>) {
        let mut sizes = Vec::new();
        let mut filters = Vec::new();
        for arg in args {
            match arg {
                CstValueItem::KeyValue { key, value, span } => match value.as_ref() {
                    CstValueItem::Dimensions(w, h, _) => sizes.push(ImageSize {
                        name: key.clone(),
                        width: *w,
                        height: *h,
                        span: *span,
                    }),
                    _ => self.error(*span, "image size must be WxH dimensions"),
                },
                CstValueItem::Name {
                    name, glob: false, ..
                } => filters.push(name.clone()),
                other => {
                    self.error(other.span(), "expected `name=WxH` or a filter name");
                }
            }
        }
        (sizes, filters)
    }

    fn relation(&mut self, cst: &CstField, arity: RelationArity) -> FieldKind {
        let mut target: Option<(ModelRef, bool)> = None;
        for arg in &cst.args {
            if target.is_some() {
                self.error(arg.span(), "relation takes a single target");
                continue;
            }
            target = self.relation_target(arg);
        }

        let Some((target, cascade_delete)) = target else {
            self.error(
                cst.kind_span,
                format!("'{}' requires a target model", cst.kind),
            );
            return FieldKind::Error;
        };

        FieldKind::Relation(RelationField {
            arity,
            target,
            cascade_delete,
            related_name: cst.related_name.as_ref().map(|(name, _)| name.clone()),
        })
    }

    fn relation_target(&mut self, arg: &CstValueItem) -> Option<(ModelRef, bool)> {
        match arg {
            CstValueItem::Ref(cst_ref) => {
                let model_ref = self.model_ref(cst_ref)?;
                Some((model_ref, cst_ref.cascade))
            }
            CstValueItem::Path(parts, span) => Some((
                ModelRef {
                    syntax: RefSyntax::Path(parts.join(".")),
                    span: *span,
                },
                false,
            )),
            CstValueItem::Name {
                name, glob: false, span,
            } => Some((
                ModelRef {
                    syntax: RefSyntax::Path(name.clone()),
                    span: *span,
                },
                false,
            )),
            other => {
                self.error(other.span(), "expected a model reference or class path");
                None
            }
        }
    }

    /// Anchored `#Model[.field]` reference from the CST. Dotted paths after
    /// `#` deeper than one field are rejected here.
    pub(crate) fn model_ref(&mut self, cst_ref: &CstRef) -> Option<ModelRef> {
        if cst_ref.anchored {
            if cst_ref.parts.len() > 2 {
                self.error(cst_ref.span, "expected '#Model' or '#Model.field'");
                return None;
            }
            Some(ModelRef {
                syntax: RefSyntax::Anchored {
                    model: cst_ref.parts[0].clone(),
                    field: cst_ref.parts.get(1).cloned(),
                },
                span: cst_ref.span,
            })
        } else {
            Some(ModelRef {
                syntax: RefSyntax::Path(cst_ref.parts.join(".")),
                span: cst_ref.span,
            })
        }
    }
}
