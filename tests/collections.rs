//! Collection declarations: field kinds, modifier sigils, and model
//! annotations, asserted through the resolved IR.

use veld::ast::FieldKind;
use veld::ir::{RefTarget, ResolvedModelAnnotation, SignalKind};
use veld::testing::{assert_compiled, compile};

#[test]
fn text_field_with_size_and_choices() {
    let compilation = compile(
        "\
#Article
status : str(16, draft: \"Draft\", live: \"Live\")
",
    );
    assert_compiled(&compilation)
        .clean()
        .collection("Article", |c| {
            c.field("status", |f| {
                f.kind("str");
            });
        });

    let ir = compilation.resolved().unwrap();
    let field = ir.collection_named("Article").unwrap().field("status").unwrap();
    let FieldKind::Text { max_length, choices } = &field.kind else {
        panic!("expected a text kind, got {:?}", field.kind);
    };
    assert_eq!(*max_length, Some(16));
    assert_eq!(choices.len(), 2);
    assert_eq!(choices[0].key, "draft");
    assert_eq!(choices[0].label.as_deref(), Some("Draft"));
}

#[test]
fn bool_default_and_timestamps() {
    let compilation = compile(
        "\
#Article
live : bool(true)
created : created
changed : updated
",
    );
    assert_compiled(&compilation).clean().collection("Article", |c| {
        c.field("live", |f| {
            f.kind("bool");
        })
        .field("created", |f| {
            f.kind("created");
        })
        .field("changed", |f| {
            f.kind("updated");
        });
    });

    let ir = compilation.resolved().unwrap();
    let live = ir.collection_named("Article").unwrap().field("live").unwrap();
    assert_eq!(live.kind, FieldKind::Bool { default: Some(true) });
}

#[test]
fn slug_sources_must_exist() {
    let good = compile(
        "\
#Article
title : str
slug : slug(title)
",
    );
    assert_compiled(&good).clean();

    let bad = compile(
        "\
#Article
slug : slug(headline)
",
    );
    assert_compiled(&bad).has_error_containing("'headline' is not a field");
}

#[test]
fn image_sizes_and_filters() {
    let compilation = compile(
        "\
#Article
photo : image(thumb: 100x100, wide: 800x300, grayscale)
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let photo = ir.collection_named("Article").unwrap().field("photo").unwrap();
    let FieldKind::Image { sizes, filters } = &photo.kind else {
        panic!("expected an image kind");
    };
    assert_eq!(sizes.len(), 2);
    assert_eq!((sizes[0].name.as_str(), sizes[0].width, sizes[0].height), ("thumb", 100, 100));
    assert_eq!(filters, &["grayscale"]);
}

#[test]
fn sigils_become_opaque_flags() {
    let compilation = compile(
        "\
#Article
=$title : str
*&body : text
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let title = article.field("title").unwrap();
    assert!(title.flags.eq && title.flags.dollar);
    assert!(!title.flags.bang);
    let body = article.field("body").unwrap();
    assert!(body.flags.star && body.flags.amp);
}

#[test]
fn verbose_help_and_extension_are_carried() {
    let compilation = compile(
        "\
#Article
title : str \"Title\" \"Shown in the admin\" { db_index=True }
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let title = ir.collection_named("Article").unwrap().field("title").unwrap();
    assert_eq!(title.verbose_name.as_deref(), Some("Title"));
    assert_eq!(title.help_text.as_deref(), Some("Shown in the admin"));
    assert_eq!(title.extension.as_ref().unwrap().text, "db_index=True");
}

#[test]
fn inline_code_extension_is_carried() {
    let compilation = compile(
        "\
#Invoice
total : int = compute_total()
label : str \"Label\" = default_label()
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let invoice = ir.collection_named("Invoice").unwrap();
    let total = invoice.field("total").unwrap();
    assert_eq!(total.extension.as_ref().unwrap().text, "compute_total()");
    let label = invoice.field("label").unwrap();
    assert_eq!(label.verbose_name.as_deref(), Some("Label"));
    assert_eq!(label.extension.as_ref().unwrap().text, "default_label()");
}

#[test]
fn relation_cascade_and_related_name() {
    let compilation = compile(
        "\
#User
name : str

#Article
author : one(#User!) -> articles
tags : many(taggit.Tag)
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let author = article.field("author").unwrap().relation.as_ref().unwrap();
    assert!(author.cascade_delete);
    assert_eq!(author.related_name.as_deref(), Some("articles"));
    let tags = article.field("tags").unwrap().relation.as_ref().unwrap();
    assert_eq!(
        tags.target,
        RefTarget::External {
            path: "taggit.Tag".to_string()
        }
    );
}

#[test]
fn unknown_field_kind_keeps_the_slot() {
    let compilation = compile(
        "\
#Article
title : str
weird : pretzel
body : text
",
    );
    assert_compiled(&compilation)
        .has_error_containing("unknown field kind 'pretzel'")
        .collection("Article", |c| {
            // The bad field stays in place so positions stay meaningful.
            c.field_names(&["title", "weird", "body"]);
        });
}

#[test]
fn admin_annotation_expands_field_lists() {
    let compilation = compile(
        "\
#Article
title : str
body : text
created : created
@admin { list: title, created; search: title }
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let admin = article
        .annotations
        .iter()
        .find_map(|a| match a {
            ResolvedModelAnnotation::Admin(admin) => Some(admin),
            _ => None,
        })
        .expect("admin annotation present");
    assert_eq!(admin.list.as_deref(), Some(&["title".to_string(), "created".to_string()][..]));
    assert_eq!(admin.search.as_deref(), Some(&["title".to_string()][..]));
    assert_eq!(admin.fields, None);
}

#[test]
fn rest_annotation_with_auth_query_and_inline() {
    let compilation = compile(
        "\
#Comment
text : str

#Article
title : str
comments : many(#Comment)
@rest {
fields: *
auth: read basic, write token
query: = Article.objects.filter(live=True)
inline: comments(fields: *)
}
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let rest = article
        .annotations
        .iter()
        .find_map(|a| match a {
            ResolvedModelAnnotation::Rest(rest) => Some(rest),
            _ => None,
        })
        .expect("rest annotation present");
    assert_eq!(
        rest.fields.as_deref(),
        Some(&["title".to_string(), "comments".to_string()][..])
    );
    assert_eq!(rest.auth.len(), 2);
    assert_eq!((rest.auth[0].mode.as_str(), rest.auth[0].method.as_str()), ("read", "basic"));
    assert!(rest.query.as_ref().unwrap().text.contains("filter(live=True)"));
    assert_eq!(rest.inlines.len(), 1);
    assert_eq!(rest.inlines[0].field, "comments");
    assert_eq!(rest.inlines[0].fields.as_deref(), Some(&["text".to_string()][..]));
}

#[test]
fn order_tree_and_signals() {
    let compilation = compile(
        "\
#Category
name : str
created : created
@order(-created, name)
@tree
@post_save {
rebuild_cache(instance)
}
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let category = ir.collection_named("Category").unwrap();
    let keywords: Vec<&str> = category
        .annotations
        .iter()
        .map(|a| match a {
            ResolvedModelAnnotation::Order { .. } => "order",
            ResolvedModelAnnotation::Tree => "tree",
            ResolvedModelAnnotation::Signal { kind, .. } => kind.keyword(),
            _ => "?",
        })
        .collect();
    assert_eq!(keywords, ["order", "tree", "post_save"]);
    let ResolvedModelAnnotation::Order { fields, .. } = &category.annotations[0] else {
        unreachable!();
    };
    assert_eq!(fields, &["-created", "name"]);
    let ResolvedModelAnnotation::Signal { kind, body } = &category.annotations[2] else {
        unreachable!();
    };
    assert_eq!(*kind, SignalKind::PostSave);
    assert!(body.text.contains("rebuild_cache"));
}

#[test]
fn dashed_collection_field_names_lex_as_single_identifiers() {
    let compilation = compile(
        "\
#Article
title : str

[article-list]: /articles/
count= Article.objects.count()
",
    );
    assert_compiled(&compilation).clean().page("article-list", |p| {
        p.computed_field_names(&["count"]);
    });
}
