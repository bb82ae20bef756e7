//! Inheritance semantics for collections and pages: effective-field
//! composition, override-in-place, cycle breaking, and URL composition.

use veld::testing::{assert_compiled, compile};

#[test]
fn derived_fields_begin_with_base_fields() {
    let compilation = compile(
        "\
#Content
title : str
created : created

#Content -> Article
body : text
",
    );
    assert_compiled(&compilation)
        .clean()
        .collection("Article", |c| {
            c.base_count(1)
                .field_names(&["title", "created", "body"]);
        })
        .collection("Content", |c| {
            c.base_count(0).field_names(&["title", "created"]);
        });
}

#[test]
fn override_replaces_in_place_not_duplicated() {
    let compilation = compile(
        "\
#Content
title : str
created : created

#Content -> Article
title : str(200)
body : text
",
    );
    assert_compiled(&compilation).clean().collection("Article", |c| {
        // The overriding declaration keeps the base position but supplies
        // the derived definition.
        c.field_names(&["title", "created", "body"])
            .field("title", |f| {
                f.origin_index(1);
            })
            .field("created", |f| {
                f.origin_index(0);
            });
    });
}

#[test]
fn bases_may_be_declared_after_derived() {
    let compilation = compile(
        "\
#Content -> Article
body : text

#Content
title : str
",
    );
    assert_compiled(&compilation).clean().collection("Article", |c| {
        c.field_names(&["title", "body"]);
    });
}

#[test]
fn two_collection_cycle_is_one_error() {
    let compilation = compile(
        "\
#B -> A
x : int

#A -> B
y : int
",
    );
    assert_compiled(&compilation)
        .error_count(1)
        .has_error_containing("inheritance cycle");
}

#[test]
fn long_cycle_terminates_with_one_error() {
    let compilation = compile(
        "\
#D -> A
a : int

#A -> B
b : int

#B -> C
c : int

#C -> D
d : int
",
    );
    assert_compiled(&compilation)
        .error_count(1)
        .has_error_containing("inheritance cycle");
}

#[test]
fn cascading_inheritance_arrow_is_accepted() {
    let compilation = compile(
        "\
#Content
title : str

#Content ~> Article
body : text
",
    );
    assert_compiled(&compilation).clean().collection("Article", |c| {
        c.field_names(&["title", "body"]);
    });
}

#[test]
fn unknown_base_is_an_error_but_fields_survive() {
    let compilation = compile(
        "\
#Ghost -> Article
title : str
",
    );
    assert_compiled(&compilation)
        .has_error_containing("unknown base collection 'Ghost'")
        .collection("Article", |c| {
            c.field_names(&["title"]);
        });
}

#[test]
fn page_inherits_template_and_fields_child_wins() {
    let compilation = compile(
        "\
[base-page]: /things/
template: base.html
count= objects.count()
extra= base_extra()

[base-page -> detail-page]: ./detail/
count= objects.detail_count()
",
    );
    assert_compiled(&compilation)
        .clean()
        .page("detail-page", |p| {
            p.url("/things/detail/")
                .computed_field_names(&["count", "extra"]);
        });

    let ir = compilation.resolved().unwrap();
    let detail = ir.page_named("detail-page").unwrap();
    assert!(detail.body.fields[0].code.text.contains("detail_count"));
    assert!(matches!(
        detail.body.template,
        Some(veld::ast::TemplateRef::Path(ref path)) if path == "base.html"
    ));
}

#[test]
fn relative_url_without_base_is_an_error() {
    let compilation = compile(
        "\
[orphan]: ./sub/
template: orphan.html
",
    );
    assert_compiled(&compilation).has_error_containing("relative URL requires a base page");
}

#[test]
fn composed_url_params_are_collected_in_order() {
    let compilation = compile(
        "\
[articles]: /articles/<category>/
template: list.html

[articles -> article-detail]: ./<slug>/
template: detail.html
",
    );
    assert_compiled(&compilation)
        .clean()
        .page("article-detail", |p| {
            p.url("/articles/<category>/<slug>/")
                .url_params(&["category", "slug"]);
        });
}

#[test]
fn duplicate_url_param_after_composition_is_an_error() {
    let compilation = compile(
        "\
[articles]: /articles/<slug>/
template: list.html

[articles -> article-detail]: ./<slug>/
template: detail.html
",
    );
    assert_compiled(&compilation).has_error_containing("duplicate URL parameter '<slug>'");
}

#[test]
fn page_alias_resolves_like_the_name() {
    let compilation = compile(
        "\
[article-list as list]: /articles/
template: list.html
",
    );
    assert_compiled(&compilation)
        .clean()
        .page("list", |p| {
            p.url("/articles/");
        })
        .page("article-list", |p| {
            p.url("/articles/");
        });
}
