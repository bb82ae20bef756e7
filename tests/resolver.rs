//! Reference resolution: field-list expansion, relation binding across the
//! three target classes, partial-failure isolation, and idempotence.

use veld::resolve;
use veld::symbols::SymbolTable;
use veld::testing::{assert_compiled, compile};

#[test]
fn wildcard_expands_to_unselected_fields_in_order() {
    let compilation = compile(
        "\
#Article
a : str
b : str
c : str
d : str
@admin { list: b, * }
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let veld::ir::ResolvedModelAnnotation::Admin(admin) = &article.annotations[0] else {
        panic!("expected an admin annotation");
    };
    assert_eq!(
        admin.list.as_deref(),
        Some(
            &[
                "b".to_string(),
                "a".to_string(),
                "c".to_string(),
                "d".to_string()
            ][..]
        )
    );
}

#[test]
fn wildcard_with_excludes_keeps_the_rest() {
    let compilation = compile(
        "\
#Article
a : str
b : str
c : str
d : str
@admin { list: *, -a, -b }
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let veld::ir::ResolvedModelAnnotation::Admin(admin) = &article.annotations[0] else {
        panic!("expected an admin annotation");
    };
    assert_eq!(
        admin.list.as_deref(),
        Some(&["c".to_string(), "d".to_string()][..])
    );
}

#[test]
fn exclude_only_list_seeds_the_full_field_set() {
    let compilation = compile(
        "\
#Article
a : str
b : str
c : str
@admin { list: -b }
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let veld::ir::ResolvedModelAnnotation::Admin(admin) = &article.annotations[0] else {
        panic!("expected an admin annotation");
    };
    assert_eq!(
        admin.list.as_deref(),
        Some(&["a".to_string(), "c".to_string()][..])
    );
}

#[test]
fn glob_requires_a_relation_and_passes_through() {
    let compilation = compile(
        "\
#Author
name : str

#Article
title : str
author : one(#Author)
@admin { list: title, author.* }
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let article = ir.collection_named("Article").unwrap();
    let veld::ir::ResolvedModelAnnotation::Admin(admin) = &article.annotations[0] else {
        panic!("expected an admin annotation");
    };
    assert_eq!(
        admin.list.as_deref(),
        Some(&["title".to_string(), "author.*".to_string()][..])
    );
}

#[test]
fn glob_on_a_plain_field_is_an_error() {
    let compilation = compile(
        "\
#Article
title : str
@admin { list: title.* }
",
    );
    assert_compiled(&compilation)
        .has_error_containing("requires 'title' to be a relation field");
}

#[test]
fn anchored_reference_to_missing_collection_is_isolated() {
    let compilation = compile(
        "\
#User
name : str

#Article
title : str
author : one(#Nobody)

#Comment
text : str
owner : one(#User)
",
    );
    assert_compiled(&compilation)
        .error_count(1)
        .has_error_containing("unresolved reference '#Nobody'")
        .collection("Article", |c| {
            c.field("author", |f| {
                f.relation_unresolved();
            });
        })
        .collection("Comment", |c| {
            c.field("owner", |f| {
                f.relation_resolved();
            });
        });
}

#[test]
fn dotted_path_is_external_without_diagnostics() {
    let compilation = compile(
        "\
#Article
owner : one(auth.User)
tags : many(taggit.Tag)
",
    );
    assert_compiled(&compilation)
        .clean()
        .collection("Article", |c| {
            c.field("owner", |f| {
                f.relation_external("auth.User");
            })
            .field("tags", |f| {
                f.relation_external("taggit.Tag");
            });
        });
}

#[test]
fn imported_name_anchors_to_its_module() {
    let compilation = compile(
        "\
from django.contrib.auth.models import User

#Article
title : str
author : one(#User)
",
    );
    assert_compiled(&compilation)
        .clean()
        .collection("Article", |c| {
            c.field("author", |f| {
                f.relation_external("django.contrib.auth.models.User");
            });
        });
}

#[test]
fn import_alias_binds_the_local_name() {
    let compilation = compile(
        "\
from django.contrib.auth.models import User as AuthUser

#Article
author : one(#AuthUser)
",
    );
    assert_compiled(&compilation)
        .clean()
        .collection("Article", |c| {
            c.field("author", |f| {
                f.relation_external("django.contrib.auth.models.User");
            });
        });
}

#[test]
fn resolution_is_idempotent() {
    let source = "\
#Base
a : str

#Base -> Article
b : str
author : one(auth.User)
@admin { list: *, -a }

[article-list]: /articles/
@crud_list {
    #Article
    fields: *
}
";
    let compilation = compile(source);
    assert_compiled(&compilation).clean();

    let documents = compilation.documents();
    let (table, diags) = SymbolTable::build(documents);
    assert!(diags.is_empty());
    let (first, first_diags) = resolve::resolve(&table);
    let (second, second_diags) = resolve::resolve(&table);
    assert!(first_diags.is_empty() && second_diags.is_empty());
    assert_eq!(first, second);
}
