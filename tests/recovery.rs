//! Error recovery: one bad line or block must not take its neighbors down,
//! and every recovery leaves a diagnostic behind.

use veld::diagnostics::Severity;
use veld::testing::{assert_compiled, compile};

#[test]
fn bad_field_line_keeps_the_rest_of_the_collection() {
    let compilation = compile(
        "\
#Article
title : str
: : :
body : text
",
    );
    assert_compiled(&compilation)
        .has_error_containing("malformed")
        .collection("Article", |c| {
            c.field_names(&["title", "body"]);
        });
}

#[test]
fn bad_block_does_not_poison_its_neighbors() {
    let compilation = compile(
        "\
#Before
a : str

%%% not a declaration at all

#After
b : str
",
    );
    assert_compiled(&compilation)
        .collection("Before", |c| {
            c.field_names(&["a"]);
        })
        .collection("After", |c| {
            c.field_names(&["b"]);
        });
    assert!(compilation.has_errors());
}

#[test]
fn stray_top_level_annotation_is_reported() {
    let compilation = compile(
        "\
@admin { list: a }

#Article
a : str
",
    );
    assert_compiled(&compilation)
        .has_error_containing("annotation outside of a collection or page")
        .collection("Article", |c| {
            c.field_names(&["a"]);
        });
}

#[test]
fn import_after_a_declaration_is_reported() {
    let compilation = compile(
        "\
#Article
title : str

from django.contrib.auth.models import User
",
    );
    assert_compiled(&compilation)
        .has_error_containing("imports must appear before the first declaration");
}

#[test]
fn unterminated_raw_block_is_a_lexer_error() {
    let compilation = compile(
        "\
[page]: /page/
@get {
    return render(request)
",
    );
    assert_compiled(&compilation).has_error_containing("unterminated raw code block");
}

#[test]
fn unterminated_string_is_reported_and_lexing_continues() {
    let compilation = compile(
        "\
#Article
title : str \"Title
body : text
",
    );
    assert_compiled(&compilation)
        .has_error_containing("unterminated string literal")
        .collection("Article", |c| {
            c.field("body", |f| {
                f.kind("text");
            });
        });
}

#[test]
fn comments_are_transparent_everywhere() {
    let compilation = compile(
        "\
// leading comment
#Article // trailing comment
// between header and fields
title : str // after a field
body : text
",
    );
    assert_compiled(&compilation).clean().collection("Article", |c| {
        c.field_names(&["title", "body"]);
    });
}

#[test]
fn duplicate_declaration_keeps_the_first() {
    let compilation = compile(
        "\
#Thing
a : str

#Thing
b : str
",
    );
    assert_compiled(&compilation)
        .has_error_containing("already declared")
        .collection("Thing", |c| {
            c.field_names(&["a"]);
        });
}

#[test]
fn collection_and_page_share_one_namespace() {
    let compilation = compile(
        "\
#home
a : str

[home]: /
template: home.html
",
    );
    assert_compiled(&compilation).has_error_containing("already declared as a collection");
}

#[test]
fn every_recovery_diagnostic_is_an_error_with_a_span() {
    let compilation = compile(
        "\
#Article
: : :
",
    );
    let errors: Vec<_> = compilation
        .diagnostics()
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .collect();
    assert!(!errors.is_empty());
    for diag in errors {
        assert!(diag.span.start <= diag.span.end);
    }
}
