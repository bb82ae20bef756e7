//! Structural validation: annotation cardinality, field-reference checks,
//! status codes, and URL segment hygiene.

use rstest::rstest;
use veld::testing::{assert_compiled, compile};

#[rstest]
#[case("@tree\n@tree\n", "'@tree' may appear only once")]
#[case("@api\n@api\n", "'@api' may appear only once")]
#[case(
    "@rest { fields: * }\n@rest { fields: title }\n",
    "duplicate '@rest'; repeat it with distinct descriptors"
)]
#[case(
    "@rest.v1 { fields: * }\n@rest.v1 { fields: title }\n",
    "duplicate '@rest.v1'; descriptors must be distinct"
)]
fn duplicate_model_annotations(#[case] annotations: &str, #[case] message: &str) {
    let source = format!("#Article\ntitle : str\n{}", annotations);
    let compilation = compile(&source);
    assert_compiled(&compilation).has_error_containing(message);
}

#[test]
fn rest_with_distinct_descriptors_is_fine() {
    let compilation = compile(
        "\
#Article
title : str
@rest.v1 { fields: * }
@rest.v2 { fields: title }
",
    );
    assert_compiled(&compilation).clean();
}

#[test]
fn repeatable_annotations_are_not_limited() {
    let compilation = compile(
        "\
#Article
title : str
@mixin(common.TimestampMixin)
@mixin(common.AuditMixin)
",
    );
    assert_compiled(&compilation).clean();
}

#[test]
fn crud_without_target_is_an_error() {
    let compilation = compile(
        "\
[things]: /things/
@crud {
    fields: *
}
",
    );
    assert_compiled(&compilation)
        .error_count(1)
        .has_error_containing("@crud requires a leading #Model target");
}

#[rstest]
#[case(99)]
#[case(600)]
#[case(7)]
fn out_of_range_error_status_is_rejected(#[case] status: u16) {
    let source = format!(
        "[errors]\n@error({}) {{\n    return render(request)\n}}\n",
        status
    );
    let compilation = compile(&source);
    assert_compiled(&compilation)
        .has_error_containing(&format!("invalid HTTP status {}", status));
}

#[test]
fn duplicate_choice_key_is_an_error() {
    let compilation = compile(
        "\
#Article
status : str(16, draft: \"Draft\", draft: \"Again\")
",
    );
    assert_compiled(&compilation).has_error_containing("duplicate choice key 'draft'");
}

#[test]
fn duplicate_image_size_is_an_error() {
    let compilation = compile(
        "\
#Article
photo : image(thumb: 100x100, thumb: 200x200)
",
    );
    assert_compiled(&compilation).has_error_containing("duplicate image size 'thumb'");
}

#[test]
fn slug_source_must_exist() {
    let compilation = compile(
        "\
#Article
title : str
slug : slug(headline)
",
    );
    assert_compiled(&compilation)
        .has_error_containing("slug source 'headline' is not a field");
}

#[test]
fn slug_source_may_come_from_a_base() {
    let compilation = compile(
        "\
#Titled
title : str

#Titled -> Article
slug : slug(title)
",
    );
    assert_compiled(&compilation).clean();
}

#[test]
fn date_tree_field_must_be_a_date() {
    let compilation = compile(
        "\
#Article
title : str
published : date
@date_tree(published)
",
    );
    assert_compiled(&compilation).clean();

    let bad = compile(
        "\
#Article
title : str
@date_tree(title)
",
    );
    assert_compiled(&bad).has_error_containing("@date_tree field 'title' is not a date field");
}

#[test]
fn date_tree_accepts_timestamp_fields() {
    let compilation = compile(
        "\
#Article
created : created
@date_tree(created)
",
    );
    assert_compiled(&compilation).clean();
}

#[test]
fn sortable_field_must_exist() {
    let compilation = compile(
        "\
#Article
title : str
@sortable(position)
",
    );
    assert_compiled(&compilation).has_error_containing("@sortable names unknown field 'position'");
}

#[test]
fn order_names_are_checked_against_effective_fields() {
    let compilation = compile(
        "\
#Article
title : str
@order(-missing)
",
    );
    assert_compiled(&compilation).has_error_containing("@order names unknown field 'missing'");
}

#[test]
fn url_segments_reject_unsafe_characters() {
    let compilation = compile(
        "\
[bad]: /spaced path/
template: bad.html
",
    );
    assert_compiled(&compilation).has_error_containing("invalid URL segment");
}

#[test]
fn skipped_and_overridden_view_is_a_warning() {
    let compilation = compile(
        "\
#Article
title : str

[articles]: /articles/
@crud {
    #Article
    skip: delete
    delete: {
        template: gone.html
    }
}
",
    );
    assert_compiled(&compilation)
        .no_errors()
        .has_warning_containing("'delete' is both skipped and overridden");
}

#[test]
fn distinct_crud_descriptors_coexist() {
    let compilation = compile(
        "\
#Article
title : str

[articles]: /articles/
@crud_list.main {
    #Article
}
@crud_list.archive {
    #Article
}
",
    );
    assert_compiled(&compilation).clean().page("articles", |p| {
        p.annotation_count(2);
    });
}
