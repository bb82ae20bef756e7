//! Page bodies: templates, computed fields, functions, and the page
//! annotation set (@stream, @menu, handlers, @error, @auth, @priority).

use veld::ast::TemplateRef;
use veld::ir::{ResolvedMenuTarget, ResolvedPageAnnotation};
use veld::testing::{assert_compiled, compile};

#[test]
fn template_path_and_inline_code_forms() {
    let compilation = compile(
        "\
[plain]: /plain/
template: pages/plain.html

[dynamic]: /dynamic/
template: = pick_template(request)
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let plain = ir.page_named("plain").unwrap();
    assert!(matches!(
        plain.body.template,
        Some(TemplateRef::Path(ref path)) if path == "pages/plain.html"
    ));
    let dynamic = ir.page_named("dynamic").unwrap();
    match &dynamic.body.template {
        Some(TemplateRef::Code(block)) => {
            assert_eq!(block.text, "pick_template(request)");
        }
        other => panic!("expected inline template code, got {:?}", other),
    }
}

#[test]
fn computed_fields_and_functions() {
    let compilation = compile(
        "\
[dashboard]: /dashboard/
total= Order.objects.count()
recent(days)= Order.objects.recent(days)
refresh() {
    cache.clear()
    return redirect(request.path)
}
",
    );
    assert_compiled(&compilation)
        .clean()
        .page("dashboard", |p| {
            p.computed_field_names(&["total"]);
        });

    let ir = compilation.resolved().unwrap();
    let page = ir.page_named("dashboard").unwrap();
    assert_eq!(page.body.functions.len(), 2);
    assert_eq!(page.body.functions[0].name, "recent");
    assert_eq!(page.body.functions[0].args, vec!["days".to_string()]);
    assert_eq!(page.body.functions[1].name, "refresh");
    assert!(page.body.functions[1].args.is_empty());
    let body = page.body.functions[1].body.as_ref().unwrap();
    assert!(body.text.contains("cache.clear()"));
}

#[test]
fn stream_targets_resolve_to_collections() {
    let compilation = compile(
        "\
#Article
title : str

[feed]: /feed/
@stream { #Article }
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let feed = ir.page_named("feed").unwrap();
    let ResolvedPageAnnotation::Stream { targets, .. } = &feed.body.annotations[0] else {
        panic!("expected a stream annotation");
    };
    assert_eq!(targets.len(), 1);
    assert!(targets[0].is_resolved());
}

#[test]
fn menu_entries_bind_pages_and_keep_urls() {
    let compilation = compile(
        "\
[home]: /
template: home.html

[site]: /site/
@menu {
    \"Home\": home
    \"Docs\": \"https://example.com/docs\"
}
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let site = ir.page_named("site").unwrap();
    let ResolvedPageAnnotation::Menu(menu) = &site.body.annotations[0] else {
        panic!("expected a menu annotation");
    };
    assert_eq!(menu.items.len(), 2);
    assert_eq!(menu.items[0].label, "Home");
    assert!(matches!(menu.items[0].target, ResolvedMenuTarget::Page(_)));
    assert!(matches!(
        menu.items[1].target,
        ResolvedMenuTarget::Url(ref url) if url == "https://example.com/docs"
    ));
}

#[test]
fn menu_entry_to_unknown_page_is_an_error() {
    let compilation = compile(
        "\
[site]: /site/
@menu {
    \"Home\": nowhere
}
",
    );
    assert_compiled(&compilation)
        .error_count(1)
        .has_error_containing("menu entry targets unknown page 'nowhere'");
}

#[test]
fn get_and_post_handlers_carry_raw_bodies() {
    let compilation = compile(
        "\
[submit]: /submit/
@get {
    return render(request, \"form.html\")
}
@post {
    form = SubmitForm(request.POST)
    if form.is_valid():
        form.save()
}
",
    );
    assert_compiled(&compilation).clean().page("submit", |p| {
        p.annotation_count(2);
    });

    let ir = compilation.resolved().unwrap();
    let submit = ir.page_named("submit").unwrap();
    let ResolvedPageAnnotation::Post(body) = &submit.body.annotations[1] else {
        panic!("expected a post handler");
    };
    assert!(body.text.contains("form.is_valid()"));
}

#[test]
fn error_annotation_keeps_status_and_body() {
    let compilation = compile(
        "\
[errors]
@error(404) {
    return render(request, \"404.html\")
}
@error(500) {
    return render(request, \"500.html\")
}
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let page = ir.page_named("errors").unwrap();
    let statuses: Vec<u16> = page
        .body
        .annotations
        .iter()
        .map(|ann| match ann {
            ResolvedPageAnnotation::Error { status, .. } => *status,
            other => panic!("expected error annotations, got {:?}", other),
        })
        .collect();
    assert_eq!(statuses, vec![404, 500]);
}

#[test]
fn auth_and_priority_are_carried() {
    let compilation = compile(
        "\
[admin-area]: /admin-area/
template: admin.html
@auth.admin
@priority
",
    );
    assert_compiled(&compilation).clean();

    let ir = compilation.resolved().unwrap();
    let page = ir.page_named("admin-area").unwrap();
    assert!(matches!(
        page.body.annotations[0],
        ResolvedPageAnnotation::Auth { descriptor: Some(ref d) } if d == "admin"
    ));
    assert!(matches!(
        page.body.annotations[1],
        ResolvedPageAnnotation::Priority
    ));
}

#[test]
fn page_without_url_is_allowed() {
    let compilation = compile(
        "\
[fragment]
template: partials/fragment.html
",
    );
    assert_compiled(&compilation).clean().page("fragment", |p| {
        p.no_url();
    });
}

#[test]
fn crud_target_field_survives_into_the_ir() {
    let compilation = compile(
        "\
#User
name : str

#Article
title : str
author : one(#User)

[by-author]: /by-author/
@crud_list {
    #Article.author
}
",
    );
    assert_compiled(&compilation).clean().page("by-author", |p| {
        p.crud(|crud| {
            assert!(crud.target.is_resolved());
            assert_eq!(crud.target_field.as_deref(), Some("author"));
        });
    });
}

#[test]
fn crud_fields_expand_against_the_target() {
    let compilation = compile(
        "\
#Article
title : str
body : text
internal : bool

[articles]: /articles/
@crud_list {
    #Article
    fields: *, -internal
}
",
    );
    assert_compiled(&compilation).clean().page("articles", |p| {
        p.crud(|crud| {
            assert_eq!(
                crud.fields.as_deref(),
                Some(&["title".to_string(), "body".to_string()][..])
            );
        });
    });
}
