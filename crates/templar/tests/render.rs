//! Expressions in templates: output, coercion, strictness and errors.

use templar::{
    CompileOptions, Engine, Error, ErrorKind, IntKind, NumberFormat, Options, Record, RenderError, ResolverChain,
    Value, ValueKind, compile_expression, render,
};

fn record(entries: &[(&str, Value)]) -> Value {
    Value::object(entries.iter().cloned().collect::<Record>())
}

fn compile_kind(source: &str, context: &Value) -> ValueKind {
    compile_expression(source, &ResolverChain::new(), &CompileOptions::default(), Some(context.kind()))
        .unwrap()
        .kind
}

#[test]
fn test_literal_text_and_expressions() {
    let ctx = record(&[("name", Value::from("Ada")), ("n", Value::from(3))]);
    let out = render("Hello $$name$$, you have $$n * 2$$ items.", &ctx, false).unwrap();
    assert_eq!(out, "Hello Ada, you have 6 items.");
    assert_eq!(render("no markers at all", &ctx, true).unwrap(), "no markers at all");
}

#[test]
fn test_truthiness_table() {
    let cases = [
        (Value::Null, "F"),
        (Value::from(false), "F"),
        (Value::from(true), "T"),
        (Value::from(0), "F"),
        (Value::from(-2), "T"),
        (Value::from(0.0), "F"),
        (Value::from(0.5), "T"),
        (Value::from(""), "F"),
        (Value::from("x"), "T"),
        (Value::list(Vec::<Value>::new()), "T"),
    ];
    for (value, expected) in cases {
        let ctx = record(&[("v", value.clone())]);
        let out = render("$$#if v$$T$$#else$$F$$/if$$", &ctx, true).unwrap();
        assert_eq!(out, expected, "truthiness of {:?}", value);
    }
}

#[test]
fn test_numeric_promotion() {
    let ctx = record(&[
        ("small", Value::from(2i16)),
        ("int", Value::from(40i32)),
        ("unsigned", Value::from(4_000_000_000u32)),
    ]);
    assert_eq!(compile_kind("small + int", &ctx), ValueKind::Int(IntKind::I32));
    assert_eq!(compile_kind("unsigned + int", &ctx), ValueKind::Int(IntKind::I64));
    assert_eq!(render("$$small + int$$|$$unsigned + int$$", &ctx, true).unwrap(), "42|4000000040");
}

#[test]
fn test_string_concatenation_and_equality() {
    let ctx = record(&[("n", Value::from(7)), ("s", Value::from("7"))]);
    assert_eq!(render("$$\"n=\" + n$$", &ctx, true).unwrap(), "n=7");
    assert_eq!(render("$$n == s$$ $$null == null$$ $$s == null$$", &ctx, true).unwrap(), "true true false");
}

#[test]
fn test_unresolved_name_lenient_and_strict() {
    let ctx = record(&[]);
    assert_eq!(render("[$$foo$$]", &ctx, false).unwrap(), "[]");

    let err = render("ab\n[$$foo$$]", &ctx, true).unwrap_err();
    let compile = err.as_compile().unwrap();
    assert_eq!(compile.kind, ErrorKind::UndefinedName);
    assert_eq!(compile.location(), Some((2, 4)));
    assert!(err.to_string().contains("foo"));
}

#[test]
fn test_late_bound_names_fail_at_render_when_strict() {
    let engine = Engine::new().with_options(Options::strict());
    let template = engine.parse("$$title$$").unwrap();
    let page = record(&[("title", Value::from("Home"))]);
    assert_eq!(template.render(&page).unwrap(), "Home");

    let err = template.render(&Value::from(5)).unwrap_err();
    assert_eq!(
        err,
        Error::Render(RenderError::UnresolvedName {
            name: "title".into()
        })
    );
}

#[test]
fn test_template_renders_many_contexts() {
    let template = Engine::new().parse("<$$a ?? \"-\"$$>").unwrap();
    let first = template.render(&record(&[("a", Value::from(1))])).unwrap();
    let second = template.render(&record(&[("a", Value::Null)])).unwrap();
    assert_eq!((first.as_str(), second.as_str()), ("<1>", "<->"));
}

#[test]
fn test_compilation_is_deterministic() {
    let source = "$$#each xs$$$$$0 * 2$$,$$/each$$$$#define t = 3$$$$t$$";
    let ctx = record(&[("xs", Value::list([Value::from(1), Value::from(2)]))]);
    let engine = Engine::new();
    let a = engine.parse_for(source, ctx.kind()).unwrap();
    let b = engine.parse_for(source, ctx.kind()).unwrap();
    assert_eq!(a.slot_count(), b.slot_count());
    let out = a.render(&ctx).unwrap();
    assert_eq!(out, b.render(&ctx).unwrap());
    assert_eq!(out, "2,4,3");
}

#[test]
fn test_runtime_failures_surface_as_render_errors() {
    let ctx = record(&[("zero", Value::from(0))]);
    let err = render("$$10 / zero$$", &ctx, true).unwrap_err();
    assert_eq!(err.as_render(), Some(&RenderError::DivideByZero));
}

#[test]
fn test_syntax_errors_are_positioned() {
    let ctx = record(&[]);
    let err = render("abc $$1 +$$", &ctx, false).unwrap_err();
    let compile = err.as_compile().unwrap();
    assert_eq!(compile.kind, ErrorKind::Syntax);
    assert_eq!(compile.location().map(|(line, _)| line), Some(1));

    let err = render("abc $$ $$", &ctx, false).unwrap_err();
    assert_eq!(err.as_compile().unwrap().kind, ErrorKind::Syntax);

    let err = render("abc $$name", &ctx, false).unwrap_err();
    assert_eq!(err.as_compile().unwrap().kind, ErrorKind::UnterminatedRegion);

    let err = render("x$$/if$$", &ctx, false).unwrap_err();
    assert_eq!(err.as_compile().unwrap().kind, ErrorKind::Syntax);
}

#[test]
fn test_number_format_is_pinned_per_invocation() {
    let ctx = record(&[("x", Value::from(1.5))]);
    let options = Options {
        number_format: NumberFormat {
            decimal_separator: ',',
            group_separator: None,
        },
        ..Options::default()
    };
    let localized = Engine::new().with_options(options);
    assert_eq!(localized.render("$$x$$", &ctx).unwrap(), "1,5");
    assert_eq!(Engine::new().render("$$x$$", &ctx).unwrap(), "1.5");
}

#[test]
fn test_case_insensitive_names() {
    let ctx = record(&[("Title", Value::from("Intro"))]);
    let options = Options {
        strict: true,
        case_sensitive: false,
        ..Options::default()
    };
    let engine = Engine::new().with_options(options);
    assert_eq!(engine.render("$$title$$/$$TITLE$$", &ctx).unwrap(), "Intro/Intro");
    assert!(render("$$title$$", &ctx, true).is_err());
}

#[test]
fn test_compile_errors_show_excerpt_and_caret() {
    let ctx = record(&[]);
    let err = render("Hi $$1 + $$ there", &ctx, true).unwrap_err();
    let text = err.to_string();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("error: syntax error: "));
    assert_eq!(lines[1], "  --> 1:9");
    assert_eq!(lines[3], "  1 | Hi $$1 + $$ there");
    assert_eq!(lines[4], format!("    | {}^", " ".repeat(8)));
}
