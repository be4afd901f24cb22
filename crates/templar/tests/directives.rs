//! Built-in directives, scope discipline and custom directives.

use std::sync::Arc;
use templar::{
    BodyRule, CompileResult, Compiler, Directive, DynamicVariables, EnumInfo, Engine, ErrorKind, IntKind,
    Invocation, Options, Record, Registry, RenderError, Step, TypeRegistry, Value, render,
};

fn record(entries: &[(&str, Value)]) -> Value {
    Value::object(entries.iter().cloned().collect::<Record>())
}

fn numbers(items: &[i32]) -> Value {
    Value::list(items.iter().map(|&n| Value::from(n)))
}

fn compile_error(source: &str, ctx: &Value, strict: bool) -> ErrorKind {
    render(source, ctx, strict).unwrap_err().as_compile().unwrap().kind
}

fn render_error(source: &str, ctx: &Value) -> RenderError {
    render(source, ctx, false).unwrap_err().as_render().unwrap().clone()
}

// === if ===

#[test]
fn test_if_elif_else_chain() {
    let source = "$$#if n > 10$$big$$#elif n > 5$$mid$$#elif n > 2$$low$$#else$$tiny$$/if$$";
    for (n, expected) in [(20, "big"), (7, "mid"), (3, "low"), (1, "tiny")] {
        let ctx = record(&[("n", Value::from(n))]);
        assert_eq!(render(source, &ctx, true).unwrap(), expected);
    }
    let ctx = record(&[("n", Value::from(0))]);
    assert_eq!(render("[$$#if n$$x$$/if$$]", &ctx, true).unwrap(), "[]");
}

#[test]
fn test_if_predicates_short_circuit() {
    let ctx = record(&[("zero", Value::from(0))]);
    let out = render("$$#if true$$a$$#elif 1 / zero$$b$$/if$$", &ctx, true).unwrap();
    assert_eq!(out, "a");
}

#[test]
fn test_if_structure_errors() {
    let ctx = record(&[("a", Value::from(true)), ("b", Value::from(false))]);
    assert_eq!(compile_error("$$#if$$x$$/if$$", &ctx, false), ErrorKind::Syntax);
    assert_eq!(compile_error("$$#if a$$$$#else$$x$$/if$$", &ctx, false), ErrorKind::Syntax);
    assert_eq!(
        compile_error("$$#if a$$x$$#else$$y$$#elif b$$z$$/if$$", &ctx, false),
        ErrorKind::Syntax
    );
    assert_eq!(
        compile_error("$$#if a$$x$$#else$$y$$#else$$z$$/if$$", &ctx, false),
        ErrorKind::Syntax
    );
    assert_eq!(compile_error("$$#if a$$x", &ctx, false), ErrorKind::UnterminatedRegion);
    assert_eq!(compile_error("$$#else$$", &ctx, false), ErrorKind::Syntax);
}

#[test]
fn test_predicates_are_lenient_unless_configured() {
    let ctx = record(&[]);
    assert_eq!(render("$$#if missing$$x$$#else$$y$$/if$$", &ctx, true).unwrap(), "y");

    let options = Options {
        lenient_predicates: false,
        ..Options::strict()
    };
    let err = Engine::new()
        .with_options(options)
        .render("$$#if missing$$x$$/if$$", &ctx)
        .unwrap_err();
    assert_eq!(err.as_compile().unwrap().kind, ErrorKind::UndefinedName);
}

// === each ===

#[test]
fn test_each_with_else() {
    let source = "$$#each items$$<$$$0$$>$$#else$$none$$/each$$";
    let full = record(&[("items", numbers(&[1, 2, 3]))]);
    let empty = record(&[("items", numbers(&[]))]);
    let missing = record(&[("items", Value::Null)]);
    assert_eq!(render(source, &full, true).unwrap(), "<1><2><3>");
    assert_eq!(render(source, &empty, true).unwrap(), "none");
    assert_eq!(render(source, &missing, true).unwrap(), "none");
}

#[test]
fn test_each_element_context_and_outer_reference() {
    let people = Value::list([
        record(&[("name", Value::from("Ada"))]),
        record(&[("name", Value::from("Alan"))]),
    ]);
    let ctx = record(&[("people", people), ("sep", Value::from(";"))]);
    let out = render("$$#each people$$$$name$$$$$1.sep$$$$/each$$", &ctx, false).unwrap();
    assert_eq!(out, "Ada;Alan;");
}

#[test]
fn test_each_rejects_scalars() {
    let ctx = record(&[("flag", Value::from(true))]);
    assert_eq!(
        compile_error("$$#each flag$$x$$/each$$", &ctx, false),
        ErrorKind::TypeMismatch
    );
}

// === block / let ===

#[test]
fn test_block_defines_revert() {
    let ctx = record(&[]);
    let source = "$$#block$$$$#define y = 5$$$$y$$$$/block$$[$$y$$]";
    assert_eq!(render(source, &ctx, false).unwrap(), "5[]");
    assert_eq!(compile_error(source, &ctx, true), ErrorKind::UndefinedName);
}

#[test]
fn test_block_switches_context() {
    let ctx = record(&[
        ("person", record(&[("name", Value::from("Ada"))])),
        ("title", Value::from("Dr")),
    ]);
    let out = render("$$#block person$$$$name$$ ($$$1.title$$)$$/block$$", &ctx, true).unwrap();
    assert_eq!(out, "Ada (Dr)");
}

#[test]
fn test_let_binds_for_its_body() {
    let ctx = record(&[("x", Value::from(1))]);
    let out = render("$$#let x = x + 1, y = x * 10$$$$x$$,$$y$$$$/let$$;$$x$$", &ctx, true).unwrap();
    assert_eq!(out, "2,10;1");
}

#[test]
fn test_let_rebinding_is_rejected() {
    let ctx = record(&[]);
    let nested = "$$#let x = 1$$$$#let x = 2$$$$x$$$$/let$$$$/let$$";
    let through_block = "$$#let x = 1$$$$#block$$$$#define x = 2$$$$/block$$$$/let$$";
    let twice = "$$#let a = 1, a = 2$$$$a$$$$/let$$";
    for source in [nested, through_block, twice] {
        let err = render(source, &ctx, false).unwrap_err();
        let compile = err.as_compile().unwrap();
        assert_eq!(compile.kind, ErrorKind::ScopeViolation, "{}", source);
    }
    let err = render(nested, &ctx, false).unwrap_err();
    assert!(err.to_string().contains("already bound in a let context"));
}

// === define / undef ===

#[test]
fn test_define_value_writes_through_dynamic_root() {
    let vars = Arc::new(Record::new().with("first", "Ada"));
    let ctx = Value::Object(vars.clone());
    let out = render("$$#define full = first + \" Lovelace\"$$$$full$$", &ctx, true).unwrap();
    assert_eq!(out, "Ada Lovelace");
    assert_eq!(vars.get("full"), Some(Value::from("Ada Lovelace")));
}

#[test]
fn test_lenient_define() {
    let ctx = record(&[]);
    assert_eq!(render("$$#define x =? missing$$[$$x$$]", &ctx, true).unwrap(), "[]");
    assert_eq!(render("$$#define x = ? missing$$[$$x$$]", &ctx, true).unwrap(), "[]");
    assert_eq!(compile_error("$$#define x = missing$$", &ctx, true), ErrorKind::UndefinedName);
}

#[test]
fn test_define_body_is_rendered_once() {
    let vars = Arc::new(Record::new().with("title", "T"));
    let ctx = Value::Object(vars.clone());
    let out = render("$$#define banner$$== $$title$$ ==$$/define$$$$banner$$|$$banner$$", &ctx, true).unwrap();
    assert_eq!(out, "== T ==|== T ==");
    assert_eq!(vars.get("banner"), Some(Value::from("== T ==")));
}

#[test]
fn test_fragments_take_arguments() {
    let engine = Engine::new().with_options(Options::strict());
    let source = "$$#define greet(who, punct)$$Hello $$who$$$$punct$$$$/define$$$$greet(\"Ada\", \"!\")$$ $$greet(name, \"?\")$$";
    let ctx = record(&[("name", Value::from("Bob"))]);
    assert_eq!(engine.render(source, &ctx).unwrap(), "Hello Ada! Hello Bob?");

    let err = engine.render("$$#define f(a)$$$$a$$$$/define$$$$f()$$", &ctx).unwrap_err();
    assert_eq!(err.as_compile().unwrap().kind, ErrorKind::TypeMismatch);
}

#[test]
fn test_fragment_out_discards_compute_output() {
    let template = Engine::new()
        .parse("$$#define shout(x)$$$$#define up = x.to_upper()$$ignored$$#out$$$$up$$!$$/define$$[$$shout(\"hi\")$$]")
        .unwrap();
    assert_eq!(template.render(&Value::Null).unwrap(), "[HI!]");
}

#[test]
fn test_fragment_sees_context_of_its_definition() {
    let ctx = record(&[
        ("items", Value::list([record(&[("label", Value::from("a"))])])),
        ("label", Value::from("root")),
    ]);
    let out = render(
        "$$#define tag()$$<$$$0.label$$>$$/define$$$$#each items$$$$tag()$$$$$0.label$$$$/each$$",
        &ctx,
        false,
    )
    .unwrap();
    assert_eq!(out, "<root>a");
}

#[test]
fn test_fragment_parameter_rules() {
    let ctx = record(&[]);
    assert_eq!(
        compile_error("$$#define f(a, b, c, d, e, g)$$x$$/define$$", &ctx, false),
        ErrorKind::Syntax
    );
    assert_eq!(
        compile_error("$$#define f(a, a)$$x$$/define$$", &ctx, false),
        ErrorKind::Syntax
    );
    assert_eq!(
        compile_error("$$#define f(a)$$x$$#out$$y$$#out$$z$$/define$$", &ctx, false),
        ErrorKind::Syntax
    );
}

#[test]
fn test_undef_removes_define() {
    let engine = Engine::new().with_options(Options::strict());
    let template = engine.parse("$$#define a = 1$$$$a$$$$#undef a$$[$$a$$]").unwrap();
    let err = template.render(&Value::from(0)).unwrap_err();
    assert_eq!(err.as_render(), Some(&RenderError::UnresolvedName { name: "a".into() }));

    let vars = Arc::new(Record::new());
    let out = render("$$#define a = 1$$$$a$$$$#undef a$$[$$a$$]", &Value::Object(vars.clone()), false).unwrap();
    assert_eq!(out, "1[]");
    assert_eq!(vars.get("a"), None);
}

#[test]
fn test_undef_inside_block_hides_until_block_end() {
    let template = Engine::new()
        .parse("$$#define a = 1$$$$#block$$$$#undef a$$[$$a$$]$$/block$$$$a$$")
        .unwrap();
    assert_eq!(template.render(&Value::Null).unwrap(), "[]1");
}

#[test]
fn test_undef_errors() {
    let ctx = record(&[]);
    assert_eq!(compile_error("$$#undef zz$$", &ctx, false), ErrorKind::ScopeViolation);
    assert_eq!(
        compile_error("$$#let x = 1$$$$#undef x$$$$/let$$", &ctx, false),
        ErrorKind::ScopeViolation
    );
    assert_eq!(
        compile_error("$$#define f(p)$$$$#undef p$$$$/define$$", &ctx, false),
        ErrorKind::ScopeViolation
    );
}

// === text, diagnostics, pragma, using ===

#[test]
fn test_literal_and_comment() {
    let ctx = record(&[]);
    let out = render(
        "a$$#literal$$<$$b$$>$$/literal$$c$$#comment$$ $$#nope$$ $$/comment$$d",
        &ctx,
        true,
    )
    .unwrap();
    assert_eq!(out, "a<$$b$$>cd");
    assert_eq!(
        compile_error("$$#literal$$x$$#literal$$$$/literal$$", &ctx, false),
        ErrorKind::Syntax
    );
}

#[test]
fn test_assert_and_error() {
    let ctx = record(&[("n", Value::from(0))]);
    assert_eq!(
        render_error("$$#assert n > 1$$", &ctx),
        RenderError::AssertionFailed {
            message: "n > 1".into()
        }
    );
    assert_eq!(
        render_error("$$#assert n > 1, \"n is \" + n$$", &ctx),
        RenderError::AssertionFailed {
            message: "n is 0".into()
        }
    );
    assert_eq!(render("$$#assert n == 0$$ok", &ctx, true).unwrap(), "ok");

    assert_eq!(
        render_error("$$#error bad thing$$", &ctx),
        RenderError::Raised {
            message: "bad thing".into()
        }
    );
    assert_eq!(
        render_error("$$#error$$n is $$n$$$$/error$$", &ctx),
        RenderError::Raised {
            message: "n is 0".into()
        }
    );
}

#[test]
fn test_pragma_handler_can_stop_rendering() {
    let engine = Engine::new().with_pragma_handler(|text: &str| {
        if text == "halt" {
            templar::PragmaOutcome::Stop
        } else {
            templar::PragmaOutcome::Continue
        }
    });
    let ctx = record(&[]);
    assert_eq!(engine.render("a$$#pragma note$$b$$#pragma halt$$c", &ctx).unwrap(), "ab");
    assert_eq!(render("a$$#pragma anything$$b", &ctx, true).unwrap(), "ab");
}

#[test]
fn test_using_adds_implied_namespace() {
    let shade = EnumInfo::new("Shade", IntKind::I32)
        .with_namespace("Paint")
        .with_variant("Light", 1)
        .with_variant("Dark", 2)
        .build();
    let engine = Engine::new()
        .with_options(Options::strict())
        .with_types(TypeRegistry::new().with_enum(shade));
    let ctx = record(&[]);
    assert_eq!(engine.render("$$Paint.Shade.Dark$$", &ctx).unwrap(), "Dark");
    assert_eq!(engine.render("$$#using Paint$$$$Shade.Light$$", &ctx).unwrap(), "Light");
    assert!(engine.render("$$Shade.Light$$", &ctx).is_err());
}

#[test]
fn test_unknown_directive() {
    let ctx = record(&[]);
    assert_eq!(compile_error("$$#frobnicate$$", &ctx, false), ErrorKind::UnknownDirective);
}

// === custom directives ===

/// Renders its body in upper case.
struct Upper;

impl Directive for Upper {
    fn name(&self) -> &str {
        "upper"
    }

    fn body(&self, _args: &str) -> BodyRule {
        BodyRule::Nested
    }

    fn compile(&self, cx: &mut Compiler<'_>, invocation: &Invocation<'_>) -> CompileResult<Step> {
        invocation.expect_no_args()?;
        let body = cx.compile_section(&invocation.sections()[0])?;
        Ok(Step::render(move |env| {
            let text = env.capture(|env| body.run(env))?;
            env.write(&text.to_uppercase());
            Ok(())
        }))
    }
}

#[test]
fn test_custom_directive() {
    let registry = Registry::standard_builder().register(Upper).unwrap().build();
    let engine = Engine::new().with_registry(registry);
    let ctx = record(&[("name", Value::from("ada"))]);
    let out = engine
        .render("$$#upper$$hi $$#if true$$$$name$$$$/if$$$$/upper$$!", &ctx)
        .unwrap();
    assert_eq!(out, "HI ADA!");
}

#[test]
fn test_registry_rejects_collisions() {
    struct Named(&'static str, &'static [&'static str]);

    impl Directive for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn reserved_words(&self) -> &[&'static str] {
            self.1
        }

        fn body(&self, _args: &str) -> BodyRule {
            BodyRule::None
        }

        fn compile(&self, _cx: &mut Compiler<'_>, _invocation: &Invocation<'_>) -> CompileResult<Step> {
            Ok(Step::empty())
        }
    }

    let cases: [(&'static str, &'static [&'static str]); 4] =
        [("each", &[]), ("elif", &[]), ("switch", &["if"]), ("switch", &["elif"])];
    for (name, words) in cases {
        let err = Registry::standard_builder().register(Named(name, words)).err().unwrap();
        assert_eq!(err.kind, ErrorKind::Registration, "#{} {:?}", name, words);
    }
    assert!(Registry::standard_builder().register(Named("switch", &["case", "else"])).is_ok());
}
