//! Error handling tests for the expression and directive-argument parsers.

use templar_ast::{CompileError, ErrorKind};
use templar_parser::{
    DefineForm, ParseErrorKind, parse_assert_args, parse_define_head, parse_expression,
    parse_let_bindings, parse_namespace, parse_variable_name,
};

fn expect_error(source: &str) -> templar_parser::ParseError {
    match parse_expression(source, 0) {
        Ok(expr) => panic!("Expected parse error, got {:?}", expr),
        Err(e) => e,
    }
}

// =============================================================================
// Expressions
// =============================================================================

#[test]
fn test_empty_expression() {
    let err = expect_error("   ");
    assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
    assert!(err.message.contains("expected an expression"));
}

#[test]
fn test_unclosed_paren_is_eof() {
    let err = expect_error("(1 + 2");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
}

#[test]
fn test_trailing_tokens() {
    let err = expect_error("a b");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedToken);
    assert_eq!((err.span.start, err.span.end), (2, 3));
}

#[test]
fn test_invalid_token_is_positioned() {
    let err = parse_expression("a + @", 100).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
    assert_eq!(err.span.start, 104);
}

#[test]
fn test_ternary_missing_colon() {
    let err = expect_error("a ? b");
    assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    assert!(err.message.contains("':'"));
}

#[test]
fn test_integer_overflow() {
    let err = expect_error("999999999999999999999999");
    assert_eq!(err.kind, ParseErrorKind::InvalidSyntax);
}

#[test]
fn test_parse_error_converts_to_syntax_compile_error() {
    let err: CompileError = expect_error("1 +").into();
    assert_eq!(err.kind, ErrorKind::Syntax);
}

// =============================================================================
// Directive arguments
// =============================================================================

#[test]
fn test_let_bindings() {
    let bindings = parse_let_bindings("a = 1, b = a + 1", 0).unwrap();
    let names: Vec<_> = bindings.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_let_invalid_name() {
    let err = parse_let_bindings("3 = 2", 0).unwrap_err();
    assert_eq!(err.kind, ParseErrorKind::InvalidName);
    let err: CompileError = err.into();
    assert_eq!(err.kind, ErrorKind::InvalidVariableName);
}

#[test]
fn test_define_forms() {
    let head = parse_define_head("total = price * 2", 0).unwrap();
    assert!(matches!(head.form, DefineForm::Value { lenient: false, .. }));

    let head = parse_define_head("total =? price * 2", 0).unwrap();
    assert!(matches!(head.form, DefineForm::Value { lenient: true, .. }));

    let head = parse_define_head("total = ? price", 0).unwrap();
    assert!(matches!(head.form, DefineForm::Value { lenient: true, .. }));

    let head = parse_define_head("banner", 0).unwrap();
    assert_eq!(head.form, DefineForm::Body { params: None });

    let head = parse_define_head("greet(name, title)", 0).unwrap();
    match head.form {
        DefineForm::Body { params: Some(params) } => {
            let names: Vec<_> = params.iter().map(|(n, _)| n.as_str()).collect();
            assert_eq!(names, vec!["name", "title"]);
        }
        other => panic!("expected parameter list, got {:?}", other),
    }
}

#[test]
fn test_define_rejects_trailing_tokens() {
    assert!(parse_define_head("a(b) c", 0).is_err());
}

#[test]
fn test_assert_args() {
    let (_, message) = parse_assert_args("count > 0, 'need items'", 0).unwrap();
    assert!(message.is_some());
    let (_, message) = parse_assert_args("ok", 0).unwrap();
    assert!(message.is_none());
}

#[test]
fn test_variable_and_namespace_names() {
    assert_eq!(parse_variable_name(" x ", 5).unwrap().0, "x");
    assert!(parse_variable_name("x y", 0).is_err());
    assert_eq!(parse_namespace("System.Text", 0).unwrap().0, "System.Text");
    assert!(parse_namespace("System.", 0).is_err());
}
