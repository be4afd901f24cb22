//! Operator precedence and associativity tests.

use templar_ast::foundation::{BinaryOp, FloatKind, IntKind, UnaryOp};
use templar_ast::{Expr, ExprKind, Literal};
use templar_parser::parse_expression;

fn parse(source: &str) -> Expr {
    parse_expression(source, 0).expect("Parse failed")
}

/// Render an expression as a fully parenthesised string.
fn sexpr(expr: &Expr) -> String {
    match &expr.kind {
        ExprKind::Literal(Literal::Int { value, .. }) => value.to_string(),
        ExprKind::Literal(Literal::Float { value, .. }) => value.to_string(),
        ExprKind::Literal(Literal::Bool(b)) => b.to_string(),
        ExprKind::Literal(Literal::Null) => "null".to_string(),
        ExprKind::Literal(Literal::Str(s)) => format!("{:?}", s),
        ExprKind::Literal(Literal::Regex { pattern, flags }) => format!("r/{}/{}", pattern, flags),
        ExprKind::Name(n) => n.clone(),
        ExprKind::Context(n) => format!("${}", n),
        ExprKind::Member { target, name, .. } => format!("{}.{}", sexpr(target), name),
        ExprKind::Index { target, index } => format!("{}[{}]", sexpr(target), sexpr(index)),
        ExprKind::Call { callee, args } => {
            let args: Vec<_> = args.iter().map(sexpr).collect();
            format!("{}({})", sexpr(callee), args.join(", "))
        }
        ExprKind::Unary { op, operand } => format!("({}{})", op, sexpr(operand)),
        ExprKind::Binary { op, left, right } => {
            format!("({} {} {})", sexpr(left), op, sexpr(right))
        }
        ExprKind::Conditional {
            condition,
            then_branch,
            else_branch,
        } => match else_branch {
            Some(e) => format!("({} ? {} : {})", sexpr(condition), sexpr(then_branch), sexpr(e)),
            None => format!("({} ? {})", sexpr(condition), sexpr(then_branch)),
        },
    }
}

// =============================================================================
// Arithmetic
// =============================================================================

#[test]
fn test_multiplication_binds_tighter_than_addition() {
    assert_eq!(sexpr(&parse("1 + 2 * 3")), "(1 + (2 * 3))");
    assert_eq!(sexpr(&parse("1 * 2 + 3")), "((1 * 2) + 3)");
}

#[test]
fn test_left_associativity() {
    assert_eq!(sexpr(&parse("a - b - c")), "((a - b) - c)");
    assert_eq!(sexpr(&parse("a / b % c")), "((a / b) % c)");
}

#[test]
fn test_unary_binds_tighter_than_binary() {
    assert_eq!(sexpr(&parse("-a * b")), "((-a) * b)");
    assert_eq!(sexpr(&parse("!a && b")), "((!a) && b)");
    assert_eq!(sexpr(&parse("not a or b")), "((!a) || b)");
    assert_eq!(sexpr(&parse("~x & 1")), "((~x) & 1)");
}

#[test]
fn test_parentheses_override_precedence() {
    assert_eq!(sexpr(&parse("(1 + 2) * 3")), "((1 + 2) * 3)");
}

// =============================================================================
// Comparison, equality and logic
// =============================================================================

#[test]
fn test_relational_binds_tighter_than_equality() {
    assert_eq!(sexpr(&parse("a < b == c > d")), "((a < b) == (c > d))");
}

#[test]
fn test_single_equals_is_equality() {
    assert_eq!(sexpr(&parse("a = 1")), "(a == 1)");
}

#[test]
fn test_regex_match_operators() {
    assert_eq!(sexpr(&parse(r#"name =~ r"^a"i"#)), "(name =~ r/^a/i)");
    assert_eq!(sexpr(&parse("name !~ 'x'")), "(name !~ \"x\")");
}

#[test]
fn test_bitwise_precedence_chain() {
    assert_eq!(sexpr(&parse("a | b ^ c & d")), "(a | (b ^ (c & d)))");
    assert_eq!(sexpr(&parse("a & b == c")), "(a & (b == c))");
}

#[test]
fn test_and_binds_tighter_than_or() {
    assert_eq!(sexpr(&parse("a || b && c")), "(a || (b && c))");
    assert_eq!(sexpr(&parse("a or b and c")), "(a || (b && c))");
}

#[test]
fn test_coalesce_is_right_associative_and_below_or() {
    assert_eq!(sexpr(&parse("a ?? b ?? c")), "(a ?? (b ?? c))");
    assert_eq!(sexpr(&parse("a || b ?? c")), "((a || b) ?? c)");
}

// =============================================================================
// Conditionals
// =============================================================================

#[test]
fn test_ternary_is_right_associative() {
    assert_eq!(
        sexpr(&parse("a ? 1 : b ? 2 : 3")),
        "(a ? 1 : (b ? 2 : 3))"
    );
}

#[test]
fn test_ternary_below_coalesce() {
    assert_eq!(sexpr(&parse("a ?? b ? c : d")), "((a ?? b) ? c : d)");
}

#[test]
fn test_prefix_if_form() {
    assert_eq!(sexpr(&parse("if a > 1 'big' else 'small'")), "((a > 1) ? \"big\" : \"small\")");
    assert_eq!(sexpr(&parse("if ok 'yes'")), "(ok ? \"yes\")");
}

// =============================================================================
// Postfix
// =============================================================================

#[test]
fn test_member_call_and_index_chain() {
    assert_eq!(
        sexpr(&parse("user.tags[0].to_upper()")),
        "user.tags[0].to_upper()"
    );
    assert_eq!(sexpr(&parse("Math.Max(1, 2)")), "Math.Max(1, 2)");
    assert_eq!(sexpr(&parse("f()")), "f()");
}

#[test]
fn test_context_reference_member() {
    assert_eq!(sexpr(&parse("$1.name")), "$1.name");
    assert_eq!(sexpr(&parse("$")), "$0");
}

#[test]
fn test_keyword_member_names() {
    assert_eq!(sexpr(&parse("flags.null")), "flags.null");
}

// =============================================================================
// Literals
// =============================================================================

fn literal(source: &str) -> Literal {
    match parse(source).kind {
        ExprKind::Literal(l) => l,
        other => panic!("expected literal, got {:?}", other),
    }
}

#[test]
fn test_integer_literal_kinds() {
    assert_eq!(literal("7"), Literal::Int { value: 7, kind: IntKind::I32 });
    assert_eq!(
        literal("3000000000"),
        Literal::Int { value: 3_000_000_000, kind: IntKind::I64 }
    );
    assert_eq!(
        literal("18446744073709551615"),
        Literal::Int { value: u64::MAX as i128, kind: IntKind::U64 }
    );
    assert_eq!(literal("7u"), Literal::Int { value: 7, kind: IntKind::U32 });
    assert_eq!(literal("7l"), Literal::Int { value: 7, kind: IntKind::I64 });
    assert_eq!(literal("7ul"), Literal::Int { value: 7, kind: IntKind::U64 });
    assert_eq!(literal("1KB"), Literal::Int { value: 1024, kind: IntKind::I64 });
}

#[test]
fn test_real_literal_kinds() {
    assert_eq!(literal("1.5"), Literal::Float { value: 1.5, kind: FloatKind::F64 });
    assert_eq!(literal("1.5f"), Literal::Float { value: 1.5, kind: FloatKind::F32 });
    assert_eq!(literal("2d"), Literal::Float { value: 2.0, kind: FloatKind::F64 });
    assert_eq!(
        literal("pi"),
        Literal::Float { value: std::f64::consts::PI, kind: FloatKind::F64 }
    );
}

#[test]
fn test_negative_literal_is_unary() {
    match parse("-5").kind {
        ExprKind::Unary { op: UnaryOp::Neg, .. } => {}
        other => panic!("expected negation, got {:?}", other),
    }
}

#[test]
fn test_binary_span_covers_operands() {
    let expr = parse_expression("a + bc", 10).unwrap();
    assert_eq!(expr.span.start, 10);
    assert_eq!(expr.span.end, 16);
    match expr.kind {
        ExprKind::Binary { op: BinaryOp::Add, right, .. } => {
            assert_eq!((right.span.start, right.span.end), (14, 16));
        }
        other => panic!("expected addition, got {:?}", other),
    }
}
