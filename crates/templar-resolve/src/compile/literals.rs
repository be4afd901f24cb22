use crate::expr::CompiledExpr;
use templar_ast::{CompileError, CompileResult, ErrorKind, Literal, Span};
use templar_runtime::Value;
use templar_runtime::coerce::compile_regex;

/// Literals compile to constants; regex literals are built here so a bad
/// pattern is a compile error.
pub(super) fn compile_literal(literal: &Literal, span: Span) -> CompileResult<CompiledExpr> {
    let value = match literal {
        Literal::Null => Value::Null,
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Int { value, kind } => Value::int(*value, *kind),
        Literal::Float { value, kind } => Value::float(*value, *kind),
        Literal::Str(s) => Value::from(s.as_str()),
        Literal::Regex { pattern, flags } => compile_regex(pattern, flags)
            .map(Value::from)
            .map_err(|e| CompileError::new(ErrorKind::Syntax, span, e.to_string()))?,
    };
    Ok(CompiledExpr::constant(value))
}
