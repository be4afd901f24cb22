use super::{ExprCompiler, err_type_mismatch};
use crate::expr::CompiledExpr;
use templar_ast::{BinaryOp, CompileResult, Expr, Span, UnaryOp};
use templar_runtime::coerce::{convert, promote, to_bool};
use templar_runtime::{Value, ValueKind, ops};

impl ExprCompiler<'_> {
    pub(super) fn compile_unary(&self, op: UnaryOp, operand: &Expr, span: Span) -> CompileResult<CompiledExpr> {
        let operand = self.compile(operand)?;
        let kind = ops::unary_kind(op, &operand.kind).map_err(|m| err_type_mismatch(span, m))?;
        let eval = operand.eval;
        Ok(CompiledExpr::new(kind, move |env| Ok(ops::unary(op, &eval(env)?)?)))
    }

    pub(super) fn compile_binary(
        &self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        span: Span,
    ) -> CompileResult<CompiledExpr> {
        let left = self.compile(left)?;
        let right = self.compile(right)?;
        let kind = ops::binary_kind(op, &left.kind, &right.kind).map_err(|m| err_type_mismatch(span, m))?;
        let (lhs, rhs) = (left.eval, right.eval);

        Ok(match op {
            BinaryOp::And => CompiledExpr::new(kind, move |env| {
                Ok(Value::Bool(to_bool(&lhs(env)?) && to_bool(&rhs(env)?)))
            }),
            BinaryOp::Or => CompiledExpr::new(kind, move |env| {
                Ok(Value::Bool(to_bool(&lhs(env)?) || to_bool(&rhs(env)?)))
            }),
            BinaryOp::Coalesce => {
                let target = kind.clone();
                CompiledExpr::new(kind, move |env| {
                    let value = match lhs(env)? {
                        Value::Null => rhs(env)?,
                        value => value,
                    };
                    if value.is_null() || target.is_any() {
                        return Ok(value);
                    }
                    Ok(convert(value, &target)?)
                })
            }
            _ => CompiledExpr::new(kind, move |env| {
                let a = lhs(env)?;
                let b = rhs(env)?;
                Ok(ops::binary(op, &a, &b)?)
            }),
        })
    }

    pub(super) fn compile_conditional(
        &self,
        condition: &Expr,
        then_branch: &Expr,
        else_branch: Option<&Expr>,
        span: Span,
    ) -> CompileResult<CompiledExpr> {
        let condition = self
            .compile(condition)?
            .coerce_to(&ValueKind::Bool, condition.span)?;
        let then_expr = self.compile(then_branch)?;
        let else_expr = match else_branch {
            Some(e) => self.compile(e)?,
            None => CompiledExpr::constant(Value::Null),
        };

        let kind = branch_kind(&then_expr.kind, &else_expr.kind);
        let then_expr = then_expr.coerce_to(&kind, then_branch.span)?;
        let else_expr = else_expr.coerce_to(&kind, else_branch.map_or(span, |e| e.span))?;

        let (test, yes, no) = (condition.eval, then_expr.eval, else_expr.eval);
        Ok(CompiledExpr::new(kind, move |env| {
            if to_bool(&test(env)?) { yes(env) } else { no(env) }
        }))
    }
}

/// Common kind of the two branches of a conditional.
fn branch_kind(a: &ValueKind, b: &ValueKind) -> ValueKind {
    if a == b {
        return a.clone();
    }
    match (a, b) {
        (ValueKind::Null, other) | (other, ValueKind::Null) if other.is_nullable() => other.clone(),
        _ if a.is_numeric() && b.is_numeric() => promote(a, b).unwrap_or(ValueKind::Any),
        _ => ValueKind::Any,
    }
}
