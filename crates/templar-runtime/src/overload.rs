//! Method overload selection.

use crate::coerce::implicit_cost;
use crate::host::Method;
use crate::kind::ValueKind;

/// Outcome of choosing among same-named methods.
#[derive(Debug)]
pub enum Selection<'m> {
    /// Every argument kind matches a parameter kind exactly.
    Exact(&'m Method),
    /// Arguments need implicit conversions; this candidate matched the most
    /// parameters exactly.
    Converted(&'m Method),
    None,
    /// Several candidates tie for the best score.
    Ambiguous(Vec<&'m Method>),
}

/// Pick the method to invoke for the given argument kinds.
///
/// Candidates are filtered by arity. The first exact match wins outright;
/// otherwise every candidate all of whose arguments convert implicitly is
/// scored by its number of exact matches and the unique best is chosen.
pub fn select<'m>(
    candidates: impl IntoIterator<Item = &'m Method>,
    args: &[ValueKind],
) -> Selection<'m> {
    let applicable: Vec<&Method> = candidates
        .into_iter()
        .filter(|m| m.params.len() == args.len())
        .collect();

    if let Some(exact) = applicable
        .iter()
        .find(|m| m.params.iter().zip(args).all(|(p, a)| a == p))
    {
        return Selection::Exact(*exact);
    }

    let mut best: Vec<&Method> = Vec::new();
    let mut best_score = 0usize;
    for method in applicable {
        let costs: Option<Vec<u32>> = method
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| implicit_cost(arg, param))
            .collect();
        let Some(costs) = costs else { continue };
        let score = costs.iter().filter(|c| **c == 0).count();
        if best.is_empty() || score > best_score {
            best = vec![method];
            best_score = score;
        } else if score == best_score {
            best.push(method);
        }
    }

    match best.len() {
        0 => Selection::None,
        1 => Selection::Converted(best[0]),
        _ => Selection::Ambiguous(best),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::TypeInfo;
    use crate::value::Value;
    use std::sync::Arc;
    use templar_ast::{FloatKind, IntKind};

    struct Calc;

    fn calc() -> Arc<TypeInfo> {
        let i32k = ValueKind::Int(IntKind::I32);
        let i64k = ValueKind::Int(IntKind::I64);
        let f64k = ValueKind::Float(FloatKind::F64);
        TypeInfo::builder::<Calc>("Calc")
            .method("add", &[i32k.clone(), i32k.clone()], i32k.clone(), |_, _| Ok(Value::from("i32")))
            .method("add", &[i64k.clone(), i64k.clone()], i64k.clone(), |_, _| Ok(Value::from("i64")))
            .method("mix", &[i64k.clone(), f64k.clone()], f64k.clone(), |_, _| Ok(Value::Null))
            .method("mix", &[f64k.clone(), i64k.clone()], f64k.clone(), |_, _| Ok(Value::Null))
            .method("name", &[ValueKind::String], ValueKind::String, |_, _| Ok(Value::Null))
            .build()
    }

    #[test]
    fn test_exact_match_short_circuits() {
        let info = calc();
        let args = [ValueKind::Int(IntKind::I32), ValueKind::Int(IntKind::I32)];
        match select(info.methods_named("add", true), &args) {
            Selection::Exact(m) => assert_eq!(m.returns, ValueKind::Int(IntKind::I32)),
            other => panic!("expected exact match, got {:?}", other),
        }
    }

    #[test]
    fn test_widening_picks_best_score() {
        let info = calc();
        let args = [ValueKind::Int(IntKind::I64), ValueKind::Int(IntKind::I32)];
        match select(info.methods_named("add", true), &args) {
            Selection::Converted(m) => assert_eq!(m.returns, ValueKind::Int(IntKind::I64)),
            other => panic!("expected converted match, got {:?}", other),
        }
    }

    #[test]
    fn test_ties_are_ambiguous() {
        let info = calc();
        let args = [ValueKind::Int(IntKind::I32), ValueKind::Int(IntKind::I32)];
        match select(info.methods_named("mix", true), &args) {
            Selection::Ambiguous(methods) => assert_eq!(methods.len(), 2),
            other => panic!("expected ambiguity, got {:?}", other),
        }
    }

    #[test]
    fn test_no_conversion_or_wrong_arity() {
        let info = calc();
        assert!(matches!(
            select(info.methods_named("name", true), &[ValueKind::Int(IntKind::I32)]),
            Selection::None
        ));
        assert!(matches!(
            select(info.methods_named("name", true), &[]),
            Selection::None
        ));
    }
}
