//! By-reference lowering.
//!
//! The generated program passes every argument by value. A call to a user
//! function with reference parameters is rewritten into a
//! [`HirExprKind::WriteBack`] node: the callee hands back the final values
//! of its reference parameters and the call site stores them into the
//! locations that were passed with `&`.
//!
//! Native callees are left alone; the generator lowers them directly.

use crate::builtins::FnImpl;
use crate::hir::{HirArg, HirExpr, HirExprKind, HirModule, HirStmt};

#[derive(Debug, Clone, Copy)]
struct Callee {
    has_refs: bool,
    has_value: bool,
}

/// Rewrite every call site of a function with reference parameters.
pub fn lower_references(module: &mut HirModule) {
    let callees: Vec<Callee> = module
        .functions
        .iter()
        .map(|func| Callee {
            has_refs: func.has_ref_params(),
            has_value: func.ret.is_some(),
        })
        .collect();
    for func in &mut module.functions {
        for stmt in &mut func.body {
            lower_stmt(stmt, &callees);
        }
    }
}

fn lower_stmt(stmt: &mut HirStmt, callees: &[Callee]) {
    match stmt {
        HirStmt::Expr(expr) | HirStmt::Return(expr) => lower_expr(expr, callees),
        HirStmt::Local { init, .. } => {
            if let Some(init) = init {
                lower_expr(init, callees);
            }
        }
        HirStmt::If { cond, body } | HirStmt::While { cond, body } => {
            lower_expr(cond, callees);
            lower_stmt(body, callees);
        }
        HirStmt::Block { body, .. } => {
            for stmt in body {
                lower_stmt(stmt, callees);
            }
        }
        HirStmt::Empty => {}
    }
}

fn lower_expr(expr: &mut HirExpr, callees: &[Callee]) {
    match &mut expr.kind {
        HirExprKind::Str(_)
        | HirExprKind::Number(_)
        | HirExprKind::Bool(_)
        | HirExprKind::Local(_) => {}
        HirExprKind::Call { args, .. } => {
            for arg in args.iter_mut() {
                match arg {
                    HirArg::Value(expr) | HirArg::Ref(expr) => lower_expr(expr, callees),
                }
            }
        }
        HirExprKind::Index { target, key } => {
            lower_expr(target, callees);
            lower_expr(key, callees);
        }
        HirExprKind::Binary { left, right, .. } => {
            lower_expr(left, callees);
            lower_expr(right, callees);
        }
        HirExprKind::Vector(items) => {
            for item in items {
                lower_expr(item, callees);
            }
        }
        HirExprKind::Assign { target, value } => {
            lower_expr(target, callees);
            lower_expr(value, callees);
        }
        HirExprKind::WriteBack { call, targets, .. } => {
            lower_expr(call, callees);
            for target in targets {
                lower_expr(target, callees);
            }
        }
    }

    let HirExprKind::Call {
        callee: FnImpl::Namespace(index),
        args,
    } = &expr.kind
    else {
        return;
    };
    let Some(callee) = callees.get(*index).copied().filter(|callee| callee.has_refs) else {
        return;
    };
    let targets = args
        .iter()
        .filter_map(|arg| match arg {
            HirArg::Ref(target) => Some(target.clone()),
            HirArg::Value(_) => None,
        })
        .collect();
    let call = HirExpr {
        kind: std::mem::replace(&mut expr.kind, HirExprKind::Vector(Vec::new())),
        ty: expr.ty.clone(),
        lvalue: false,
    };
    expr.kind = HirExprKind::WriteBack {
        call: Box::new(call),
        targets,
        has_value: callee.has_value,
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::typecheck::analyze;

    fn lowered(source: &str) -> HirModule {
        let mut module = analyze(&parse(source).expect("parse")).expect("analyze");
        lower_references(&mut module);
        module
    }

    #[test]
    fn reference_call_becomes_write_back() {
        let module = lowered("void inc(ref i32 x) { x = x + 1; } void g() { i32 y = 1; inc(&y); }");
        let HirStmt::Expr(expr) = &module.functions[1].body[1] else {
            panic!("expected expression statement");
        };
        let HirExprKind::WriteBack { call, targets, has_value } = &expr.kind else {
            panic!("expected write-back, got {:?}", expr.kind);
        };
        assert!(!has_value);
        assert_eq!(targets.len(), 1);
        assert!(matches!(targets[0].kind, HirExprKind::Local(_)));
        assert!(matches!(call.kind, HirExprKind::Call { .. }));
    }

    #[test]
    fn value_only_calls_are_untouched() {
        let module = lowered("i32 id(i32 x) { return x; } void g() { i32 y = id(1); }");
        let HirStmt::Local { init: Some(init), .. } = &module.functions[1].body[0] else {
            panic!("expected local");
        };
        assert!(matches!(init.kind, HirExprKind::Call { .. }));
    }

    #[test]
    fn native_push_is_not_rewritten() {
        let module = lowered("void g() { vec<i32> v = [1]; push(&v, 2); }");
        let HirStmt::Expr(expr) = &module.functions[0].body[1] else {
            panic!("expected expression statement");
        };
        assert!(matches!(expr.kind, HirExprKind::Call { .. }));
    }

    #[test]
    fn nested_reference_calls_are_rewritten() {
        let module = lowered(
            "i32 take(ref i32 x) { x = 0; return 1; } \
             void g() { i32 a = 1; i32 b = 2; i32 c = take(&a) + take(&b); }",
        );
        let HirStmt::Local { init: Some(init), .. } = &module.functions[1].body[2] else {
            panic!("expected local");
        };
        let HirExprKind::Binary { left, right, .. } = &init.kind else {
            panic!("expected binary");
        };
        assert!(matches!(left.kind, HirExprKind::WriteBack { has_value: true, .. }));
        assert!(matches!(right.kind, HirExprKind::WriteBack { has_value: true, .. }));
    }
}
