//! Exhaustive-return and dead-code checks.
//!
//! A statement always returns iff it is a `return` or a block whose own
//! sequence always returns. `if` and `while` never do, whatever their
//! body, because the body may not run.

use crate::ast::{Stmt, StmtKind};
use crate::error::CoreError;
use crate::span::Position;

/// Check every statement sequence in a function body for dead code and,
/// when `must_return` is set, that the body always returns a value.
pub fn check_body(body: &[Stmt], must_return: bool, end: Position) -> Result<(), CoreError> {
    for stmt in body {
        check_nested(stmt)?;
    }
    let returns = check_sequence(body)?;
    if must_return && !returns {
        return Err(CoreError::analysis(
            end,
            "function does not always return a value",
        ));
    }
    Ok(())
}

pub fn always_returns(stmt: &Stmt) -> bool {
    match &stmt.kind {
        StmtKind::Return(_) => true,
        StmtKind::Block(stmts) => stmts.iter().any(always_returns),
        _ => false,
    }
}

/// The first always-returning statement must close the sequence.
/// Returns whether the sequence always returns.
fn check_sequence(stmts: &[Stmt]) -> Result<bool, CoreError> {
    let Some(index) = stmts.iter().position(always_returns) else {
        return Ok(false);
    };
    match stmts.get(index + 1) {
        Some(dead) => Err(CoreError::analysis(dead.pos, "unreachable code after return")),
        None => Ok(true),
    }
}

fn check_nested(stmt: &Stmt) -> Result<(), CoreError> {
    match &stmt.kind {
        StmtKind::Block(stmts) => {
            for inner in stmts {
                check_nested(inner)?;
            }
            check_sequence(stmts).map(|_| ())
        }
        StmtKind::If { body, .. } | StmtKind::While { body, .. } => check_nested(body),
        StmtKind::Expr(_) | StmtKind::Local { .. } | StmtKind::Return(_) | StmtKind::Empty => {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Decl;
    use crate::parser::parse;

    fn check(source: &str) -> Result<(), CoreError> {
        let unit = parse(source).expect("parse");
        let Some(Decl::Function(func)) = unit.decls.into_iter().next() else {
            panic!("expected a function");
        };
        check_body(&func.body, func.ret.is_some(), func.end)
    }

    #[test]
    fn trailing_return_is_exhaustive() {
        assert!(check("i32 f() { g(); return x; }").is_ok());
    }

    #[test]
    fn returning_block_is_exhaustive() {
        assert!(check("i32 f() { { return x; } }").is_ok());
    }

    #[test]
    fn conditional_return_is_not_exhaustive() {
        let err = check("i32 f() { if (c) return x; }").unwrap_err();
        assert!(err.to_string().contains("does not always return"));
        let err = check("i32 f() { while (c) { return x; } }").unwrap_err();
        assert!(err.to_string().contains("does not always return"));
    }

    #[test]
    fn void_function_need_not_return() {
        assert!(check("void f() { g(); }").is_ok());
    }

    #[test]
    fn statements_after_return_are_dead() {
        let err = check("i32 f() {\n return x;\n g();\n}").unwrap_err();
        assert_eq!(err.position(), Position::new(3, 2));
    }

    #[test]
    fn dead_code_inside_nested_blocks_is_rejected() {
        let err = check("void f() { if (c) { return x; g(); } }").unwrap_err();
        assert!(err.to_string().contains("unreachable"));
    }

    #[test]
    fn statement_after_returning_block_is_dead() {
        assert!(check("i32 f() { { return x; } return y; }").is_err());
    }
}
