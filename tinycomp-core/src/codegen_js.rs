//! JavaScript code generation from lowered HIR.
//!
//! The module is rendered into a `String` and written to the sink in one
//! piece, so a failing generation leaves the sink untouched. Calls with
//! reference arguments must have gone through
//! [`crate::lower::lower_references`] first.

use std::io::Write;

use crate::ast::BinaryOp;
use crate::builtins::{FnImpl, NativeFn};
use crate::eq::eq;
use crate::error::CoreError;
use crate::hir::{HirArg, HirExpr, HirExprKind, HirFunction, HirModule, HirStmt, LocalId};
use crate::naming;
use crate::types::Type;

const PRELUDE: &str = "
function $v(a,k) {if(k<0||k>=a.length)throw new Error('index out of bounds');return a[k];}
function $k(a,k) {if(k<0||k>=a.length)throw new Error('index out of bounds');return k;}
function $eq(a,b) {if(a===b)return true;if(Array.isArray(a)&&Array.isArray(b))return a.length===b.length&&a.every((x,i)=>$eq(x,b[i]));if(a instanceof Map&&b instanceof Map)return a.size===b.size&&[...a].every(([k,x])=>b.has(k)&&$eq(x,b.get(k)));return false;}
";

/// Operator precedence of emitted expressions, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Prec {
    Assign,
    Equality,
    Additive,
    Multiplicative,
    Primary,
}

impl Prec {
    fn of(op: BinaryOp) -> Prec {
        match op {
            BinaryOp::Eq => Prec::Equality,
            BinaryOp::Add | BinaryOp::Sub => Prec::Additive,
            BinaryOp::Mul | BinaryOp::Div => Prec::Multiplicative,
        }
    }

    fn tighter(self) -> Prec {
        match self {
            Prec::Assign => Prec::Equality,
            Prec::Equality => Prec::Additive,
            Prec::Additive => Prec::Multiplicative,
            Prec::Multiplicative | Prec::Primary => Prec::Primary,
        }
    }
}

/// Generate a JavaScript program for `module` and write it to `out`.
pub fn generate_js(module: &HirModule, out: &mut impl Write) -> Result<(), CoreError> {
    let text = render(module)?;
    out.write_all(text.as_bytes())?;
    Ok(())
}

/// Render `module` as JavaScript source text.
pub fn render(module: &HirModule) -> Result<String, CoreError> {
    let entry = find_entry_point(module)?;
    let function_names: Vec<String> = (1..=module.functions.len()).map(naming::ident).collect();

    let mut out = String::new();
    out.push_str("'use strict';\n");
    out.push_str(PRELUDE);
    for (index, func) in module.functions.iter().enumerate() {
        FunctionEmitter::new(&function_names, func, &mut out).emit(index)?;
    }

    if module.functions[entry].ret.is_some() {
        out.push_str("process.exitCode=");
    }
    out.push_str(&function_names[entry]);
    out.push_str("(process.argv.slice(1));\n");
    Ok(out)
}

/// The unique exported, unnamed function taking a single `vec<str>`.
fn find_entry_point(module: &HirModule) -> Result<usize, CoreError> {
    let args_ty = Type::vec(Type::str());
    let mut candidates = Vec::new();
    for (index, func) in module.functions.iter().enumerate() {
        if func.name.is_some() || !func.is_exported {
            continue;
        }
        if let [param] = func.params.as_slice() {
            let takes_args = eq(&param.ty, &args_ty)
                .map_err(|err| CoreError::generation(err.to_string()))?;
            if !param.by_ref && takes_args {
                candidates.push(index);
            }
        }
    }
    match candidates.as_slice() {
        [entry] => Ok(*entry),
        [] => Err(CoreError::generation("could not find an entry point")),
        _ => Err(CoreError::generation(format!(
            "ambiguous entry point: {} exported unnamed functions take vec<str>",
            candidates.len()
        ))),
    }
}

struct FunctionEmitter<'a> {
    function_names: &'a [String],
    func: &'a HirFunction,
    /// Generated name per local slot; empty until its scope is entered.
    locals: Vec<String>,
    /// Highest id in use by the current scope chain.
    max_id: usize,
    out: &'a mut String,
}

impl<'a> FunctionEmitter<'a> {
    fn new(function_names: &'a [String], func: &'a HirFunction, out: &'a mut String) -> Self {
        FunctionEmitter {
            function_names,
            func,
            locals: vec![String::new(); func.locals.len()],
            max_id: function_names.len(),
            out,
        }
    }

    fn emit(mut self, index: usize) -> Result<(), CoreError> {
        let func = self.func;
        for &local in &func.scope_locals {
            self.bind(local)?;
        }
        let params = func
            .params
            .iter()
            .map(|param| self.local(param.local).map(str::to_string))
            .collect::<Result<Vec<_>, _>>()?;

        let name = self.name_of(index)?;
        self.out.push_str("function ");
        self.out.push_str(name);
        self.out.push('(');
        self.out.push_str(&params.join(", "));
        self.out.push_str(") {\n");
        for stmt in &func.body {
            self.emit_stmt(stmt)?;
        }
        if func.has_ref_params() && func.ret.is_none() {
            let refs = self.ref_params()?.join(",");
            self.out.push_str("return [");
            self.out.push_str(&refs);
            self.out.push_str("];\n");
        }
        self.out.push_str("}\n\n");
        Ok(())
    }

    fn name_of(&self, index: usize) -> Result<&'a str, CoreError> {
        self.function_names
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CoreError::generation(format!("no function with index {index}")))
    }

    fn bind(&mut self, local: LocalId) -> Result<(), CoreError> {
        self.max_id += 1;
        let slot = self
            .locals
            .get_mut(local)
            .ok_or_else(|| CoreError::generation(format!("unknown local slot {local}")))?;
        *slot = naming::ident(self.max_id);
        Ok(())
    }

    fn local(&self, local: LocalId) -> Result<&str, CoreError> {
        match self.locals.get(local) {
            Some(name) if !name.is_empty() => Ok(name),
            _ => Err(CoreError::generation(format!(
                "local slot {local} used outside its scope"
            ))),
        }
    }

    fn ref_params(&self) -> Result<Vec<String>, CoreError> {
        self.func
            .params
            .iter()
            .filter(|param| param.by_ref)
            .map(|param| self.local(param.local).map(str::to_string))
            .collect()
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn emit_stmt(&mut self, stmt: &HirStmt) -> Result<(), CoreError> {
        match stmt {
            HirStmt::Expr(expr) => {
                self.emit_expr(expr, Prec::Assign)?;
                self.out.push_str(";\n");
            }
            HirStmt::Local { local, init } => {
                let name = self.local(*local)?.to_string();
                self.out.push_str("let ");
                self.out.push_str(&name);
                self.out.push('=');
                match init {
                    Some(init) => self.emit_copied(init, Prec::Assign)?,
                    None => {
                        let default = default_value(&self.func.locals[*local].ty);
                        self.out.push_str(default);
                    }
                }
                self.out.push_str(";\n");
            }
            HirStmt::If { cond, body } => {
                self.out.push_str("if(");
                self.emit_expr(cond, Prec::Assign)?;
                self.out.push(')');
                self.emit_stmt(body)?;
            }
            HirStmt::While { cond, body } => {
                self.out.push_str("while(");
                self.emit_expr(cond, Prec::Assign)?;
                self.out.push(')');
                self.emit_stmt(body)?;
            }
            HirStmt::Return(value) => {
                self.out.push_str("return ");
                if self.func.has_ref_params() {
                    self.out.push('[');
                    self.emit_expr(value, Prec::Assign)?;
                    for name in self.ref_params()? {
                        self.out.push(',');
                        self.out.push_str(&name);
                    }
                    self.out.push(']');
                } else {
                    self.emit_expr(value, Prec::Assign)?;
                }
                self.out.push_str(";\n");
            }
            HirStmt::Block { locals, body } => {
                self.out.push_str("{\n");
                let saved = self.max_id;
                for &local in locals {
                    self.bind(local)?;
                }
                for stmt in body {
                    self.emit_stmt(stmt)?;
                }
                self.max_id = saved;
                self.out.push_str("}\n");
            }
            HirStmt::Empty => self.out.push_str(";\n"),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn emit_expr(&mut self, expr: &HirExpr, prec: Prec) -> Result<(), CoreError> {
        match &expr.kind {
            HirExprKind::Str(value) => write_str_lit(self.out, value),
            HirExprKind::Number(value) => self.out.push_str(&value.to_string()),
            HirExprKind::Bool(value) => self.out.push_str(if *value { "true" } else { "false" }),
            HirExprKind::Local(local) => {
                let name = self.local(*local)?.to_string();
                self.out.push_str(&name);
            }
            HirExprKind::Call { callee, args } => self.emit_call(*callee, args)?,
            HirExprKind::Index { target, key } => {
                self.out.push_str("$v(");
                self.emit_expr(target, Prec::Assign)?;
                self.out.push(',');
                self.emit_expr(key, Prec::Assign)?;
                self.out.push(')');
            }
            HirExprKind::Binary {
                op: BinaryOp::Div,
                left,
                right,
            } => {
                self.out.push_str("Math.trunc(");
                self.emit_expr(left, Prec::Multiplicative)?;
                self.out.push('/');
                self.emit_expr(right, Prec::Primary)?;
                self.out.push(')');
            }
            HirExprKind::Binary {
                op: BinaryOp::Eq,
                left,
                right,
            } if !left.ty.as_ref().is_some_and(is_primitive) => {
                self.out.push_str("$eq(");
                self.emit_expr(left, Prec::Assign)?;
                self.out.push(',');
                self.emit_expr(right, Prec::Assign)?;
                self.out.push(')');
            }
            HirExprKind::Binary { op, left, right } => {
                let own = Prec::of(*op);
                let parens = prec > own;
                if parens {
                    self.out.push('(');
                }
                self.emit_expr(left, own)?;
                self.out.push_str(op.symbol());
                self.emit_expr(right, own.tighter())?;
                if parens {
                    self.out.push(')');
                }
            }
            HirExprKind::Vector(items) => {
                self.out.push('[');
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        self.out.push(',');
                    }
                    self.emit_copied(item, Prec::Assign)?;
                }
                self.out.push(']');
            }
            HirExprKind::Assign { target, value } => {
                let parens = prec > Prec::Assign;
                if parens {
                    self.out.push('(');
                }
                self.emit_place(target)?;
                self.out.push('=');
                self.emit_copied(value, Prec::Assign)?;
                if parens {
                    self.out.push(')');
                }
            }
            HirExprKind::WriteBack {
                call,
                targets,
                has_value,
            } => self.emit_write_back(call, targets, *has_value)?,
        }
        Ok(())
    }

    /// Emit a vector read out of existing storage as a fresh copy.
    fn emit_copied(&mut self, expr: &HirExpr, prec: Prec) -> Result<(), CoreError> {
        if expr.is_vec_place() {
            self.emit_expr(expr, Prec::Primary)?;
            self.out.push_str(".slice()");
            Ok(())
        } else {
            self.emit_expr(expr, prec)
        }
    }

    /// Emit an assignment target.
    fn emit_place(&mut self, expr: &HirExpr) -> Result<(), CoreError> {
        match &expr.kind {
            HirExprKind::Local(local) => {
                let name = self.local(*local)?.to_string();
                self.out.push_str(&name);
            }
            HirExprKind::Index { target, key } => {
                self.emit_expr(target, Prec::Primary)?;
                self.out.push_str("[$k(");
                self.emit_expr(target, Prec::Assign)?;
                self.out.push(',');
                self.emit_expr(key, Prec::Assign)?;
                self.out.push_str(")]");
            }
            other => {
                return Err(CoreError::generation(format!(
                    "cannot assign to {other:?}"
                )));
            }
        }
        Ok(())
    }

    fn emit_call(&mut self, callee: FnImpl, args: &[HirArg]) -> Result<(), CoreError> {
        match callee {
            FnImpl::Native(NativeFn::Print) => {
                self.out.push_str("console.log");
                self.emit_args(args)?;
            }
            FnImpl::Native(NativeFn::Open) => {
                self.out.push_str("require('fs').openSync(");
                for arg in args {
                    self.emit_copied(arg.expr(), Prec::Assign)?;
                    self.out.push(',');
                }
                self.out.push_str("'r')");
            }
            FnImpl::Native(NativeFn::Push) => {
                let [HirArg::Ref(receiver), HirArg::Value(item)] = args else {
                    return Err(CoreError::generation("malformed call to push"));
                };
                self.emit_expr(receiver, Prec::Primary)?;
                self.out.push_str(".push(");
                self.emit_copied(item, Prec::Assign)?;
                self.out.push(')');
            }
            FnImpl::Namespace(index) => {
                if args.iter().any(|arg| matches!(arg, HirArg::Ref(_))) {
                    return Err(CoreError::generation(format!(
                        "call to {} with reference arguments was not lowered",
                        self.name_of(index)?
                    )));
                }
                let name = self.name_of(index)?;
                self.out.push_str(name);
                self.emit_args(args)?;
            }
        }
        Ok(())
    }

    fn emit_args(&mut self, args: &[HirArg]) -> Result<(), CoreError> {
        self.out.push('(');
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.out.push_str(", ");
            }
            match arg {
                HirArg::Value(expr) => self.emit_copied(expr, Prec::Assign)?,
                HirArg::Ref(expr) => self.emit_expr(expr, Prec::Assign)?,
            }
        }
        self.out.push(')');
        Ok(())
    }

    /// `((t)=>(x=t[1],t[0]))(f(x))`, or `((t)=>{x=t[0];})(f(x))` for a
    /// void callee.
    fn emit_write_back(
        &mut self,
        call: &HirExpr,
        targets: &[HirExpr],
        has_value: bool,
    ) -> Result<(), CoreError> {
        let HirExprKind::Call { callee, args } = &call.kind else {
            return Err(CoreError::generation("write-back around a non-call"));
        };
        let temp = naming::ident(self.max_id + 1);
        let first = usize::from(has_value);

        self.out.push_str("((");
        self.out.push_str(&temp);
        self.out.push_str(")=>");
        self.out.push(if has_value { '(' } else { '{' });
        for (offset, target) in targets.iter().enumerate() {
            self.emit_place(target)?;
            self.out.push_str(&format!("={temp}[{}]", first + offset));
            self.out.push(if has_value { ',' } else { ';' });
        }
        if has_value {
            self.out.push_str(&format!("{temp}[0])"));
        } else {
            self.out.push('}');
        }
        self.out.push_str(")(");

        let name = self.name_of(callee_index(*callee)?)?;
        self.out.push_str(name);
        self.emit_args(args)?;
        self.out.push(')');
        Ok(())
    }
}

fn callee_index(callee: FnImpl) -> Result<usize, CoreError> {
    match callee {
        FnImpl::Namespace(index) => Ok(index),
        FnImpl::Native(native) => Err(CoreError::generation(format!(
            "native {} cannot take a write-back",
            native.qualified_name()
        ))),
    }
}

/// Types whose JavaScript `==` already compares by value.
fn is_primitive(ty: &Type) -> bool {
    ty.is_numeric() || ty.is_str() || ty.is_bool()
}

fn default_value(ty: &Type) -> &'static str {
    if ty.is_numeric() {
        "0"
    } else if ty.is_str() {
        "\"\""
    } else if ty.is_bool() {
        "false"
    } else if ty.vec_item().is_some() {
        "[]"
    } else if ty.is_dict() {
        "new Map()"
    } else {
        "null"
    }
}

fn write_str_lit(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            _ => out.push(ch),
        }
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lower::lower_references;
    use crate::parser::parse;
    use crate::typecheck::analyze;

    fn js(source: &str) -> String {
        let mut module = analyze(&parse(source).expect("parse")).expect("analyze");
        lower_references(&mut module);
        render(&module).expect("render")
    }

    fn entry_js(body: &str) -> String {
        js(&format!("export void (vec<str> args) {{ {body} }}"))
    }

    #[test]
    fn hello_program_layout() {
        let out = js("export void (vec<str> args) { IO.print(\"hi\"); }");
        let expected = format!(
            "'use strict';\n{PRELUDE}function a(b) {{\nconsole.log(\"hi\");\n}}\n\na(process.argv.slice(1));\n"
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn parenthesizes_only_when_needed() {
        let out = entry_js(
            "i32 a = 1; i32 b = (a + 2) * 3 - a / 2; i32 e = a - (b - 1); bool f = a + 1 == b;",
        );
        assert!(out.contains("let d=(c+2)*3-Math.trunc(c/2);\n"), "{out}");
        assert!(out.contains("let e=c-(d-1);\n"), "{out}");
        assert!(out.contains("let f=c+1==d;\n"), "{out}");
    }

    #[test]
    fn nested_assignment_is_parenthesized() {
        let out = entry_js("i32 a = 1; i32 b = 2; bool c = (a = b) == b;");
        assert!(out.contains("let e=(c=d)==d;\n"), "{out}");
    }

    #[test]
    fn void_reference_callee_writes_back() {
        let out = js(
            "void inc(ref i32 x) { x = x + 1; } \
             export void (vec<str> args) { i32 y = 1; inc(&y); }",
        );
        assert!(out.contains("function a(c) {\nc=c+1;\nreturn [c];\n}\n\n"), "{out}");
        assert!(out.contains("let d=1;\n((e)=>{d=e[0];})(a(d));\n"), "{out}");
    }

    #[test]
    fn valued_reference_callee_returns_tuple() {
        let out = js(
            "i32 take(ref i32 x) { x = 0; return 7; } \
             export i32 (vec<str> args) { i32 y = 1; return take(&y); }",
        );
        assert!(out.contains("c=0;\nreturn [7,c];\n"), "{out}");
        assert!(out.contains("return ((e)=>(d=e[1],e[0]))(a(d));\n"), "{out}");
        assert!(out.ends_with("process.exitCode=b(process.argv.slice(1));\n"), "{out}");
    }

    #[test]
    fn sibling_blocks_reuse_ids_and_shadowing_gets_fresh_names() {
        let out = entry_js("str s = \"x\"; { str t = s; } { str s = s; }");
        assert!(out.contains("{\nlet d=c;\n}\n{\nlet d=c;\n}\n"), "{out}");
    }

    #[test]
    fn vector_places_are_copied() {
        let out = entry_js("vec<str> v = args; v = args; vec<str> w = [\"a\"]; push(&v, args[0]);");
        assert!(out.contains("let c=b.slice();\n"), "{out}");
        assert!(out.contains("c=b.slice();\n"), "{out}");
        assert!(out.contains("let d=[\"a\"];\n"), "{out}");
        assert!(out.contains("c.push($v(b,0));\n"), "{out}");
    }

    #[test]
    fn container_equality_compares_structurally() {
        let out = entry_js("vec<str> v = [\"x\"]; bool same = v == args; bool n = true == false;");
        assert!(out.contains("let d=$eq(c,b);\n"), "{out}");
        assert!(out.contains("let e=true==false;\n"), "{out}");
    }

    #[test]
    fn index_reads_and_writes_are_bounds_checked() {
        let out = entry_js("str s = args[0]; args[0] = s;");
        assert!(out.contains("let c=$v(b,0);\n"), "{out}");
        assert!(out.contains("b[$k(b,0)]=c;\n"), "{out}");
    }

    #[test]
    fn locals_without_initializer_get_defaults() {
        let out = entry_js("i32 n; str s; bool b; vec<u8> v; dict<str, i32> d; IO.file f;");
        for line in [
            "let c=0;",
            "let d=\"\";",
            "let e=false;",
            "let f=[];",
            "let g=new Map();",
            "let h=null;",
        ] {
            assert!(out.contains(line), "missing {line} in {out}");
        }
    }

    #[test]
    fn string_literals_are_escaped() {
        let out = entry_js(r#"IO.print("a\"b\\c\td\ne");"#);
        assert!(out.contains(r#"console.log("a\"b\\c\td\ne");"#), "{out}");
    }

    #[test]
    fn control_flow_statements() {
        let out = entry_js("while (false) IO.print(\"x\"); if (true) i32 x = 1;");
        assert!(out.contains("while(false)console.log(\"x\");\n"), "{out}");
        assert!(out.contains("if(true){\nlet c=1;\n}\n"), "{out}");
    }

    #[test]
    fn open_lowers_to_fs() {
        let out = entry_js("IO.file f = IO.open(\"in.txt\");");
        assert!(out.contains("let c=require('fs').openSync(\"in.txt\",'r');\n"), "{out}");
    }

    #[test]
    fn entry_point_must_be_unique() {
        let module = analyze(&parse("void f() {}").expect("parse")).expect("analyze");
        assert!(render(&module).unwrap_err().to_string().contains("could not find an entry point"));

        let source = "export void (vec<str> a) {} export void (vec<str> b) {}";
        let module = analyze(&parse(source).expect("parse")).expect("analyze");
        assert!(render(&module).unwrap_err().to_string().contains("ambiguous"));

        let source = "export void (vec<u8> a) {} export void (ref vec<str> b) {} \
                      export void (vec<str> c) {}";
        let module = analyze(&parse(source).expect("parse")).expect("analyze");
        assert!(render(&module).expect("render").ends_with("c(process.argv.slice(1));\n"));
    }

    #[test]
    fn unlowered_reference_call_is_rejected_without_output() {
        let source = "void inc(ref i32 x) { x = x + 1; } \
                      export void (vec<str> args) { i32 y = 1; inc(&y); }";
        let module = analyze(&parse(source).expect("parse")).expect("analyze");
        let mut sink = Vec::new();
        let err = generate_js(&module, &mut sink).unwrap_err();
        assert!(matches!(err, CoreError::Generation(_)));
        assert!(sink.is_empty());
    }
}
