//! Name resolution and type checking: AST to HIR.
//!
//! The analyzer first builds the top-level namespace in two passes
//! (structs, then functions) so that signatures can mention any
//! declaration, then checks each function body against it.
//!
//! Identifiers resolve against the builtin registry first, then the
//! namespace, then the function's scopes from the innermost outwards.
//! A local can therefore never hide a builtin or a top-level name.

use std::collections::HashMap;

use crate::ast::{self, BinaryOp, Decl, ExprKind, StmtKind};
use crate::builtins::{BuiltinDecl, FnImpl, ParamSig, Registry, Signature};
use crate::eq::{DepthExceeded, eq};
use crate::error::CoreError;
use crate::hir::{
    HirArg, HirExpr, HirExprKind, HirFunction, HirModule, HirParam, HirStmt, HirStruct,
};
use crate::reachability;
use crate::scope::ScopeStack;
use crate::span::Position;
use crate::types::{IntKind, Type, TypePattern};

/// Analyze a parsed unit and produce its typed IR.
pub fn analyze(unit: &ast::Unit) -> Result<HirModule, CoreError> {
    let registry = Registry::standard();
    let analyzer = Analyzer::new(&registry, unit)?;
    analyzer.run(unit)
}

#[derive(Debug, Clone, Copy)]
enum TopLevel {
    Struct(usize),
    Function(usize),
}

/// Top-level declarations of the unit.
#[derive(Debug, Default)]
struct Namespace {
    names: HashMap<String, TopLevel>,
    structs: Vec<HirStruct>,
    /// One entry per function declaration, in source order.
    signatures: Vec<Signature>,
    param_types: Vec<Vec<Type>>,
    ret_types: Vec<Option<Type>>,
}

/// What an expression evaluates to before it is used.
#[derive(Debug, Clone)]
enum Operand<'r> {
    Value(HirExpr),
    /// Result of `&place`; only valid as a reference argument.
    Reference(HirExpr),
    Callable(Signature),
    Namespace(&'r BuiltinDecl),
    Type(Type),
}

impl Operand<'_> {
    fn describe(&self) -> String {
        match self {
            Operand::Value(_) => "value".to_string(),
            Operand::Reference(_) => "reference".to_string(),
            Operand::Callable(sig) => format!("function {}", sig.name),
            Operand::Namespace(decl) => match decl {
                BuiltinDecl::Namespace { name, .. } => format!("namespace {name}"),
                _ => "namespace".to_string(),
            },
            Operand::Type(ty) => format!("type {ty}"),
        }
    }
}

struct Analyzer<'r> {
    registry: &'r Registry,
    namespace: Namespace,
}

impl<'r> Analyzer<'r> {
    fn new(registry: &'r Registry, unit: &ast::Unit) -> Result<Self, CoreError> {
        let mut analyzer = Analyzer {
            registry,
            namespace: Namespace::default(),
        };
        analyzer.register_declarations(unit)?;
        analyzer.resolve_declarations(unit)?;
        Ok(analyzer)
    }

    /// Pass 1: make every top-level name visible, structs first.
    fn register_declarations(&mut self, unit: &ast::Unit) -> Result<(), CoreError> {
        for decl in &unit.decls {
            if let Decl::Struct(decl) = decl {
                let index = self.namespace.structs.len();
                self.register_name(&decl.name, TopLevel::Struct(index))?;
                self.namespace.structs.push(HirStruct {
                    name: decl.name.name.clone(),
                    fields: Vec::new(),
                });
            }
        }
        for decl in &unit.decls {
            if let Decl::Function(func) = decl {
                let index = self.namespace.signatures.len();
                if let Some(name) = &func.name {
                    self.register_name(name, TopLevel::Function(index))?;
                }
                self.namespace.signatures.push(Signature {
                    name: func
                        .name
                        .as_ref()
                        .map_or_else(|| "<anonymous>".to_string(), |name| name.name.clone()),
                    params: Vec::new(),
                    ret: None,
                    generics: 0,
                    implementation: FnImpl::Namespace(index),
                });
            }
        }
        Ok(())
    }

    fn register_name(&mut self, name: &ast::Ident, entry: TopLevel) -> Result<(), CoreError> {
        if self.registry.get(&name.name).is_some() {
            return Err(CoreError::analysis(
                name.pos,
                format!("\"{}\" is already declared as a builtin", name.name),
            ));
        }
        if self.namespace.names.insert(name.name.clone(), entry).is_some() {
            return Err(CoreError::analysis(
                name.pos,
                format!("duplicate declaration of \"{}\"", name.name),
            ));
        }
        Ok(())
    }

    /// Pass 2: resolve field types and function signatures.
    fn resolve_declarations(&mut self, unit: &ast::Unit) -> Result<(), CoreError> {
        let mut struct_index = 0;
        let mut function_index = 0;
        for decl in &unit.decls {
            match decl {
                Decl::Struct(decl) => {
                    let mut fields: Vec<(String, Type)> = Vec::new();
                    for field in &decl.fields {
                        if fields.iter().any(|(name, _)| *name == field.name.name) {
                            return Err(CoreError::analysis(
                                field.name.pos,
                                format!("duplicate field \"{}\"", field.name.name),
                            ));
                        }
                        fields.push((field.name.name.clone(), self.resolve_type(&field.ty)?));
                    }
                    self.namespace.structs[struct_index].fields = fields;
                    struct_index += 1;
                }
                Decl::Function(func) => {
                    let mut params = Vec::new();
                    let mut param_types = Vec::new();
                    for param in &func.params {
                        let ty = self.resolve_type(&param.ty)?;
                        params.push(ParamSig {
                            ty: TypePattern::from(&ty),
                            by_ref: param.by_ref,
                        });
                        param_types.push(ty);
                    }
                    let ret = func
                        .ret
                        .as_ref()
                        .map(|ty| self.resolve_type(ty))
                        .transpose()?;
                    let signature = &mut self.namespace.signatures[function_index];
                    signature.params = params;
                    signature.ret = ret.as_ref().map(TypePattern::from);
                    self.namespace.param_types.push(param_types);
                    self.namespace.ret_types.push(ret);
                    function_index += 1;
                }
            }
        }
        Ok(())
    }

    fn resolve_type(&self, ty: &ast::TypeExpr) -> Result<Type, CoreError> {
        let unknown =
            || CoreError::analysis(ty.pos, format!("unknown type \"{}\"", ty.display_name()));
        let (first, rest) = ty.path.split_first().ok_or_else(unknown)?;

        let (path, arity) = if let Some(decl) = self.registry.get(first) {
            let mut decl = decl;
            for segment in rest {
                decl = decl.member(segment).ok_or_else(unknown)?;
            }
            match decl {
                BuiltinDecl::Type { path, arity } => (path.clone(), *arity),
                _ => return Err(unknown()),
            }
        } else {
            match self.namespace.names.get(first) {
                Some(TopLevel::Struct(_)) if rest.is_empty() => (vec![first.clone()], 0),
                _ => return Err(unknown()),
            }
        };

        if ty.args.len() != arity {
            return Err(CoreError::analysis(
                ty.pos,
                format!(
                    "type \"{}\" expects {arity} type argument(s), found {}",
                    path.join("."),
                    ty.args.len()
                ),
            ));
        }
        let args = ty
            .args
            .iter()
            .map(|arg| self.resolve_type(arg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Type::new(path, args))
    }

    fn run(self, unit: &ast::Unit) -> Result<HirModule, CoreError> {
        let mut functions = Vec::new();
        let mut index = 0;
        for decl in &unit.decls {
            if let Decl::Function(func) = decl {
                functions.push(self.check_function(index, func)?);
                index += 1;
            }
        }
        Ok(HirModule {
            structs: self.namespace.structs,
            functions,
        })
    }

    fn check_function(
        &self,
        index: usize,
        func: &ast::FunctionDecl,
    ) -> Result<HirFunction, CoreError> {
        let ret = self.namespace.ret_types[index].clone();
        let mut checker = FunctionChecker {
            analyzer: self,
            scopes: ScopeStack::new(),
            ret: ret.clone(),
        };
        checker.scopes.push();

        let mut params = Vec::new();
        for (param, ty) in func.params.iter().zip(&self.namespace.param_types[index]) {
            let local = checker.scopes.declare(&param.name.name, ty.clone()).ok_or_else(|| {
                CoreError::analysis(
                    param.name.pos,
                    format!("duplicate parameter \"{}\"", param.name.name),
                )
            })?;
            params.push(HirParam {
                local,
                ty: ty.clone(),
                by_ref: param.by_ref,
            });
        }

        let mut body = Vec::new();
        for stmt in &func.body {
            body.push(checker.check_stmt(stmt)?);
        }
        let scope_locals = checker.scopes.pop();
        reachability::check_body(&func.body, ret.is_some(), func.end)?;

        Ok(HirFunction {
            name: func.name.as_ref().map(|name| name.name.clone()),
            ret,
            is_exported: func.is_exported,
            params,
            locals: checker.scopes.into_slots(),
            scope_locals,
            body,
        })
    }
}

/// Per-function checking state.
struct FunctionChecker<'a, 'r> {
    analyzer: &'a Analyzer<'r>,
    scopes: ScopeStack,
    ret: Option<Type>,
}

impl<'r> FunctionChecker<'_, 'r> {
    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn check_stmt(&mut self, stmt: &ast::Stmt) -> Result<HirStmt, CoreError> {
        match &stmt.kind {
            StmtKind::Expr(expr) => {
                let expr = self.check_value(expr, None)?;
                Ok(HirStmt::Expr(expr))
            }
            StmtKind::Local { ty, name, init } => {
                let ty = self.analyzer.resolve_type(ty)?;
                let init = match init {
                    Some(init) => {
                        let value = self.check_value(init, Some(&ty))?;
                        let found = self.typed(&value, init.pos)?;
                        if !same_type(&ty, found, init.pos)? {
                            return Err(CoreError::analysis(
                                init.pos,
                                format!(
                                    "cannot initialize \"{}\" of type {ty} with {found}",
                                    name.name
                                ),
                            ));
                        }
                        Some(value)
                    }
                    None => None,
                };
                let local = self.scopes.declare(&name.name, ty).ok_or_else(|| {
                    CoreError::analysis(
                        name.pos,
                        format!("\"{}\" is already declared in this scope", name.name),
                    )
                })?;
                Ok(HirStmt::Local { local, init })
            }
            StmtKind::If { cond, body } => {
                let cond = self.check_condition(cond)?;
                let body = self.check_body(body)?;
                Ok(HirStmt::If { cond, body })
            }
            StmtKind::While { cond, body } => {
                let cond = self.check_condition(cond)?;
                let body = self.check_body(body)?;
                Ok(HirStmt::While { cond, body })
            }
            StmtKind::Return(value) => {
                let Some(expected) = self.ret.clone() else {
                    return Err(CoreError::analysis(
                        stmt.pos,
                        "cannot return a value from a void function",
                    ));
                };
                let value_expr = self.check_value(value, Some(&expected))?;
                let found = self.typed(&value_expr, value.pos)?;
                if !same_type(&expected, found, value.pos)? {
                    return Err(CoreError::analysis(
                        value.pos,
                        format!("return type mismatch: expected {expected}, found {found}"),
                    ));
                }
                Ok(HirStmt::Return(value_expr))
            }
            StmtKind::Block(stmts) => {
                self.scopes.push();
                let body = stmts
                    .iter()
                    .map(|stmt| self.check_stmt(stmt))
                    .collect::<Result<Vec<_>, _>>();
                let locals = self.scopes.pop();
                Ok(HirStmt::Block {
                    locals,
                    body: body?,
                })
            }
            StmtKind::Empty => Ok(HirStmt::Empty),
        }
    }

    fn check_condition(&mut self, cond: &ast::Expr) -> Result<HirExpr, CoreError> {
        let expr = self.check_value(cond, Some(&Type::bool()))?;
        let ty = self.typed(&expr, cond.pos)?;
        if !ty.is_bool() {
            return Err(CoreError::analysis(
                cond.pos,
                format!("condition must be bool, found {ty}"),
            ));
        }
        Ok(expr)
    }

    /// The body of `if`/`while` gets its own scope, so a declaration used
    /// as the whole body does not leak into the enclosing one.
    fn check_body(&mut self, body: &ast::Stmt) -> Result<Box<HirStmt>, CoreError> {
        self.scopes.push();
        let stmt = self.check_stmt(body);
        let locals = self.scopes.pop();
        let stmt = stmt?;
        if locals.is_empty() {
            Ok(Box::new(stmt))
        } else {
            Ok(Box::new(HirStmt::Block {
                locals,
                body: vec![stmt],
            }))
        }
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Check an expression that must be a plain value.
    fn check_value(
        &mut self,
        expr: &ast::Expr,
        expected: Option<&Type>,
    ) -> Result<HirExpr, CoreError> {
        match self.check_expr(expr, expected)? {
            Operand::Value(value) => Ok(value),
            Operand::Reference(_) => Err(CoreError::analysis(
                expr.pos,
                "address-of is only allowed as a reference argument",
            )),
            other => Err(CoreError::analysis(
                expr.pos,
                format!("expected a value, found {}", other.describe()),
            )),
        }
    }

    /// Type of a value, rejecting the result of a void call.
    fn typed<'e>(&self, expr: &'e HirExpr, pos: Position) -> Result<&'e Type, CoreError> {
        expr.ty
            .as_ref()
            .ok_or_else(|| CoreError::analysis(pos, "void expression used as a value"))
    }

    fn check_expr(
        &mut self,
        expr: &ast::Expr,
        expected: Option<&Type>,
    ) -> Result<Operand<'r>, CoreError> {
        let pos = expr.pos;
        match &expr.kind {
            ExprKind::Str(value) => Ok(Operand::Value(HirExpr::value(
                HirExprKind::Str(value.clone()),
                Type::str(),
            ))),
            ExprKind::Bool(value) => Ok(Operand::Value(HirExpr::value(
                HirExprKind::Bool(*value),
                Type::bool(),
            ))),
            ExprKind::Number(value) => self.check_number(*value, expected, pos).map(Operand::Value),
            ExprKind::Ident(name) => self.resolve_ident(name, pos),
            ExprKind::Member { target, member } => match self.check_expr(target, None)? {
                Operand::Namespace(decl) => match decl.member(&member.name) {
                    Some(found) => Ok(builtin_operand(found)),
                    None => Err(CoreError::analysis(
                        member.pos,
                        format!(
                            "{} has no member \"{}\"",
                            Operand::Namespace(decl).describe(),
                            member.name
                        ),
                    )),
                },
                other => Err(CoreError::analysis(
                    member.pos,
                    format!("cannot access member \"{}\" of {}", member.name, other.describe()),
                )),
            },
            ExprKind::Call { callee, args } => self.check_call(callee, args, pos),
            ExprKind::Index { target, key } => {
                let target_expr = self.check_value(target, None)?;
                let target_ty = self.typed(&target_expr, target.pos)?;
                let Some(item) = target_ty.vec_item().cloned() else {
                    return Err(CoreError::analysis(
                        target.pos,
                        format!("cannot index into {target_ty}"),
                    ));
                };
                let key_ty = Type::int(IntKind::U32);
                let key_expr = self.check_value(key, Some(&key_ty))?;
                let found = self.typed(&key_expr, key.pos)?;
                if !same_type(&key_ty, found, key.pos)? {
                    return Err(CoreError::analysis(
                        key.pos,
                        format!("vector index must be u32, found {found}"),
                    ));
                }
                let lvalue = target_expr.lvalue;
                Ok(Operand::Value(HirExpr {
                    kind: HirExprKind::Index {
                        target: Box::new(target_expr),
                        key: Box::new(key_expr),
                    },
                    ty: Some(item),
                    lvalue,
                }))
            }
            ExprKind::Binary { op, left, right } => {
                self.check_binary(*op, left, right, expected).map(Operand::Value)
            }
            ExprKind::Vector(items) => self.check_vector(items, expected, pos).map(Operand::Value),
            ExprKind::Assign { target, value } => {
                let target_expr = self.check_value(target, None)?;
                if !target_expr.lvalue {
                    return Err(CoreError::analysis(
                        target.pos,
                        "left side of assignment is not assignable",
                    ));
                }
                let target_ty = self.typed(&target_expr, target.pos)?.clone();
                let value_expr = self.check_value(value, Some(&target_ty))?;
                let found = self.typed(&value_expr, value.pos)?;
                if !same_type(&target_ty, found, value.pos)? {
                    return Err(CoreError::analysis(
                        value.pos,
                        format!("cannot assign {found} to {target_ty}"),
                    ));
                }
                Ok(Operand::Value(HirExpr::value(
                    HirExprKind::Assign {
                        target: Box::new(target_expr),
                        value: Box::new(value_expr),
                    },
                    target_ty,
                )))
            }
            ExprKind::AddressOf(target) => {
                let target_expr = self.check_value(target, expected)?;
                if !target_expr.lvalue {
                    return Err(CoreError::analysis(
                        target.pos,
                        "cannot take the address of a temporary value",
                    ));
                }
                Ok(Operand::Reference(target_expr))
            }
        }
    }

    fn check_number(
        &self,
        value: f64,
        expected: Option<&Type>,
        pos: Position,
    ) -> Result<HirExpr, CoreError> {
        let Some(ty) = expected else {
            return Err(CoreError::analysis(
                pos,
                "cannot infer type of numeric literal",
            ));
        };
        let Some(kind) = ty.int_kind() else {
            return Err(CoreError::analysis(
                pos,
                format!("expected {ty}, found numeric literal"),
            ));
        };
        if !kind.accepts(value) {
            return Err(CoreError::analysis(
                pos,
                format!("numeric literal {value} does not fit in {ty}"),
            ));
        }
        Ok(HirExpr::value(HirExprKind::Number(value), ty.clone()))
    }

    fn resolve_ident(&self, name: &str, pos: Position) -> Result<Operand<'r>, CoreError> {
        let registry: &'r Registry = self.analyzer.registry;
        if let Some(decl) = registry.get(name) {
            return Ok(builtin_operand(decl));
        }
        let namespace = &self.analyzer.namespace;
        match namespace.names.get(name) {
            Some(TopLevel::Struct(index)) => {
                return Ok(Operand::Type(Type::named(&namespace.structs[*index].name)));
            }
            Some(TopLevel::Function(index)) => {
                return Ok(Operand::Callable(namespace.signatures[*index].clone()));
            }
            None => {}
        }
        match self.scopes.lookup(name) {
            Some(local) => Ok(Operand::Value(HirExpr {
                kind: HirExprKind::Local(local),
                ty: Some(self.scopes.slot(local).ty.clone()),
                lvalue: true,
            })),
            None => Err(CoreError::analysis(pos, format!("unresolved name \"{name}\""))),
        }
    }

    fn check_call(
        &mut self,
        callee: &ast::Expr,
        args: &[ast::Expr],
        pos: Position,
    ) -> Result<Operand<'r>, CoreError> {
        let signature = match self.check_expr(callee, None)? {
            Operand::Callable(signature) => signature,
            other => {
                return Err(CoreError::analysis(
                    callee.pos,
                    format!("{} is not callable", other.describe()),
                ));
            }
        };
        if args.len() != signature.params.len() {
            return Err(CoreError::analysis(
                pos,
                format!(
                    "{} expects {} argument(s), found {}",
                    signature.name,
                    signature.params.len(),
                    args.len()
                ),
            ));
        }

        let mut bindings: Vec<Option<Type>> = vec![None; signature.generics];
        let mut hir_args = Vec::new();
        for (index, (param, arg)) in signature.params.iter().zip(args).enumerate() {
            let expected = param.ty.instantiate(&bindings);
            let operand = self.check_expr(arg, expected.as_ref())?;
            let (expr, hir_arg) = match (param.by_ref, operand) {
                (true, Operand::Reference(expr)) => (expr.clone(), HirArg::Ref(expr)),
                (false, Operand::Value(expr)) => (expr.clone(), HirArg::Value(expr)),
                (true, _) => {
                    return Err(CoreError::analysis(
                        arg.pos,
                        format!(
                            "argument {} of {} must be passed by reference with &",
                            index + 1,
                            signature.name
                        ),
                    ));
                }
                (false, Operand::Reference(_)) => {
                    return Err(CoreError::analysis(
                        arg.pos,
                        format!(
                            "argument {} of {} is not a reference parameter",
                            index + 1,
                            signature.name
                        ),
                    ));
                }
                (false, other) => {
                    return Err(CoreError::analysis(
                        arg.pos,
                        format!("expected a value, found {}", other.describe()),
                    ));
                }
            };
            let found = self.typed(&expr, arg.pos)?;
            let matches = param
                .ty
                .unify(found, &mut bindings)
                .map_err(|err| depth_error(err, arg.pos))?;
            if !matches {
                let wanted = param
                    .ty
                    .instantiate(&bindings)
                    .map_or_else(|| param.ty.to_string(), |ty| ty.to_string());
                return Err(CoreError::analysis(
                    arg.pos,
                    format!(
                        "argument {} of {}: expected {wanted}, found {found}",
                        index + 1,
                        signature.name
                    ),
                ));
            }
            hir_args.push(hir_arg);
        }

        let ty = match &signature.ret {
            Some(ret) => Some(ret.instantiate(&bindings).ok_or_else(|| {
                CoreError::analysis(
                    pos,
                    format!("cannot infer the return type of {}", signature.name),
                )
            })?),
            None => None,
        };
        Ok(Operand::Value(HirExpr {
            kind: HirExprKind::Call {
                callee: signature.implementation,
                args: hir_args,
            },
            ty,
            lvalue: false,
        }))
    }

    fn check_binary(
        &mut self,
        op: BinaryOp,
        left: &ast::Expr,
        right: &ast::Expr,
        expected: Option<&Type>,
    ) -> Result<HirExpr, CoreError> {
        // Operands of `==` get no context from the (bool) result.
        let outer = if op == BinaryOp::Eq { None } else { expected };

        // Untyped numeric operands take their type from the other side.
        let (left_expr, right_expr) = if left.is_untyped_numeric() && !right.is_untyped_numeric() {
            let right_expr = self.check_value(right, outer)?;
            let context = right_expr.ty.clone();
            let left_expr = self.check_value(left, context.as_ref().or(outer))?;
            (left_expr, right_expr)
        } else {
            let left_expr = self.check_value(left, outer)?;
            let context = left_expr.ty.clone();
            let right_expr = self.check_value(right, context.as_ref().or(outer))?;
            (left_expr, right_expr)
        };

        let left_ty = self.typed(&left_expr, left.pos)?.clone();
        let right_ty = self.typed(&right_expr, right.pos)?;
        if !same_type(&left_ty, right_ty, right.pos)? {
            return Err(CoreError::analysis(
                right.pos,
                format!(
                    "operands of {} have different types: {left_ty} and {right_ty}",
                    op.symbol()
                ),
            ));
        }

        let result = match op {
            BinaryOp::Eq => Type::bool(),
            BinaryOp::Add if left_ty.is_str() || left_ty.is_numeric() => left_ty,
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div if left_ty.is_numeric() => left_ty,
            _ => {
                return Err(CoreError::analysis(
                    left.pos,
                    format!("operator {} cannot be applied to {left_ty}", op.symbol()),
                ));
            }
        };
        Ok(HirExpr::value(
            HirExprKind::Binary {
                op,
                left: Box::new(left_expr),
                right: Box::new(right_expr),
            },
            result,
        ))
    }

    fn check_vector(
        &mut self,
        items: &[ast::Expr],
        expected: Option<&Type>,
        pos: Position,
    ) -> Result<HirExpr, CoreError> {
        if items.is_empty() {
            return Err(CoreError::analysis(
                pos,
                "vector literal must have at least one element",
            ));
        }
        let context = expected.and_then(Type::vec_item).cloned();

        // Non-literal elements first; the first of them fixes the element
        // type that literal elements are then checked against.
        let mut checked: Vec<Option<HirExpr>> = vec![None; items.len()];
        let mut element: Option<Type> = None;
        for (index, item) in items.iter().enumerate() {
            if item.is_untyped_numeric() {
                continue;
            }
            let expr = self.check_value(item, element.as_ref().or(context.as_ref()))?;
            let ty = self.typed(&expr, item.pos)?.clone();
            if let Some(first) = &element {
                if !same_type(first, &ty, item.pos)? {
                    return Err(inconsistent_element(first, &ty.to_string(), item.pos));
                }
            } else {
                element = Some(ty);
            }
            checked[index] = Some(expr);
        }

        let element = element.or(context);
        for (index, item) in items.iter().enumerate() {
            if !item.is_untyped_numeric() {
                continue;
            }
            if let Some(first) = element.as_ref().filter(|ty| !ty.is_numeric()) {
                return Err(inconsistent_element(first, "numeric literal", item.pos));
            }
            checked[index] = Some(self.check_value(item, element.as_ref())?);
        }

        let element = element
            .ok_or_else(|| CoreError::analysis(pos, "cannot infer vector element type"))?;
        let items = checked.into_iter().flatten().collect();
        Ok(HirExpr::value(HirExprKind::Vector(items), Type::vec(element)))
    }
}

fn builtin_operand(decl: &BuiltinDecl) -> Operand<'_> {
    match decl {
        BuiltinDecl::Type { path, .. } => Operand::Type(Type::new(path.clone(), Vec::new())),
        BuiltinDecl::Namespace { .. } => Operand::Namespace(decl),
        BuiltinDecl::Function(signature) => Operand::Callable(signature.clone()),
    }
}

fn same_type(a: &Type, b: &Type, pos: Position) -> Result<bool, CoreError> {
    eq(a, b).map_err(|err| depth_error(err, pos))
}

fn depth_error(err: DepthExceeded, pos: Position) -> CoreError {
    CoreError::analysis(pos, err.to_string())
}

fn inconsistent_element(expected: &Type, found: &str, pos: Position) -> CoreError {
    CoreError::analysis(
        pos,
        format!("inconsistent element type in vector literal: expected {expected}, found {found}"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn analyze_source(source: &str) -> Result<HirModule, CoreError> {
        analyze(&parse(source).expect("parse"))
    }

    fn analyze_body(body: &str) -> Result<HirModule, CoreError> {
        analyze_source(&format!("void f(vec<str> args) {{ {body} }}"))
    }

    fn error_message(body: &str) -> String {
        analyze_body(body).unwrap_err().to_string()
    }

    #[test]
    fn types_entry_point_with_print() {
        let module =
            analyze_source("export void (vec<str> args) { IO.print(\"hi\"); }").expect("analyze");
        let func = &module.functions[0];
        assert!(func.name.is_none());
        assert_eq!(func.params[0].ty, Type::vec(Type::str()));
        assert!(matches!(
            &func.body[0],
            HirStmt::Expr(HirExpr { kind: HirExprKind::Call { .. }, ty: None, .. })
        ));
    }

    #[test]
    fn numeric_literal_needs_context() {
        assert!(error_message("5;").contains("cannot infer type"));
        assert!(analyze_body("i32 x = 5;").is_ok());
    }

    #[test]
    fn numeric_literal_takes_peer_type() {
        assert!(analyze_body("u8 x = 1; bool b = 2 == x; u8 y = 3 + x;").is_ok());
    }

    #[test]
    fn literal_arithmetic_takes_comparison_peer_type() {
        assert!(analyze_body("u8 x = 3; if (1 + 2 == x) x = 0;").is_ok());
        assert!(analyze_body("u8 x = 3; if ((1 + 2) * 2 == x) x = 0;").is_ok());
        assert!(analyze_body("u8 x = 3; if (x == 1 + 2) x = 0;").is_ok());
        assert!(analyze_body("u8 x = 3; vec<u8> v = [1 + 2, x];").is_ok());
        assert!(error_message("bool b = 1 + 2 == 3;").contains("cannot infer type"));
    }

    #[test]
    fn numeric_literal_must_fit_its_type() {
        assert!(error_message("u8 x = 256;").contains("does not fit"));
        assert!(error_message("i32 x = 1.5;").contains("does not fit"));
    }

    #[test]
    fn reference_parameters_require_address_of() {
        let source = "void inc(ref i32 x) { x = x + 1; }";
        let by_value = analyze_source(&format!("{source} void g() {{ i32 y = 1; inc(y); }}"));
        assert!(by_value.unwrap_err().to_string().contains("by reference"));
        let by_ref = analyze_source(&format!("{source} void g() {{ i32 y = 1; inc(&y); }}"));
        assert!(by_ref.is_ok());
    }

    #[test]
    fn value_parameters_reject_address_of() {
        let err = analyze_source("void show(str s) {} void g() { str t = \"a\"; show(&t); }")
            .unwrap_err();
        assert!(err.to_string().contains("not a reference parameter"));
    }

    #[test]
    fn address_of_requires_lvalue() {
        let err = analyze_source("void g() { push(&[\"a\"], \"b\"); }").unwrap_err();
        assert!(err.to_string().contains("address of a temporary"));
        let err = analyze_source("void g() { vec<i32> v = [1]; push(&v, &v); }").unwrap_err();
        assert!(err.to_string().contains("not a reference parameter"));
    }

    #[test]
    fn generic_push_binds_item_type() {
        assert!(analyze_body("vec<i32> v = [1, 2]; push(&v, 3);").is_ok());
        let err = error_message("vec<i32> v = [1]; push(&v, \"x\");");
        assert!(err.contains("expected i32, found str"));
    }

    #[test]
    fn vector_literals_need_consistent_elements() {
        assert!(error_message("vec<str> v = [\"a\", true];").contains("inconsistent element type"));
        assert!(error_message("vec<str> v = [\"a\", 1];").contains("inconsistent element type"));
        assert!(error_message("vec<str> v = [];").contains("at least one element"));
        assert!(analyze_body("vec<vec<u8>> m = [[1], [2, 3]];").is_ok());
    }

    #[test]
    fn indexing_requires_u32_key_and_vector_target() {
        assert!(analyze_body("str first = args[0];").is_ok());
        assert!(error_message("i32 k = 0; str s = args[k];").contains("must be u32"));
        assert!(error_message("str s = \"x\"; str t = s[0];").contains("cannot index"));
    }

    #[test]
    fn index_access_is_assignable() {
        assert!(analyze_body("args[0] = \"x\";").is_ok());
        assert!(error_message("\"a\" = \"b\";").contains("not assignable"));
    }

    #[test]
    fn binary_operator_rules() {
        assert!(analyze_body("str s = \"a\" + \"b\";").is_ok());
        assert!(error_message("str s = \"a\" - \"b\";").contains("cannot be applied"));
        assert!(error_message("bool b = true + false;").contains("cannot be applied"));
        assert!(error_message("i32 a = 1; u8 b = 2; bool c = a == b;").contains("different types"));
        assert!(analyze_body("i32 a = 6; i32 b = a * 2 / 3 - 1;").is_ok());
    }

    #[test]
    fn same_scope_redeclaration_is_rejected_but_shadowing_is_allowed() {
        assert!(error_message("i32 x = 1; i32 x = 2;").contains("already declared"));
        let module = analyze_body("i32 x = 1; { i32 x = 2; }").expect("shadowing");
        assert_eq!(module.functions[0].locals.len(), 3);
    }

    #[test]
    fn locals_are_not_visible_after_their_block() {
        assert!(error_message("{ i32 x = 1; } x = 2;").contains("unresolved name"));
    }

    #[test]
    fn builtins_resolve_before_locals() {
        assert!(error_message("str IO = \"x\"; IO.print(IO);").contains("expected a value"));
    }

    #[test]
    fn conditions_must_be_bool() {
        assert!(error_message("if (\"x\") IO.print(\"y\");").contains("must be bool"));
        assert!(analyze_body("while (false) ;").is_ok());
    }

    #[test]
    fn return_type_must_match() {
        let err = analyze_source("i32 f() { return \"x\"; }").unwrap_err();
        assert!(err.to_string().contains("return type mismatch"));
        let err = analyze_source("void f() { return 1; }").unwrap_err();
        assert!(err.to_string().contains("void function"));
    }

    #[test]
    fn missing_return_is_reported_at_closing_brace() {
        let err = analyze_source("i32 f() {\n}").unwrap_err();
        assert_eq!(err.position(), Position::new(2, 1));
    }

    #[test]
    fn duplicate_top_level_names_are_rejected() {
        let err = analyze_source("void f() {} void f() {}").unwrap_err();
        assert!(err.to_string().contains("duplicate"));
        assert!(analyze_source("struct P { i32 x } void P() {}").is_err());
        assert!(analyze_source("void push() {}").unwrap_err().to_string().contains("builtin"));
    }

    #[test]
    fn signatures_see_later_declarations() {
        let module = analyze_source("P make(P p) { return p; } struct P { i32 x, IO.file f }")
            .expect("analyze");
        let file = Type::new(vec!["IO".into(), "file".into()], vec![]);
        assert_eq!(module.structs[0].fields[1].1, file);
    }

    #[test]
    fn type_arguments_are_checked() {
        assert!(error_message("vec v = [1];").contains("type argument"));
        assert!(error_message("i32<str> v = 1;").contains("type argument"));
        assert!(error_message("nope n;").contains("unknown type"));
    }

    #[test]
    fn void_results_cannot_be_used_as_values() {
        assert!(error_message("str s = IO.print(\"x\");").contains("void expression"));
    }

    #[test]
    fn arity_must_match() {
        assert!(error_message("IO.print(\"a\", \"b\");").contains("expects 1 argument"));
    }

    #[test]
    fn declaration_as_if_body_gets_own_scope() {
        let module = analyze_body("if (true) i32 x = 1;").expect("analyze");
        let HirStmt::If { body, .. } = &module.functions[0].body[0] else {
            panic!("expected if");
        };
        assert!(matches!(**body, HirStmt::Block { .. }));
    }
}
