//! Typed intermediate representation.
//!
//! HIR is what the analyzer produces and the code generator consumes:
//! every name is resolved to a local slot or a callee, and every
//! expression carries its type.

use crate::ast::BinaryOp;
use crate::builtins::FnImpl;
use crate::types::Type;

/// Index into a function's local slot list. Slots are never reused within
/// one function, so a slot id identifies a single declaration.
pub type LocalId = usize;

#[derive(Debug, Clone, PartialEq)]
pub struct HirModule {
    pub structs: Vec<HirStruct>,
    pub functions: Vec<HirFunction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirStruct {
    pub name: String,
    pub fields: Vec<(String, Type)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirFunction {
    pub name: Option<String>,
    /// `None` for `void`.
    pub ret: Option<Type>,
    pub is_exported: bool,
    pub params: Vec<HirParam>,
    /// Every local of the function, including parameters, in slot order.
    pub locals: Vec<LocalSlot>,
    /// Slots declared directly in the function's outermost scope,
    /// parameters first.
    pub scope_locals: Vec<LocalId>,
    pub body: Vec<HirStmt>,
}

impl HirFunction {
    pub fn has_ref_params(&self) -> bool {
        self.params.iter().any(|param| param.by_ref)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirParam {
    pub local: LocalId,
    pub ty: Type,
    pub by_ref: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocalSlot {
    pub name: String,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HirStmt {
    Expr(HirExpr),
    Local {
        local: LocalId,
        init: Option<HirExpr>,
    },
    If {
        cond: HirExpr,
        body: Box<HirStmt>,
    },
    While {
        cond: HirExpr,
        body: Box<HirStmt>,
    },
    Return(HirExpr),
    Block {
        /// Slots declared directly in this block.
        locals: Vec<LocalId>,
        body: Vec<HirStmt>,
    },
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HirExpr {
    pub kind: HirExprKind,
    /// `None` for the result of a void call.
    pub ty: Option<Type>,
    pub lvalue: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum HirExprKind {
    Str(String),
    Number(f64),
    Bool(bool),
    Local(LocalId),
    Call {
        callee: FnImpl,
        args: Vec<HirArg>,
    },
    Index {
        target: Box<HirExpr>,
        key: Box<HirExpr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<HirExpr>,
        right: Box<HirExpr>,
    },
    Vector(Vec<HirExpr>),
    Assign {
        target: Box<HirExpr>,
        value: Box<HirExpr>,
    },
    /// A call to a function with reference parameters whose final values
    /// are stored back into `targets`. Only produced by [`crate::lower`].
    WriteBack {
        call: Box<HirExpr>,
        targets: Vec<HirExpr>,
        has_value: bool,
    },
}

/// A call argument.
#[derive(Debug, Clone, PartialEq)]
pub enum HirArg {
    Value(HirExpr),
    /// Storage location passed to a reference parameter.
    Ref(HirExpr),
}

impl HirArg {
    pub fn expr(&self) -> &HirExpr {
        match self {
            HirArg::Value(expr) | HirArg::Ref(expr) => expr,
        }
    }
}

impl HirExpr {
    pub fn value(kind: HirExprKind, ty: Type) -> Self {
        HirExpr {
            kind,
            ty: Some(ty),
            lvalue: false,
        }
    }

    /// Statically a vector read straight out of existing storage, i.e. one
    /// that aliases it in the generated program.
    pub fn is_vec_place(&self) -> bool {
        let is_vec = self.ty.as_ref().is_some_and(|ty| ty.vec_item().is_some());
        is_vec && matches!(self.kind, HirExprKind::Local(_) | HirExprKind::Index { .. })
    }
}
