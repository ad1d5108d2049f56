//! Surface syntax tree produced by the parser.
//!
//! Nodes are exactly what was written: names are unresolved and types are
//! still syntactic.

use crate::span::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub decls: Vec<Decl>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Struct(StructDecl),
    Function(FunctionDecl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub name: String,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDecl {
    pub name: Ident,
    pub fields: Vec<Field>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub ty: TypeExpr,
    pub name: Ident,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDecl {
    /// `None` for anonymous functions such as the program entry point.
    pub name: Option<Ident>,
    /// `None` for `void`.
    pub ret: Option<TypeExpr>,
    pub is_exported: bool,
    pub params: Vec<Param>,
    pub body: Vec<Stmt>,
    pub pos: Position,
    /// Position of the closing brace.
    pub end: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub ty: TypeExpr,
    pub name: Ident,
    pub by_ref: bool,
}

/// A type as written, e.g. `vec<str>` or `IO.file`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeExpr {
    pub path: Vec<String>,
    pub args: Vec<TypeExpr>,
    pub pos: Position,
}

impl TypeExpr {
    pub fn display_name(&self) -> String {
        let mut out = self.path.join(".");
        if !self.args.is_empty() {
            let args: Vec<String> = self.args.iter().map(TypeExpr::display_name).collect();
            out.push('<');
            out.push_str(&args.join(", "));
            out.push('>');
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Expr(Expr),
    Local {
        ty: TypeExpr,
        name: Ident,
        init: Option<Expr>,
    },
    If {
        cond: Expr,
        body: Box<Stmt>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Return(Expr),
    Block(Vec<Stmt>),
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Str(String),
    Number(f64),
    Bool(bool),
    Ident(String),
    Member {
        target: Box<Expr>,
        member: Ident,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Index {
        target: Box<Expr>,
        key: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Vector(Vec<Expr>),
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    AddressOf(Box<Expr>),
}

impl Expr {
    /// True for a numeric literal or arithmetic over numeric literals only.
    /// Such an expression has no type of its own and takes one from context.
    pub fn is_untyped_numeric(&self) -> bool {
        match &self.kind {
            ExprKind::Number(_) => true,
            ExprKind::Binary { op, left, right } => {
                *op != BinaryOp::Eq && left.is_untyped_numeric() && right.is_untyped_numeric()
            }
            _ => false,
        }
    }
}
