//! Typed AST: structurally parallel to [`al_parser::ast`], with every
//! expression node carrying its inferred [`Ty`]. Node-for-node, same
//! order as the untyped tree it was built from.

use al_common::Span;
use al_parser::{BinOp, PropagateKind, UnOp};

use crate::ty::Ty;

#[derive(Debug, Clone)]
pub struct TypedBlock {
    pub body: Vec<TypedNode>,
    pub ty: Ty,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypedNode {
    Stmt(TypedStmt),
    Expr(TypedExpr),
}

#[derive(Debug, Clone)]
pub enum TypedStmt {
    VariableBinding { name: String, init: Box<TypedExpr>, span: Span },
    ConstBinding { name: String, init: Box<TypedExpr>, span: Span },
    TypePatternBinding { type_name: String, init: Box<TypedExpr>, span: Span },
    TupleDestructuringBinding { names: Vec<String>, init: Box<TypedExpr>, span: Span },
    FunctionDeclaration { name: String, ty: Ty, body: TypedBlock, span: Span },
    StructDeclaration { name: String, span: Span },
    EnumDeclaration { name: String, span: Span },
    ImportDeclaration { path: String, names: Vec<String>, span: Span },
    ExportDeclaration { inner: Box<TypedStmt>, span: Span },
}

#[derive(Debug, Clone)]
pub struct TypedMatchArm {
    pub body: Box<TypedExpr>,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypedExpr {
    IntLiteral(i64, Span),
    FloatLiteral(f64, Span),
    StringLiteral(String, Span),
    InterpolatedString(Vec<TypedExpr>, Span),
    BoolLiteral(bool, Span),
    NoneLiteral(Span),
    Identifier { name: String, ty: Ty, span: Span },
    PropertyAccess { left: Box<TypedExpr>, ty: Ty, span: Span },
    ArrayIndex { array: Box<TypedExpr>, index: Box<TypedExpr>, ty: Ty, span: Span },
    Range { start: Box<TypedExpr>, end: Box<TypedExpr>, ty: Ty, span: Span },
    Tuple(Vec<TypedExpr>, Ty, Span),
    Array(Vec<TypedExpr>, Ty, Span),
    If { cond: Box<TypedExpr>, then: TypedBlock, else_: Option<Box<TypedExpr>>, ty: Ty, span: Span },
    Match { subject: Box<TypedExpr>, arms: Vec<TypedMatchArm>, ty: Ty, span: Span },
    Block(TypedBlock),
    FunctionExpr { ty: Ty, body: TypedBlock, span: Span },
    Call { callee: Box<TypedExpr>, args: Vec<TypedExpr>, ty: Ty, span: Span },
    StructInit { name: String, fields: Vec<(String, TypedExpr)>, ty: Ty, span: Span },
    Binary { op: BinOp, lhs: Box<TypedExpr>, rhs: Box<TypedExpr>, ty: Ty, span: Span },
    Unary { op: UnOp, operand: Box<TypedExpr>, ty: Ty, span: Span },
    /// `pre_unwrap_ty` is the `Option`/`Result` type of `lhs` before the
    /// fallback was applied -- codegen needs to know which it unwrapped.
    OrExpression { lhs: Box<TypedExpr>, body: Box<TypedExpr>, pre_unwrap_ty: Ty, ty: Ty, span: Span },
    ErrorExpression { inner: Box<TypedExpr>, ty: Ty, span: Span },
    Propagate { inner: Box<TypedExpr>, kind: PropagateKind, pre_unwrap_ty: Ty, ty: Ty, span: Span },
    Assert { cond: Box<TypedExpr>, message: Box<TypedExpr>, span: Span },
    ErrorNode { span: Span },
}

impl TypedExpr {
    pub fn ty(&self) -> Ty {
        match self {
            TypedExpr::IntLiteral(..) => Ty::Int,
            TypedExpr::FloatLiteral(..) => Ty::Float,
            TypedExpr::StringLiteral(..) | TypedExpr::InterpolatedString(..) => Ty::String,
            TypedExpr::BoolLiteral(..) => Ty::Bool,
            TypedExpr::NoneLiteral(_) => Ty::None,
            TypedExpr::Identifier { ty, .. }
            | TypedExpr::PropertyAccess { ty, .. }
            | TypedExpr::ArrayIndex { ty, .. }
            | TypedExpr::Range { ty, .. }
            | TypedExpr::If { ty, .. }
            | TypedExpr::Match { ty, .. }
            | TypedExpr::FunctionExpr { ty, .. }
            | TypedExpr::Call { ty, .. }
            | TypedExpr::StructInit { ty, .. }
            | TypedExpr::Binary { ty, .. }
            | TypedExpr::Unary { ty, .. }
            | TypedExpr::OrExpression { ty, .. }
            | TypedExpr::ErrorExpression { ty, .. }
            | TypedExpr::Propagate { ty, .. } => ty.clone(),
            TypedExpr::Tuple(_, ty, _) | TypedExpr::Array(_, ty, _) => ty.clone(),
            TypedExpr::Block(b) => b.ty.clone(),
            TypedExpr::Assert { .. } => Ty::None,
            TypedExpr::ErrorNode { .. } => Ty::None,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            TypedExpr::IntLiteral(_, s)
            | TypedExpr::FloatLiteral(_, s)
            | TypedExpr::StringLiteral(_, s)
            | TypedExpr::InterpolatedString(_, s)
            | TypedExpr::BoolLiteral(_, s)
            | TypedExpr::NoneLiteral(s)
            | TypedExpr::Identifier { span: s, .. }
            | TypedExpr::PropertyAccess { span: s, .. }
            | TypedExpr::ArrayIndex { span: s, .. }
            | TypedExpr::Range { span: s, .. }
            | TypedExpr::If { span: s, .. }
            | TypedExpr::Match { span: s, .. }
            | TypedExpr::FunctionExpr { span: s, .. }
            | TypedExpr::Call { span: s, .. }
            | TypedExpr::StructInit { span: s, .. }
            | TypedExpr::Binary { span: s, .. }
            | TypedExpr::Unary { span: s, .. }
            | TypedExpr::OrExpression { span: s, .. }
            | TypedExpr::ErrorExpression { span: s, .. }
            | TypedExpr::Propagate { span: s, .. }
            | TypedExpr::Assert { span: s, .. }
            | TypedExpr::ErrorNode { span: s } => *s,
            TypedExpr::Tuple(_, _, s) | TypedExpr::Array(_, _, s) => *s,
            TypedExpr::Block(b) => b.span,
        }
    }
}
