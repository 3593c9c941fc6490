//! Untyped AST. A plain tagged-union tree: every node is either a
//! [`Stmt`] or an [`Expr`], each carrying its own [`Span`].
//!
//! Patterns are not a separate node family: per the surface grammar, a
//! match arm's pattern position holds either `_`, an or-pattern, or any
//! ordinary expression (literal, identifier, tuple, array-with-spread,
//! call, property access) read structurally by the pattern analyzer.

use al_common::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Stmt(Stmt),
    Expr(Expr),
}

impl Node {
    pub fn span(&self) -> Span {
        match self {
            Node::Stmt(s) => s.span(),
            Node::Expr(e) => e.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub body: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: String,
    pub type_annotation: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub type_annotation: TypeExpr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub name: String,
    pub payload: Vec<TypeExpr>,
    pub span: Span,
}

/// A type annotation as written in source. `?T` is sugar for `Option(T)`,
/// `T!E` is sugar for `Result(T, E)`.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Named(String, Span),
    Applied(String, Vec<TypeExpr>, Span),
    Optional(Box<TypeExpr>, Span),
    Fallible(Box<TypeExpr>, Box<TypeExpr>, Span),
    Error(Span),
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named(_, s)
            | TypeExpr::Applied(_, _, s)
            | TypeExpr::Optional(_, s)
            | TypeExpr::Fallible(_, _, s)
            | TypeExpr::Error(s) => *s,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DestructureElement {
    Name(String, Span),
    TypeAssert(String, Span),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    VariableBinding {
        name: String,
        type_annotation: Option<TypeExpr>,
        init: Box<Expr>,
        doc: Option<String>,
        span: Span,
    },
    ConstBinding {
        name: String,
        init: Box<Expr>,
        doc: Option<String>,
        span: Span,
    },
    TypePatternBinding {
        type_name: String,
        init: Box<Expr>,
        span: Span,
    },
    TupleDestructuringBinding {
        elements: Vec<DestructureElement>,
        init: Box<Expr>,
        span: Span,
    },
    FunctionDeclaration {
        name: String,
        params: Vec<Param>,
        return_type: Option<TypeExpr>,
        body: Block,
        doc: Option<String>,
        span: Span,
    },
    StructDeclaration {
        name: String,
        generics: Vec<String>,
        fields: Vec<FieldDef>,
        doc: Option<String>,
        span: Span,
    },
    EnumDeclaration {
        name: String,
        generics: Vec<String>,
        variants: Vec<VariantDef>,
        doc: Option<String>,
        span: Span,
    },
    ImportDeclaration {
        path: String,
        names: Vec<String>,
        span: Span,
    },
    ExportDeclaration {
        inner: Box<Stmt>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::VariableBinding { span, .. }
            | Stmt::ConstBinding { span, .. }
            | Stmt::TypePatternBinding { span, .. }
            | Stmt::TupleDestructuringBinding { span, .. }
            | Stmt::FunctionDeclaration { span, .. }
            | Stmt::StructDeclaration { span, .. }
            | Stmt::EnumDeclaration { span, .. }
            | Stmt::ImportDeclaration { span, .. }
            | Stmt::ExportDeclaration { span, .. } => *span,
        }
    }

    pub fn doc(&self) -> Option<&str> {
        match self {
            Stmt::VariableBinding { doc, .. }
            | Stmt::ConstBinding { doc, .. }
            | Stmt::FunctionDeclaration { doc, .. }
            | Stmt::StructDeclaration { doc, .. }
            | Stmt::EnumDeclaration { doc, .. } => doc.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StringPart {
    Text(String),
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElement {
    Item(Expr),
    Spread(Expr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropagateKind {
    Bang,
    Question,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PropertyRight {
    Name(String),
    Call { name: String, args: Vec<Expr> },
    TupleIndex(u32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Box<Expr>,
    pub span: Span,
}

/// Patterns reuse expression nodes: only the wildcard and the or-pattern
/// separator are pattern-specific surface forms.
#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Wildcard(Span),
    Or(Vec<Pattern>, Span),
    Expr(Box<Expr>),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Wildcard(s) | Pattern::Or(_, s) => *s,
            Pattern::Expr(e) => e.span(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    IntLiteral(i64, Span),
    FloatLiteral(f64, Span),
    StringLiteral(String, Span),
    InterpolatedString(Vec<StringPart>, Span),
    BoolLiteral(bool, Span),
    NoneLiteral(Span),
    Identifier(String, Span),
    PropertyAccess {
        left: Box<Expr>,
        right: PropertyRight,
        span: Span,
    },
    ArrayIndex {
        array: Box<Expr>,
        index: Box<Expr>,
        span: Span,
    },
    Range {
        start: Box<Expr>,
        end: Box<Expr>,
        span: Span,
    },
    Tuple(Vec<Expr>, Span),
    Array(Vec<ArrayElement>, Span),
    If {
        cond: Box<Expr>,
        then: Block,
        else_: Option<Box<Expr>>,
        span: Span,
    },
    Match {
        subject: Box<Expr>,
        arms: Vec<MatchArm>,
        span: Span,
    },
    Block(Block),
    FunctionExpr {
        params: Vec<Param>,
        return_type: Option<TypeExpr>,
        body: Block,
        span: Span,
    },
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
        span: Span,
    },
    StructInit {
        name: String,
        type_args: Vec<TypeExpr>,
        fields: Vec<(String, Expr)>,
        span: Span,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        span: Span,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: Span,
    },
    OrExpression {
        lhs: Box<Expr>,
        err_name: Option<String>,
        body: Box<Expr>,
        span: Span,
    },
    ErrorExpression {
        inner: Box<Expr>,
        span: Span,
    },
    Propagate {
        inner: Box<Expr>,
        kind: PropagateKind,
        span: Span,
    },
    Assert {
        cond: Box<Expr>,
        message: Box<Expr>,
        span: Span,
    },
    ErrorNode {
        message: String,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> Span {
        match self {
            Expr::IntLiteral(_, s)
            | Expr::FloatLiteral(_, s)
            | Expr::StringLiteral(_, s)
            | Expr::InterpolatedString(_, s)
            | Expr::BoolLiteral(_, s)
            | Expr::NoneLiteral(s)
            | Expr::Identifier(_, s)
            | Expr::PropertyAccess { span: s, .. }
            | Expr::ArrayIndex { span: s, .. }
            | Expr::Range { span: s, .. }
            | Expr::Tuple(_, s)
            | Expr::Array(_, s)
            | Expr::If { span: s, .. }
            | Expr::Match { span: s, .. }
            | Expr::FunctionExpr { span: s, .. }
            | Expr::Call { span: s, .. }
            | Expr::StructInit { span: s, .. }
            | Expr::Binary { span: s, .. }
            | Expr::Unary { span: s, .. }
            | Expr::OrExpression { span: s, .. }
            | Expr::ErrorExpression { span: s, .. }
            | Expr::Propagate { span: s, .. }
            | Expr::Assert { span: s, .. }
            | Expr::ErrorNode { span: s, .. } => *s,
            Expr::Block(b) => b.span,
        }
    }

    pub fn is_error_node(&self) -> bool {
        matches!(self, Expr::ErrorNode { .. })
    }
}
