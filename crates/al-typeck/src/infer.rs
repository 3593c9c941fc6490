//! Bidirectional type checker: walks the untyped AST, producing a
//! structurally-parallel typed AST plus a diagnostic list.
//!
//! Top-level structs/enums are registered before any body is checked, so
//! forward and mutually-recursive references between nominal types work.
//! Functions are checked top-to-bottom in declaration order; a function's
//! own signature is generalized into a polymorphic `Scheme` the moment its
//! body finishes checking, so later call sites each get a fresh
//! instantiation (this is what lets `fn id(x) { x }` get used at both
//! `Int` and `String` later in the same block).

use rustc_hash::FxHashMap;

use al_common::{Diagnostic, Span};
use al_parser::ast::{ArrayElement, Block, DestructureElement, Expr, MatchArm, Node, Param, Pattern, PropertyRight, Stmt, StringPart, TypeExpr};
use al_parser::{BinOp, PropagateKind, UnOp};

use crate::builtins;
use crate::env::{EnumInfo, EnumVariantInfo, StructInfo, TypeEnv, TypePosition};
use crate::error::{ConstraintOrigin, TypeError};
use crate::exhaustiveness::{self, Pat};
use crate::ty::{FieldTy, Scheme, Ty, TyVar, VariantTy};
use crate::typed::{TypedBlock, TypedExpr, TypedMatchArm, TypedNode, TypedStmt};
use crate::unify::InferCtx;

pub struct CheckResult {
    pub typed_ast: TypedBlock,
    pub diagnostics: Vec<Diagnostic>,
    pub env: TypeEnv,
    pub success: bool,
}

/// Check a whole program. The single public entry point of this crate.
pub fn check(ast: &Block) -> CheckResult {
    let mut checker = Checker::new();
    checker.register_nominals(&ast.body);
    let typed_ast = checker.check_block_inner(ast, true);
    let diagnostics: Vec<Diagnostic> = checker.errors.into_iter().map(TypeError::into_diagnostic).collect();
    let success = !diagnostics.iter().any(Diagnostic::is_error);
    CheckResult { typed_ast, diagnostics, env: checker.env, success }
}

struct FnFrame {
    ret: Ty,
    error_ty: Option<Ty>,
}

struct Checker {
    ctx: InferCtx,
    env: TypeEnv,
    errors: Vec<TypeError>,
    fn_stack: Vec<FnFrame>,
}

fn unwrap_export(stmt: &Stmt) -> &Stmt {
    match stmt {
        Stmt::ExportDeclaration { inner, .. } => unwrap_export(inner),
        other => other,
    }
}

/// Classic iterative edit-distance, used for "did you mean" suggestions on
/// unbound names. Only offered when the distance is small relative to the
/// name's length, so it doesn't suggest nonsense for very short names.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for i in 1..=a.len() {
        cur[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            cur[j] = (prev[j] + 1).min(cur[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

fn best_suggestion(name: &str, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .filter(|c| c.as_str() != name)
        .map(|c| (levenshtein(name, c), c))
        .filter(|(d, _)| *d <= 3)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c.clone())
}

impl Checker {
    fn new() -> Self {
        Checker {
            ctx: InferCtx::new(),
            env: TypeEnv::new(),
            errors: Vec::new(),
            fn_stack: Vec::new(),
        }
    }

    fn push_error(&mut self, e: TypeError) {
        self.errors.push(e);
    }

    /// Unify and resolve, recording a diagnostic (rather than aborting) on
    /// mismatch -- every call site keeps checking with its best guess.
    fn unify(&mut self, a: Ty, b: Ty, origin: ConstraintOrigin) -> Ty {
        match self.ctx.unify(a.clone(), b, origin) {
            Ok(()) => self.ctx.resolve(a),
            Err(e) => {
                self.push_error(e);
                self.ctx.resolve(a)
            }
        }
    }

    /// The only place coercions happen: `T` accepted where `Option<T>` is
    /// expected, `None` accepted where `Option<T>` is expected, and `T`
    /// accepted where `Result<T, E>` is expected.
    fn expect_type(&mut self, expected: &Ty, found: Ty, span: Span, origin: ConstraintOrigin) -> Ty {
        let expected_r = self.ctx.resolve(expected.clone());
        let found_r = self.ctx.resolve(found);
        match (&expected_r, &found_r) {
            (Ty::Option(_), Ty::None) => {
                return expected_r;
            }
            (Ty::Option(inner), other) if !matches!(other, Ty::Option(_)) => {
                self.unify((**inner).clone(), other.clone(), origin);
                return expected_r;
            }
            (Ty::Result(ok, _err), other) if !matches!(other, Ty::Result(_, _)) => {
                self.unify((**ok).clone(), other.clone(), origin);
                return expected_r;
            }
            (Ty::Result(exp_ok, exp_err), Ty::Result(found_ok, found_err)) if **found_ok == Ty::None => {
                self.unify((**exp_err).clone(), (**found_err).clone(), origin);
                return Ty::Result(exp_ok.clone(), exp_err.clone());
            }
            _ => {}
        }
        self.unify(expected_r, found_r, origin)
    }

    /// Least-upper-type merge for `if`/`match` branches, including the
    /// `T + None -> Option<T>` and `T + <error struct> -> Result<T, E>`
    /// promotions.
    fn unify_branches(&mut self, a: Ty, b: Ty, span: Span) -> Ty {
        let a = self.ctx.resolve(a);
        let b = self.ctx.resolve(b);
        let origin = ConstraintOrigin::Branches { span };
        if a == b {
            return a;
        }
        if matches!(a, Ty::None) && !matches!(b, Ty::None) {
            return Ty::Option(Box::new(b));
        }
        if matches!(b, Ty::None) && !matches!(a, Ty::None) {
            return Ty::Option(Box::new(a));
        }
        if a.is_struct() && !b.is_struct() {
            return Ty::Result(Box::new(b), Box::new(a));
        }
        if b.is_struct() && !a.is_struct() {
            return Ty::Result(Box::new(a), Box::new(b));
        }
        if let (Ty::Result(ok1, err1), Ty::Result(ok2, err2)) = (&a, &b) {
            let ok = if **ok1 == Ty::None {
                (**ok2).clone()
            } else if **ok2 == Ty::None {
                (**ok1).clone()
            } else {
                self.unify((**ok1).clone(), (**ok2).clone(), origin.clone())
            };
            let err = self.unify((**err1).clone(), (**err2).clone(), origin);
            return Ty::Result(Box::new(ok), Box::new(err));
        }
        if let Ty::Result(ok, err) = &a {
            if **ok == Ty::None {
                return Ty::Result(Box::new(b), err.clone());
            }
        }
        if let Ty::Result(ok, err) = &b {
            if **ok == Ty::None {
                return Ty::Result(Box::new(a), err.clone());
            }
        }
        self.unify(a, b, origin)
    }

    fn suggest(&self, name: &str, extra: &[String]) -> Option<String> {
        let mut candidates = self.env.visible_names();
        candidates.extend_from_slice(extra);
        best_suggestion(name, &candidates)
    }

    // ── Nominal type registration ─────────────────────────────────────

    fn register_nominals(&mut self, body: &[Node]) {
        for node in body {
            if let Node::Stmt(stmt) = node {
                match unwrap_export(stmt) {
                    Stmt::StructDeclaration { name, generics, doc, span, .. } => {
                        let id = self.env.fresh_nominal_id();
                        let generic_vars = self.fresh_generic_vars(generics.len());
                        self.env.register_struct(StructInfo {
                            id,
                            name: name.clone(),
                            generics: generics.clone(),
                            generic_vars,
                            fields: Vec::new(),
                            def_span: *span,
                            doc: doc.clone(),
                        });
                    }
                    Stmt::EnumDeclaration { name, generics, doc, span, .. } => {
                        let id = self.env.fresh_nominal_id();
                        let generic_vars = self.fresh_generic_vars(generics.len());
                        self.env.register_enum(EnumInfo {
                            id,
                            name: name.clone(),
                            generics: generics.clone(),
                            generic_vars,
                            variants: Vec::new(),
                            def_span: *span,
                            doc: doc.clone(),
                        });
                    }
                    _ => {}
                }
            }
        }
        for node in body {
            if let Node::Stmt(stmt) = node {
                match unwrap_export(stmt) {
                    Stmt::StructDeclaration { name, generics, fields, doc, span } => {
                        let info = self.env.lookup_struct(name).expect("registered above").clone();
                        let scope = generic_scope(generics, &info.generic_vars);
                        let resolved: Vec<(String, Ty)> = fields.iter().map(|f| (f.name.clone(), self.type_expr_to_ty(&f.type_annotation, &scope))).collect();
                        self.env.register_struct(StructInfo {
                            fields: resolved,
                            doc: doc.clone(),
                            ..info.clone()
                        });
                        let _ = span;
                    }
                    Stmt::EnumDeclaration { name, generics, variants, doc, span } => {
                        let info = self.env.lookup_enum(name).expect("registered above").clone();
                        let scope = generic_scope(generics, &info.generic_vars);
                        let resolved: Vec<EnumVariantInfo> = variants
                            .iter()
                            .map(|v| EnumVariantInfo {
                                name: v.name.clone(),
                                payload: v.payload.iter().map(|t| self.type_expr_to_ty(t, &scope)).collect(),
                            })
                            .collect();
                        self.env.register_enum(EnumInfo {
                            variants: resolved,
                            doc: doc.clone(),
                            ..info.clone()
                        });
                        let _ = span;
                    }
                    _ => {}
                }
            }
        }
    }

    fn fresh_generic_vars(&mut self, n: usize) -> Vec<TyVar> {
        (0..n)
            .map(|_| match self.ctx.fresh_var() {
                Ty::Var(v) => v,
                _ => unreachable!("fresh_var always returns Ty::Var"),
            })
            .collect()
    }

    fn type_expr_to_ty(&mut self, te: &TypeExpr, generics: &FxHashMap<String, Ty>) -> Ty {
        match te {
            TypeExpr::Named(name, span) => {
                if let Some(t) = generics.get(name) {
                    return t.clone();
                }
                match name.as_str() {
                    "Int" => Ty::Int,
                    "Float" => Ty::Float,
                    "String" => Ty::String,
                    "Bool" => Ty::Bool,
                    "None" => Ty::None,
                    _ => {
                        if let Some(info) = self.env.lookup_struct(name).cloned() {
                            self.instantiate_struct(&info, None)
                        } else if let Some(info) = self.env.lookup_enum(name).cloned() {
                            self.instantiate_enum(&info, None)
                        } else {
                            let suggestion = self.suggest(name, &self.env.all_type_names());
                            self.push_error(TypeError::UnboundVariable { name: name.clone(), span: *span, suggestion });
                            self.ctx.fresh_var()
                        }
                    }
                }
            }
            TypeExpr::Applied(name, args, span) => match name.as_str() {
                "Option" if args.len() == 1 => Ty::Option(Box::new(self.type_expr_to_ty(&args[0], generics))),
                "Result" if args.len() == 2 => Ty::Result(Box::new(self.type_expr_to_ty(&args[0], generics)), Box::new(self.type_expr_to_ty(&args[1], generics))),
                "Array" if args.len() == 1 => Ty::Array(Box::new(self.type_expr_to_ty(&args[0], generics))),
                _ => {
                    let arg_tys: Vec<Ty> = args.iter().map(|a| self.type_expr_to_ty(a, generics)).collect();
                    if let Some(info) = self.env.lookup_struct(name).cloned() {
                        if info.generic_vars.len() != arg_tys.len() {
                            self.push_error(TypeError::ArityMismatch { expected: info.generic_vars.len(), found: arg_tys.len(), origin: ConstraintOrigin::Annotation { span: *span } });
                        }
                        self.instantiate_struct(&info, Some(arg_tys))
                    } else if let Some(info) = self.env.lookup_enum(name).cloned() {
                        if info.generic_vars.len() != arg_tys.len() {
                            self.push_error(TypeError::ArityMismatch { expected: info.generic_vars.len(), found: arg_tys.len(), origin: ConstraintOrigin::Annotation { span: *span } });
                        }
                        self.instantiate_enum(&info, Some(arg_tys))
                    } else {
                        let suggestion = self.suggest(name, &self.env.all_type_names());
                        self.push_error(TypeError::UnboundVariable { name: name.clone(), span: *span, suggestion });
                        self.ctx.fresh_var()
                    }
                }
            },
            TypeExpr::Optional(inner, _) => Ty::Option(Box::new(self.type_expr_to_ty(inner, generics))),
            TypeExpr::Fallible(ok, err, _) => Ty::Result(Box::new(self.type_expr_to_ty(ok, generics)), Box::new(self.type_expr_to_ty(err, generics))),
            TypeExpr::Error(_) => self.ctx.fresh_var(),
        }
    }

    /// Build a concrete `Ty::Struct` from a registered `StructInfo`, either
    /// substituting explicit type arguments or fresh vars to be pinned down
    /// by the values actually passed at the use site.
    fn instantiate_struct(&mut self, info: &StructInfo, args: Option<Vec<Ty>>) -> Ty {
        let subst = self.nominal_subst(&info.generic_vars, args);
        let fields = info
            .fields
            .iter()
            .map(|(name, ty)| FieldTy { name: name.clone(), ty: Box::new(self.ctx.substitute(ty, &subst)) })
            .collect();
        Ty::Struct { id: info.id, name: info.name.clone(), fields }
    }

    fn instantiate_enum(&mut self, info: &EnumInfo, args: Option<Vec<Ty>>) -> Ty {
        let subst = self.nominal_subst(&info.generic_vars, args);
        let variants = info
            .variants
            .iter()
            .map(|v| VariantTy { name: v.name.clone(), payload: v.payload.iter().map(|t| self.ctx.substitute(t, &subst)).collect() })
            .collect();
        Ty::Enum { id: info.id, name: info.name.clone(), variants }
    }

    fn nominal_subst(&mut self, slots: &[TyVar], args: Option<Vec<Ty>>) -> FxHashMap<TyVar, Ty> {
        match args {
            Some(args) => slots.iter().copied().zip(args).collect(),
            None => self.ctx.fresh_substitution(slots),
        }
    }

    // ── Statements and blocks ──────────────────────────────────────────

    fn check_block(&mut self, block: &Block) -> TypedBlock {
        self.check_block_inner(block, false)
    }

    fn check_block_inner(&mut self, block: &Block, is_top_level: bool) -> TypedBlock {
        self.env.push_scope();
        let n = block.body.len();
        let mut typed_body = Vec::with_capacity(n);
        for (i, node) in block.body.iter().enumerate() {
            match node {
                Node::Stmt(stmt) => {
                    if matches!(unwrap_export(stmt), Stmt::ConstBinding { .. }) && !is_top_level {
                        self.push_error(TypeError::TopLevelOnly { what: "const", span: stmt.span() });
                    }
                    let typed = self.check_stmt(stmt);
                    typed_body.push(TypedNode::Stmt(typed));
                }
                Node::Expr(e) => {
                    let typed = self.check_expr(e);
                    if i != n - 1 {
                        let ty = self.ctx.resolve(typed.ty());
                        if ty != Ty::None {
                            self.push_error(TypeError::UnusedValue { ty, span: e.span() });
                        }
                    }
                    typed_body.push(TypedNode::Expr(typed));
                }
            }
        }
        let block_ty = match typed_body.last() {
            Some(TypedNode::Expr(e)) => e.ty(),
            _ => Ty::None,
        };
        self.env.pop_scope();
        TypedBlock { body: typed_body, ty: block_ty, span: block.span }
    }

    fn check_stmt(&mut self, stmt: &Stmt) -> TypedStmt {
        match stmt {
            Stmt::VariableBinding { name, type_annotation, init, span, .. } => {
                let init_typed = self.check_expr(init);
                let ty = match type_annotation {
                    Some(te) => {
                        let ann = self.type_expr_to_ty(te, &FxHashMap::default());
                        self.expect_type(&ann, init_typed.ty(), init.span(), ConstraintOrigin::Annotation { span: te.span() })
                    }
                    None => init_typed.ty(),
                };
                self.env.insert(name.clone(), Scheme::mono(ty));
                TypedStmt::VariableBinding { name: name.clone(), init: Box::new(init_typed), span: *span }
            }
            Stmt::ConstBinding { name, init, span, .. } => {
                let init_typed = self.check_expr(init);
                self.env.insert(name.clone(), Scheme::mono(init_typed.ty()));
                TypedStmt::ConstBinding { name: name.clone(), init: Box::new(init_typed), span: *span }
            }
            Stmt::TypePatternBinding { type_name, init, span } => {
                let init_typed = self.check_expr(init);
                let declared = self.type_expr_to_ty(&TypeExpr::Named(type_name.clone(), *span), &FxHashMap::default());
                self.expect_type(&declared, init_typed.ty(), init.span(), ConstraintOrigin::Annotation { span: *span });
                TypedStmt::TypePatternBinding { type_name: type_name.clone(), init: Box::new(init_typed), span: *span }
            }
            Stmt::TupleDestructuringBinding { elements, init, span } => {
                let init_typed = self.check_expr(init);
                let init_ty = self.ctx.resolve(init_typed.ty());
                let elem_tys: Vec<Ty> = match &init_ty {
                    Ty::Tuple(tys) if tys.len() == elements.len() => tys.clone(),
                    _ => {
                        let fresh: Vec<Ty> = elements.iter().map(|_| self.ctx.fresh_var()).collect();
                        self.unify(init_ty.clone(), Ty::Tuple(fresh.clone()), ConstraintOrigin::Binding { span: *span });
                        fresh
                    }
                };
                let mut names = Vec::new();
                for (el, ty) in elements.iter().zip(elem_tys) {
                    let name = match el {
                        DestructureElement::Name(n, _) | DestructureElement::TypeAssert(n, _) => n.clone(),
                    };
                    self.env.insert(name.clone(), Scheme::mono(ty));
                    names.push(name);
                }
                TypedStmt::TupleDestructuringBinding { names, init: Box::new(init_typed), span: *span }
            }
            Stmt::FunctionDeclaration { name, params, return_type, body, doc, span } => self.check_function_declaration(name, params, return_type, body, doc, span),
            Stmt::StructDeclaration { name, span, .. } => TypedStmt::StructDeclaration { name: name.clone(), span: *span },
            Stmt::EnumDeclaration { name, span, .. } => TypedStmt::EnumDeclaration { name: name.clone(), span: *span },
            Stmt::ImportDeclaration { path, names, span } => {
                for n in names {
                    let fresh = self.ctx.fresh_var();
                    self.env.insert(n.clone(), Scheme::mono(fresh));
                }
                TypedStmt::ImportDeclaration { path: path.clone(), names: names.clone(), span: *span }
            }
            Stmt::ExportDeclaration { inner, span } => {
                let typed_inner = self.check_stmt(inner);
                TypedStmt::ExportDeclaration { inner: Box::new(typed_inner), span: *span }
            }
        }
    }

    fn check_function_declaration(&mut self, name: &str, params: &[Param], return_type: &Option<TypeExpr>, body: &Block, doc: &Option<String>, span: &Span) -> TypedStmt {
        self.env.push_scope();
        let mut param_tys = Vec::new();
        for p in params {
            let ty = match &p.type_annotation {
                Some(te) => self.type_expr_to_ty(te, &FxHashMap::default()),
                None => self.ctx.fresh_var(),
            };
            self.env.insert(p.name.clone(), Scheme::mono(ty.clone()));
            param_tys.push(ty);
        }
        let (declared_ret, declared_err) = match return_type {
            Some(TypeExpr::Fallible(ok, err, _)) => (self.type_expr_to_ty(ok, &FxHashMap::default()), Some(self.type_expr_to_ty(err, &FxHashMap::default()))),
            Some(other) => (self.type_expr_to_ty(other, &FxHashMap::default()), None),
            None => (self.ctx.fresh_var(), None),
        };
        self.fn_stack.push(FnFrame { ret: declared_ret.clone(), error_ty: declared_err.clone() });
        let body_typed = self.check_block(body);
        self.fn_stack.pop();
        let final_ret = match &declared_err {
            Some(err_ty) => {
                let expected = Ty::Result(Box::new(declared_ret.clone()), Box::new(err_ty.clone()));
                let unified = self.expect_type(&expected, body_typed.ty.clone(), body.span, ConstraintOrigin::Return { span: *span });
                match self.ctx.resolve(unified) {
                    Ty::Result(ok, _) => (*ok).clone(),
                    other => other,
                }
            }
            None => self.expect_type(&declared_ret, body_typed.ty.clone(), body.span, ConstraintOrigin::Return { span: *span }),
        };
        self.env.pop_scope();

        let fn_ty = Ty::Function { params: param_tys, ret: Box::new(final_ret), error_type: declared_err.map(Box::new) };
        let scheme = self.ctx.generalize(fn_ty.clone());
        let resolved_ty = self.ctx.resolve(fn_ty);
        self.env.insert_with_def(name.to_string(), scheme, *span, doc.clone());
        TypedStmt::FunctionDeclaration { name: name.to_string(), ty: resolved_ty, body: body_typed, span: *span }
    }

    // ── Expressions ─────────────────────────────────────────────────────

    fn check_expr(&mut self, expr: &Expr) -> TypedExpr {
        match expr {
            Expr::IntLiteral(v, s) => TypedExpr::IntLiteral(*v, *s),
            Expr::FloatLiteral(v, s) => TypedExpr::FloatLiteral(*v, *s),
            Expr::StringLiteral(v, s) => TypedExpr::StringLiteral(v.clone(), *s),
            Expr::BoolLiteral(v, s) => TypedExpr::BoolLiteral(*v, *s),
            Expr::NoneLiteral(s) => TypedExpr::NoneLiteral(*s),
            Expr::InterpolatedString(parts, s) => {
                let typed_parts = parts
                    .iter()
                    .map(|p| match p {
                        StringPart::Text(t) => TypedExpr::StringLiteral(t.clone(), *s),
                        StringPart::Expr(e) => self.check_expr(e),
                    })
                    .collect();
                TypedExpr::InterpolatedString(typed_parts, *s)
            }
            Expr::Identifier(name, span) => self.check_identifier(name, *span),
            Expr::PropertyAccess { left, right, span } => self.check_property_access(left, right, *span),
            Expr::ArrayIndex { array, index, span } => self.check_array_index(array, index, *span),
            Expr::Range { start, end, span } => {
                let s = self.check_expr(start);
                let e = self.check_expr(end);
                self.expect_type(&Ty::Int, s.ty(), start.span(), ConstraintOrigin::Binding { span: *span });
                self.expect_type(&Ty::Int, e.ty(), end.span(), ConstraintOrigin::Binding { span: *span });
                TypedExpr::Range { start: Box::new(s), end: Box::new(e), ty: Ty::Array(Box::new(Ty::Int)), span: *span }
            }
            Expr::Tuple(elems, span) => {
                let typed: Vec<TypedExpr> = elems.iter().map(|e| self.check_expr(e)).collect();
                let ty = Ty::Tuple(typed.iter().map(TypedExpr::ty).collect());
                TypedExpr::Tuple(typed, ty, *span)
            }
            Expr::Array(elements, span) => self.check_array_literal(elements, *span),
            Expr::If { cond, then, else_, span } => self.check_if(cond, then, else_, *span),
            Expr::Match { subject, arms, span } => self.check_match(subject, arms, *span),
            Expr::Block(b) => TypedExpr::Block(self.check_block(b)),
            Expr::FunctionExpr { params, return_type, body, span } => self.check_function_expr(params, return_type, body, *span),
            Expr::Call { callee, args, span } => self.check_call(callee, args, *span),
            Expr::StructInit { name, type_args, fields, span } => self.check_struct_init(name, type_args, fields, *span),
            Expr::Binary { op, lhs, rhs, span } => self.check_binary(*op, lhs, rhs, *span),
            Expr::Unary { op, operand, span } => self.check_unary(*op, operand, *span),
            Expr::OrExpression { lhs, err_name, body, span } => self.check_or_expression(lhs, err_name, body, *span),
            Expr::ErrorExpression { inner, span } => {
                let i = self.check_expr(inner);
                let ty = Ty::Result(Box::new(Ty::None), Box::new(i.ty()));
                TypedExpr::ErrorExpression { inner: Box::new(i), ty, span: *span }
            }
            Expr::Propagate { inner, kind, span } => self.check_propagate(inner, *kind, *span),
            Expr::Assert { cond, message, span } => self.check_assert(cond, message, *span),
            Expr::ErrorNode { span, .. } => TypedExpr::ErrorNode { span: *span },
        }
    }

    fn check_identifier(&mut self, name: &str, span: Span) -> TypedExpr {
        match self.env.lookup(name).cloned() {
            Some(scheme) => {
                let ty = self.ctx.instantiate(&scheme);
                let resolved = self.ctx.resolve(ty.clone());
                self.env.type_positions.push(TypePosition {
                    span,
                    name: name.to_string(),
                    ty: resolved.clone(),
                    definition_span: self.env.def_location(name),
                    doc: self.env.doc_for(name),
                });
                TypedExpr::Identifier { name: name.to_string(), ty: resolved, span }
            }
            None => {
                if let Some(enum_info) = self.env.enum_owning_variant(name).cloned() {
                    return self.construct_enum_variant(&enum_info, name, &[], span);
                }
                let suggestion = self.suggest(name, &[]);
                self.push_error(TypeError::UnboundVariable { name: name.to_string(), span, suggestion });
                TypedExpr::Identifier { name: name.to_string(), ty: Ty::None, span }
            }
        }
    }

    fn try_builtin_variant_call(&mut self, name: &str, args: &[Expr], span: Span) -> Option<TypedExpr> {
        fn wrap(name: &str, ty: Ty, typed_args: Vec<TypedExpr>, span: Span) -> TypedExpr {
            TypedExpr::Call {
                callee: Box::new(TypedExpr::Identifier { name: name.to_string(), ty: ty.clone(), span }),
                args: typed_args,
                ty,
                span,
            }
        }
        match name {
            "Some" if args.len() == 1 => {
                let a = self.check_expr(&args[0]);
                let ty = Ty::Option(Box::new(a.ty()));
                Some(wrap(name, ty, vec![a], span))
            }
            "Ok" if args.len() == 1 => {
                let a = self.check_expr(&args[0]);
                let err = self.ctx.fresh_var();
                let ty = Ty::Result(Box::new(a.ty()), Box::new(err));
                Some(wrap(name, ty, vec![a], span))
            }
            "Err" if args.len() == 1 => {
                let a = self.check_expr(&args[0]);
                let ok = self.ctx.fresh_var();
                let ty = Ty::Result(Box::new(ok), Box::new(a.ty()));
                Some(wrap(name, ty, vec![a], span))
            }
            _ => None,
        }
    }

    fn construct_enum_variant(&mut self, enum_info: &EnumInfo, variant_name: &str, args: &[Expr], span: Span) -> TypedExpr {
        let variant = enum_info.variants.iter().find(|v| v.name == variant_name).cloned();
        match variant {
            None => {
                self.push_error(TypeError::UnknownVariant { name: variant_name.to_string(), span });
                TypedExpr::ErrorNode { span }
            }
            Some(v) => {
                if v.payload.len() != args.len() {
                    self.push_error(TypeError::VariantArityMismatch { name: variant_name.to_string(), expected: v.payload.len(), found: args.len(), span });
                }
                let subst = self.ctx.fresh_substitution(&enum_info.generic_vars);
                let payload_tys: Vec<Ty> = v.payload.iter().map(|t| self.ctx.substitute(t, &subst)).collect();
                let mut typed_args = Vec::new();
                for (i, arg) in args.iter().enumerate() {
                    let t = self.check_expr(arg);
                    if let Some(expected) = payload_tys.get(i) {
                        self.expect_type(expected, t.ty(), arg.span(), ConstraintOrigin::FnArg { call_span: span, param_index: i });
                    }
                    typed_args.push(t);
                }
                let variants = enum_info
                    .variants
                    .iter()
                    .map(|v| VariantTy { name: v.name.clone(), payload: v.payload.iter().map(|t| self.ctx.substitute(t, &subst)).collect() })
                    .collect();
                let ty = Ty::Enum { id: enum_info.id, name: enum_info.name.clone(), variants };
                TypedExpr::Call {
                    callee: Box::new(TypedExpr::Identifier { name: variant_name.to_string(), ty: ty.clone(), span }),
                    args: typed_args,
                    ty,
                    span,
                }
            }
        }
    }

    fn check_call(&mut self, callee: &Expr, args: &[Expr], span: Span) -> TypedExpr {
        if let Expr::Identifier(name, _) = callee {
            if let Some(t) = self.try_builtin_variant_call(name, args, span) {
                return t;
            }
            if let Some(enum_info) = self.env.enum_owning_variant(name).cloned() {
                return self.construct_enum_variant(&enum_info, name, args, span);
            }
        }
        let callee_typed = self.check_expr(callee);
        let callee_ty = self.ctx.resolve(callee_typed.ty());
        match callee_ty.clone() {
            Ty::Function { params, ret, error_type } => {
                if params.len() != args.len() {
                    self.push_error(TypeError::ArityMismatch { expected: params.len(), found: args.len(), origin: ConstraintOrigin::FnArg { call_span: span, param_index: 0 } });
                }
                let mut typed_args = Vec::new();
                for (i, arg) in args.iter().enumerate() {
                    let t = self.check_expr(arg);
                    if let Some(p) = params.get(i) {
                        self.expect_type(p, t.ty(), arg.span(), ConstraintOrigin::FnArg { call_span: span, param_index: i });
                    }
                    typed_args.push(t);
                }
                let ty = match error_type {
                    Some(err) => Ty::Result(ret, err),
                    None => *ret,
                };
                TypedExpr::Call { callee: Box::new(callee_typed), args: typed_args, ty, span }
            }
            Ty::Var(_) => {
                let ret = self.ctx.fresh_var();
                let mut typed_args = Vec::new();
                let mut param_tys = Vec::new();
                for arg in args {
                    let t = self.check_expr(arg);
                    param_tys.push(t.ty());
                    typed_args.push(t);
                }
                let fn_ty = Ty::Function { params: param_tys, ret: Box::new(ret.clone()), error_type: None };
                self.unify(callee_ty, fn_ty, ConstraintOrigin::FnArg { call_span: span, param_index: 0 });
                TypedExpr::Call { callee: Box::new(callee_typed), args: typed_args, ty: ret, span }
            }
            other => {
                self.push_error(TypeError::NotAFunction { ty: other, span });
                let typed_args = args.iter().map(|a| self.check_expr(a)).collect();
                TypedExpr::Call { callee: Box::new(callee_typed), args: typed_args, ty: self.ctx.fresh_var(), span }
            }
        }
    }

    fn check_struct_init(&mut self, name: &str, type_args: &[TypeExpr], fields: &[(String, Expr)], span: Span) -> TypedExpr {
        let info = match self.env.lookup_struct(name).cloned() {
            Some(i) => i,
            None => {
                let suggestion = self.suggest(name, &self.env.all_type_names());
                self.push_error(TypeError::UnboundVariable { name: name.to_string(), span, suggestion });
                let typed_fields = fields.iter().map(|(n, e)| (n.clone(), self.check_expr(e))).collect();
                return TypedExpr::StructInit { name: name.to_string(), fields: typed_fields, ty: Ty::None, span };
            }
        };
        let explicit_args = if type_args.is_empty() {
            None
        } else {
            if type_args.len() != info.generic_vars.len() {
                self.push_error(TypeError::ArityMismatch { expected: info.generic_vars.len(), found: type_args.len(), origin: ConstraintOrigin::Annotation { span } });
            }
            Some(type_args.iter().map(|t| self.type_expr_to_ty(t, &FxHashMap::default())).collect::<Vec<_>>())
        };
        let subst = self.nominal_subst(&info.generic_vars, explicit_args);
        let declared_fields: Vec<(String, Ty)> = info.fields.iter().map(|(n, t)| (n.clone(), self.ctx.substitute(t, &subst))).collect();

        let mut seen = std::collections::HashSet::new();
        let mut typed_fields = Vec::new();
        for (fname, fexpr) in fields {
            if !seen.insert(fname.clone()) {
                self.push_error(TypeError::DuplicateField { struct_name: name.to_string(), field_name: fname.clone(), span: fexpr.span() });
            }
            let typed = self.check_expr(fexpr);
            match declared_fields.iter().find(|(n, _)| n == fname) {
                Some((_, ty)) => {
                    self.expect_type(ty, typed.ty(), fexpr.span(), ConstraintOrigin::Binding { span: fexpr.span() });
                }
                None => {
                    self.push_error(TypeError::UnknownField {
                        struct_name: name.to_string(),
                        field_name: fname.clone(),
                        available: declared_fields.iter().map(|(n, _)| n.clone()).collect(),
                        span: fexpr.span(),
                    });
                }
            }
            typed_fields.push((fname.clone(), typed));
        }
        for (fname, _) in &declared_fields {
            if !seen.contains(fname) {
                self.push_error(TypeError::MissingField { struct_name: name.to_string(), field_name: fname.clone(), span });
            }
        }
        let field_tys: Vec<FieldTy> = declared_fields.into_iter().map(|(n, t)| FieldTy { name: n, ty: Box::new(self.ctx.resolve(t)) }).collect();
        let ty = Ty::Struct { id: info.id, name: name.to_string(), fields: field_tys };
        TypedExpr::StructInit { name: name.to_string(), fields: typed_fields, ty, span }
    }

    fn check_property_access(&mut self, left: &Expr, right: &PropertyRight, span: Span) -> TypedExpr {
        if let Expr::Identifier(left_name, _) = left {
            if let Some(enum_info) = self.env.lookup_enum(left_name).cloned() {
                return match right {
                    PropertyRight::Name(vname) => self.construct_enum_variant(&enum_info, vname, &[], span),
                    PropertyRight::Call { name: vname, args } => self.construct_enum_variant(&enum_info, vname, args, span),
                    PropertyRight::TupleIndex(_) => {
                        self.push_error(TypeError::UnknownVariant { name: left_name.clone(), span });
                        TypedExpr::ErrorNode { span }
                    }
                };
            }
            if left_name == "Option" || left_name == "Result" {
                match right {
                    PropertyRight::Call { name: vname, args } => {
                        if let Some(t) = self.try_builtin_variant_call(vname, args, span) {
                            return t;
                        }
                        if vname == "None" {
                            return TypedExpr::NoneLiteral(span);
                        }
                    }
                    PropertyRight::Name(vname) if vname == "None" => return TypedExpr::NoneLiteral(span),
                    _ => {}
                }
            }
        }
        let left_typed = self.check_expr(left);
        let left_ty = self.ctx.resolve(left_typed.ty());
        let ty = match (&left_ty, right) {
            (Ty::Struct { name: sname, .. }, PropertyRight::Name(fname)) => match self.env.lookup_struct(sname).cloned() {
                Some(info) => match info.fields.iter().find(|(n, _)| n == fname) {
                    Some((_, t)) => t.clone(),
                    None => {
                        self.push_error(TypeError::UnknownField {
                            struct_name: sname.clone(),
                            field_name: fname.clone(),
                            available: info.fields.iter().map(|(n, _)| n.clone()).collect(),
                            span,
                        });
                        self.ctx.fresh_var()
                    }
                },
                None => self.ctx.fresh_var(),
            },
            (Ty::Tuple(elems), PropertyRight::TupleIndex(i)) => elems.get(*i as usize).cloned().unwrap_or_else(|| {
                self.push_error(TypeError::ArityMismatch { expected: elems.len(), found: *i as usize + 1, origin: ConstraintOrigin::Binding { span } });
                self.ctx.fresh_var()
            }),
            _ => {
                self.push_error(TypeError::NotAFunction { ty: left_ty.clone(), span });
                self.ctx.fresh_var()
            }
        };
        TypedExpr::PropertyAccess { left: Box::new(left_typed), ty, span }
    }

    fn check_array_index(&mut self, array: &Expr, index: &Expr, span: Span) -> TypedExpr {
        let a = self.check_expr(array);
        let at = self.ctx.resolve(a.ty());
        let elem = match &at {
            Ty::Array(inner) => (**inner).clone(),
            Ty::Var(_) => {
                let fresh = self.ctx.fresh_var();
                self.unify(at.clone(), Ty::Array(Box::new(fresh.clone())), ConstraintOrigin::Binding { span });
                fresh
            }
            other => {
                self.push_error(TypeError::Mismatch { expected: Ty::Array(Box::new(self.ctx.fresh_var())), found: other.clone(), origin: ConstraintOrigin::Binding { span } });
                self.ctx.fresh_var()
            }
        };
        let idx = self.check_expr(index);
        self.expect_type(&Ty::Int, idx.ty(), index.span(), ConstraintOrigin::Binding { span });
        TypedExpr::ArrayIndex { array: Box::new(a), index: Box::new(idx), ty: elem, span }
    }

    fn check_array_literal(&mut self, elements: &[ArrayElement], span: Span) -> TypedExpr {
        let elem_ty = self.ctx.fresh_var();
        let mut typed_elems = Vec::new();
        for el in elements {
            match el {
                ArrayElement::Item(e) => {
                    let t = self.check_expr(e);
                    self.expect_type(&elem_ty, t.ty(), e.span(), ConstraintOrigin::Branches { span: e.span() });
                    typed_elems.push(t);
                }
                ArrayElement::Spread(e) => {
                    let t = self.check_expr(e);
                    let te = self.ctx.resolve(t.ty());
                    if let Ty::Array(inner) = &te {
                        self.unify(elem_ty.clone(), (**inner).clone(), ConstraintOrigin::Branches { span: e.span() });
                    } else {
                        self.push_error(TypeError::Mismatch { expected: Ty::Array(Box::new(elem_ty.clone())), found: te, origin: ConstraintOrigin::Branches { span: e.span() } });
                    }
                    typed_elems.push(t);
                }
            }
        }
        let ty = Ty::Array(Box::new(self.ctx.resolve(elem_ty)));
        TypedExpr::Array(typed_elems, ty, span)
    }

    fn check_if(&mut self, cond: &Expr, then: &Block, else_: &Option<Box<Expr>>, span: Span) -> TypedExpr {
        let c = self.check_expr(cond);
        self.expect_type(&Ty::Bool, c.ty(), cond.span(), ConstraintOrigin::Binding { span });
        let then_typed = self.check_block(then);
        match else_ {
            Some(e) => {
                let e_typed = self.check_expr(e);
                let ty = self.unify_branches(then_typed.ty.clone(), e_typed.ty(), span);
                TypedExpr::If { cond: Box::new(c), then: then_typed, else_: Some(Box::new(e_typed)), ty, span }
            }
            None => TypedExpr::If { cond: Box::new(c), then: then_typed, else_: None, ty: Ty::None, span },
        }
    }

    fn check_function_expr(&mut self, params: &[Param], return_type: &Option<TypeExpr>, body: &Block, span: Span) -> TypedExpr {
        self.env.push_scope();
        let mut param_tys = Vec::new();
        for p in params {
            let ty = match &p.type_annotation {
                Some(te) => self.type_expr_to_ty(te, &FxHashMap::default()),
                None => self.ctx.fresh_var(),
            };
            self.env.insert(p.name.clone(), Scheme::mono(ty.clone()));
            param_tys.push(ty);
        }
        let (declared_ret, declared_err) = match return_type {
            Some(TypeExpr::Fallible(ok, err, _)) => (self.type_expr_to_ty(ok, &FxHashMap::default()), Some(self.type_expr_to_ty(err, &FxHashMap::default()))),
            Some(other) => (self.type_expr_to_ty(other, &FxHashMap::default()), None),
            None => (self.ctx.fresh_var(), None),
        };
        self.fn_stack.push(FnFrame { ret: declared_ret.clone(), error_ty: declared_err.clone() });
        let body_typed = self.check_block(body);
        self.fn_stack.pop();
        let final_ret = self.expect_type(&declared_ret, body_typed.ty.clone(), body.span, ConstraintOrigin::Return { span });
        self.env.pop_scope();
        let ty = Ty::Function { params: param_tys, ret: Box::new(final_ret), error_type: declared_err.map(Box::new) };
        TypedExpr::FunctionExpr { ty, body: body_typed, span }
    }

    fn check_binary(&mut self, op: BinOp, lhs: &Expr, rhs: &Expr, span: Span) -> TypedExpr {
        let l = self.check_expr(lhs);
        let r = self.check_expr(rhs);
        let lt = self.ctx.resolve(l.ty());
        let rt = self.ctx.resolve(r.ty());
        let origin = ConstraintOrigin::BinOp { span };
        let ty = match op {
            BinOp::Add => builtins::add_result(&lt, &rt).unwrap_or_else(|| {
                self.push_error(TypeError::Mismatch { expected: lt.clone(), found: rt.clone(), origin });
                lt.clone()
            }),
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Rem => builtins::arithmetic_result(&lt, &rt).unwrap_or_else(|| {
                self.push_error(TypeError::Mismatch { expected: lt.clone(), found: rt.clone(), origin });
                lt.clone()
            }),
            BinOp::Lt | BinOp::Gt | BinOp::LtEq | BinOp::GtEq => {
                if !builtins::is_comparable(&lt, &rt) {
                    self.push_error(TypeError::Mismatch { expected: lt.clone(), found: rt.clone(), origin });
                }
                Ty::Bool
            }
            BinOp::Eq | BinOp::NotEq => {
                self.unify(lt.clone(), rt.clone(), origin);
                Ty::Bool
            }
            BinOp::And | BinOp::Or => {
                if !builtins::is_logical_operand(&lt) {
                    self.push_error(TypeError::Mismatch { expected: Ty::Bool, found: lt.clone(), origin: origin.clone() });
                }
                if !builtins::is_logical_operand(&rt) {
                    self.push_error(TypeError::Mismatch { expected: Ty::Bool, found: rt.clone(), origin });
                }
                Ty::Bool
            }
        };
        TypedExpr::Binary { op, lhs: Box::new(l), rhs: Box::new(r), ty, span }
    }

    fn check_unary(&mut self, op: UnOp, operand: &Expr, span: Span) -> TypedExpr {
        let o = self.check_expr(operand);
        let ot = self.ctx.resolve(o.ty());
        let origin = ConstraintOrigin::BinOp { span };
        let ty = match op {
            UnOp::Neg => builtins::unary_neg_result(&ot).unwrap_or_else(|| {
                self.push_error(TypeError::Mismatch { expected: Ty::Int, found: ot.clone(), origin });
                ot.clone()
            }),
            UnOp::Not => {
                if !builtins::is_unary_not_operand(&ot) {
                    self.push_error(TypeError::Mismatch { expected: Ty::Bool, found: ot.clone(), origin });
                }
                Ty::Bool
            }
        };
        TypedExpr::Unary { op, operand: Box::new(o), ty, span }
    }

    fn check_or_expression(&mut self, lhs: &Expr, err_name: &Option<String>, body: &Expr, span: Span) -> TypedExpr {
        let l = self.check_expr(lhs);
        let lt = self.ctx.resolve(l.ty());
        let pre_unwrap_ty = lt.clone();
        let mut pushed_scope = false;
        let success_ty = match &lt {
            Ty::Option(inner) => (**inner).clone(),
            Ty::Result(ok, err) => {
                if let Some(en) = err_name {
                    self.env.push_scope();
                    self.env.insert(en.clone(), Scheme::mono((**err).clone()));
                    pushed_scope = true;
                }
                (**ok).clone()
            }
            other => {
                let expected = Ty::Option(Box::new(self.ctx.fresh_var()));
                self.push_error(TypeError::Mismatch { expected, found: other.clone(), origin: ConstraintOrigin::Branches { span } });
                other.clone()
            }
        };
        let b = self.check_expr(body);
        if pushed_scope {
            self.env.pop_scope();
        }
        let ty = self.expect_type(&success_ty, b.ty(), body.span(), ConstraintOrigin::Branches { span });
        TypedExpr::OrExpression { lhs: Box::new(l), body: Box::new(b), pre_unwrap_ty, ty, span }
    }

    fn check_propagate(&mut self, inner: &Expr, kind: PropagateKind, span: Span) -> TypedExpr {
        let i = self.check_expr(inner);
        let it = self.ctx.resolve(i.ty());
        let pre_unwrap_ty = it.clone();
        let result_ty = match (&it, kind) {
            (Ty::Option(ok), PropagateKind::Question) => {
                let enclosing_ret = self.fn_stack.last().map(|f| f.ret.clone());
                match enclosing_ret.map(|r| self.ctx.resolve(r)) {
                    Some(Ty::Option(_)) | Some(Ty::Var(_)) => {}
                    _ => self.push_error(TypeError::InvalidPropagation { span }),
                }
                (**ok).clone()
            }
            (Ty::Result(ok, err), PropagateKind::Bang) => {
                match self.fn_stack.last().map(|f| f.error_ty.clone()) {
                    Some(Some(fn_err)) => {
                        self.unify(fn_err, (**err).clone(), ConstraintOrigin::Return { span });
                    }
                    _ => self.push_error(TypeError::InvalidPropagation { span }),
                }
                (**ok).clone()
            }
            _ => {
                self.push_error(TypeError::InvalidPropagation { span });
                self.ctx.fresh_var()
            }
        };
        TypedExpr::Propagate { inner: Box::new(i), kind, pre_unwrap_ty, ty: result_ty, span }
    }

    fn check_assert(&mut self, cond: &Expr, message: &Expr, span: Span) -> TypedExpr {
        let c = self.check_expr(cond);
        let ct = self.ctx.resolve(c.ty());
        match &ct {
            Ty::Var(_) => {
                self.unify(Ty::Bool, ct.clone(), ConstraintOrigin::Binding { span });
            }
            Ty::Bool => {}
            other => self.push_error(TypeError::AssertConditionNotBool { found: other.clone(), span: cond.span() }),
        }
        let m = self.check_expr(message);
        self.expect_type(&Ty::String, m.ty(), message.span(), ConstraintOrigin::Binding { span });
        TypedExpr::Assert { cond: Box::new(c), message: Box::new(m), span }
    }

    fn check_match(&mut self, subject: &Expr, arms: &[MatchArm], span: Span) -> TypedExpr {
        let subj = self.check_expr(subject);
        let subj_ty = self.ctx.resolve(subj.ty());
        let mut typed_arms = Vec::new();
        let mut lowered_pats = Vec::new();
        let mut arm_spans = Vec::new();
        let mut arm_is_wild = Vec::new();
        let mut result_ty: Option<Ty> = None;
        for arm in arms {
            self.env.push_scope();
            let (bindings, pat) = self.check_pattern(&arm.pattern, &subj_ty);
            for (n, t) in bindings {
                self.env.insert(n, Scheme::mono(t));
            }
            let body_typed = self.check_expr(&arm.body);
            self.env.pop_scope();
            result_ty = Some(match result_ty {
                None => body_typed.ty(),
                Some(acc) => self.unify_branches(acc, body_typed.ty(), arm.span),
            });
            arm_is_wild.push(matches!(arm.pattern, Pattern::Wildcard(_)));
            arm_spans.push(arm.span);
            lowered_pats.push(pat);
            typed_arms.push(TypedMatchArm { body: Box::new(body_typed), span: arm.span });
        }
        exhaustiveness::check_match(&lowered_pats, &arm_spans, &arm_is_wild, &subj_ty, span, &self.env, &mut self.errors);
        let ty = result_ty.unwrap_or(Ty::None);
        TypedExpr::Match { subject: Box::new(subj), arms: typed_arms, ty, span }
    }

    // ── Pattern lowering ────────────────────────────────────────────────

    fn check_pattern(&mut self, pattern: &Pattern, scrutinee: &Ty) -> (Vec<(String, Ty)>, Pat) {
        match pattern {
            Pattern::Wildcard(_) => (Vec::new(), Pat::Wildcard),
            Pattern::Or(alts, _) => {
                let mut bindings = Vec::new();
                let mut pats = Vec::new();
                for alt in alts {
                    let (b, p) = self.check_pattern(alt, scrutinee);
                    bindings.extend(b);
                    pats.push(p);
                }
                (bindings, Pat::Or(pats))
            }
            Pattern::Expr(e) => {
                let mut bindings = Vec::new();
                let pat = self.lower_pattern_expr(e, scrutinee, &mut bindings);
                (bindings, pat)
            }
        }
    }

    fn lower_pattern_expr(&mut self, e: &Expr, scrutinee: &Ty, bindings: &mut Vec<(String, Ty)>) -> Pat {
        let scrutinee_r = self.ctx.resolve(scrutinee.clone());
        match e {
            Expr::Identifier(name, ispan) => {
                if let Some(enum_info) = self.env.enum_owning_variant(name).cloned() {
                    return self.lower_variant_pattern(&enum_info, name, &[], &scrutinee_r, bindings, *ispan);
                }
                bindings.push((name.clone(), scrutinee_r));
                Pat::Wildcard
            }
            Expr::IntLiteral(v, _) => {
                self.unify(scrutinee_r, Ty::Int, ConstraintOrigin::Builtin);
                Pat::Ctor { name: format!("lit:{v}"), args: Vec::new() }
            }
            Expr::FloatLiteral(v, _) => {
                self.unify(scrutinee_r, Ty::Float, ConstraintOrigin::Builtin);
                Pat::Ctor { name: format!("lit:{v}"), args: Vec::new() }
            }
            Expr::StringLiteral(v, _) => {
                self.unify(scrutinee_r, Ty::String, ConstraintOrigin::Builtin);
                Pat::Ctor { name: format!("lit:{v:?}"), args: Vec::new() }
            }
            Expr::BoolLiteral(v, _) => {
                self.unify(scrutinee_r, Ty::Bool, ConstraintOrigin::Builtin);
                Pat::Ctor { name: v.to_string(), args: Vec::new() }
            }
            Expr::NoneLiteral(_) => {
                if !matches!(scrutinee_r, Ty::Option(_) | Ty::None) {
                    let fresh = self.ctx.fresh_var();
                    self.unify(scrutinee_r, Ty::Option(Box::new(fresh)), ConstraintOrigin::Builtin);
                }
                Pat::Ctor { name: "none".to_string(), args: Vec::new() }
            }
            Expr::Unary { op: UnOp::Neg, operand, .. } => self.lower_pattern_expr(operand, &scrutinee_r, bindings),
            Expr::Range { span, .. } => {
                self.unify(scrutinee_r, Ty::Int, ConstraintOrigin::Builtin);
                Pat::Ctor { name: format!("range:{}:{}", span.start_line, span.start_column), args: Vec::new() }
            }
            Expr::Tuple(elems, _) => {
                let tys: Vec<Ty> = match &scrutinee_r {
                    Ty::Tuple(tys) if tys.len() == elems.len() => tys.clone(),
                    _ => {
                        let fresh: Vec<Ty> = elems.iter().map(|_| self.ctx.fresh_var()).collect();
                        self.unify(scrutinee_r.clone(), Ty::Tuple(fresh.clone()), ConstraintOrigin::Builtin);
                        fresh
                    }
                };
                let args = elems.iter().zip(tys).map(|(el, t)| self.lower_pattern_expr(el, &t, bindings)).collect();
                Pat::Ctor { name: "tuple".to_string(), args }
            }
            Expr::Array(elements, _) => {
                let elem_ty = match &scrutinee_r {
                    Ty::Array(inner) => (**inner).clone(),
                    _ => {
                        let fresh = self.ctx.fresh_var();
                        self.unify(scrutinee_r.clone(), Ty::Array(Box::new(fresh.clone())), ConstraintOrigin::Builtin);
                        fresh
                    }
                };
                self.lower_array_pattern(elements, &elem_ty, bindings)
            }
            Expr::Call { callee, args, span } => {
                if let Expr::Identifier(name, _) = callee.as_ref() {
                    if let Some(p) = self.try_builtin_variant_pattern(name, args, &scrutinee_r, bindings) {
                        return p;
                    }
                    if let Some(enum_info) = self.env.enum_owning_variant(name).cloned() {
                        return self.lower_variant_pattern(&enum_info, name, args, &scrutinee_r, bindings, *span);
                    }
                }
                self.lower_condition_pattern(e, &scrutinee_r)
            }
            Expr::PropertyAccess { left, right, span } => {
                if let Expr::Identifier(enum_name, _) = left.as_ref() {
                    if let Some(enum_info) = self.env.lookup_enum(enum_name).cloned() {
                        return match right {
                            PropertyRight::Name(vname) => self.lower_variant_pattern(&enum_info, vname, &[], &scrutinee_r, bindings, *span),
                            PropertyRight::Call { name: vname, args } => self.lower_variant_pattern(&enum_info, vname, args, &scrutinee_r, bindings, *span),
                            PropertyRight::TupleIndex(_) => self.lower_condition_pattern(e, &scrutinee_r),
                        };
                    }
                }
                self.lower_condition_pattern(e, &scrutinee_r)
            }
            _ => self.lower_condition_pattern(e, &scrutinee_r),
        }
    }

    /// An arbitrary boolean expression used in pattern position, e.g.
    /// `match n { n > 0 -> 'pos', else -> 'non-pos' }`.
    fn lower_condition_pattern(&mut self, e: &Expr, scrutinee: &Ty) -> Pat {
        self.unify(scrutinee.clone(), Ty::Bool, ConstraintOrigin::Builtin);
        let typed = self.check_expr(e);
        self.expect_type(&Ty::Bool, typed.ty(), e.span(), ConstraintOrigin::Builtin);
        let span = e.span();
        Pat::Ctor { name: format!("cond:{}:{}", span.start_line, span.start_column), args: Vec::new() }
    }

    fn lower_array_pattern(&mut self, elements: &[ArrayElement], elem_ty: &Ty, bindings: &mut Vec<(String, Ty)>) -> Pat {
        if elements.is_empty() {
            return Pat::Ctor { name: "[]".to_string(), args: Vec::new() };
        }
        match &elements[0] {
            ArrayElement::Item(e) => {
                let head = self.lower_pattern_expr(e, elem_ty, bindings);
                let tail = self.lower_array_pattern(&elements[1..], elem_ty, bindings);
                Pat::Ctor { name: "[..]".to_string(), args: vec![head, tail] }
            }
            ArrayElement::Spread(e) => {
                if let Expr::Identifier(name, _) = e {
                    bindings.push((name.clone(), Ty::Array(Box::new(elem_ty.clone()))));
                }
                Pat::Wildcard
            }
        }
    }

    fn try_builtin_variant_pattern(&mut self, name: &str, args: &[Expr], scrutinee: &Ty, bindings: &mut Vec<(String, Ty)>) -> Option<Pat> {
        match name {
            "Some" if args.len() == 1 => {
                let inner_ty = match scrutinee {
                    Ty::Option(i) => (**i).clone(),
                    _ => self.ctx.fresh_var(),
                };
                let p = self.lower_pattern_expr(&args[0], &inner_ty, bindings);
                Some(Pat::Ctor { name: "some".to_string(), args: vec![p] })
            }
            "Ok" if args.len() == 1 => {
                let ok_ty = match scrutinee {
                    Ty::Result(ok, _) => (**ok).clone(),
                    _ => self.ctx.fresh_var(),
                };
                let p = self.lower_pattern_expr(&args[0], &ok_ty, bindings);
                Some(Pat::Ctor { name: "ok".to_string(), args: vec![p] })
            }
            "Err" if args.len() == 1 => {
                let err_ty = match scrutinee {
                    Ty::Result(_, err) => (**err).clone(),
                    _ => self.ctx.fresh_var(),
                };
                let p = self.lower_pattern_expr(&args[0], &err_ty, bindings);
                Some(Pat::Ctor { name: "err".to_string(), args: vec![p] })
            }
            _ => None,
        }
    }

    fn lower_variant_pattern(&mut self, enum_info: &EnumInfo, variant_name: &str, args: &[Expr], scrutinee: &Ty, bindings: &mut Vec<(String, Ty)>, span: Span) -> Pat {
        let variant = enum_info.variants.iter().find(|v| v.name == variant_name).cloned();
        match variant {
            None => {
                self.push_error(TypeError::UnknownVariant { name: variant_name.to_string(), span });
                Pat::Wildcard
            }
            Some(v) => {
                if v.payload.len() != args.len() {
                    self.push_error(TypeError::VariantArityMismatch { name: variant_name.to_string(), expected: v.payload.len(), found: args.len(), span });
                }
                let subst = self.ctx.fresh_substitution(&enum_info.generic_vars);
                let payload_tys: Vec<Ty> = v.payload.iter().map(|t| self.ctx.substitute(t, &subst)).collect();
                let args_pats = args
                    .iter()
                    .enumerate()
                    .map(|(i, a)| {
                        let t = payload_tys.get(i).cloned().unwrap_or_else(|| self.ctx.fresh_var());
                        self.lower_pattern_expr(a, &t, bindings)
                    })
                    .collect();
                Pat::Ctor { name: variant_name.to_string(), args: args_pats }
            }
        }
    }
}

fn generic_scope(names: &[String], vars: &[TyVar]) -> FxHashMap<String, Ty> {
    names.iter().cloned().zip(vars.iter().map(|v| Ty::Var(*v))).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use al_lexer::Lexer;

    fn check_source(src: &str) -> CheckResult {
        let tokens = Lexer::scan(src).tokens;
        let parsed = al_parser::parse(tokens);
        check(&parsed.ast)
    }

    fn errors_of(result: &CheckResult) -> Vec<&Diagnostic> {
        result.diagnostics.iter().filter(|d| d.is_error()).collect()
    }

    #[test]
    fn polymorphic_identity_infers_both_call_sites() {
        let result = check_source("fn id(x) { x }\na = id(42)\nb = id('hi')\n");
        assert!(errors_of(&result).is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn or_expression_unwraps_result_with_error_struct() {
        let result = check_source("struct E { msg String }\nfn f() Int!E {\n  error E{msg: 'x'}\n}\nv = f() or 0\n");
        assert!(errors_of(&result).is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn enum_match_requires_all_variants() {
        let result = check_source("enum Color { Red; Green; Blue }\nc = Red\nmatch c { Red -> 1, Green -> 2 }\n");
        assert!(result.diagnostics.iter().any(|d| d.code == "T0011"));
    }

    #[test]
    fn or_expression_unwraps_option() {
        let result = check_source("fn head(xs Array(Int)) Option(Int) {\n  Some(xs[0])\n}\nfn first(xs Array(Int)) Int {\n  head(xs) or 0\n}\n");
        assert!(errors_of(&result).is_empty(), "{:?}", result.diagnostics);
    }

    #[test]
    fn unused_non_final_value_is_flagged() {
        let result = check_source("fn f() {\n  42\n  1\n}\n");
        assert!(result.diagnostics.iter().any(|d| d.code == "T0013"));
    }

    #[test]
    fn struct_init_reports_missing_and_unknown_fields() {
        let result = check_source("struct Point { x Int, y Int }\np = Point{x: 1, z: 2}\n");
        let codes: Vec<&str> = result.diagnostics.iter().map(|d| d.code).collect();
        assert!(codes.contains(&"T0007"));
        assert!(codes.contains(&"T0008"));
    }

    #[test]
    fn array_spread_pattern_is_exhaustive_with_wildcard_tail() {
        let result = check_source("xs = [1, 2, 3]\nmatch xs {\n  [] -> 0,\n  [h, ..rest] -> h,\n}\n");
        assert!(!result.diagnostics.iter().any(|d| d.code == "T0011"), "{:?}", result.diagnostics);
    }

    #[test]
    fn unbound_name_suggests_closest_match() {
        let result = check_source("x = 1\ny = xx\n");
        let msg = result.diagnostics.iter().find(|d| d.code == "T0004").map(|d| d.message.clone());
        assert_eq!(msg, Some("unknown name `xx`. Did you mean `x`?".to_string()));
    }
}
