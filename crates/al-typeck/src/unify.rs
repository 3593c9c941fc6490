//! Unification engine. Owns the `ena` union-find table that backs every
//! free type variable created during inference.

use ena::unify::InPlaceUnificationTable;
use rustc_hash::FxHashMap;

use crate::error::{ConstraintOrigin, TypeError};
use crate::ty::{Scheme, Ty, TyVar};

pub struct InferCtx {
    table: InPlaceUnificationTable<TyVar>,
    pub errors: Vec<TypeError>,
}

impl InferCtx {
    pub fn new() -> Self {
        InferCtx {
            table: InPlaceUnificationTable::new(),
            errors: Vec::new(),
        }
    }

    pub fn fresh_var(&mut self) -> Ty {
        Ty::Var(self.table.new_key(None))
    }

    /// Follow union-find indirection until reaching a concrete type or an
    /// unbound variable's representative key.
    pub fn resolve(&mut self, ty: Ty) -> Ty {
        match ty {
            Ty::Var(v) => match self.table.probe_value(v) {
                Some(inner) => self.resolve(inner),
                None => Ty::Var(self.table.find(v)),
            },
            Ty::Option(inner) => Ty::Option(Box::new(self.resolve(*inner))),
            Ty::Result(ok, err) => Ty::Result(Box::new(self.resolve(*ok)), Box::new(self.resolve(*err))),
            Ty::Array(elem) => Ty::Array(Box::new(self.resolve(*elem))),
            Ty::Tuple(elems) => Ty::Tuple(elems.into_iter().map(|e| self.resolve(e)).collect()),
            Ty::Function { params, ret, error_type } => Ty::Function {
                params: params.into_iter().map(|p| self.resolve(p)).collect(),
                ret: Box::new(self.resolve(*ret)),
                error_type: error_type.map(|e| Box::new(self.resolve(*e))),
            },
            other => other,
        }
    }

    fn occurs_in(&mut self, var: TyVar, ty: &Ty) -> bool {
        match ty {
            Ty::Var(v) => {
                if *v == var {
                    return true;
                }
                match self.table.probe_value(*v) {
                    Some(inner) => self.occurs_in(var, &inner),
                    None => false,
                }
            }
            Ty::Option(inner) | Ty::Array(inner) => self.occurs_in(var, inner),
            Ty::Result(a, b) => self.occurs_in(var, a) || self.occurs_in(var, b),
            Ty::Tuple(elems) => elems.iter().any(|e| self.occurs_in(var, e)),
            Ty::Function { params, ret, error_type } => {
                params.iter().any(|p| self.occurs_in(var, p))
                    || self.occurs_in(var, ret)
                    || error_type.as_ref().is_some_and(|e| self.occurs_in(var, e))
            }
            _ => false,
        }
    }

    /// Structural unification. Per the language's inference design, `Var`
    /// unifies with anything and records the binding; no occurs-check
    /// failure is fatal to the run (it's still recorded as an error).
    pub fn unify(&mut self, a: Ty, b: Ty, origin: ConstraintOrigin) -> Result<(), TypeError> {
        let a = self.resolve(a);
        let b = self.resolve(b);

        match (a, b) {
            (Ty::Var(v1), Ty::Var(v2)) if v1 == v2 => Ok(()),
            (Ty::Var(v1), Ty::Var(v2)) => {
                self.table.unify_var_var(v1, v2).expect("unifying two unbound vars cannot fail");
                Ok(())
            }
            (Ty::Var(v), ty) | (ty, Ty::Var(v)) => {
                if self.occurs_in(v, &ty) {
                    let err = TypeError::InfiniteType { var: v, ty, origin };
                    self.errors.push(err.clone());
                    Err(err)
                } else {
                    self.table
                        .unify_var_value(v, Some(ty))
                        .expect("binding a var after a passed occurs check cannot fail");
                    Ok(())
                }
            }
            (Ty::Int, Ty::Int) | (Ty::Float, Ty::Float) | (Ty::String, Ty::String) | (Ty::Bool, Ty::Bool) | (Ty::None, Ty::None) => Ok(()),
            (Ty::Option(a), Ty::Option(b)) => self.unify(*a, *b, origin),
            (Ty::Result(a1, a2), Ty::Result(b1, b2)) => {
                self.unify(*a1, *b1, origin.clone())?;
                self.unify(*a2, *b2, origin)
            }
            (Ty::Array(a), Ty::Array(b)) => self.unify(*a, *b, origin),
            (Ty::Tuple(e1), Ty::Tuple(e2)) => {
                if e1.len() != e2.len() {
                    let err = TypeError::ArityMismatch { expected: e1.len(), found: e2.len(), origin };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                for (x, y) in e1.into_iter().zip(e2) {
                    self.unify(x, y, origin.clone())?;
                }
                Ok(())
            }
            (Ty::Function { params: p1, ret: r1, error_type: e1 }, Ty::Function { params: p2, ret: r2, error_type: e2 }) => {
                if p1.len() != p2.len() {
                    let err = TypeError::ArityMismatch { expected: p1.len(), found: p2.len(), origin };
                    self.errors.push(err.clone());
                    return Err(err);
                }
                for (x, y) in p1.into_iter().zip(p2) {
                    self.unify(x, y, origin.clone())?;
                }
                self.unify(*r1, *r2, origin.clone())?;
                match (e1, e2) {
                    (Some(x), Some(y)) => self.unify(*x, *y, origin),
                    _ => Ok(()),
                }
            }
            (a @ Ty::Struct { .. }, b @ Ty::Struct { .. }) | (a @ Ty::Enum { .. }, b @ Ty::Enum { .. }) => {
                if a == b {
                    Ok(())
                } else {
                    let err = TypeError::Mismatch { expected: a, found: b, origin };
                    self.errors.push(err.clone());
                    Err(err)
                }
            }
            (a, b) => {
                let err = TypeError::Mismatch { expected: a, found: b, origin };
                self.errors.push(err.clone());
                Err(err)
            }
        }
    }

    fn collect_vars(&mut self, ty: &Ty, out: &mut Vec<TyVar>) {
        match self.resolve(ty.clone()) {
            Ty::Var(v) => {
                if !out.contains(&v) {
                    out.push(v);
                }
            }
            Ty::Option(inner) | Ty::Array(inner) => self.collect_vars(&inner, out),
            Ty::Result(a, b) => {
                self.collect_vars(&a, out);
                self.collect_vars(&b, out);
            }
            Ty::Tuple(elems) => {
                for e in &elems {
                    self.collect_vars(e, out);
                }
            }
            Ty::Function { params, ret, error_type } => {
                for p in &params {
                    self.collect_vars(p, out);
                }
                self.collect_vars(&ret, out);
                if let Some(e) = &error_type {
                    self.collect_vars(e, out);
                }
            }
            _ => {}
        }
    }

    /// Quantify over every free variable reachable from `ty`. Callers only
    /// do this once, right after a top-level function's own body has been
    /// checked in full -- at that point the vars are owned solely by that
    /// function's signature and nothing else could have constrained them.
    pub fn generalize(&mut self, ty: Ty) -> Scheme {
        let resolved = self.resolve(ty);
        let mut vars = Vec::new();
        self.collect_vars(&resolved, &mut vars);
        Scheme { vars, ty: resolved }
    }

    pub fn substitute(&self, ty: &Ty, subst: &FxHashMap<TyVar, Ty>) -> Ty {
        match ty {
            Ty::Var(v) => subst.get(v).cloned().unwrap_or(Ty::Var(*v)),
            Ty::Option(inner) => Ty::Option(Box::new(self.substitute(inner, subst))),
            Ty::Result(ok, err) => Ty::Result(Box::new(self.substitute(ok, subst)), Box::new(self.substitute(err, subst))),
            Ty::Array(elem) => Ty::Array(Box::new(self.substitute(elem, subst))),
            Ty::Tuple(elems) => Ty::Tuple(elems.iter().map(|e| self.substitute(e, subst)).collect()),
            Ty::Function { params, ret, error_type } => Ty::Function {
                params: params.iter().map(|p| self.substitute(p, subst)).collect(),
                ret: Box::new(self.substitute(ret, subst)),
                error_type: error_type.as_ref().map(|e| Box::new(self.substitute(e, subst))),
            },
            other => other.clone(),
        }
    }

    /// Produce a fresh copy of `scheme` with every quantified variable
    /// replaced by a brand-new unification variable.
    pub fn instantiate(&mut self, scheme: &Scheme) -> Ty {
        let subst: FxHashMap<TyVar, Ty> = scheme.vars.iter().map(|v| (*v, self.fresh_var())).collect();
        self.substitute(&scheme.ty, &subst)
    }

    /// Fresh vars for an arbitrary set of generic slots (structs/enums),
    /// paired with the slots they replace -- used to instantiate a nominal
    /// type's stored field/variant types per use-site.
    pub fn fresh_substitution(&mut self, slots: &[TyVar]) -> FxHashMap<TyVar, Ty> {
        slots.iter().map(|v| (*v, self.fresh_var())).collect()
    }
}

impl Default for InferCtx {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> ConstraintOrigin {
        ConstraintOrigin::Builtin
    }

    #[test]
    fn unify_var_with_concrete() {
        let mut ctx = InferCtx::new();
        let v = ctx.fresh_var();
        assert!(ctx.unify(v.clone(), Ty::Int, origin()).is_ok());
        assert_eq!(ctx.resolve(v), Ty::Int);
    }

    #[test]
    fn unify_mismatch_is_recorded() {
        let mut ctx = InferCtx::new();
        assert!(ctx.unify(Ty::Int, Ty::String, origin()).is_err());
        assert_eq!(ctx.errors.len(), 1);
    }

    #[test]
    fn unify_option_recurses() {
        let mut ctx = InferCtx::new();
        let v = ctx.fresh_var();
        let a = Ty::Option(Box::new(v.clone()));
        let b = Ty::Option(Box::new(Ty::Bool));
        assert!(ctx.unify(a, b, origin()).is_ok());
        assert_eq!(ctx.resolve(v), Ty::Bool);
    }

    #[test]
    fn occurs_check_rejects_infinite_type() {
        let mut ctx = InferCtx::new();
        let v = ctx.fresh_var();
        let array_of_v = Ty::Array(Box::new(v.clone()));
        let result = ctx.unify(v, array_of_v, origin());
        assert!(matches!(result, Err(TypeError::InfiniteType { .. })));
    }

    #[test]
    fn struct_equality_by_id_not_shape() {
        let mut ctx = InferCtx::new();
        let a = Ty::Struct { id: 7, name: "A".into(), fields: vec![] };
        let b = Ty::Struct { id: 7, name: "A".into(), fields: vec![] };
        assert!(ctx.unify(a, b, origin()).is_ok());
    }
}
