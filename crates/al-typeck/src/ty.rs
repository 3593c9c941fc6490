//! Type representation for AL's type system.
//!
//! Defines the core `Ty` enum, type variables (`TyVar`), and polymorphic
//! function signatures. Structs and enums are nominal: two instances are
//! equal iff their `id` (assigned at declaration time) matches, not their
//! structural shape.

use std::fmt;

/// A type variable, identified by a `u32` index into the unification table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TyVar(pub u32);

/// Injective id assigned to every declared struct/enum at registration time.
pub type NominalId = u32;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldTy {
    pub name: String,
    pub ty: Box<Ty>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VariantTy {
    pub name: String,
    pub payload: Vec<Ty>,
}

/// An AL type.
#[derive(Clone, Debug)]
pub enum Ty {
    Var(TyVar),
    Int,
    Float,
    String,
    Bool,
    /// The type of `none` before it has been unified to a concrete `Option<T>`.
    None,
    Option(Box<Ty>),
    Result(Box<Ty>, Box<Ty>),
    Array(Box<Ty>),
    Tuple(Vec<Ty>),
    Function {
        params: Vec<Ty>,
        ret: Box<Ty>,
        error_type: Option<Box<Ty>>,
    },
    Struct {
        id: NominalId,
        name: String,
        fields: Vec<FieldTy>,
    },
    Enum {
        id: NominalId,
        name: String,
        variants: Vec<VariantTy>,
    },
}

impl Ty {
    pub fn fun(params: Vec<Ty>, ret: Ty) -> Ty {
        Ty::Function {
            params,
            ret: Box::new(ret),
            error_type: None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Ty::Int | Ty::Float)
    }

    /// Heuristic used by branch-type unification: a nominal struct "looks
    /// like an error" if it's used on the other side of a `T` in an
    /// `if`/`match` arm unification -- per spec, any `Struct` triggers the
    /// `Result` promotion, so this is just a type-tag check.
    pub fn is_struct(&self) -> bool {
        matches!(self, Ty::Struct { .. })
    }
}

/// Nominal types (struct/enum) compare by `id` alone, per the invariant
/// that two nominal types are equal iff their declaration id matches --
/// not by structurally comparing field/variant lists.
impl PartialEq for Ty {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ty::Var(a), Ty::Var(b)) => a == b,
            (Ty::Int, Ty::Int) | (Ty::Float, Ty::Float) | (Ty::String, Ty::String) | (Ty::Bool, Ty::Bool) | (Ty::None, Ty::None) => true,
            (Ty::Option(a), Ty::Option(b)) => a == b,
            (Ty::Result(a1, a2), Ty::Result(b1, b2)) => a1 == b1 && a2 == b2,
            (Ty::Array(a), Ty::Array(b)) => a == b,
            (Ty::Tuple(a), Ty::Tuple(b)) => a == b,
            (
                Ty::Function { params: p1, ret: r1, error_type: e1 },
                Ty::Function { params: p2, ret: r2, error_type: e2 },
            ) => p1 == p2 && r1 == r2 && e1 == e2,
            (Ty::Struct { id: a, .. }, Ty::Struct { id: b, .. }) => a == b,
            (Ty::Enum { id: a, .. }, Ty::Enum { id: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for Ty {}

impl std::hash::Hash for Ty {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            Ty::Var(v) => v.hash(state),
            Ty::Int => 0u8.hash(state),
            Ty::Float => 1u8.hash(state),
            Ty::String => 2u8.hash(state),
            Ty::Bool => 3u8.hash(state),
            Ty::None => 4u8.hash(state),
            Ty::Option(inner) => {
                5u8.hash(state);
                inner.hash(state);
            }
            Ty::Result(ok, err) => {
                6u8.hash(state);
                ok.hash(state);
                err.hash(state);
            }
            Ty::Array(elem) => {
                7u8.hash(state);
                elem.hash(state);
            }
            Ty::Tuple(elems) => {
                8u8.hash(state);
                elems.hash(state);
            }
            Ty::Function { params, ret, error_type } => {
                9u8.hash(state);
                params.hash(state);
                ret.hash(state);
                error_type.hash(state);
            }
            Ty::Struct { id, .. } => {
                10u8.hash(state);
                id.hash(state);
            }
            Ty::Enum { id, .. } => {
                11u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Var(v) => write!(f, "?{}", v.0),
            Ty::Int => write!(f, "Int"),
            Ty::Float => write!(f, "Float"),
            Ty::String => write!(f, "String"),
            Ty::Bool => write!(f, "Bool"),
            Ty::None => write!(f, "None"),
            Ty::Option(inner) => write!(f, "Option<{inner}>"),
            Ty::Result(ok, err) => write!(f, "Result<{ok}, {err}>"),
            Ty::Array(elem) => write!(f, "Array<{elem}>"),
            Ty::Tuple(elems) => {
                write!(f, "(")?;
                for (i, e) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{e}")?;
                }
                write!(f, ")")
            }
            Ty::Function { params, ret, error_type } => {
                write!(f, "fn(")?;
                for (i, p) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{p}")?;
                }
                write!(f, ") {ret}")?;
                if let Some(err) = error_type {
                    write!(f, "!{err}")?;
                }
                Ok(())
            }
            Ty::Struct { name, .. } => write!(f, "{name}"),
            Ty::Enum { name, .. } => write!(f, "{name}"),
        }
    }
}

/// A polymorphic type scheme: a type with universally quantified variables.
#[derive(Clone, Debug)]
pub struct Scheme {
    pub vars: Vec<TyVar>,
    pub ty: Ty,
}

impl Scheme {
    pub fn mono(ty: Ty) -> Self {
        Scheme { vars: Vec::new(), ty }
    }
}

impl ena::unify::UnifyKey for TyVar {
    type Value = Option<Ty>;

    fn index(&self) -> u32 {
        self.0
    }

    fn from_index(u: u32) -> Self {
        TyVar(u)
    }

    fn tag() -> &'static str {
        "TyVar"
    }
}

impl ena::unify::EqUnifyValue for Ty {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_surface_syntax() {
        assert_eq!(Ty::Int.to_string(), "Int");
        assert_eq!(Ty::Option(Box::new(Ty::Int)).to_string(), "Option<Int>");
        assert_eq!(Ty::Result(Box::new(Ty::Int), Box::new(Ty::String)).to_string(), "Result<Int, String>");
        assert_eq!(Ty::Array(Box::new(Ty::Bool)).to_string(), "Array<Bool>");
    }

    #[test]
    fn struct_equality_is_nominal() {
        let a = Ty::Struct { id: 1, name: "Point".into(), fields: vec![] };
        let b = Ty::Struct { id: 1, name: "Point".into(), fields: vec![] };
        let c = Ty::Struct { id: 2, name: "Point".into(), fields: vec![] };
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
