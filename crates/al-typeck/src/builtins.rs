//! Built-in operator typing rules.
//!
//! AL has no user-overloadable operators, so unlike a Hindley-Milner
//! language with typeclass dispatch, there's nothing to register into the
//! environment as callable schemes -- `infer.rs` calls straight into these
//! helpers when it reaches a `Binary`/`Unary` node.

use crate::ty::Ty;

/// `+`: `String + String -> String`, numeric + numeric (same type) -> that
/// type. No mixed-type coercion, no auto-stringification.
pub fn add_result(lhs: &Ty, rhs: &Ty) -> Option<Ty> {
    match (lhs, rhs) {
        (Ty::String, Ty::String) => Some(Ty::String),
        (Ty::Int, Ty::Int) => Some(Ty::Int),
        (Ty::Float, Ty::Float) => Some(Ty::Float),
        _ => None,
    }
}

/// `- * / %`: numeric, same type on both sides.
pub fn arithmetic_result(lhs: &Ty, rhs: &Ty) -> Option<Ty> {
    match (lhs, rhs) {
        (Ty::Int, Ty::Int) => Some(Ty::Int),
        (Ty::Float, Ty::Float) => Some(Ty::Float),
        _ => None,
    }
}

/// `< > <= >=`: both sides numeric (need not match: spec only requires
/// numeric, not same-type, for ordering comparisons).
pub fn is_comparable(lhs: &Ty, rhs: &Ty) -> bool {
    lhs.is_numeric() && rhs.is_numeric()
}

/// `&&` / `||`: both sides `Bool`.
pub fn is_logical_operand(ty: &Ty) -> bool {
    matches!(ty, Ty::Bool)
}

/// Unary `-`: numeric operand, same result type.
pub fn unary_neg_result(operand: &Ty) -> Option<Ty> {
    match operand {
        Ty::Int => Some(Ty::Int),
        Ty::Float => Some(Ty::Float),
        _ => None,
    }
}

/// Unary `!`: `Bool` operand, `Bool` result.
pub fn is_unary_not_operand(ty: &Ty) -> bool {
    matches!(ty, Ty::Bool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_allows_string_and_numeric_but_not_mixed() {
        assert_eq!(add_result(&Ty::String, &Ty::String), Some(Ty::String));
        assert_eq!(add_result(&Ty::Int, &Ty::Int), Some(Ty::Int));
        assert_eq!(add_result(&Ty::Int, &Ty::String), None);
        assert_eq!(add_result(&Ty::Int, &Ty::Float), None);
    }

    #[test]
    fn arithmetic_rejects_string() {
        assert_eq!(arithmetic_result(&Ty::String, &Ty::String), None);
        assert_eq!(arithmetic_result(&Ty::Float, &Ty::Float), Some(Ty::Float));
    }
}
