//! Maranget-style usefulness and exhaustiveness checking over a closed
//! constructor algebra.
//!
//! The lowering from surface `Pattern` to [`Pat`] happens in `infer.rs`
//! (it needs live type information and the environment to resolve enum
//! variants); this module only knows about the abstract matrix algorithm
//! and the per-type constructor universe.

use al_common::Span;

use crate::env::TypeEnv;
use crate::error::TypeError;
use crate::ty::Ty;

/// The three-shape internal pattern form. Surface patterns (literals,
/// bindings, tuples, array-with-spread, constructor calls, or-patterns)
/// all lower into this before the algorithm ever sees them.
#[derive(Debug, Clone, PartialEq)]
pub enum Pat {
    Wildcard,
    Ctor { name: String, args: Vec<Pat> },
    Or(Vec<Pat>),
}

impl Pat {
    /// Render as source-like syntax for witness/diagnostic messages.
    pub fn render(&self) -> String {
        match self {
            Pat::Wildcard => "_".to_string(),
            Pat::Or(alts) => alts.iter().map(Pat::render).collect::<Vec<_>>().join(" | "),
            Pat::Ctor { name, args } => match name.as_str() {
                "true" | "false" | "none" => name.clone(),
                "tuple" => format!("({})", args.iter().map(Pat::render).collect::<Vec<_>>().join(", ")),
                "[]" => "[]".to_string(),
                "[..]" => {
                    if args.len() == 2 {
                        format!("[{}, ..{}]", args[0].render(), tail_render(&args[1]))
                    } else {
                        "[..]".to_string()
                    }
                }
                "struct" => "{ .. }".to_string(),
                n if n.starts_with("lit:") => n.trim_start_matches("lit:").to_string(),
                n if n.starts_with("cond:") => "<condition>".to_string(),
                variant if args.is_empty() => variant.to_string(),
                variant => format!("{variant}({})", args.iter().map(Pat::render).collect::<Vec<_>>().join(", ")),
            },
        }
    }
}

fn tail_render(tail: &Pat) -> String {
    match tail {
        Pat::Wildcard => "".to_string(),
        _ => tail.render(),
    }
}

/// All inhabited constructors of `ty`, with their arity -- only meaningful
/// for types with a *finite* constructor set.
pub fn all_constructors(ty: &Ty, env: &TypeEnv) -> Vec<(String, usize)> {
    match ty {
        Ty::Bool => vec![("true".to_string(), 0), ("false".to_string(), 0)],
        Ty::Option(_) => vec![("some".to_string(), 1), ("none".to_string(), 0)],
        Ty::Result(_, _) => vec![("ok".to_string(), 1), ("err".to_string(), 1)],
        Ty::Array(_) => vec![("[]".to_string(), 0), ("[..]".to_string(), 2)],
        Ty::Tuple(elems) => vec![("tuple".to_string(), elems.len())],
        Ty::None => vec![("none".to_string(), 0)],
        Ty::Enum { name, .. } => env
            .lookup_enum(name)
            .map(|info| info.variants.iter().map(|v| (v.name.clone(), v.payload.len())).collect())
            .unwrap_or_default(),
        Ty::Struct { name, .. } => env
            .lookup_struct(name)
            .map(|info| vec![("struct".to_string(), info.fields.len())])
            .unwrap_or_else(|| vec![("struct".to_string(), 0)]),
        _ => Vec::new(),
    }
}

/// Whether `ty` has a finite, enumerable constructor set at all (numbers,
/// strings, and opaque condition sites never do).
fn is_finite(ty: &Ty) -> bool {
    matches!(
        ty,
        Ty::Bool | Ty::Option(_) | Ty::Result(_, _) | Ty::Array(_) | Ty::Tuple(_) | Ty::None | Ty::Enum { .. } | Ty::Struct { .. }
    )
}

fn is_complete(ty: &Ty, env: &TypeEnv, seen: &std::collections::HashSet<String>) -> bool {
    if !is_finite(ty) {
        return false;
    }
    all_constructors(ty, env).iter().all(|(name, _)| seen.contains(name))
}

/// The sub-pattern types a constructor's arguments carry, for specializing
/// the type vector alongside a specialized matrix row.
pub fn ctor_arg_types(ty: &Ty, env: &TypeEnv, name: &str) -> Vec<Ty> {
    match (ty, name) {
        (Ty::Option(inner), "some") => vec![(**inner).clone()],
        (Ty::Result(ok, _), "ok") => vec![(**ok).clone()],
        (Ty::Result(_, err), "err") => vec![(**err).clone()],
        (Ty::Array(elem), "[..]") => vec![(**elem).clone(), Ty::Array(elem.clone())],
        (Ty::Tuple(elems), "tuple") => elems.clone(),
        (Ty::Enum { name: enum_name, .. }, variant) => env
            .lookup_enum(enum_name)
            .and_then(|info| info.variants.iter().find(|v| v.name == variant))
            .map(|v| v.payload.clone())
            .unwrap_or_default(),
        (Ty::Struct { name: struct_name, .. }, "struct") => env
            .lookup_struct(struct_name)
            .map(|info| info.fields.iter().map(|(_, t)| t.clone()).collect())
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn flatten_ors(matrix: Vec<Vec<Pat>>) -> Vec<Vec<Pat>> {
    let mut out = Vec::with_capacity(matrix.len());
    for row in matrix {
        if let Some(Pat::Or(alts)) = row.first().cloned() {
            for alt in alts {
                let mut new_row = row.clone();
                new_row[0] = alt;
                out.extend(flatten_ors(vec![new_row]));
            }
        } else {
            out.push(row);
        }
    }
    out
}

fn first_column_ctors(matrix: &[Vec<Pat>]) -> std::collections::HashSet<String> {
    matrix
        .iter()
        .filter_map(|row| match row.first() {
            Some(Pat::Ctor { name, .. }) => Some(name.clone()),
            _ => None,
        })
        .collect()
}

fn specialize(matrix: &[Vec<Pat>], ctor: &str, arity: usize) -> Vec<Vec<Pat>> {
    let matrix = flatten_ors(matrix.to_vec());
    let mut out = Vec::new();
    for row in matrix {
        match &row[0] {
            Pat::Ctor { name, args } if name == ctor => {
                let mut new_row = args.clone();
                new_row.extend(row[1..].to_vec());
                out.push(new_row);
            }
            Pat::Ctor { .. } => {}
            Pat::Wildcard => {
                let mut new_row = vec![Pat::Wildcard; arity];
                new_row.extend(row[1..].to_vec());
                out.push(new_row);
            }
            Pat::Or(_) => unreachable!("flatten_ors removes leading Or"),
        }
    }
    out
}

fn default_matrix(matrix: &[Vec<Pat>]) -> Vec<Vec<Pat>> {
    let matrix = flatten_ors(matrix.to_vec());
    matrix
        .into_iter()
        .filter_map(|row| match row.first() {
            Some(Pat::Wildcard) => Some(row[1..].to_vec()),
            _ => None,
        })
        .collect()
}

/// True iff some value matches `row` but no prior row of `matrix`.
pub fn is_useful(matrix: &[Vec<Pat>], row: &[Pat], types: &[Ty], env: &TypeEnv) -> bool {
    if row.is_empty() {
        return matrix.is_empty();
    }
    let ty = &types[0];
    match &row[0] {
        Pat::Ctor { name, args } => {
            let specialized = specialize(matrix, name, args.len());
            let mut new_row = args.clone();
            new_row.extend(row[1..].to_vec());
            let mut new_types = ctor_arg_types(ty, env, name);
            new_types.extend(types[1..].to_vec());
            is_useful(&specialized, &new_row, &new_types, env)
        }
        Pat::Wildcard => {
            let seen = first_column_ctors(matrix);
            if is_complete(ty, env, &seen) {
                all_constructors(ty, env).into_iter().any(|(cname, arity)| {
                    let specialized = specialize(matrix, &cname, arity);
                    let mut new_row = vec![Pat::Wildcard; arity];
                    new_row.extend(row[1..].to_vec());
                    let mut new_types = ctor_arg_types(ty, env, &cname);
                    new_types.extend(types[1..].to_vec());
                    is_useful(&specialized, &new_row, &new_types, env)
                })
            } else {
                let default = default_matrix(matrix);
                is_useful(&default, &row[1..], &types[1..], env)
            }
        }
        Pat::Or(alts) => alts.iter().any(|alt| {
            let mut new_row = vec![alt.clone()];
            new_row.extend(row[1..].to_vec());
            is_useful(matrix, &new_row, types, env)
        }),
    }
}

/// Construct a concrete value not covered by `matrix`, or `None` if it's
/// exhaustive. `types` is the type vector in lockstep with matrix columns.
fn find_witness(matrix: &[Vec<Pat>], types: &[Ty], env: &TypeEnv) -> Option<Vec<Pat>> {
    if types.is_empty() {
        return if matrix.is_empty() { Some(Vec::new()) } else { None };
    }
    let ty = &types[0];
    let seen = first_column_ctors(matrix);
    if !is_complete(ty, env, &seen) {
        let default = default_matrix(matrix);
        let rest = find_witness(&default, &types[1..], env)?;
        let missing_head = if is_finite(ty) {
            all_constructors(ty, env)
                .into_iter()
                .find(|(name, _)| !seen.contains(name))
                .map(|(name, arity)| Pat::Ctor { name, args: vec![Pat::Wildcard; arity] })
                .unwrap_or(Pat::Wildcard)
        } else {
            Pat::Wildcard
        };
        let mut full = vec![missing_head];
        full.extend(rest);
        return Some(full);
    }
    for (cname, arity) in all_constructors(ty, env) {
        let specialized = specialize(matrix, &cname, arity);
        let mut new_types = ctor_arg_types(ty, env, &cname);
        new_types.extend(types[1..].to_vec());
        if let Some(mut witness) = find_witness(&specialized, &new_types, env) {
            let args: Vec<Pat> = witness.drain(0..arity).collect();
            let mut full = vec![Pat::Ctor { name: cname, args }];
            full.extend(witness);
            return Some(full);
        }
    }
    None
}

/// Per-arm reachability, plus one exhaustiveness check over the full set.
/// Appends a `TypeError` per unreachable arm and at most one for a missing
/// case; callers turn these into diagnostics the same way as any other
/// type error.
pub fn check_match(arm_patterns: &[Pat], arm_spans: &[Span], arm_is_wildcard: &[bool], scrutinee: &Ty, match_span: Span, env: &TypeEnv, errors: &mut Vec<TypeError>) {
    let mut matrix: Vec<Vec<Pat>> = Vec::new();
    for (i, pat) in arm_patterns.iter().enumerate() {
        let row = vec![pat.clone()];
        if !is_useful(&matrix, &row, std::slice::from_ref(scrutinee), env) {
            errors.push(TypeError::UnreachableArm { span: arm_spans[i], is_wildcard: arm_is_wildcard[i] });
        }
        matrix.push(row);
    }
    if let Some(parts) = find_witness(&matrix, std::slice::from_ref(scrutinee), env) {
        let rendered = parts.first().map(Pat::render).unwrap_or_else(|| "_".to_string());
        errors.push(TypeError::NonExhaustiveMatch {
            scrutinee_type: scrutinee.to_string(),
            witness: rendered,
            span: match_span,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{EnumInfo, EnumVariantInfo};

    fn color_env() -> (TypeEnv, Ty) {
        let mut env = TypeEnv::new();
        let id = env.fresh_nominal_id();
        env.register_enum(EnumInfo {
            id,
            name: "Color".to_string(),
            generics: vec![],
            generic_vars: vec![],
            variants: vec![
                EnumVariantInfo { name: "Red".to_string(), payload: vec![] },
                EnumVariantInfo { name: "Green".to_string(), payload: vec![] },
                EnumVariantInfo { name: "Blue".to_string(), payload: vec![] },
            ],
            def_span: Span::point(1, 1),
            doc: None,
        });
        (env, Ty::Enum { id, name: "Color".to_string(), variants: vec![] })
    }

    fn ctor(name: &str) -> Pat {
        Pat::Ctor { name: name.to_string(), args: vec![] }
    }

    #[test]
    fn bool_two_arms_exhaustive() {
        let env = TypeEnv::new();
        let matrix = vec![vec![ctor("true")], vec![ctor("false")]];
        assert!(find_witness(&matrix, &[Ty::Bool], &env).is_none());
    }

    #[test]
    fn bool_missing_arm_reports_witness() {
        let env = TypeEnv::new();
        let matrix = vec![vec![ctor("true")]];
        let witness = find_witness(&matrix, &[Ty::Bool], &env).expect("should be missing false");
        assert_eq!(witness[0].render(), "false");
    }

    #[test]
    fn wildcard_alone_is_always_exhaustive() {
        let env = TypeEnv::new();
        let matrix = vec![vec![Pat::Wildcard]];
        assert!(find_witness(&matrix, &[Ty::Bool], &env).is_none());
    }

    #[test]
    fn enum_missing_variant_produces_witness() {
        let (env, color) = color_env();
        let matrix = vec![vec![ctor("Red")], vec![ctor("Green")]];
        let witness = find_witness(&matrix, &[color], &env).expect("Blue missing");
        assert_eq!(witness[0].render(), "Blue");
    }

    #[test]
    fn redundant_arm_after_wildcard_is_not_useful() {
        let env = TypeEnv::new();
        let matrix = vec![vec![Pat::Wildcard]];
        assert!(!is_useful(&matrix, &[ctor("true")], &[Ty::Bool], &env));
    }

    #[test]
    fn array_spread_and_empty_cover_array_type() {
        let env = TypeEnv::new();
        let elem = Ty::Int;
        let matrix = vec![
            vec![Pat::Ctor { name: "[..]".to_string(), args: vec![Pat::Wildcard, Pat::Wildcard] }],
            vec![ctor("[]")],
        ];
        assert!(find_witness(&matrix, &[Ty::Array(Box::new(elem))], &env).is_none());
    }
}
