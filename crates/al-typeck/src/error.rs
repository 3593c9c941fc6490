//! Type error taxonomy with source-position provenance.

use al_common::{Diagnostic, Span};

use crate::ty::{Ty, TyVar};

/// Where a unification constraint came from -- used to phrase the
/// diagnostic around the actual source construct rather than a bare
/// "types don't match".
#[derive(Clone, Debug)]
pub enum ConstraintOrigin {
    FnArg { call_span: Span, param_index: usize },
    BinOp { span: Span },
    Branches { span: Span },
    Annotation { span: Span },
    Return { span: Span },
    Binding { span: Span },
    Builtin,
}

impl ConstraintOrigin {
    fn span(&self) -> Option<Span> {
        match self {
            ConstraintOrigin::FnArg { call_span, .. } => Some(*call_span),
            ConstraintOrigin::BinOp { span }
            | ConstraintOrigin::Branches { span }
            | ConstraintOrigin::Annotation { span }
            | ConstraintOrigin::Return { span }
            | ConstraintOrigin::Binding { span } => Some(*span),
            ConstraintOrigin::Builtin => None,
        }
    }
}

#[derive(Clone, Debug)]
pub enum TypeError {
    Mismatch { expected: Ty, found: Ty, origin: ConstraintOrigin },
    InfiniteType { var: TyVar, ty: Ty, origin: ConstraintOrigin },
    ArityMismatch { expected: usize, found: usize, origin: ConstraintOrigin },
    UnboundVariable { name: String, span: Span, suggestion: Option<String> },
    NotAFunction { ty: Ty, span: Span },
    DuplicateField { struct_name: String, field_name: String, span: Span },
    MissingField { struct_name: String, field_name: String, span: Span },
    UnknownField { struct_name: String, field_name: String, available: Vec<String>, span: Span },
    UnknownVariant { name: String, span: Span },
    VariantArityMismatch { name: String, expected: usize, found: usize, span: Span },
    NonExhaustiveMatch { scrutinee_type: String, witness: String, span: Span },
    UnreachableArm { span: Span, is_wildcard: bool },
    UnusedValue { ty: Ty, span: Span },
    TopLevelOnly { what: &'static str, span: Span },
    InvalidPropagation { span: Span },
    AssertConditionNotBool { found: Ty, span: Span },
    InternalRecoveryLimit { span: Span },
}

impl TypeError {
    pub fn span(&self) -> Span {
        match self {
            TypeError::Mismatch { origin, .. }
            | TypeError::InfiniteType { origin, .. }
            | TypeError::ArityMismatch { origin, .. } => origin.span().unwrap_or_else(|| Span::point(1, 1)),
            TypeError::UnboundVariable { span, .. }
            | TypeError::NotAFunction { span, .. }
            | TypeError::DuplicateField { span, .. }
            | TypeError::MissingField { span, .. }
            | TypeError::UnknownField { span, .. }
            | TypeError::UnknownVariant { span, .. }
            | TypeError::VariantArityMismatch { span, .. }
            | TypeError::NonExhaustiveMatch { span, .. }
            | TypeError::UnreachableArm { span, .. }
            | TypeError::UnusedValue { span, .. }
            | TypeError::TopLevelOnly { span, .. }
            | TypeError::InvalidPropagation { span }
            | TypeError::AssertConditionNotBool { span, .. }
            | TypeError::InternalRecoveryLimit { span } => *span,
        }
    }

    pub fn message(&self) -> String {
        match self {
            TypeError::Mismatch { expected, found, .. } => {
                format!("type mismatch: expected `{expected}`, found `{found}`")
            }
            TypeError::InfiniteType { ty, .. } => format!("infinite type: variable occurs in `{ty}`"),
            TypeError::ArityMismatch { expected, found, .. } => {
                format!("expected {expected} arguments, found {found}")
            }
            TypeError::UnboundVariable { name, suggestion, .. } => match suggestion {
                Some(s) => format!("unknown name `{name}`. Did you mean `{s}`?"),
                None => format!("unknown name `{name}`"),
            },
            TypeError::NotAFunction { ty, .. } => format!("`{ty}` is not callable"),
            TypeError::DuplicateField { struct_name, field_name, .. } => {
                format!("duplicate field `{field_name}` in initializer of `{struct_name}`")
            }
            TypeError::MissingField { struct_name, field_name, .. } => {
                format!("missing field `{field_name}` in initializer of `{struct_name}`")
            }
            TypeError::UnknownField { struct_name, field_name, available, .. } => {
                format!(
                    "unknown field `{field_name}` on `{struct_name}` (available: {})",
                    available.join(", ")
                )
            }
            TypeError::UnknownVariant { name, .. } => format!("unknown variant `{name}`"),
            TypeError::VariantArityMismatch { name, expected, found, .. } => {
                format!("variant `{name}` expects {expected} argument(s), found {found}")
            }
            TypeError::NonExhaustiveMatch { scrutinee_type, witness, .. } => {
                format!("non-exhaustive match on `{scrutinee_type}`: missing case `{witness}`")
            }
            TypeError::UnreachableArm { is_wildcard, .. } => {
                if *is_wildcard {
                    "else branch is unreachable".to_string()
                } else {
                    "unreachable pattern".to_string()
                }
            }
            TypeError::UnusedValue { ty, .. } => format!("expression of type `{ty}` must be consumed"),
            TypeError::TopLevelOnly { what, .. } => format!("`{what}` is only allowed at the top level"),
            TypeError::InvalidPropagation { .. } => {
                "propagation operator used outside a function that can fail".to_string()
            }
            TypeError::AssertConditionNotBool { found, .. } => {
                format!("assert condition must be `Bool`, found `{found}`")
            }
            TypeError::InternalRecoveryLimit { .. } => {
                "type checker internal error: exceeded recovery limit".to_string()
            }
        }
    }

    pub fn into_diagnostic(self) -> Diagnostic {
        let span = self.span();
        let code = self.code();
        let message = self.message();
        match self {
            TypeError::UnreachableArm { .. } => Diagnostic::warning(code, span, message),
            _ => Diagnostic::error(code, span, message),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            TypeError::Mismatch { .. } => "T0001",
            TypeError::InfiniteType { .. } => "T0002",
            TypeError::ArityMismatch { .. } => "T0003",
            TypeError::UnboundVariable { .. } => "T0004",
            TypeError::NotAFunction { .. } => "T0005",
            TypeError::DuplicateField { .. } => "T0006",
            TypeError::MissingField { .. } => "T0007",
            TypeError::UnknownField { .. } => "T0008",
            TypeError::UnknownVariant { .. } => "T0009",
            TypeError::VariantArityMismatch { .. } => "T0010",
            TypeError::NonExhaustiveMatch { .. } => "T0011",
            TypeError::UnreachableArm { .. } => "T0012",
            TypeError::UnusedValue { .. } => "T0013",
            TypeError::TopLevelOnly { .. } => "T0014",
            TypeError::InvalidPropagation { .. } => "T0015",
            TypeError::AssertConditionNotBool { .. } => "T0016",
            TypeError::InternalRecoveryLimit { .. } => "T0999",
        }
    }
}
