//! Type environment: lexical scope stack plus the flat registries of
//! declared structs, enums, and functions.

use al_common::Span;
use rustc_hash::FxHashMap;

use crate::ty::{NominalId, Scheme, Ty, TyVar};

#[derive(Clone, Debug)]
pub struct StructInfo {
    pub id: NominalId,
    pub name: String,
    pub generics: Vec<String>,
    /// One placeholder `TyVar` per entry in `generics`, used to instantiate
    /// a fresh copy of `fields` at each use site (literal init, type
    /// annotation) via `InferCtx::fresh_substitution`.
    pub generic_vars: Vec<TyVar>,
    pub fields: Vec<(String, Ty)>,
    pub def_span: Span,
    pub doc: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EnumVariantInfo {
    pub name: String,
    pub payload: Vec<Ty>,
}

#[derive(Clone, Debug)]
pub struct EnumInfo {
    pub id: NominalId,
    pub name: String,
    pub generics: Vec<String>,
    pub generic_vars: Vec<TyVar>,
    pub variants: Vec<EnumVariantInfo>,
    pub def_span: Span,
    pub doc: Option<String>,
}

/// A point recorded in the type-position index, for editor hover.
#[derive(Clone, Debug)]
pub struct TypePosition {
    pub span: Span,
    pub name: String,
    pub ty: Ty,
    pub definition_span: Option<Span>,
    pub doc: Option<String>,
}

/// Lexical scopes plus the flat nominal-type/function registries. The
/// scope stack is pushed/popped in strict LIFO order alongside AST
/// traversal; `depth()` must be 1 once `check` finishes.
pub struct TypeEnv {
    scopes: Vec<FxHashMap<String, Scheme>>,
    def_locations: FxHashMap<String, Span>,
    docs: FxHashMap<String, String>,
    structs: FxHashMap<String, StructInfo>,
    enums: FxHashMap<String, EnumInfo>,
    /// Maps a variant name to the enum that declares it, for bare
    /// `Ok('hi')`-style construction without the `Enum.Variant` qualifier.
    variant_owners: FxHashMap<String, String>,
    next_nominal_id: NominalId,
    pub type_positions: Vec<TypePosition>,
}

impl TypeEnv {
    pub fn new() -> Self {
        TypeEnv {
            scopes: vec![FxHashMap::default()],
            def_locations: FxHashMap::default(),
            docs: FxHashMap::default(),
            structs: FxHashMap::default(),
            enums: FxHashMap::default(),
            variant_owners: FxHashMap::default(),
            next_nominal_id: 0,
            type_positions: Vec::new(),
        }
    }

    pub fn fresh_nominal_id(&mut self) -> NominalId {
        let id = self.next_nominal_id;
        self.next_nominal_id += 1;
        id
    }

    // ── Scopes ───────────────────────────────────────────────────────

    pub fn push_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn pop_scope(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the top-level scope");
        self.scopes.pop();
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn insert(&mut self, name: String, scheme: Scheme) {
        self.scopes.last_mut().expect("scope stack never empty").insert(name, scheme);
    }

    pub fn insert_with_def(&mut self, name: String, scheme: Scheme, def_span: Span, doc: Option<String>) {
        self.def_locations.insert(name.clone(), def_span);
        if let Some(d) = doc {
            self.docs.insert(name.clone(), d);
        }
        self.insert(name, scheme);
    }

    pub fn lookup(&self, name: &str) -> Option<&Scheme> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn def_location(&self, name: &str) -> Option<Span> {
        self.def_locations.get(name).copied()
    }

    pub fn doc_for(&self, name: &str) -> Option<String> {
        self.docs.get(name).cloned()
    }

    /// All names visible right now, innermost-first, for "did you mean"
    /// suggestions and name-resolution diagnostics.
    pub fn visible_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for scope in self.scopes.iter().rev() {
            names.extend(scope.keys().cloned());
        }
        names
    }

    // ── Nominal type registries ──────────────────────────────────────

    pub fn register_struct(&mut self, info: StructInfo) {
        self.structs.insert(info.name.clone(), info);
    }

    pub fn register_enum(&mut self, info: EnumInfo) {
        for variant in &info.variants {
            self.variant_owners.insert(variant.name.clone(), info.name.clone());
        }
        self.enums.insert(info.name.clone(), info);
    }

    pub fn lookup_struct(&self, name: &str) -> Option<&StructInfo> {
        self.structs.get(name)
    }

    pub fn lookup_enum(&self, name: &str) -> Option<&EnumInfo> {
        self.enums.get(name)
    }

    pub fn enum_owning_variant(&self, variant: &str) -> Option<&EnumInfo> {
        self.variant_owners.get(variant).and_then(|enum_name| self.enums.get(enum_name))
    }

    pub fn all_type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.structs.keys().cloned().collect();
        names.extend(self.enums.keys().cloned());
        names
    }
}

impl Default for TypeEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Ty;

    #[test]
    fn lookup_searches_outward() {
        let mut env = TypeEnv::new();
        env.insert("x".into(), Scheme::mono(Ty::Int));
        env.push_scope();
        assert!(env.lookup("x").is_some());
        env.insert("x".into(), Scheme::mono(Ty::String));
        assert_eq!(env.lookup("x").unwrap().ty, Ty::String);
        env.pop_scope();
        assert_eq!(env.lookup("x").unwrap().ty, Ty::Int);
    }

    #[test]
    #[should_panic(expected = "cannot pop the top-level scope")]
    fn pop_top_level_panics() {
        let mut env = TypeEnv::new();
        env.pop_scope();
    }

    #[test]
    fn nominal_ids_are_unique() {
        let mut env = TypeEnv::new();
        let a = env.fresh_nominal_id();
        let b = env.fresh_nominal_id();
        assert_ne!(a, b);
    }
}
