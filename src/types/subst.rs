//! Type substitutions
//!
//! A substitution maps type-variable ids to types. The checker maintains a
//! single global substitution, extending it as unification binds variables.
//! Because bindings can chain (`'t0 := 't1`, then `'t1 := Int`), applying a
//! substitution chases through variables recursively; the occurs check at
//! bind time guarantees the chase terminates.

use std::collections::HashMap;

use super::ty::{FunType, Type, TypeVar};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Substitution {
    map: HashMap<TypeVar, Type>,
}

impl Substitution {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Record `var := ty`. The caller is responsible for the occurs check.
    pub fn bind(&mut self, var: TypeVar, ty: Type) {
        self.map.insert(var, ty);
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Fully resolve a type: replace every bound variable with its mapping,
    /// recursively.
    pub fn apply(&self, ty: &Type) -> Type {
        match ty {
            Type::Int | Type::Bool | Type::String | Type::Unit => ty.clone(),
            Type::Var(v) => match self.map.get(v) {
                Some(bound) => self.apply(bound),
                None => ty.clone(),
            },
            Type::Fun(fun) => Type::Fun(FunType {
                params: fun.params.iter().map(|p| self.apply(p)).collect(),
                required: fun.required,
                variadic: fun.variadic.as_ref().map(|t| Box::new(self.apply(t))),
                ret: Box::new(self.apply(&fun.ret)),
            }),
        }
    }
}
