//! Type environment
//!
//! A stack of scope layers mapping names to bindings. Lookup walks layers
//! innermost first; the outermost layer holds the builtins and, above it,
//! the top-level user layer that the REPL keeps alive across inputs.
//! Besides the type, a binding records whether assignment to it is legal
//! and whether it is one of the specially-typed builtins.

use std::collections::HashMap;

use crate::builtins::Builtin;

use super::subst::Substitution;
use super::ty::{FunType, Type, TypeVar};

/// What the checker knows about one name in scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub ty: Type,
    pub mutable: bool,
    /// Set for the seeded builtins; calls to them are special-cased.
    pub builtin: Option<Builtin>,
}

impl Binding {
    pub fn immutable(ty: Type) -> Self {
        Self {
            ty,
            mutable: false,
            builtin: None,
        }
    }

    pub fn mutable(ty: Type) -> Self {
        Self {
            ty,
            mutable: true,
            builtin: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEnv {
    frames: Vec<HashMap<String, Binding>>,
}

impl TypeEnv {
    /// An environment with the builtins in the outermost layer and an empty
    /// top-level user layer. `next_var` supplies ids for the type variables
    /// in the polymorphic builtin signatures.
    pub fn new(next_var: &mut usize) -> Self {
        let mut fresh = || {
            let id = *next_var;
            *next_var += 1;
            Type::Var(TypeVar::new(id))
        };

        let mut builtins = HashMap::new();
        for b in Builtin::ALL {
            let ty = match b {
                Builtin::Print => Type::Fun(FunType {
                    params: vec![],
                    required: 0,
                    variadic: Some(Box::new(fresh())),
                    ret: Box::new(Type::Unit),
                }),
                Builtin::Input => Type::Fun(FunType {
                    params: vec![Type::String],
                    required: 0,
                    variadic: None,
                    ret: Box::new(Type::String),
                }),
                Builtin::Str => Type::fun(vec![fresh()], Type::String),
                Builtin::Min | Builtin::Max => Type::Fun(FunType {
                    params: vec![Type::Int, Type::Int],
                    required: 2,
                    variadic: Some(Box::new(Type::Int)),
                    ret: Box::new(Type::Int),
                }),
            };
            builtins.insert(
                b.name().to_string(),
                Binding {
                    ty,
                    mutable: false,
                    builtin: Some(b),
                },
            );
        }

        Self {
            frames: vec![builtins, HashMap::new()],
        }
    }

    pub fn enter(&mut self) {
        self.frames.push(HashMap::new());
    }

    pub fn leave(&mut self) {
        debug_assert!(self.frames.len() > 2, "cannot pop the top-level layer");
        self.frames.pop();
    }

    /// Bind a name in the innermost layer, shadowing any outer binding.
    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) {
        self.frames
            .last_mut()
            .expect("type environment always has a frame")
            .insert(name.into(), binding);
    }

    /// Innermost-first lookup.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.frames.iter().rev().find_map(|frame| frame.get(name))
    }

    /// Resolve every binding through the substitution. Used when persisting
    /// the environment at the end of a successful pipeline run.
    pub fn resolved(&self, subst: &Substitution) -> TypeEnv {
        TypeEnv {
            frames: self
                .frames
                .iter()
                .map(|frame| {
                    frame
                        .iter()
                        .map(|(name, binding)| {
                            (
                                name.clone(),
                                Binding {
                                    ty: subst.apply(&binding.ty),
                                    mutable: binding.mutable,
                                    builtin: binding.builtin,
                                },
                            )
                        })
                        .collect()
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_seeded() {
        let mut counter = 0;
        let env = TypeEnv::new(&mut counter);
        assert!(env.lookup("print").is_some());
        assert_eq!(env.lookup("min").unwrap().builtin, Some(Builtin::Min));
        assert!(counter > 0);
    }

    #[test]
    fn test_inner_layer_shadows() {
        let mut counter = 0;
        let mut env = TypeEnv::new(&mut counter);
        env.insert("x", Binding::immutable(Type::Int));
        env.enter();
        env.insert("x", Binding::mutable(Type::String));
        assert_eq!(env.lookup("x").unwrap().ty, Type::String);
        assert!(env.lookup("x").unwrap().mutable);
        env.leave();
        assert_eq!(env.lookup("x").unwrap().ty, Type::Int);
    }

    #[test]
    fn test_resolved_applies_substitution() {
        let mut counter = 0;
        let mut env = TypeEnv::new(&mut counter);
        let var = TypeVar::new(counter);
        env.insert("x", Binding::immutable(Type::Var(var)));

        let mut subst = Substitution::empty();
        subst.bind(var, Type::Int);
        assert_eq!(env.resolved(&subst).lookup("x").unwrap().ty, Type::Int);
    }
}
