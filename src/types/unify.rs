//! Unification
//!
//! Standard first-order unification against the checker's global
//! substitution. Both sides are resolved through the substitution before
//! matching, so callers never need to pre-apply it. Binding a variable runs
//! the occurs check first; function types unify parameter-wise and
//! result-wise, with variadic tails absorbing extra parameters of the
//! other side.

use std::fmt;

use super::subst::Substitution;
use super::ty::{Type, TypeVar};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnifyError {
    Mismatch { expected: Type, found: Type },
    OccursCheck { var: TypeVar, ty: Type },
    Arity { expected: usize, found: usize },
}

impl fmt::Display for UnifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnifyError::Mismatch { expected, found } => {
                write!(f, "expected {}, got {}", expected.pretty(), found.pretty())
            }
            UnifyError::OccursCheck { var, ty } => write!(
                f,
                "cannot construct infinite type 't{} = {}",
                var.id,
                ty.pretty()
            ),
            UnifyError::Arity { expected, found } => write!(
                f,
                "expected function of {expected} parameters, got {found}"
            ),
        }
    }
}

/// Unify `t1` (the expected side) with `t2`, extending `subst`.
pub fn unify(subst: &mut Substitution, t1: &Type, t2: &Type) -> Result<(), UnifyError> {
    let t1 = subst.apply(t1);
    let t2 = subst.apply(t2);

    match (&t1, &t2) {
        (Type::Int, Type::Int)
        | (Type::Bool, Type::Bool)
        | (Type::String, Type::String)
        | (Type::Unit, Type::Unit) => Ok(()),

        (Type::Var(v1), Type::Var(v2)) if v1 == v2 => Ok(()),
        (Type::Var(v), other) | (other, Type::Var(v)) => {
            if occurs_in(*v, other) {
                Err(UnifyError::OccursCheck {
                    var: *v,
                    ty: other.clone(),
                })
            } else {
                subst.bind(*v, other.clone());
                Ok(())
            }
        }

        (Type::Fun(f1), Type::Fun(f2)) => {
            // Pair up fixed parameters; a variadic tail on one side absorbs
            // the other side's extras.
            let fixed = f1.params.len().min(f2.params.len());
            for (p1, p2) in f1.params.iter().zip(f2.params.iter()) {
                unify(subst, p1, p2)?;
            }
            if f1.params.len() > fixed {
                match &f2.variadic {
                    Some(tail) => {
                        for p in &f1.params[fixed..] {
                            unify(subst, p, tail)?;
                        }
                    }
                    None => {
                        return Err(UnifyError::Arity {
                            expected: f1.params.len(),
                            found: f2.params.len(),
                        });
                    }
                }
            }
            if f2.params.len() > fixed {
                match &f1.variadic {
                    Some(tail) => {
                        for p in &f2.params[fixed..] {
                            unify(subst, tail, p)?;
                        }
                    }
                    None => {
                        return Err(UnifyError::Arity {
                            expected: f1.params.len(),
                            found: f2.params.len(),
                        });
                    }
                }
            }
            if let (Some(t1), Some(t2)) = (&f1.variadic, &f2.variadic) {
                unify(subst, t1, t2)?;
            }
            unify(subst, &f1.ret, &f2.ret)
        }

        _ => Err(UnifyError::Mismatch {
            expected: t1.clone(),
            found: t2.clone(),
        }),
    }
}

fn occurs_in(var: TypeVar, ty: &Type) -> bool {
    match ty {
        Type::Int | Type::Bool | Type::String | Type::Unit => false,
        Type::Var(v) => *v == var,
        Type::Fun(fun) => {
            fun.params.iter().any(|p| occurs_in(var, p))
                || fun.variadic.as_deref().is_some_and(|t| occurs_in(var, t))
                || occurs_in(var, &fun.ret)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var(id: usize) -> Type {
        Type::Var(TypeVar::new(id))
    }

    #[test]
    fn test_unify_identical_concrete() {
        let mut subst = Substitution::empty();
        assert_eq!(unify(&mut subst, &Type::Int, &Type::Int), Ok(()));
        assert!(subst.is_empty());
    }

    #[test]
    fn test_unify_var_with_concrete() {
        let mut subst = Substitution::empty();
        unify(&mut subst, &var(0), &Type::Bool).unwrap();
        assert_eq!(subst.apply(&var(0)), Type::Bool);
    }

    #[test]
    fn test_unify_through_existing_bindings() {
        let mut subst = Substitution::empty();
        unify(&mut subst, &var(0), &var(1)).unwrap();
        unify(&mut subst, &var(1), &Type::String).unwrap();
        assert_eq!(subst.apply(&var(0)), Type::String);
    }

    #[test]
    fn test_unify_mismatch() {
        let mut subst = Substitution::empty();
        assert!(matches!(
            unify(&mut subst, &Type::Int, &Type::String),
            Err(UnifyError::Mismatch { .. })
        ));
    }

    #[test]
    fn test_occurs_check() {
        let mut subst = Substitution::empty();
        let fun = Type::fun(vec![var(0)], Type::Int);
        assert!(matches!(
            unify(&mut subst, &var(0), &fun),
            Err(UnifyError::OccursCheck { .. })
        ));
    }

    #[test]
    fn test_unify_functions_parameter_wise() {
        let mut subst = Substitution::empty();
        let f1 = Type::fun(vec![var(0), Type::Int], var(1));
        let f2 = Type::fun(vec![Type::String, Type::Int], Type::Bool);
        unify(&mut subst, &f1, &f2).unwrap();
        assert_eq!(subst.apply(&var(0)), Type::String);
        assert_eq!(subst.apply(&var(1)), Type::Bool);
    }

    #[test]
    fn test_unify_function_arity_mismatch() {
        let mut subst = Substitution::empty();
        let f1 = Type::fun(vec![Type::Int], Type::Int);
        let f2 = Type::fun(vec![Type::Int, Type::Int], Type::Int);
        assert!(matches!(
            unify(&mut subst, &f1, &f2),
            Err(UnifyError::Arity { .. })
        ));
    }

    #[test]
    fn test_unify_variadic_absorbs_extras() {
        use crate::types::ty::FunType;
        let mut subst = Substitution::empty();
        let variadic = Type::Fun(FunType {
            params: vec![Type::Int, Type::Int],
            required: 2,
            variadic: Some(Box::new(Type::Int)),
            ret: Box::new(Type::Int),
        });
        let call_shape = Type::fun(vec![Type::Int, Type::Int, var(0), Type::Int], var(1));
        unify(&mut subst, &variadic, &call_shape).unwrap();
        assert_eq!(subst.apply(&var(0)), Type::Int);
        assert_eq!(subst.apply(&var(1)), Type::Int);
    }

    #[test]
    fn test_unify_order_independent_result() {
        // Solving the same constraints in either order resolves the
        // variables to the same ground types.
        let constraints = [
            (var(0), Type::fun(vec![var(1)], var(2))),
            (var(1), Type::Int),
            (var(2), Type::Bool),
        ];

        let mut forward = Substitution::empty();
        for (a, b) in &constraints {
            unify(&mut forward, a, b).unwrap();
        }
        let mut backward = Substitution::empty();
        for (a, b) in constraints.iter().rev() {
            unify(&mut backward, a, b).unwrap();
        }

        assert_eq!(forward.apply(&var(0)), backward.apply(&var(0)));
        assert_eq!(forward.apply(&var(0)), Type::fun(vec![Type::Int], Type::Bool));
    }
}
