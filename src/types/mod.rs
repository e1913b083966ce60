pub mod check;
pub mod env;
pub mod subst;
pub mod ty;
pub mod unify;

pub use check::Checker;
pub use env::{Binding, TypeEnv};
pub use subst::Substitution;
pub use ty::{FunType, Type, TypeVar};
