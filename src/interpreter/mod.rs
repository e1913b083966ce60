//! Evaluator: core AST to values
//!
//! The runtime splits state in two: the [`Scope`] maps names to addresses
//! and the [`Store`] maps addresses to values. Closures hold addresses, the
//! store holds values, and the store outlives every closure — which is how
//! mutually recursive closures avoid cyclic ownership.

mod eval;
mod scope;
mod store;
mod value;

pub use eval::{Evaluator, LineReader, StdinReader};
pub use scope::Scope;
pub use store::{Addr, Store};
pub use value::{Captured, Closure, Value};

use crate::builtins::Builtin;

/// Seed the builtins into the outermost runtime frame.
pub fn install_builtins(scope: &mut Scope, store: &mut Store) {
    for builtin in Builtin::ALL {
        let addr = store.alloc(Value::Builtin(builtin));
        scope.insert(builtin.name(), addr);
    }
}
