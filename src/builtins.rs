//! Built-in functions
//!
//! The same set of builtins is seeded into the outermost type-environment
//! layer and the outermost runtime scope. `print` and `str` are the only
//! points of ad-hoc polymorphism in the otherwise monomorphic type system,
//! so the checker special-cases calls to them (see
//! [`crate::types::check`]); the signatures recorded here matter when a
//! builtin is referenced as a plain value.

/// Identifies one of the native functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// Variadic; stringifies each argument, space-separated, trailing newline.
    Print,
    /// Reads one line from the line reader; optional prompt argument.
    Input,
    /// Stringifies a single value of any type.
    Str,
    /// Minimum of two or more integers.
    Min,
    /// Maximum of two or more integers.
    Max,
}

impl Builtin {
    pub const ALL: [Builtin; 5] = [
        Builtin::Print,
        Builtin::Input,
        Builtin::Str,
        Builtin::Min,
        Builtin::Max,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Input => "input",
            Builtin::Str => "str",
            Builtin::Min => "min",
            Builtin::Max => "max",
        }
    }
}
