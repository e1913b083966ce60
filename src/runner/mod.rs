//! Pipeline orchestration
//!
//! Wires the stages together — lex → parse → desugar → typecheck → eval —
//! and converts whatever structured error escapes a stage into the
//! [`PipelineResult::Failure`] string that is the only externally visible
//! outcome of a run.
//!
//! The incremental entry point threads a [`SessionState`] through: the
//! persisted type environment (plus its type-variable counter), the runtime
//! scope, and the store. It computes candidate next-states on clones and
//! returns them only when *both* the type check and the evaluation succeed,
//! so a failed input can never leave half-typed bindings behind.

pub mod repl;

use std::io::{self, Write};
use std::path::Path;

use tracing::debug;

use crate::core::CoreBlock;
use crate::desugar::desugar_program;
use crate::error::Error;
use crate::interpreter::{Evaluator, LineReader, Scope, StdinReader, Store, Value};
use crate::lexer;
use crate::parser;
use crate::types::{Checker, Type, TypeEnv};

/// The boundary value of every runner entry point.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineResult<T> {
    Success(T),
    Failure(String),
}

impl<T> PipelineResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineResult::Success(_))
    }

    pub fn into_result(self) -> Result<T, String> {
        match self {
            PipelineResult::Success(value) => Ok(value),
            PipelineResult::Failure(message) => Err(message),
        }
    }
}

impl<T> From<Result<T, Error>> for PipelineResult<T> {
    fn from(result: Result<T, Error>) -> Self {
        match result {
            Ok(value) => PipelineResult::Success(value),
            Err(err) => PipelineResult::Failure(err.to_string()),
        }
    }
}

/// Everything the REPL carries between inputs.
pub struct SessionState {
    pub types: TypeEnv,
    pub ty_counter: usize,
    pub scope: Scope,
    pub store: Store,
}

impl SessionState {
    /// A fresh session: builtins seeded on both the type and runtime side.
    pub fn new() -> Self {
        let mut ty_counter = 0;
        let types = TypeEnv::new(&mut ty_counter);
        let mut scope = Scope::new();
        let mut store = Store::new();
        crate::interpreter::install_builtins(&mut scope, &mut store);
        Self {
            types,
            ty_counter,
            scope,
            store,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// The syntactic front half of the pipeline: lex → parse → desugar.
pub fn compile(source: &str) -> Result<CoreBlock, Error> {
    let tokens = lexer::lex(source)?;
    debug!(tokens = tokens.len(), "lexed");
    let program = parser::parse(tokens)?;
    debug!(statements = program.statements.len(), "parsed");
    Ok(desugar_program(program))
}

/// Run the pipeline through the type checker only.
pub fn run_typecheck(source: &str) -> PipelineResult<Type> {
    fn inner(source: &str) -> Result<Type, Error> {
        let program = compile(source)?;
        let mut checker = Checker::new();
        let ty = checker.check_program(&program)?;
        debug!(%ty, "typechecked");
        Ok(ty)
    }
    inner(source).into()
}

/// Run the whole pipeline once against a fresh session.
pub fn run_eval(
    source: &str,
    out: &mut dyn Write,
    reader: &mut dyn LineReader,
) -> PipelineResult<Value> {
    let state = SessionState::new();
    match run_eval_incremental(&state, source, out, reader) {
        Ok((value, _)) => PipelineResult::Success(value),
        Err(err) => PipelineResult::Failure(err.to_string()),
    }
}

/// Run one input against persisted state. On success the value and the
/// candidate next-state are returned together; the caller decides when to
/// swap them in. On failure nothing of `state` has been touched.
pub fn run_eval_incremental(
    state: &SessionState,
    source: &str,
    out: &mut dyn Write,
    reader: &mut dyn LineReader,
) -> Result<(Value, SessionState), Error> {
    let program = compile(source)?;

    let mut checker = Checker::with_state(state.types.clone(), state.ty_counter);
    checker.check_program(&program)?;
    let (types, ty_counter) = checker.into_state();

    let mut evaluator =
        Evaluator::with_state(state.scope.clone(), state.store.clone(), out, reader);
    let value = evaluator.eval_program(&program)?;
    let (scope, store) = evaluator.into_state();
    debug!(store_cells = store.len(), "evaluated");

    Ok((
        value,
        SessionState {
            types,
            ty_counter,
            scope,
            store,
        },
    ))
}

/// File-mode execution of an in-memory source string: the whole pipeline
/// against a fresh session, wired to real stdio. Embedders and tests use
/// this to get `run_file` semantics without touching the filesystem.
pub fn run_source(source: &str) -> PipelineResult<Value> {
    let mut out = io::stdout();
    let mut reader = StdinReader;
    run_eval(source, &mut out, &mut reader)
}

/// Execute a source file.
pub fn run_file(path: &Path) -> PipelineResult<Value> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) => {
            return PipelineResult::Failure(format!("IoError: {}: {err}", path.display()));
        }
    };
    let source = match String::from_utf8(bytes) {
        Ok(source) => source,
        Err(_) => {
            return PipelineResult::Failure(
                Error::lex("source is not valid UTF-8", crate::span::Span::start()).to_string(),
            );
        }
    };

    run_source(&source)
}
