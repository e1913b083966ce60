//! Tree-walking evaluator
//!
//! Evaluates the core AST against a [`Scope`] (names to addresses) and a
//! [`Store`] (addresses to values). Every block is executed in two phases:
//!
//! 1. **Allocate** pre-scans the block's statements and installs a fresh
//!    address for every binding in a new frame, without running any
//!    initializer.
//! 2. **Evaluate** runs the statements in order, writing initializer
//!    results through the pre-allocated addresses. Closures built here
//!    capture an environment that already names every sibling, which is
//!    what makes mutually recursive functions work without back-patching.
//!
//! `break`/`continue`/`return` travel as a [`Signal`] in the result
//! channel rather than as values: loops absorb `Break`/`Continue`, calls
//! absorb `Return`, and anything escaping the top level is an internal
//! error (the type checker rules it out).

use std::io::{self, BufRead, Write};

use tracing::trace;

use crate::ast::{BinOpKind, UnaryOpKind};
use crate::builtins::Builtin;
use crate::core::{
    CoreAssign, CoreBinary, CoreBlock, CoreCall, CoreExpr, CoreIf, CoreStmt, CoreWhile,
};
use crate::error::Error;
use crate::span::Span;

use super::scope::Scope;
use super::store::Store;
use super::value::{Captured, Closure, Value};
use std::rc::Rc;

/// Guards against unbounded user recursion blowing the host stack.
const MAX_CALL_DEPTH: usize = 512;

/// Non-local control flow, carried in the error channel so `?` unwinds it
/// to the nearest loop or call frame. `Error` is the only variant that is
/// an actual failure.
#[derive(Debug)]
pub enum Signal {
    Break(Span),
    Continue(Span),
    Return(Value),
    Error(Error),
}

impl From<Error> for Signal {
    fn from(err: Error) -> Self {
        Signal::Error(err)
    }
}

type Eval<T> = Result<T, Signal>;

/// The line-reader collaborator behind the `input` builtin.
pub trait LineReader {
    /// Read one line, without its trailing newline. `None` on end of input.
    fn read_line(&mut self) -> io::Result<Option<String>>;
}

/// Reads lines from stdin; the reader used outside of tests.
pub struct StdinReader;

impl LineReader for StdinReader {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let n = io::stdin().lock().read_line(&mut line)?;
        if n == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }
}

pub struct Evaluator<'io> {
    scope: Scope,
    store: Store,
    out: &'io mut dyn Write,
    reader: &'io mut dyn LineReader,
    call_depth: usize,
    current_pos: Span,
}

impl<'io> Evaluator<'io> {
    /// A fresh session: builtins installed, empty store otherwise.
    pub fn new(out: &'io mut dyn Write, reader: &'io mut dyn LineReader) -> Self {
        let mut scope = Scope::new();
        let mut store = Store::new();
        super::install_builtins(&mut scope, &mut store);
        Self::with_state(scope, store, out, reader)
    }

    /// Resume from a persisted scope and store.
    pub fn with_state(
        scope: Scope,
        store: Store,
        out: &'io mut dyn Write,
        reader: &'io mut dyn LineReader,
    ) -> Self {
        Self {
            scope,
            store,
            out,
            reader,
            call_depth: 0,
            current_pos: Span::start(),
        }
    }

    /// The persisted state after a successful run.
    pub fn into_state(self) -> (Scope, Store) {
        (self.scope, self.store)
    }

    /// Execute a program block in the current global frame, so that its
    /// bindings persist for subsequent REPL inputs.
    pub fn eval_program(&mut self, program: &CoreBlock) -> Result<Value, Error> {
        self.allocate(&program.statements);
        match self.eval_stmts(&program.statements) {
            Ok(value) => Ok(value),
            Err(Signal::Error(err)) => Err(err),
            Err(Signal::Return(_)) => Err(Error::internal(
                "return escaped to the top level",
                self.current_pos,
            )),
            Err(Signal::Break(span)) | Err(Signal::Continue(span)) => Err(Error::internal(
                "loop control escaped to the top level",
                span,
            )),
        }
    }

    /// Phase 1: give every binding of this block an address before any
    /// initializer runs.
    fn allocate(&mut self, statements: &[CoreStmt]) {
        for stmt in statements {
            if let CoreStmt::Let(decl) = stmt {
                let addr = self.store.alloc(Value::Unit);
                self.scope.insert(decl.name.clone(), addr);
            }
        }
    }

    /// Phase 2: run the statements; the result is the trailing
    /// expression's value, or unit.
    fn eval_stmts(&mut self, statements: &[CoreStmt]) -> Eval<Value> {
        let mut last = Value::Unit;

        for stmt in statements {
            match stmt {
                CoreStmt::Let(decl) => {
                    let value = self.eval_expr(&decl.init)?;
                    let addr = self.scope.resolve(&decl.name).ok_or_else(|| {
                        Error::internal(
                            format!("no address for binding '{}'", decl.name),
                            decl.span,
                        )
                    })?;
                    self.store.set(addr, value);
                    last = Value::Unit;
                }
                CoreStmt::Expr(expr) => {
                    last = self.eval_expr(expr)?;
                }
                CoreStmt::Break(span) => return Err(Signal::Break(*span)),
                CoreStmt::Continue(span) => return Err(Signal::Continue(*span)),
                CoreStmt::Return(ret) => {
                    let value = match &ret.value {
                        Some(expr) => self.eval_expr(expr)?,
                        None => Value::Unit,
                    };
                    return Err(Signal::Return(value));
                }
            }
        }

        Ok(last)
    }

    /// A nested block: its own frame, both phases, frame popped even when
    /// a signal unwinds through.
    fn eval_block(&mut self, block: &CoreBlock) -> Eval<Value> {
        self.scope.enter();
        self.allocate(&block.statements);
        let result = self.eval_stmts(&block.statements);
        self.scope.leave();
        result
    }

    fn eval_expr(&mut self, expr: &CoreExpr) -> Eval<Value> {
        self.current_pos = expr.span();
        match expr {
            CoreExpr::Int(lit) => Ok(Value::Int(lit.value)),
            CoreExpr::Str(lit) => Ok(Value::Str(lit.value.clone())),
            CoreExpr::Bool(lit) => Ok(Value::Bool(lit.value)),

            CoreExpr::Var(var) => {
                let addr = self.scope.resolve(&var.name).ok_or_else(|| {
                    Error::internal(format!("unbound name '{}'", var.name), var.span)
                })?;
                let value = self.store.get(addr).ok_or_else(|| {
                    Error::internal(format!("dangling address for '{}'", var.name), var.span)
                })?;
                Ok(value.clone())
            }

            CoreExpr::Unary(unary) => {
                let operand = self.eval_expr(&unary.operand)?;
                match (unary.op, operand) {
                    (UnaryOpKind::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                    (UnaryOpKind::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (_, other) => Err(Signal::Error(Error::internal(
                        format!("unary operator applied to {}", other.type_name()),
                        unary.span,
                    ))),
                }
            }

            CoreExpr::Binary(binary) => self.eval_binary(binary),
            CoreExpr::Call(call) => self.eval_call(call),

            CoreExpr::Lambda(lambda) => Ok(Value::Closure(Rc::new(Closure {
                params: lambda.params.clone(),
                body: lambda.body.clone(),
                env: self.scope.capture(),
            }))),

            CoreExpr::Block(block) => self.eval_block(block),
            CoreExpr::If(if_expr) => self.eval_if(if_expr),
            CoreExpr::While(while_expr) => self.eval_while(while_expr),
            CoreExpr::Assign(assign) => self.eval_assign(assign),
        }
    }

    fn eval_binary(&mut self, binary: &CoreBinary) -> Eval<Value> {
        use BinOpKind::*;

        // Logical operators short-circuit; everything else evaluates both
        // sides left to right.
        match binary.op {
            And => {
                return match self.eval_bool(&binary.left)? {
                    false => Ok(Value::Bool(false)),
                    true => Ok(Value::Bool(self.eval_bool(&binary.right)?)),
                };
            }
            Or => {
                return match self.eval_bool(&binary.left)? {
                    true => Ok(Value::Bool(true)),
                    false => Ok(Value::Bool(self.eval_bool(&binary.right)?)),
                };
            }
            _ => {}
        }

        let left = self.eval_expr(&binary.left)?;
        let right = self.eval_expr(&binary.right)?;

        match binary.op {
            Add => match (left, right) {
                (Value::Int(a), Value::Int(b)) => Ok(Value::Int(a.wrapping_add(b))),
                (Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
                (a, b) => Err(self.operand_error("+", &a, &b, binary.span)),
            },
            Sub | Mul | Div | Rem => {
                let (a, b) = match (left, right) {
                    (Value::Int(a), Value::Int(b)) => (a, b),
                    (a, b) => return Err(self.operand_error(binary.op.symbol(), &a, &b, binary.span)),
                };
                match binary.op {
                    Sub => Ok(Value::Int(a.wrapping_sub(b))),
                    Mul => Ok(Value::Int(a.wrapping_mul(b))),
                    Div => {
                        if b == 0 {
                            return Err(Signal::Error(Error::runtime(
                                "division by zero",
                                binary.span,
                            )));
                        }
                        Ok(Value::Int(a.wrapping_div(b)))
                    }
                    Rem => {
                        if b == 0 {
                            return Err(Signal::Error(Error::runtime(
                                "division by zero",
                                binary.span,
                            )));
                        }
                        // Mathematical modulo: the result follows the sign
                        // of the divisor.
                        Ok(Value::Int(a.wrapping_rem(b).wrapping_add(b).wrapping_rem(b)))
                    }
                    _ => unreachable!(),
                }
            }
            Eq => Ok(Value::Bool(left.equals(&right))),
            NotEq => Ok(Value::Bool(!left.equals(&right))),
            Lt | LtEq | Gt | GtEq => {
                let (a, b) = match (left, right) {
                    (Value::Int(a), Value::Int(b)) => (a, b),
                    (a, b) => return Err(self.operand_error(binary.op.symbol(), &a, &b, binary.span)),
                };
                let result = match binary.op {
                    Lt => a < b,
                    LtEq => a <= b,
                    Gt => a > b,
                    GtEq => a >= b,
                    _ => unreachable!(),
                };
                Ok(Value::Bool(result))
            }
            And | Or => unreachable!("handled above"),
        }
    }

    fn operand_error(&self, op: &str, left: &Value, right: &Value, span: Span) -> Signal {
        Signal::Error(Error::internal(
            format!(
                "operator '{op}' applied to {} and {}",
                left.type_name(),
                right.type_name()
            ),
            span,
        ))
    }

    fn eval_bool(&mut self, expr: &CoreExpr) -> Eval<bool> {
        match self.eval_expr(expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(Signal::Error(Error::internal(
                format!("expected Bool, got {}", other.type_name()),
                expr.span(),
            ))),
        }
    }

    fn eval_if(&mut self, if_expr: &CoreIf) -> Eval<Value> {
        if self.eval_bool(&if_expr.cond)? {
            self.eval_expr(&if_expr.then_branch)
        } else {
            match &if_expr.else_branch {
                Some(else_branch) => self.eval_expr(else_branch),
                None => Ok(Value::Unit),
            }
        }
    }

    fn eval_while(&mut self, while_expr: &CoreWhile) -> Eval<Value> {
        while self.eval_bool(&while_expr.cond)? {
            match self.eval_block(&while_expr.body) {
                Ok(_) => {}
                Err(Signal::Break(_)) => break,
                Err(Signal::Continue(_)) => continue,
                Err(signal) => return Err(signal),
            }
        }
        Ok(Value::Unit)
    }

    fn eval_assign(&mut self, assign: &CoreAssign) -> Eval<Value> {
        let value = self.eval_expr(&assign.value)?;
        let addr = self.scope.resolve(&assign.name).ok_or_else(|| {
            Error::internal(format!("unbound name '{}'", assign.name), assign.span)
        })?;
        self.store.set(addr, value);
        Ok(Value::Unit)
    }

    fn eval_call(&mut self, call: &CoreCall) -> Eval<Value> {
        let callee = self.eval_expr(&call.callee)?;

        // Arguments evaluate left to right in the caller's environment.
        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.eval_expr(arg)?);
        }

        match callee {
            Value::Closure(closure) => self.call_closure(&closure, args, call.span),
            Value::Builtin(builtin) => self.call_builtin(builtin, args, call.span),
            other => Err(Signal::Error(Error::internal(
                format!("cannot call {}", other.type_name()),
                call.span,
            ))),
        }
    }

    fn call_closure(&mut self, closure: &Closure, args: Vec<Value>, span: Span) -> Eval<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(Signal::Error(Error::runtime(
                "recursion limit exceeded",
                span,
            )));
        }
        self.call_depth += 1;
        trace!(depth = self.call_depth, "calling closure");

        // The defining environment comes back as a frame; defaults for
        // unsupplied trailing parameters are evaluated in it, once per
        // call, before the parameter frame exists.
        self.scope.push_captured(&closure.env);
        let result = self.run_call(closure, args, span);
        self.scope.leave();
        self.call_depth -= 1;

        match result {
            Err(Signal::Return(value)) => Ok(value),
            other => other,
        }
    }

    fn run_call(&mut self, closure: &Closure, mut args: Vec<Value>, span: Span) -> Eval<Value> {
        for param in closure.params.iter().skip(args.len()) {
            let default = param.default.as_ref().ok_or_else(|| {
                Error::internal(format!("missing argument for '{}'", param.name), span)
            })?;
            let value = self.eval_expr(default)?;
            args.push(value);
        }
        if args.len() != closure.params.len() {
            return Err(Signal::Error(Error::internal(
                "argument count mismatch after defaults",
                span,
            )));
        }

        self.scope.enter();
        for (param, value) in closure.params.iter().zip(args) {
            let addr = self.store.alloc(value);
            self.scope.insert(param.name.clone(), addr);
        }
        let result = self.eval_block(&closure.body);
        self.scope.leave();
        result
    }

    fn call_builtin(&mut self, builtin: Builtin, args: Vec<Value>, span: Span) -> Eval<Value> {
        match builtin {
            Builtin::Print => {
                let line = args
                    .iter()
                    .map(Value::stringify)
                    .collect::<Vec<_>>()
                    .join(" ");
                writeln!(self.out, "{line}")
                    .map_err(|e| Error::runtime(format!("io error: {e}"), span))?;
                Ok(Value::Unit)
            }
            Builtin::Str => {
                let arg = args.into_iter().next().ok_or_else(|| {
                    Error::internal("str called without an argument", span)
                })?;
                Ok(Value::Str(arg.stringify()))
            }
            Builtin::Min | Builtin::Max => {
                let mut ints = Vec::with_capacity(args.len());
                for arg in &args {
                    match arg {
                        Value::Int(n) => ints.push(*n),
                        other => {
                            return Err(Signal::Error(Error::internal(
                                format!("{} applied to {}", builtin.name(), other.type_name()),
                                span,
                            )));
                        }
                    }
                }
                let result = match builtin {
                    Builtin::Min => ints.into_iter().min(),
                    _ => ints.into_iter().max(),
                };
                let result = result.ok_or_else(|| {
                    Error::internal(format!("{} called without arguments", builtin.name()), span)
                })?;
                Ok(Value::Int(result))
            }
            Builtin::Input => {
                if let Some(prompt) = args.first() {
                    write!(self.out, "{}", prompt.stringify())
                        .and_then(|_| self.out.flush())
                        .map_err(|e| Error::runtime(format!("io error: {e}"), span))?;
                }
                let line = self
                    .reader
                    .read_line()
                    .map_err(|e| Error::runtime(format!("io error: {e}"), span))?;
                match line {
                    Some(line) => Ok(Value::Str(line)),
                    None => Err(Signal::Error(Error::runtime("end of input", span))),
                }
            }
        }
    }
}
