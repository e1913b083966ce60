//! Type checker
//!
//! Monomorphic Hindley-Milner-style inference over the core AST, driven by
//! a single [`Checker`] context that owns the global substitution, the type
//! environment, the fresh-variable counter, and the lexical bookkeeping
//! (loop depth, enclosing function return types).
//!
//! Every block is checked in two phases:
//!
//! 1. **Discovery** walks the block's statements and binds each declared
//!    name — to its annotated type, to a function type of fresh variables
//!    (for bindings whose initializer is a lambda), or to a fresh variable.
//!    Bodies and initializers are not examined.
//! 2. **Validation** walks the block again, inferring and unifying. Because
//!    every sibling name is already bound, mutual recursion and forward
//!    references need no declarations.
//!
//! The REPL persists the type environment and the fresh-variable counter
//! between inputs; [`Checker::with_state`] resumes from them and
//! [`Checker::into_state`] hands back the environment with the final
//! substitution applied.

use crate::builtins::Builtin;
use crate::core::{
    CoreBinary, CoreBlock, CoreCall, CoreExpr, CoreLambda, CoreStmt,
};
use crate::ast::{BinOpKind, UnaryOpKind};
use crate::error::{Error, Result};
use crate::span::Span;

use super::env::{Binding, TypeEnv};
use super::subst::Substitution;
use super::ty::{FunType, Type, TypeVar};
use super::unify::unify;

pub struct Checker {
    env: TypeEnv,
    subst: Substitution,
    next_var: usize,
    loop_depth: usize,
    fn_ret: Vec<Type>,
}

impl Checker {
    /// A checker over a fresh environment (builtins only).
    pub fn new() -> Self {
        let mut next_var = 0;
        let env = TypeEnv::new(&mut next_var);
        Self {
            env,
            subst: Substitution::empty(),
            next_var,
            loop_depth: 0,
            fn_ret: Vec::new(),
        }
    }

    /// Resume from a persisted environment and variable counter.
    pub fn with_state(env: TypeEnv, next_var: usize) -> Self {
        Self {
            env,
            subst: Substitution::empty(),
            next_var,
            loop_depth: 0,
            fn_ret: Vec::new(),
        }
    }

    /// The persisted state after a successful run: the environment with the
    /// final substitution applied, and the variable counter.
    pub fn into_state(self) -> (TypeEnv, usize) {
        (self.env.resolved(&self.subst), self.next_var)
    }

    /// Check a program block in the current top-level layer, so that its
    /// bindings persist for subsequent REPL inputs. Returns the block's
    /// (fully resolved) type.
    pub fn check_program(&mut self, program: &CoreBlock) -> Result<Type> {
        self.declare(&program.statements);
        let ty = self.check_stmts(&program.statements)?;
        Ok(self.subst.apply(&ty))
    }

    fn fresh(&mut self) -> Type {
        let id = self.next_var;
        self.next_var += 1;
        Type::Var(TypeVar::new(id))
    }

    fn unify_at(&mut self, expected: &Type, found: &Type, span: Span) -> Result<()> {
        unify(&mut self.subst, expected, found)
            .map_err(|e| Error::type_error(e.to_string(), span))
    }

    /// Phase 1: bind every name declared at this level without looking at
    /// initializers or bodies.
    fn declare(&mut self, statements: &[CoreStmt]) {
        for stmt in statements {
            let CoreStmt::Let(decl) = stmt else { continue };

            let ty = match (&decl.annotation, decl.init.as_ref()) {
                (Some(annotation), _) => Type::from_annotation(annotation),
                (None, CoreExpr::Lambda(lambda)) => {
                    // The arity is known even though the body is not yet
                    // examined, which is what makes mutual recursion work.
                    let params = lambda
                        .params
                        .iter()
                        .map(|p| match &p.annotation {
                            Some(a) => Type::from_annotation(a),
                            None => self.fresh(),
                        })
                        .collect();
                    let required = lambda.params.iter().filter(|p| p.default.is_none()).count();
                    let ret = match &lambda.ret {
                        Some(a) => Type::from_annotation(a),
                        None => self.fresh(),
                    };
                    Type::Fun(FunType {
                        params,
                        required,
                        variadic: None,
                        ret: Box::new(ret),
                    })
                }
                (None, _) => self.fresh(),
            };

            let binding = if decl.mutable {
                Binding::mutable(ty)
            } else {
                Binding::immutable(ty)
            };
            self.env.insert(decl.name.clone(), binding);
        }
    }

    /// Phase 2: validate the statements. The result is the type of the
    /// trailing expression, `Unit` if the block ends with a binding, or a
    /// fresh variable if it ends with a diverging statement.
    fn check_stmts(&mut self, statements: &[CoreStmt]) -> Result<Type> {
        let mut ty = Type::Unit;

        for stmt in statements {
            ty = match stmt {
                CoreStmt::Let(decl) => {
                    let expected = self
                        .env
                        .lookup(&decl.name)
                        .map(|b| b.ty.clone())
                        .ok_or_else(|| {
                            Error::internal(
                                format!("binding '{}' missing after discovery", decl.name),
                                decl.span,
                            )
                        })?;
                    self.check_expr(&decl.init, &expected)?;
                    Type::Unit
                }
                CoreStmt::Expr(expr) => self.infer(expr)?,
                CoreStmt::Break(span) => {
                    if self.loop_depth == 0 {
                        return Err(Error::type_error("break outside while", *span));
                    }
                    self.fresh()
                }
                CoreStmt::Continue(span) => {
                    if self.loop_depth == 0 {
                        return Err(Error::type_error("continue outside while", *span));
                    }
                    self.fresh()
                }
                CoreStmt::Return(ret) => {
                    let expected = self.fn_ret.last().cloned().ok_or_else(|| {
                        Error::type_error("return outside function", ret.span)
                    })?;
                    match &ret.value {
                        Some(value) => self.check_expr(value, &expected)?,
                        None => self.unify_at(&expected, &Type::Unit, ret.span)?,
                    }
                    // A trailing return diverges, so it constrains nothing.
                    self.fresh()
                }
            };
        }

        Ok(ty)
    }

    /// Nested `{ ... }` blocks open their own scope layer.
    fn check_block(&mut self, block: &CoreBlock) -> Result<Type> {
        self.env.enter();
        self.declare(&block.statements);
        let result = self.check_stmts(&block.statements);
        self.env.leave();
        result
    }

    fn check_expr(&mut self, expr: &CoreExpr, expected: &Type) -> Result<()> {
        let found = self.infer(expr)?;
        self.unify_at(expected, &found, expr.span())
    }

    fn infer(&mut self, expr: &CoreExpr) -> Result<Type> {
        match expr {
            CoreExpr::Int(_) => Ok(Type::Int),
            CoreExpr::Str(_) => Ok(Type::String),
            CoreExpr::Bool(_) => Ok(Type::Bool),

            CoreExpr::Var(var) => match self.env.lookup(&var.name) {
                Some(binding) => Ok(binding.ty.clone()),
                None => Err(Error::type_error(
                    format!("undefined: {}", var.name),
                    var.span,
                )),
            },

            CoreExpr::Unary(unary) => match unary.op {
                UnaryOpKind::Neg => {
                    self.check_expr(&unary.operand, &Type::Int)?;
                    Ok(Type::Int)
                }
                UnaryOpKind::Not => {
                    self.check_expr(&unary.operand, &Type::Bool)?;
                    Ok(Type::Bool)
                }
            },

            CoreExpr::Binary(binary) => self.infer_binary(binary),
            CoreExpr::Call(call) => self.infer_call(call),
            CoreExpr::Lambda(lambda) => self.infer_lambda(lambda),
            CoreExpr::Block(block) => self.check_block(block),

            CoreExpr::If(if_expr) => {
                self.check_expr(&if_expr.cond, &Type::Bool)?;
                match &if_expr.else_branch {
                    Some(else_branch) => {
                        let then_ty = self.infer(&if_expr.then_branch)?;
                        let else_ty = self.infer(else_branch)?;
                        self.unify_at(&then_ty, &else_ty, if_expr.span)?;
                        Ok(self.subst.apply(&then_ty))
                    }
                    // Block form without else: the whole thing is Unit and
                    // the branch must agree.
                    None => {
                        self.check_expr(&if_expr.then_branch, &Type::Unit)?;
                        Ok(Type::Unit)
                    }
                }
            }

            CoreExpr::While(while_expr) => {
                self.check_expr(&while_expr.cond, &Type::Bool)?;
                self.loop_depth += 1;
                let body_ty = self.check_block(&while_expr.body);
                self.loop_depth -= 1;
                let body_ty = body_ty?;
                self.unify_at(&Type::Unit, &body_ty, while_expr.body.span)?;
                Ok(Type::Unit)
            }

            CoreExpr::Assign(assign) => {
                let binding = match self.env.lookup(&assign.name) {
                    Some(binding) => binding.clone(),
                    None => {
                        return Err(Error::type_error(
                            format!("undefined: {}", assign.name),
                            assign.span,
                        ));
                    }
                };
                if !binding.mutable {
                    return Err(Error::type_error(
                        format!("cannot assign to immutable binding '{}'", assign.name),
                        assign.span,
                    ));
                }
                self.check_expr(&assign.value, &binding.ty)?;
                Ok(Type::Unit)
            }
        }
    }

    fn infer_binary(&mut self, binary: &CoreBinary) -> Result<Type> {
        use BinOpKind::*;
        match binary.op {
            // `+` is overloaded: string concatenation when either side is
            // already known to be a string, integer addition otherwise.
            Add => {
                let left_ty = self.infer(&binary.left)?;
                let right_ty = self.infer(&binary.right)?;
                let left_ty = self.subst.apply(&left_ty);
                let right_ty = self.subst.apply(&right_ty);
                let operand = if left_ty == Type::String || right_ty == Type::String {
                    Type::String
                } else {
                    Type::Int
                };
                self.unify_at(&operand, &left_ty, binary.left.span())?;
                self.unify_at(&operand, &right_ty, binary.right.span())?;
                Ok(operand)
            }
            Sub | Mul | Div | Rem => {
                self.check_expr(&binary.left, &Type::Int)?;
                self.check_expr(&binary.right, &Type::Int)?;
                Ok(Type::Int)
            }
            Eq | NotEq => {
                let left_ty = self.infer(&binary.left)?;
                let right_ty = self.infer(&binary.right)?;
                self.unify_at(&left_ty, &right_ty, binary.span)?;
                Ok(Type::Bool)
            }
            Lt | LtEq | Gt | GtEq => {
                self.check_expr(&binary.left, &Type::Int)?;
                self.check_expr(&binary.right, &Type::Int)?;
                Ok(Type::Bool)
            }
            And | Or => {
                self.check_expr(&binary.left, &Type::Bool)?;
                self.check_expr(&binary.right, &Type::Bool)?;
                Ok(Type::Bool)
            }
        }
    }

    fn infer_lambda(&mut self, lambda: &CoreLambda) -> Result<Type> {
        let mut param_tys = Vec::new();
        for param in &lambda.params {
            let ty = match &param.annotation {
                Some(a) => Type::from_annotation(a),
                None => self.fresh(),
            };
            param_tys.push(ty);
        }

        // Defaults are evaluated in the defining environment at call time,
        // so they are checked before the parameters come into scope.
        for (param, ty) in lambda.params.iter().zip(&param_tys) {
            if let Some(default) = &param.default {
                self.check_expr(default, ty)?;
            }
        }

        let ret_ty = match &lambda.ret {
            Some(a) => Type::from_annotation(a),
            None => self.fresh(),
        };

        self.env.enter();
        for (param, ty) in lambda.params.iter().zip(&param_tys) {
            self.env.insert(param.name.clone(), Binding::mutable(ty.clone()));
        }
        self.fn_ret.push(ret_ty.clone());
        // break/continue do not cross a call boundary.
        let saved_depth = std::mem::replace(&mut self.loop_depth, 0);

        let body_result = {
            self.declare(&lambda.body.statements);
            self.check_stmts(&lambda.body.statements)
        };

        self.loop_depth = saved_depth;
        self.fn_ret.pop();
        self.env.leave();

        let body_ty = body_result?;
        self.unify_at(&ret_ty, &body_ty, lambda.body.span)?;

        let required = lambda.params.iter().filter(|p| p.default.is_none()).count();
        Ok(Type::Fun(FunType {
            params: param_tys.iter().map(|t| self.subst.apply(t)).collect(),
            required,
            variadic: None,
            ret: Box::new(self.subst.apply(&ret_ty)),
        }))
    }

    fn infer_call(&mut self, call: &CoreCall) -> Result<Type> {
        // Calls to the seeded builtins are the only points of ad-hoc
        // polymorphism; their argument types are constrained per call site.
        if let CoreExpr::Var(var) = call.callee.as_ref() {
            if let Some(builtin) = self.env.lookup(&var.name).and_then(|b| b.builtin) {
                return self.infer_builtin_call(builtin, call);
            }
        }

        let callee_ty = self.infer(&call.callee)?;
        let callee_ty = self.subst.apply(&callee_ty);

        match callee_ty {
            Type::Fun(fun) => {
                let supplied = call.args.len();
                if supplied < fun.required {
                    return Err(Error::type_error(
                        format!(
                            "expected at least {} arguments, got {supplied}",
                            fun.required
                        ),
                        call.span,
                    ));
                }
                if supplied > fun.params.len() && fun.variadic.is_none() {
                    return Err(Error::type_error(
                        format!("expected {} arguments, got {supplied}", fun.params.len()),
                        call.span,
                    ));
                }
                for (i, arg) in call.args.iter().enumerate() {
                    let expected = match fun.params.get(i) {
                        Some(param) => param.clone(),
                        None => fun
                            .variadic
                            .as_deref()
                            .cloned()
                            .expect("arity checked above"),
                    };
                    self.check_expr(arg, &expected)?;
                }
                Ok(self.subst.apply(&fun.ret))
            }

            // Calling through an unresolved variable pins it to a function
            // of exactly this call's shape.
            Type::Var(_) => {
                let mut arg_tys = Vec::new();
                for arg in &call.args {
                    arg_tys.push(self.infer(arg)?);
                }
                let ret = self.fresh();
                let expected = Type::fun(arg_tys, ret.clone());
                self.unify_at(&callee_ty, &expected, call.span)?;
                Ok(self.subst.apply(&ret))
            }

            other => Err(Error::type_error(
                format!("expected function, got {}", other.pretty()),
                call.span,
            )),
        }
    }

    fn infer_builtin_call(&mut self, builtin: Builtin, call: &CoreCall) -> Result<Type> {
        let supplied = call.args.len();
        match builtin {
            Builtin::Print => {
                // Each argument's type is left free; only self-consistency
                // per argument is required.
                for arg in &call.args {
                    self.infer(arg)?;
                }
                Ok(Type::Unit)
            }
            Builtin::Str => {
                if supplied != 1 {
                    return Err(Error::type_error(
                        format!("str expects exactly 1 argument, got {supplied}"),
                        call.span,
                    ));
                }
                self.infer(&call.args[0])?;
                Ok(Type::String)
            }
            Builtin::Min | Builtin::Max => {
                if supplied < 2 {
                    return Err(Error::type_error(
                        format!("{} requires at least 2 arguments", builtin.name()),
                        call.span,
                    ));
                }
                for arg in &call.args {
                    self.check_expr(arg, &Type::Int)?;
                }
                Ok(Type::Int)
            }
            Builtin::Input => {
                if supplied > 1 {
                    return Err(Error::type_error(
                        format!("input expects at most 1 argument, got {supplied}"),
                        call.span,
                    ));
                }
                if let Some(prompt) = call.args.first() {
                    self.check_expr(prompt, &Type::String)?;
                }
                Ok(Type::String)
            }
        }
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}
