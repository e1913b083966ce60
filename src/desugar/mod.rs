//! Desugaring: surface AST to core AST
//!
//! Pure, position-preserving local rewrites:
//! - `x += e` becomes `x = x + e` (likewise `-=`)
//! - `def name(...) { ... }` becomes an immutable binding of a lambda
//! - both lambda forms get a block body
//!
//! Everything else maps one-to-one. Default parameter values stay
//! expressions; they are evaluated at call time by the evaluator.

use crate::ast;
use crate::ast::{AssignOp, BinOpKind};
use crate::core::*;

/// Desugar a parsed program into the core block the type checker and
/// evaluator consume.
pub fn desugar_program(program: ast::Program) -> CoreBlock {
    let span = program
        .statements
        .first()
        .map(|s| s.span())
        .unwrap_or_default();
    CoreBlock {
        statements: program.statements.into_iter().map(desugar_stmt).collect(),
        span,
    }
}

fn desugar_stmt(stmt: ast::Statement) -> CoreStmt {
    match stmt {
        ast::Statement::Decl(decl) => CoreStmt::Let(CoreLet {
            name: decl.name.name,
            mutable: decl.mutable,
            annotation: decl.annotation,
            init: Box::new(desugar_expr(decl.init)),
            span: decl.span,
        }),
        ast::Statement::Def(def) => {
            // `def` is an immutable binding of a lambda; the name is already
            // visible to the body through two-phase scope discovery.
            let lambda = CoreExpr::Lambda(CoreLambda {
                params: def.params.into_iter().map(desugar_param).collect(),
                ret: def.ret,
                body: desugar_block(def.body),
                span: def.span,
            });
            CoreStmt::Let(CoreLet {
                name: def.name.name,
                mutable: false,
                annotation: None,
                init: Box::new(lambda),
                span: def.span,
            })
        }
        ast::Statement::Break(span) => CoreStmt::Break(span),
        ast::Statement::Continue(span) => CoreStmt::Continue(span),
        ast::Statement::Return(ret) => CoreStmt::Return(CoreReturn {
            value: ret.value.map(|e| Box::new(desugar_expr(e))),
            span: ret.span,
        }),
        ast::Statement::Expression(expr) => CoreStmt::Expr(desugar_expr(expr)),
    }
}

fn desugar_expr(expr: ast::Expression) -> CoreExpr {
    match expr {
        ast::Expression::Int(lit) => CoreExpr::Int(CoreInt {
            value: lit.value,
            span: lit.span,
        }),
        ast::Expression::Str(lit) => CoreExpr::Str(CoreStr {
            value: lit.value,
            span: lit.span,
        }),
        ast::Expression::Bool(lit) => CoreExpr::Bool(CoreBool {
            value: lit.value,
            span: lit.span,
        }),
        ast::Expression::Ident(id) => CoreExpr::Var(CoreVar {
            name: id.name,
            span: id.span,
        }),
        ast::Expression::Unary(unary) => CoreExpr::Unary(CoreUnary {
            op: unary.op,
            operand: Box::new(desugar_expr(*unary.operand)),
            span: unary.span,
        }),
        ast::Expression::Binary(binary) => CoreExpr::Binary(CoreBinary {
            op: binary.op,
            left: Box::new(desugar_expr(*binary.left)),
            right: Box::new(desugar_expr(*binary.right)),
            span: binary.span,
        }),
        ast::Expression::Call(call) => CoreExpr::Call(CoreCall {
            callee: Box::new(desugar_expr(*call.callee)),
            args: call.args.into_iter().map(desugar_expr).collect(),
            span: call.span,
        }),
        ast::Expression::Lambda(lambda) => {
            let span = lambda.span;
            let body = match *lambda.body {
                // `fn(...) { ... }` already has a block body.
                ast::Expression::Block(block) => desugar_block(block),
                // `(...) => expr` gets a single-statement block.
                other => {
                    let expr_span = other.span();
                    CoreBlock {
                        statements: vec![CoreStmt::Expr(desugar_expr(other))],
                        span: expr_span,
                    }
                }
            };
            CoreExpr::Lambda(CoreLambda {
                params: lambda.params.into_iter().map(desugar_param).collect(),
                ret: None,
                body,
                span,
            })
        }
        ast::Expression::Block(block) => CoreExpr::Block(desugar_block(block)),
        ast::Expression::If(if_expr) => CoreExpr::If(CoreIf {
            cond: Box::new(desugar_expr(*if_expr.cond)),
            then_branch: Box::new(desugar_expr(*if_expr.then_branch)),
            else_branch: if_expr.else_branch.map(|e| Box::new(desugar_expr(*e))),
            span: if_expr.span,
        }),
        ast::Expression::While(while_expr) => CoreExpr::While(CoreWhile {
            cond: Box::new(desugar_expr(*while_expr.cond)),
            body: desugar_block(while_expr.body),
            span: while_expr.span,
        }),
        ast::Expression::Assign(assign) => desugar_assign(assign),
    }
}

/// `x += e` → `x = x + e`; `x -= e` → `x = x - e`.
fn desugar_assign(assign: ast::Assign) -> CoreExpr {
    let value = desugar_expr(*assign.value);
    let span = assign.span;
    let value = match assign.op {
        AssignOp::Set => value,
        AssignOp::Add | AssignOp::Sub => {
            let op = if matches!(assign.op, AssignOp::Add) {
                BinOpKind::Add
            } else {
                BinOpKind::Sub
            };
            CoreExpr::Binary(CoreBinary {
                op,
                left: Box::new(CoreExpr::Var(CoreVar {
                    name: assign.target.name.clone(),
                    span: assign.target.span,
                })),
                right: Box::new(value),
                span,
            })
        }
    };
    CoreExpr::Assign(CoreAssign {
        name: assign.target.name,
        value: Box::new(value),
        span,
    })
}

fn desugar_param(param: ast::Param) -> CoreParam {
    let span = param.name.span;
    CoreParam {
        name: param.name.name,
        annotation: param.annotation,
        default: param.default.map(desugar_expr),
        span,
    }
}

fn desugar_block(block: ast::Block) -> CoreBlock {
    CoreBlock {
        statements: block.statements.into_iter().map(desugar_stmt).collect(),
        span: block.span,
    }
}
