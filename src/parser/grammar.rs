//! Grammar rules
//!
//! One function per nonterminal, layered by operator precedence
//! (tight to loose): unary, `* / %`, `+ -`, comparisons, `&&`, `||`,
//! assignment. All binary operators are left-associative; assignment is
//! right-associative and only accepts an identifier target.
//!
//! Newlines terminate statements, so the expression layers never skip a
//! newline *before* deciding whether to continue — only after an operator
//! or opening delimiter has committed to a continuation.

use crate::ast::{
    Assign, AssignOp, BinOpKind, BinaryOp, Block, BoolLit, Call, Decl, Def, Expression, Ident, If,
    IntLit, Lambda, Param, Program, Return, Statement, StrLit, TypeExpr, UnaryOp, UnaryOpKind,
    While,
};
use crate::error::{Error, Result};
use crate::lexer::TokenKind;

use super::ParseState;

/// program := statement*
pub fn program(state: &mut ParseState) -> Result<Program> {
    let statements = statement_list(state, None)?;
    state.expect(TokenKind::Eof, "end of input")?;
    Ok(Program { statements })
}

/// Statements until `closing` (or end of input), with separators between
/// them consumed greedily. Separators are optional: a statement ending in
/// `}` may be followed directly by the next one.
fn statement_list(
    state: &mut ParseState,
    closing: Option<&TokenKind>,
) -> Result<Vec<Statement>> {
    let mut statements = Vec::new();
    state.skip_separators();
    loop {
        match state.peek_kind() {
            TokenKind::Eof => break,
            kind if closing
                .is_some_and(|c| std::mem::discriminant(kind) == std::mem::discriminant(c)) =>
            {
                break
            }
            _ => {}
        }
        statements.push(statement(state)?);
        state.skip_separators();
    }
    Ok(statements)
}

/// statement := decl | def | "break" | "continue" | return | expression
fn statement(state: &mut ParseState) -> Result<Statement> {
    match state.peek_kind() {
        TokenKind::Val | TokenKind::Var => decl(state),
        TokenKind::Def => def(state),
        TokenKind::Break => {
            let token = state.advance();
            Ok(Statement::Break(token.span))
        }
        TokenKind::Continue => {
            let token = state.advance();
            Ok(Statement::Continue(token.span))
        }
        TokenKind::Return => {
            let token = state.advance();
            let value = match state.peek_kind() {
                TokenKind::Newline | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::Eof => {
                    None
                }
                _ => Some(expression(state)?),
            };
            Ok(Statement::Return(Return {
                value,
                span: token.span,
            }))
        }
        _ => Ok(Statement::Expression(expression(state)?)),
    }
}

/// decl := ("val" | "var") ident [":" type] "=" expression
fn decl(state: &mut ParseState) -> Result<Statement> {
    let keyword = state.advance();
    let mutable = matches!(keyword.kind, TokenKind::Var);
    let name = ident(state)?;
    let annotation = if state.eat(&TokenKind::Colon) {
        Some(type_expr(state)?)
    } else {
        None
    };
    state.expect(TokenKind::Assign, "'='")?;
    state.skip_newlines();
    let init = expression(state)?;
    Ok(Statement::Decl(Decl {
        name,
        mutable,
        annotation,
        init,
        span: keyword.span,
    }))
}

/// def := "def" ident "(" params ")" [":" type] block
fn def(state: &mut ParseState) -> Result<Statement> {
    let keyword = state.advance();
    let name = ident(state)?;
    state.expect(TokenKind::LParen, "'('")?;
    let params = param_list(state)?;
    state.expect(TokenKind::RParen, "')'")?;
    let ret = if state.eat(&TokenKind::Colon) {
        Some(type_expr(state)?)
    } else {
        None
    };
    state.skip_newlines();
    let body = block(state)?;
    Ok(Statement::Def(Def {
        name,
        params,
        ret,
        body,
        span: keyword.span,
    }))
}

/// params := [param ("," param)*], where param := ident [":" type] ["=" expression].
/// Parameters with a default must come after those without one.
fn param_list(state: &mut ParseState) -> Result<Vec<Param>> {
    let mut params = Vec::new();
    let mut seen_default = false;
    state.skip_newlines();

    if matches!(state.peek_kind(), TokenKind::RParen) {
        return Ok(params);
    }

    loop {
        let name = ident(state)?;
        let annotation = if state.eat(&TokenKind::Colon) {
            Some(type_expr(state)?)
        } else {
            None
        };
        let default = if state.eat(&TokenKind::Assign) {
            state.skip_newlines();
            Some(expression(state)?)
        } else {
            None
        };

        if default.is_some() {
            seen_default = true;
        } else if seen_default {
            return Err(Error::parse(
                format!(
                    "parameter '{}' without a default follows a parameter with one",
                    name.name
                ),
                name.span,
            ));
        }

        params.push(Param {
            name,
            annotation,
            default,
        });

        state.skip_newlines();
        if !state.eat(&TokenKind::Comma) {
            break;
        }
        state.skip_newlines();
    }

    Ok(params)
}

/// type := "Int" | "Bool" | "String" | "Unit" | "(" [type ("," type)*] ")" "->" type
fn type_expr(state: &mut ParseState) -> Result<TypeExpr> {
    match state.peek_kind() {
        TokenKind::Ident(name) => {
            let ty = match name.as_str() {
                "Int" => TypeExpr::Int,
                "Bool" => TypeExpr::Bool,
                "String" => TypeExpr::String,
                "Unit" => TypeExpr::Unit,
                other => {
                    return Err(Error::parse(
                        format!("unknown type '{other}'"),
                        state.peek().span,
                    ));
                }
            };
            state.advance();
            Ok(ty)
        }
        TokenKind::LParen => {
            state.advance();
            state.skip_newlines();
            let mut params = Vec::new();
            if !matches!(state.peek_kind(), TokenKind::RParen) {
                loop {
                    params.push(type_expr(state)?);
                    state.skip_newlines();
                    if !state.eat(&TokenKind::Comma) {
                        break;
                    }
                    state.skip_newlines();
                }
            }
            state.expect(TokenKind::RParen, "')'")?;
            state.expect(TokenKind::Arrow, "'->'")?;
            let ret = type_expr(state)?;
            Ok(TypeExpr::Fun(params, Box::new(ret)))
        }
        _ => Err(state.error_expected("a type")),
    }
}

/// block := "{" statement* "}"
fn block(state: &mut ParseState) -> Result<Block> {
    let open = state.expect(TokenKind::LBrace, "'{'")?;
    let statements = statement_list(state, Some(&TokenKind::RBrace))?;
    state.expect(TokenKind::RBrace, "'}'")?;
    Ok(Block {
        statements,
        span: open.span,
    })
}

/// expression := assignment
pub fn expression(state: &mut ParseState) -> Result<Expression> {
    assignment(state)
}

/// assignment := or_expr [("=" | "+=" | "-=") assignment]
fn assignment(state: &mut ParseState) -> Result<Expression> {
    let left = or_expr(state)?;

    let op = match state.peek_kind() {
        TokenKind::Assign => AssignOp::Set,
        TokenKind::PlusAssign => AssignOp::Add,
        TokenKind::MinusAssign => AssignOp::Sub,
        _ => return Ok(left),
    };
    let op_token = state.advance();

    let target = match left {
        Expression::Ident(id) => id,
        _ => {
            return Err(Error::parse(
                "invalid assignment target".to_string(),
                op_token.span,
            ));
        }
    };

    state.skip_newlines();
    let value = assignment(state)?;
    let span = target.span;
    Ok(Expression::Assign(Assign {
        target,
        op,
        value: Box::new(value),
        span,
    }))
}

/// or_expr := and_expr ("||" and_expr)*
fn or_expr(state: &mut ParseState) -> Result<Expression> {
    binary_level(state, and_expr, |kind| match kind {
        TokenKind::OrOr => Some(BinOpKind::Or),
        _ => None,
    })
}

/// and_expr := comparison ("&&" comparison)*
fn and_expr(state: &mut ParseState) -> Result<Expression> {
    binary_level(state, comparison, |kind| match kind {
        TokenKind::AndAnd => Some(BinOpKind::And),
        _ => None,
    })
}

/// comparison := additive (("==" | "!=" | "<" | "<=" | ">" | ">=") additive)*
fn comparison(state: &mut ParseState) -> Result<Expression> {
    binary_level(state, additive, |kind| match kind {
        TokenKind::EqEq => Some(BinOpKind::Eq),
        TokenKind::NotEq => Some(BinOpKind::NotEq),
        TokenKind::Lt => Some(BinOpKind::Lt),
        TokenKind::LtEq => Some(BinOpKind::LtEq),
        TokenKind::Gt => Some(BinOpKind::Gt),
        TokenKind::GtEq => Some(BinOpKind::GtEq),
        _ => None,
    })
}

/// additive := multiplicative (("+" | "-") multiplicative)*
fn additive(state: &mut ParseState) -> Result<Expression> {
    binary_level(state, multiplicative, |kind| match kind {
        TokenKind::Plus => Some(BinOpKind::Add),
        TokenKind::Minus => Some(BinOpKind::Sub),
        _ => None,
    })
}

/// multiplicative := unary (("*" | "/" | "%") unary)*
fn multiplicative(state: &mut ParseState) -> Result<Expression> {
    binary_level(state, unary, |kind| match kind {
        TokenKind::Star => Some(BinOpKind::Mul),
        TokenKind::Slash => Some(BinOpKind::Div),
        TokenKind::Percent => Some(BinOpKind::Rem),
        _ => None,
    })
}

/// One left-associative binary precedence level.
fn binary_level(
    state: &mut ParseState,
    next: fn(&mut ParseState) -> Result<Expression>,
    match_op: fn(&TokenKind) -> Option<BinOpKind>,
) -> Result<Expression> {
    let mut left = next(state)?;

    while let Some(op) = match_op(state.peek_kind()) {
        state.advance();
        state.skip_newlines();
        let right = next(state)?;
        let span = left.span();
        left = Expression::Binary(BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
            span,
        });
    }

    Ok(left)
}

/// unary := ("-" | "!") unary | postfix
fn unary(state: &mut ParseState) -> Result<Expression> {
    let op = match state.peek_kind() {
        TokenKind::Minus => UnaryOpKind::Neg,
        TokenKind::Bang => UnaryOpKind::Not,
        _ => return postfix(state),
    };
    let token = state.advance();
    let operand = unary(state)?;

    // Fold negation onto integer literals directly.
    if let (UnaryOpKind::Neg, Expression::Int(lit)) = (op, &operand) {
        return Ok(Expression::Int(IntLit {
            value: lit.value.wrapping_neg(),
            span: token.span,
        }));
    }

    Ok(Expression::Unary(UnaryOp {
        op,
        operand: Box::new(operand),
        span: token.span,
    }))
}

/// postfix := primary call_args*
fn postfix(state: &mut ParseState) -> Result<Expression> {
    let mut expr = primary(state)?;

    while matches!(state.peek_kind(), TokenKind::LParen) {
        state.advance();
        state.skip_newlines();
        let mut args = Vec::new();
        if !matches!(state.peek_kind(), TokenKind::RParen) {
            loop {
                args.push(expression(state)?);
                state.skip_newlines();
                if !state.eat(&TokenKind::Comma) {
                    break;
                }
                state.skip_newlines();
            }
        }
        state.expect(TokenKind::RParen, "')'")?;
        let span = expr.span();
        expr = Expression::Call(Call {
            callee: Box::new(expr),
            args,
            span,
        });
    }

    Ok(expr)
}

/// primary := literal | ident | lambda | block | if | while | "(" expression ")"
fn primary(state: &mut ParseState) -> Result<Expression> {
    match state.peek_kind() {
        TokenKind::Int(value) => {
            let value = *value;
            let token = state.advance();
            Ok(Expression::Int(IntLit {
                value,
                span: token.span,
            }))
        }
        TokenKind::Str(value) => {
            let value = value.clone();
            let token = state.advance();
            Ok(Expression::Str(StrLit {
                value,
                span: token.span,
            }))
        }
        TokenKind::True | TokenKind::False => {
            let value = matches!(state.peek_kind(), TokenKind::True);
            let token = state.advance();
            Ok(Expression::Bool(BoolLit {
                value,
                span: token.span,
            }))
        }
        TokenKind::Ident(_) => Ok(Expression::Ident(ident(state)?)),
        TokenKind::Fn => fn_lambda(state),
        TokenKind::LBrace => Ok(Expression::Block(block(state)?)),
        TokenKind::If => if_expr(state),
        TokenKind::While => while_expr(state),
        TokenKind::LParen => paren_or_lambda(state),
        _ => Err(state.error_expected("an expression")),
    }
}

/// lambda := "fn" "(" params ")" block
fn fn_lambda(state: &mut ParseState) -> Result<Expression> {
    let keyword = state.advance();
    state.expect(TokenKind::LParen, "'('")?;
    let params = param_list(state)?;
    state.expect(TokenKind::RParen, "')'")?;
    state.skip_newlines();
    let body = block(state)?;
    Ok(Expression::Lambda(Lambda {
        params,
        body: Box::new(Expression::Block(body)),
        span: keyword.span,
    }))
}

/// Either the compact lambda `(params) => expr` or a parenthesized
/// expression; disambiguated by backtracking.
fn paren_or_lambda(state: &mut ParseState) -> Result<Expression> {
    let saved = state.position();
    match compact_lambda(state) {
        Ok(lambda) => Ok(lambda),
        Err(_) => {
            state.restore(saved);
            state.advance(); // '('
            state.skip_newlines();
            let expr = expression(state)?;
            state.skip_newlines();
            state.expect(TokenKind::RParen, "')'")?;
            Ok(expr)
        }
    }
}

/// compact_lambda := "(" params ")" "=>" expression
fn compact_lambda(state: &mut ParseState) -> Result<Expression> {
    let open = state.expect(TokenKind::LParen, "'('")?;
    let params = param_list(state)?;
    state.expect(TokenKind::RParen, "')'")?;
    state.expect(TokenKind::FatArrow, "'=>'")?;
    state.skip_newlines();
    let body = expression(state)?;
    Ok(Expression::Lambda(Lambda {
        params,
        body: Box::new(body),
        span: open.span,
    }))
}

/// if := "if" expression "then" expression "else" expression
///     | "if" expression block ["else" (block | if)]
fn if_expr(state: &mut ParseState) -> Result<Expression> {
    let keyword = state.advance();
    let cond = expression(state)?;

    if state.eat(&TokenKind::Then) {
        state.skip_newlines();
        let then_branch = expression(state)?;
        state.skip_newlines();
        state.expect(TokenKind::Else, "'else'")?;
        state.skip_newlines();
        let else_branch = expression(state)?;
        return Ok(Expression::If(If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Some(Box::new(else_branch)),
            span: keyword.span,
        }));
    }

    state.skip_newlines();
    let then_branch = Expression::Block(block(state)?);

    // `else` may sit on the next line; without it, the newline is a
    // statement separator and must be left alone.
    let saved = state.position();
    state.skip_newlines();
    let else_branch = if state.eat(&TokenKind::Else) {
        state.skip_newlines();
        let branch = if matches!(state.peek_kind(), TokenKind::If) {
            if_expr(state)?
        } else {
            Expression::Block(block(state)?)
        };
        Some(Box::new(branch))
    } else {
        state.restore(saved);
        None
    };

    Ok(Expression::If(If {
        cond: Box::new(cond),
        then_branch: Box::new(then_branch),
        else_branch,
        span: keyword.span,
    }))
}

/// while := "while" expression block
fn while_expr(state: &mut ParseState) -> Result<Expression> {
    let keyword = state.advance();
    let cond = expression(state)?;
    state.skip_newlines();
    let body = block(state)?;
    Ok(Expression::While(While {
        cond: Box::new(cond),
        body,
        span: keyword.span,
    }))
}

fn ident(state: &mut ParseState) -> Result<Ident> {
    match state.peek_kind() {
        TokenKind::Ident(name) => {
            let name = name.clone();
            let token = state.advance();
            Ok(Ident {
                name,
                span: token.span,
            })
        }
        _ => Err(state.error_expected("an identifier")),
    }
}
