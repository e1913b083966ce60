//! Surface expressions

use crate::span::Span;

use super::statement::Statement;
use super::{Ident, TypeExpr};

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Int(IntLit),
    Str(StrLit),
    Bool(BoolLit),
    Ident(Ident),
    Unary(UnaryOp),
    Binary(BinaryOp),
    Call(Call),
    Lambda(Lambda),
    Block(Block),
    If(If),
    While(While),
    Assign(Assign),
}

impl Expression {
    pub fn span(&self) -> Span {
        match self {
            Expression::Int(e) => e.span,
            Expression::Str(e) => e.span,
            Expression::Bool(e) => e.span,
            Expression::Ident(e) => e.span,
            Expression::Unary(e) => e.span,
            Expression::Binary(e) => e.span,
            Expression::Call(e) => e.span,
            Expression::Lambda(e) => e.span,
            Expression::Block(e) => e.span,
            Expression::If(e) => e.span,
            Expression::While(e) => e.span,
            Expression::Assign(e) => e.span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IntLit {
    pub value: i64,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    pub value: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoolLit {
    pub value: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    /// `-`
    Neg,
    /// `!`
    Not,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub op: UnaryOpKind,
    pub operand: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinOpKind {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOpKind::Add => "+",
            BinOpKind::Sub => "-",
            BinOpKind::Mul => "*",
            BinOpKind::Div => "/",
            BinOpKind::Rem => "%",
            BinOpKind::Eq => "==",
            BinOpKind::NotEq => "!=",
            BinOpKind::Lt => "<",
            BinOpKind::LtEq => "<=",
            BinOpKind::Gt => ">",
            BinOpKind::GtEq => ">=",
            BinOpKind::And => "&&",
            BinOpKind::Or => "||",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryOp {
    pub op: BinOpKind,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub callee: Box<Expression>,
    pub args: Vec<Expression>,
    pub span: Span,
}

/// A function parameter: `name [: T] [= default]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Ident,
    pub annotation: Option<TypeExpr>,
    pub default: Option<Expression>,
}

/// `fn(params) { body }` or `(params) => expr`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    pub params: Vec<Param>,
    pub body: Box<Expression>,
    pub span: Span,
}

/// `{ stmt* expr? }` — yields the trailing expression, or unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub statements: Vec<Statement>,
    pub span: Span,
}

/// Both `if c then a else b` and the block form. `else_branch` is `None`
/// only for the block form without `else`.
#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub cond: Box<Expression>,
    pub then_branch: Box<Expression>,
    pub else_branch: Option<Box<Expression>>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub cond: Box<Expression>,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    /// `=`
    Set,
    /// `+=`
    Add,
    /// `-=`
    Sub,
}

/// Assignment to an existing binding, including compound forms.
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Ident,
    pub op: AssignOp,
    pub value: Box<Expression>,
    pub span: Span,
}
