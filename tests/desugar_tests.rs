use pyrite::ast::BinOpKind;
use pyrite::core::{CoreBlock, CoreExpr, CoreStmt};
use pyrite::desugar::desugar_program;
use pyrite::lexer::lex;
use pyrite::parser::parse;
use pyrite::span::Span;

fn desugar_src(source: &str) -> CoreBlock {
    desugar_program(parse(lex(source).expect("lexing failed")).expect("parsing failed"))
}

#[test]
fn desugar_compound_add_assignment() {
    let block = desugar_src("x += 2");
    match &block.statements[0] {
        CoreStmt::Expr(CoreExpr::Assign(assign)) => {
            assert_eq!(assign.name, "x");
            match assign.value.as_ref() {
                CoreExpr::Binary(binary) => {
                    assert_eq!(binary.op, BinOpKind::Add);
                    assert!(matches!(
                        binary.left.as_ref(),
                        CoreExpr::Var(v) if v.name == "x"
                    ));
                    assert!(matches!(
                        binary.right.as_ref(),
                        CoreExpr::Int(lit) if lit.value == 2
                    ));
                }
                other => panic!("expected x + 2, got {other:?}"),
            }
        }
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn desugar_compound_sub_assignment() {
    let block = desugar_src("x -= 1");
    match &block.statements[0] {
        CoreStmt::Expr(CoreExpr::Assign(assign)) => {
            assert!(matches!(
                assign.value.as_ref(),
                CoreExpr::Binary(binary) if binary.op == BinOpKind::Sub
            ));
        }
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn desugar_plain_assignment_is_untouched() {
    let block = desugar_src("x = 7");
    match &block.statements[0] {
        CoreStmt::Expr(CoreExpr::Assign(assign)) => {
            assert!(matches!(
                assign.value.as_ref(),
                CoreExpr::Int(lit) if lit.value == 7
            ));
        }
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn desugar_def_becomes_immutable_lambda_binding() {
    let block = desugar_src("def double(x) { x * 2 }");
    match &block.statements[0] {
        CoreStmt::Let(decl) => {
            assert_eq!(decl.name, "double");
            assert!(!decl.mutable);
            match decl.init.as_ref() {
                CoreExpr::Lambda(lambda) => {
                    assert_eq!(lambda.params.len(), 1);
                    assert_eq!(lambda.params[0].name, "x");
                }
                other => panic!("expected a lambda, got {other:?}"),
            }
        }
        other => panic!("expected a binding, got {other:?}"),
    }
}

#[test]
fn desugar_keeps_default_parameters_as_expressions() {
    let block = desugar_src("def f(a, b = 1 + 2) { a }");
    match &block.statements[0] {
        CoreStmt::Let(decl) => match decl.init.as_ref() {
            CoreExpr::Lambda(lambda) => {
                assert!(lambda.params[0].default.is_none());
                assert!(matches!(
                    lambda.params[1].default,
                    Some(CoreExpr::Binary(_))
                ));
            }
            other => panic!("expected a lambda, got {other:?}"),
        },
        other => panic!("expected a binding, got {other:?}"),
    }
}

#[test]
fn desugar_val_and_var_mutability() {
    let block = desugar_src("val a = 1\nvar b = 2");
    match (&block.statements[0], &block.statements[1]) {
        (CoreStmt::Let(a), CoreStmt::Let(b)) => {
            assert!(!a.mutable);
            assert!(b.mutable);
        }
        other => panic!("expected two bindings, got {other:?}"),
    }
}

#[test]
fn desugar_compact_lambda_gets_block_body() {
    let block = desugar_src("val id = (x) => x");
    match &block.statements[0] {
        CoreStmt::Let(decl) => match decl.init.as_ref() {
            CoreExpr::Lambda(lambda) => {
                assert_eq!(lambda.body.statements.len(), 1);
                assert!(matches!(
                    lambda.body.statements[0],
                    CoreStmt::Expr(CoreExpr::Var(_))
                ));
            }
            other => panic!("expected a lambda, got {other:?}"),
        },
        other => panic!("expected a binding, got {other:?}"),
    }
}

#[test]
fn desugar_preserves_control_flow() {
    let block = desugar_src("while x { break\ncontinue }\ndef f() { return 1 }");
    match &block.statements[0] {
        CoreStmt::Expr(CoreExpr::While(while_expr)) => {
            assert!(matches!(while_expr.body.statements[0], CoreStmt::Break(_)));
            assert!(matches!(
                while_expr.body.statements[1],
                CoreStmt::Continue(_)
            ));
        }
        other => panic!("expected a while, got {other:?}"),
    }
}

#[test]
fn desugar_preserves_positions() {
    let block = desugar_src("val x = 1\nx += 2");
    match &block.statements[0] {
        CoreStmt::Let(decl) => {
            assert_eq!(decl.span, Span::new(1, 1));
            assert_eq!(decl.init.span(), Span::new(1, 9));
        }
        other => panic!("expected a binding, got {other:?}"),
    }
    // The rewritten `x = x + 2` keeps the source positions of the original.
    match &block.statements[1] {
        CoreStmt::Expr(CoreExpr::Assign(assign)) => {
            assert_eq!(assign.span, Span::new(2, 1));
            match assign.value.as_ref() {
                CoreExpr::Binary(binary) => {
                    assert_eq!(binary.right.span(), Span::new(2, 6));
                }
                other => panic!("expected a binary op, got {other:?}"),
            }
        }
        other => panic!("expected an assignment, got {other:?}"),
    }
}

#[test]
fn desugar_is_deterministic() {
    let source = "def f(a, b = 2) { if a then b else b - 1 }\nval g = (x) => f(x)\n";
    assert_eq!(desugar_src(source), desugar_src(source));
}
