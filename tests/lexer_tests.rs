use pyrite::lexer::{lex, open_delimiters, TokenKind};
use pyrite::span::Span;

#[test]
fn lex_keywords() {
    let tokens = lex("def val var if then else while break continue return fn true false").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Def,
            TokenKind::Val,
            TokenKind::Var,
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Else,
            TokenKind::While,
            TokenKind::Break,
            TokenKind::Continue,
            TokenKind::Return,
            TokenKind::Fn,
            TokenKind::True,
            TokenKind::False,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_identifiers() {
    let tokens = lex("foo _bar baz42").unwrap();
    assert!(matches!(&tokens[0].kind, TokenKind::Ident(n) if n == "foo"));
    assert!(matches!(&tokens[1].kind, TokenKind::Ident(n) if n == "_bar"));
    assert!(matches!(&tokens[2].kind, TokenKind::Ident(n) if n == "baz42"));
}

#[test]
fn lex_keyword_prefix_is_identifier() {
    let tokens = lex("define valx").unwrap();
    assert!(matches!(&tokens[0].kind, TokenKind::Ident(n) if n == "define"));
    assert!(matches!(&tokens[1].kind, TokenKind::Ident(n) if n == "valx"));
}

#[test]
fn lex_integers() {
    let tokens = lex("0 42 123").unwrap();
    assert!(matches!(tokens[0].kind, TokenKind::Int(0)));
    assert!(matches!(tokens[1].kind, TokenKind::Int(42)));
    assert!(matches!(tokens[2].kind, TokenKind::Int(123)));
}

#[test]
fn lex_integer_overflow_is_an_error() {
    let err = lex("99999999999999999999").unwrap_err();
    assert!(err.to_string().starts_with("LexError:"));
    assert!(err.to_string().contains("out of range"));
}

#[test]
fn lex_string_literals_resolve_escapes() {
    let tokens = lex(r#""hello" "a\nb" "q\"q" "t\tt" "s\\s""#).unwrap();
    assert!(matches!(&tokens[0].kind, TokenKind::Str(s) if s == "hello"));
    assert!(matches!(&tokens[1].kind, TokenKind::Str(s) if s == "a\nb"));
    assert!(matches!(&tokens[2].kind, TokenKind::Str(s) if s == "q\"q"));
    assert!(matches!(&tokens[3].kind, TokenKind::Str(s) if s == "t\tt"));
    assert!(matches!(&tokens[4].kind, TokenKind::Str(s) if s == "s\\s"));
}

#[test]
fn lex_unknown_escape_is_an_error() {
    let err = lex(r#""a\qb""#).unwrap_err();
    assert!(err.to_string().contains("unknown escape"));
}

#[test]
fn lex_unterminated_string_points_at_opening_quote() {
    let err = lex("val s = \"oops").unwrap_err();
    assert_eq!(err.span(), Span::new(1, 9));
    assert_eq!(err.message(), "unterminated string");
}

#[test]
fn lex_operators_maximal_munch() {
    let tokens = lex("== != <= >= && || += -= => -> = < > + - ! %").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::EqEq,
            TokenKind::NotEq,
            TokenKind::LtEq,
            TokenKind::GtEq,
            TokenKind::AndAnd,
            TokenKind::OrOr,
            TokenKind::PlusAssign,
            TokenKind::MinusAssign,
            TokenKind::FatArrow,
            TokenKind::Arrow,
            TokenKind::Assign,
            TokenKind::Lt,
            TokenKind::Gt,
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Bang,
            TokenKind::Percent,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_adjacent_multichar_operators() {
    // `x<=y` must not split into `<` `=`.
    let tokens = lex("x<=y").unwrap();
    assert!(matches!(tokens[1].kind, TokenKind::LtEq));
}

#[test]
fn lex_newlines_are_tokens() {
    let tokens = lex("a\nb\n").unwrap();
    let newlines = tokens
        .iter()
        .filter(|t| matches!(t.kind, TokenKind::Newline))
        .count();
    assert_eq!(newlines, 2);
}

#[test]
fn lex_comments_run_to_end_of_line() {
    let tokens = lex("a // a comment with val and }\nb").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Ident("a".to_string()),
            TokenKind::Newline,
            TokenKind::Ident("b".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn lex_unexpected_character() {
    let err = lex("val x = @").unwrap_err();
    assert!(err.to_string().contains("unexpected character '@'"));
    assert_eq!(err.span(), Span::new(1, 9));
}

#[test]
fn lex_always_ends_with_eof() {
    let tokens = lex("").unwrap();
    assert_eq!(tokens.len(), 1);
    assert!(matches!(tokens[0].kind, TokenKind::Eof));
}

#[test]
fn balance_counting_skips_strings_and_comments() {
    assert_eq!(open_delimiters("def f(a, b) {"), 1);
    assert_eq!(open_delimiters("def f(a, b) { a + b }"), 0);
    assert_eq!(open_delimiters("print(\"}}}\")"), 0);
    assert_eq!(open_delimiters("( // )"), 1);
    assert_eq!(open_delimiters("}"), -1);
}
