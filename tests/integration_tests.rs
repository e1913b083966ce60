//! End-to-end pipeline scenarios, including incremental (REPL-style) runs
//! against persisted session state.

use std::collections::VecDeque;
use std::io;

use pyrite::interpreter::{LineReader, Value};
use pyrite::runner::{run_eval, run_eval_incremental, run_source, PipelineResult, SessionState};

struct ScriptedReader(VecDeque<String>);

impl LineReader for ScriptedReader {
    fn read_line(&mut self) -> io::Result<Option<String>> {
        Ok(self.0.pop_front())
    }
}

fn no_input() -> ScriptedReader {
    ScriptedReader(VecDeque::new())
}

fn run(source: &str) -> (PipelineResult<Value>, String) {
    let mut out = Vec::new();
    let mut reader = no_input();
    let result = run_eval(source, &mut out, &mut reader);
    (result, String::from_utf8(out).expect("output was not UTF-8"))
}

/// Run one input against `state`, swapping the state in on success, like
/// the REPL does.
fn step(state: &mut SessionState, source: &str) -> Result<(Value, String), String> {
    let mut out = Vec::new();
    let mut reader = no_input();
    match run_eval_incremental(state, source, &mut out, &mut reader) {
        Ok((value, next_state)) => {
            *state = next_state;
            Ok((value, String::from_utf8(out).expect("output was not UTF-8")))
        }
        Err(err) => Err(err.to_string()),
    }
}

#[test]
fn e2e_print_addition() {
    let (result, output) = run("print(1 + 2)");
    assert!(matches!(result, PipelineResult::Success(Value::Unit)));
    assert_eq!(output, "3\n");
}

#[test]
fn e2e_mutual_recursion() {
    let source = "
def isEven(n) { if n == 0 then true else isOdd(n - 1) }
def isOdd(n)  { if n == 0 then false else isEven(n - 1) }
print(isEven(4))
";
    let (result, output) = run(source);
    assert!(result.is_success());
    assert_eq!(output, "true\n");
}

#[test]
fn e2e_default_argument() {
    let (result, _) = run("def add(a, b = 42) { a + b } add(8)");
    assert!(matches!(result, PipelineResult::Success(Value::Int(50))));
}

#[test]
fn e2e_val_reassignment_is_a_type_error() {
    let (result, _) = run("val x = 1\nx = 2");
    match result {
        PipelineResult::Failure(message) => {
            assert!(message.starts_with("TypeError: cannot assign to immutable binding 'x' at"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn e2e_min_arity_is_a_type_error() {
    let (result, _) = run("min(3)");
    match result {
        PipelineResult::Failure(message) => {
            assert!(message.starts_with("TypeError: min requires at least 2 arguments at"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn e2e_repl_session_preserves_state_across_failures() {
    let mut state = SessionState::new();

    let (value, _) = step(&mut state, "val a = 10").expect("first input failed");
    assert!(value.is_unit());

    let (value, _) = step(&mut state, "a + 5").expect("second input failed");
    assert!(matches!(value, Value::Int(15)));

    let err = step(&mut state, "a = \"hi\"").expect_err("expected a type error");
    assert!(err.starts_with("TypeError:"));

    // Prior state is intact: `a` is still 10.
    let (_, output) = step(&mut state, "print(a)").expect("fourth input failed");
    assert_eq!(output, "10\n");
}

#[test]
fn e2e_repl_session_accumulates_definitions() {
    let mut state = SessionState::new();
    step(&mut state, "def inc(n) { n + 1 }").unwrap();
    step(&mut state, "var total = 0").unwrap();
    step(&mut state, "total = inc(total)").unwrap();
    step(&mut state, "total = inc(total)").unwrap();
    let (value, _) = step(&mut state, "total").unwrap();
    assert!(matches!(value, Value::Int(2)));
}

#[test]
fn e2e_failed_eval_rolls_back_typecheck_bindings() {
    let mut state = SessionState::new();
    // Typecheck succeeds but evaluation fails; the binding for `b` must
    // not survive into the next input.
    let err = step(&mut state, "val b = 1 / 0").expect_err("expected a runtime error");
    assert!(err.starts_with("RuntimeError: division by zero"));

    let err = step(&mut state, "b").expect_err("b must be undefined");
    assert!(err.starts_with("TypeError: undefined: b"));
}

#[test]
fn e2e_redefinition_in_a_later_input() {
    let mut state = SessionState::new();
    step(&mut state, "val x = 1").unwrap();
    step(&mut state, "val x = \"now a string\"").unwrap();
    let (value, _) = step(&mut state, "x + \"!\"").unwrap();
    assert!(matches!(value, Value::Str(s) if s == "now a string!"));
}

#[test]
fn e2e_closures_defined_in_one_input_run_in_later_ones() {
    let mut state = SessionState::new();
    step(&mut state, "def makeCounter() { var n = 0\nfn() { n += 1\nn } }").unwrap();
    step(&mut state, "val tick = makeCounter()").unwrap();
    step(&mut state, "tick()").unwrap();
    let (value, _) = step(&mut state, "tick()").unwrap();
    assert!(matches!(value, Value::Int(2)));
}

#[test]
fn e2e_store_grows_monotonically_across_inputs() {
    let mut state = SessionState::new();
    let before = state.store.len();
    step(&mut state, "val a = 1").unwrap();
    let after_one = state.store.len();
    assert!(after_one > before);
    step(&mut state, "val b = 2").unwrap();
    assert!(state.store.len() > after_one);
}

#[test]
fn e2e_parse_error_leaves_state_untouched() {
    let mut state = SessionState::new();
    step(&mut state, "val a = 1").unwrap();
    let store_len = state.store.len();

    let err = step(&mut state, "val = ").expect_err("expected a parse error");
    assert!(err.starts_with("ParseError:"));
    assert_eq!(state.store.len(), store_len);

    let (value, _) = step(&mut state, "a").unwrap();
    assert!(matches!(value, Value::Int(1)));
}

#[test]
fn e2e_lex_error_includes_position() {
    let (result, _) = run("val s = \"unterminated");
    match result {
        PipelineResult::Failure(message) => {
            assert_eq!(message, "LexError: unterminated string at 1:9");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn e2e_break_outside_while_is_rejected_before_eval() {
    let (result, output) = run("print(\"side effect\")\nbreak");
    match result {
        PipelineResult::Failure(message) => {
            assert!(message.starts_with("TypeError: break outside while"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
    // The type check failed, so nothing ran.
    assert_eq!(output, "");
}

#[test]
fn e2e_run_source_executes_in_memory_programs() {
    // File-mode semantics without a file: fresh session per call.
    let result = run_source("def square(n) { n * n }\nsquare(7)");
    assert!(matches!(result, PipelineResult::Success(Value::Int(49))));

    let result = run_source("val x = 1\nx");
    assert!(matches!(result, PipelineResult::Success(Value::Int(1))));
}

#[test]
fn e2e_run_source_reports_failures() {
    match run_source("1 / 0") {
        PipelineResult::Failure(message) => {
            assert!(message.starts_with("RuntimeError: division by zero"));
        }
        other => panic!("unexpected result: {other:?}"),
    }

    match run_source("val x = 1\nx = 2") {
        PipelineResult::Failure(message) => assert!(message.starts_with("TypeError:")),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn e2e_run_source_sessions_are_independent() {
    assert!(run_source("val solo = 1").is_success());
    match run_source("solo") {
        PipelineResult::Failure(message) => {
            assert!(message.starts_with("TypeError: undefined: solo"));
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn e2e_whole_program_with_io() {
    let source = r#"
def greet(name, punct = "!") { "hello, " + name + punct }
val msg = greet("world")
print(msg)
print(greet("pyrite", "?"))
"#;
    let (result, output) = run(source);
    assert!(result.is_success());
    assert_eq!(output, "hello, world!\nhello, pyrite?\n");
}
