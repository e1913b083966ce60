//! Tests for the REPL's input accumulation: prompt switching, multi-line
//! continuation while delimiters are unbalanced, interrupt handling, and
//! the quit commands. The evaluation half of the loop is covered by the
//! incremental-session tests in `integration_tests.rs`.

use pyrite::runner::repl::{is_quit_command, BlockReader};

/// Feed lines until a block completes; returns the block and the prompt
/// shown before each line.
fn feed(lines: &[&str]) -> (Option<String>, Vec<&'static str>) {
    let mut reader = BlockReader::new();
    let mut prompts = Vec::new();
    for line in lines {
        prompts.push(reader.prompt());
        if let Some(block) = reader.push_line(line) {
            return (Some(block), prompts);
        }
    }
    (None, prompts)
}

#[test]
fn balanced_line_submits_immediately() {
    let (block, prompts) = feed(&["val x = 1"]);
    assert_eq!(block.as_deref(), Some("val x = 1\n"));
    assert_eq!(prompts, vec!["> "]);
}

#[test]
fn unbalanced_braces_continue_until_closed() {
    let (block, prompts) = feed(&["def f(n) {", "    n + 1", "}"]);
    assert_eq!(block.as_deref(), Some("def f(n) {\n    n + 1\n}\n"));
    assert_eq!(prompts, vec!["> ", "... ", "... "]);
}

#[test]
fn unbalanced_parens_continue_until_closed() {
    let (block, _) = feed(&["val x = (1 +", "2)"]);
    assert_eq!(block.as_deref(), Some("val x = (1 +\n2)\n"));
}

#[test]
fn nested_delimiters_need_every_closer() {
    let (block, prompts) = feed(&["def f() { g(", "1)", "}"]);
    assert!(block.is_some());
    assert_eq!(prompts, vec!["> ", "... ", "... "]);
}

#[test]
fn blank_line_at_primary_prompt_is_ignored() {
    let mut reader = BlockReader::new();
    assert_eq!(reader.push_line(""), None);
    assert_eq!(reader.push_line("   "), None);
    assert!(reader.is_empty());
    assert_eq!(reader.prompt(), "> ");
}

#[test]
fn blank_lines_inside_an_unbalanced_block_are_kept() {
    let (block, _) = feed(&["def f() {", "", "1 }"]);
    assert_eq!(block.as_deref(), Some("def f() {\n\n1 }\n"));
}

#[test]
fn delimiters_in_strings_and_comments_do_not_continue() {
    let (block, _) = feed(&["val s = \"{ (\""]);
    assert!(block.is_some());
    let (block, _) = feed(&["val n = 1 // } )"]);
    assert!(block.is_some());
}

#[test]
fn extra_closers_submit_for_the_parser_to_reject() {
    // The parser owns the error; the reader must not wait forever.
    let (block, _) = feed(&["val x = 1)"]);
    assert!(block.is_some());
}

#[test]
fn interrupt_discards_the_pending_input() {
    let mut reader = BlockReader::new();
    assert_eq!(reader.push_line("def f() {"), None);
    assert_eq!(reader.prompt(), "... ");

    reader.interrupt();
    assert!(reader.is_empty());
    assert_eq!(reader.prompt(), "> ");

    // The next line starts a fresh block.
    assert_eq!(reader.push_line("1 + 1").as_deref(), Some("1 + 1\n"));
}

#[test]
fn completed_block_resets_the_reader() {
    let mut reader = BlockReader::new();
    assert!(reader.push_line("val a = 1").is_some());
    assert!(reader.is_empty());
    assert_eq!(reader.prompt(), "> ");
    assert_eq!(reader.push_line("val b = 2").as_deref(), Some("val b = 2\n"));
}

#[test]
fn quit_commands() {
    assert!(is_quit_command(":quit"));
    assert!(is_quit_command(":q"));
    assert!(is_quit_command("  :quit \n"));
    assert!(!is_quit_command(":quitx"));
    assert!(!is_quit_command("quit"));
    assert!(!is_quit_command("val q = 1"));
}
