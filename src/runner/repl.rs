//! The REPL
//!
//! Reads logical input blocks (multi-line while `{`/`(` are unbalanced),
//! runs them through the incremental pipeline, and prints either the
//! resulting value or the failure. Persisted state is swapped in only after
//! an input has fully succeeded, so a failure at any stage leaves the
//! session exactly as it was.
//!
//! Line accumulation lives in [`BlockReader`] so the continuation logic can
//! be driven without a terminal; [`run`] wires it to rustyline.

use std::io;
use std::mem;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use crate::interpreter::StdinReader;
use crate::lexer::open_delimiters;

use super::{run_eval_incremental, SessionState};

const PROMPT: &str = "> ";
const CONTINUE_PROMPT: &str = "... ";

/// Accumulates raw lines into logical input blocks. An input is complete
/// when its `{`/`(` are balanced (counted outside strings and comments)
/// and the current line is non-empty; a blank line also submits an
/// accumulated balanced block unchanged.
#[derive(Debug, Default)]
pub struct BlockReader {
    buffer: String,
}

impl BlockReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// The prompt for the next line: primary, or continuation while an
    /// input is pending.
    pub fn prompt(&self) -> &'static str {
        if self.buffer.is_empty() {
            PROMPT
        } else {
            CONTINUE_PROMPT
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Feed one line; returns the completed block once the input is done.
    /// Blank lines at the primary prompt are ignored.
    pub fn push_line(&mut self, line: &str) -> Option<String> {
        let blank = line.trim().is_empty();
        if self.buffer.is_empty() && blank {
            return None;
        }
        if blank && open_delimiters(&self.buffer) <= 0 {
            return Some(mem::take(&mut self.buffer));
        }
        self.buffer.push_str(line);
        self.buffer.push('\n');
        if !blank && open_delimiters(&self.buffer) <= 0 {
            return Some(mem::take(&mut self.buffer));
        }
        None
    }

    /// Ctrl-C: discard the pending input and return to the primary prompt.
    pub fn interrupt(&mut self) {
        self.buffer.clear();
    }
}

/// `:quit` and `:q` end the session, like Ctrl-D.
pub fn is_quit_command(input: &str) -> bool {
    matches!(input.trim(), ":quit" | ":q")
}

/// Run the interactive loop until Ctrl-D or `:quit`.
pub fn run() -> anyhow::Result<()> {
    let mut editor = DefaultEditor::new()?;
    let mut blocks = BlockReader::new();
    let mut state = SessionState::new();

    println!(
        "pyrite {} — Ctrl-D or :quit to exit",
        env!("CARGO_PKG_VERSION")
    );

    loop {
        match editor.readline(blocks.prompt()) {
            Ok(line) => {
                let Some(input) = blocks.push_line(&line) else {
                    continue;
                };
                if is_quit_command(&input) {
                    break;
                }
                let _ = editor.add_history_entry(input.trim());

                let mut out = io::stdout();
                let mut reader = StdinReader;
                match run_eval_incremental(&state, &input, &mut out, &mut reader) {
                    Ok((value, next_state)) => {
                        state = next_state;
                        if !value.is_unit() {
                            println!("{}", value.stringify());
                        }
                    }
                    Err(err) if err.is_internal() => {
                        eprintln!("{err}");
                        std::process::exit(1);
                    }
                    Err(err) => println!("{err}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                blocks.interrupt();
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {err}");
                break;
            }
        }
    }

    Ok(())
}
