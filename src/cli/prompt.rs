//! Commit prompts
//!
//! Asks the operator the commit question, on a terminal with dialoguer or
//! from plain line input when stdin is piped.

use console::Term;
use dialoguer::{theme::ColorfulTheme, Input};
use is_terminal::IsTerminal;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;
use tracing::debug;

use crate::transaction::{is_affirmative, Confirmation};

/// Prompt on the controlling terminal.
///
/// Falls back to reading one line from stdin when stdin or stdout is not
/// a terminal. Any read failure declines.
pub struct TerminalPrompt {
    term: Term,
    theme: ColorfulTheme,
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPrompt {
    /// Create a new terminal prompt
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
            theme: ColorfulTheme::default(),
        }
    }

    fn interactive() -> bool {
        io::stdin().is_terminal() && io::stdout().is_terminal()
    }
}

impl Confirmation for TerminalPrompt {
    fn confirm(&self, question: &str) -> bool {
        if !Self::interactive() {
            let stdin = io::stdin();
            return LinePrompt::new(stdin.lock()).ask(question);
        }

        let answer: Result<String, _> = Input::with_theme(&self.theme)
            .with_prompt(question.trim_end())
            .allow_empty(true)
            .interact_text_on(&self.term);

        match answer {
            Ok(answer) => is_affirmative(&answer),
            Err(e) => {
                debug!(error = %e, "prompt aborted");
                false
            }
        }
    }
}

/// Prompt that reads answers line by line from any reader.
pub struct LinePrompt<R> {
    input: Mutex<R>,
}

impl<R: BufRead> LinePrompt<R> {
    /// Wrap a reader
    pub fn new(input: R) -> Self {
        Self {
            input: Mutex::new(input),
        }
    }

    /// Print `question` and read one answer line.
    pub fn ask(&self, question: &str) -> bool {
        print!("{}", question);
        let _ = io::stdout().flush();

        match self.read_answer() {
            Some(answer) => is_affirmative(&answer),
            None => {
                // EOF leaves the cursor on the prompt line
                println!();
                false
            }
        }
    }

    fn read_answer(&self) -> Option<String> {
        let mut input = self.input.lock().ok()?;
        let mut line = String::new();
        match input.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line),
            Err(e) => {
                debug!(error = %e, "failed to read answer");
                None
            }
        }
    }
}

impl<R: BufRead + Send> Confirmation for LinePrompt<R> {
    fn confirm(&self, question: &str) -> bool {
        self.ask(question)
    }
}
