use anyhow::{Context, Result};
use std::fmt::Display;
use std::io::{BufRead, Write};
use thiserror::Error;

/// Typed at any cancelable prompt to go back to the menu.
pub const CANCEL: &str = "q";

/// Standard input reached end of file.
#[derive(Debug, Error)]
#[error("input closed")]
pub struct InputClosed;

/// Line-oriented prompts over any reader/writer pair.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Print one line.
    pub fn say(&mut self, line: impl Display) -> Result<()> {
        writeln!(self.output, "{line}").context("Failed to write output")
    }

    /// Print `prompt` and read one trimmed line. Fails with [`InputClosed`] at EOF.
    pub fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{prompt}").context("Failed to write output")?;
        self.output.flush().context("Failed to flush output")?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read input")?;
        if read == 0 {
            return Err(InputClosed.into());
        }
        Ok(line.trim().to_string())
    }

    /// Ask until a non-empty answer is given.
    pub fn ask_required(&mut self, prompt: &str) -> Result<String> {
        loop {
            let value = self.ask(prompt)?;
            if !value.is_empty() {
                return Ok(value);
            }
            self.say("❌ Input cannot be empty.")?;
        }
    }

    /// Like [`Self::ask`], but `q` cancels and yields `None`.
    pub fn ask_cancelable(&mut self, prompt: &str) -> Result<Option<String>> {
        let value = self.ask(prompt)?;
        self.check_cancel(value)
    }

    /// Like [`Self::ask_required`], but `q` cancels and yields `None`.
    pub fn ask_required_cancelable(&mut self, prompt: &str) -> Result<Option<String>> {
        let value = self.ask_required(prompt)?;
        self.check_cancel(value)
    }

    /// Yes/no question; only `y` counts as yes.
    pub fn confirm(&mut self, prompt: &str) -> Result<bool> {
        Ok(self.ask(prompt)?.eq_ignore_ascii_case("y"))
    }

    pub fn into_inner(self) -> (R, W) {
        (self.input, self.output)
    }

    fn check_cancel(&mut self, value: String) -> Result<Option<String>> {
        if value.eq_ignore_ascii_case(CANCEL) {
            self.say("↩️  Returning to main menu...")?;
            return Ok(None);
        }
        Ok(Some(value))
    }
}
