//! Line input for the console.

use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};

use dialoguer::theme::Theme;
use dialoguer::{Input, Password};

/// Source of operator input.
///
/// `Ok(None)` means the input ended: end-of-file or an interrupt.
pub trait Terminal {
    /// Read one line after showing `prompt` verbatim.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;

    /// Like [`Terminal::read_line`] but without echo where possible.
    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.read_line(prompt)
    }
}

/// Prompts rendered exactly as given, without the default theme's `: `.
struct PlainTheme;

impl Theme for PlainTheme {
    fn format_input_prompt(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        _default: Option<&str>,
    ) -> fmt::Result {
        write!(f, "{prompt}")
    }

    fn format_input_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
        sel: &str,
    ) -> fmt::Result {
        write!(f, "{prompt}{sel}")
    }

    fn format_password_prompt(&self, f: &mut dyn fmt::Write, prompt: &str) -> fmt::Result {
        write!(f, "{prompt}")
    }

    fn format_password_prompt_selection(
        &self,
        f: &mut dyn fmt::Write,
        prompt: &str,
    ) -> fmt::Result {
        write!(f, "{prompt}********")
    }
}

/// Stdin-backed terminal.
///
/// Uses `dialoguer` when attached to a TTY and plain buffered reads
/// otherwise, so the console can be driven from a pipe.
pub struct StdTerminal {
    interactive: bool,
}

impl StdTerminal {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal() && io::stdout().is_terminal(),
        }
    }

    fn read_piped(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

impl Default for StdTerminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminal for StdTerminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !self.interactive {
            return self.read_piped(prompt);
        }
        let result = Input::<String>::with_theme(&PlainTheme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text();
        ended_on_interrupt(result)
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !self.interactive {
            return self.read_piped(prompt);
        }
        let result = Password::with_theme(&PlainTheme)
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact();
        ended_on_interrupt(result)
    }
}

/// Fold Ctrl-C / Ctrl-D into `Ok(None)`.
fn ended_on_interrupt(result: dialoguer::Result<String>) -> io::Result<Option<String>> {
    match result {
        Ok(line) => Ok(Some(line)),
        #[allow(unreachable_patterns)]
        Err(err) => match err {
            dialoguer::Error::IO(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::Interrupted | io::ErrorKind::UnexpectedEof
                ) =>
            {
                Ok(None)
            }
            dialoguer::Error::IO(e) => Err(e),
            other => Err(io::Error::other(other.to_string())),
        },
    }
}
