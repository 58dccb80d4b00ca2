//! Line-oriented terminal I/O for the interactive menus

use std::fmt::Display;
use std::io::{self, BufRead, BufReader, IsTerminal, Stdin, Stdout, Write};

/// Reads answers from `input` and writes prompts to `output`
pub struct Console<R, W> {
    input: R,
    output: W,
    /// Read secrets from the terminal with echo disabled
    hide_secrets: bool,
}

impl Console<BufReader<Stdin>, Stdout> {
    pub fn stdio() -> Self {
        Self {
            hide_secrets: io::stdin().is_terminal(),
            ..Self::new(BufReader::new(io::stdin()), io::stdout())
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            hide_secrets: false,
        }
    }

    /// Print one line
    pub fn say(&mut self, line: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", line)
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Like [`ask`](Self::ask), but the answer is not echoed on a terminal
    pub fn ask_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        if !self.hide_secrets {
            return self.ask(prompt);
        }

        let password = dialoguer::Password::new()
            .with_prompt(prompt.trim_end().trim_end_matches(':'))
            .allow_empty_password(true)
            .interact()
            .map_err(io::Error::other)?;
        Ok(Some(password.trim().to_string()))
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}
