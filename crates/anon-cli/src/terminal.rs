//! Console output and yes/no questions, over any reader and writer so
//! commands can be run in tests.

use std::io::{self, BufRead, Write};

pub struct Terminal<'a> {
    out: &'a mut dyn Write,
    input: &'a mut dyn BufRead,
    /// Answer yes to every confirmation without asking.
    assume_yes: bool,
}

impl<'a> Terminal<'a> {
    pub fn new(out: &'a mut dyn Write, input: &'a mut dyn BufRead) -> Self {
        Self {
            out,
            input,
            assume_yes: false,
        }
    }

    #[must_use]
    pub fn assume_yes(mut self, assume_yes: bool) -> Self {
        self.assume_yes = assume_yes;
        self
    }

    /// Stop asking for confirmation when `yes` is set.
    pub fn answer_yes_if(&mut self, yes: bool) {
        self.assume_yes |= yes;
    }

    pub fn say(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        writeln!(self.out, "{}", message.as_ref())
    }

    /// Ask a yes/no question. Anything but y or yes is no.
    pub fn confirm(&mut self, question: &str) -> io::Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        write!(self.out, "{question} [y/N]: ")?;
        self.out.flush()?;
        let answer = self.read_line()?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }

    /// Ask for a value. An empty answer gives `default`.
    pub fn prompt(&mut self, question: &str, default: &str) -> io::Result<String> {
        write!(self.out, "{question} [{default}]: ")?;
        self.out.flush()?;
        let answer = self.read_line()?;
        if answer.is_empty() {
            Ok(default.to_string())
        } else {
            Ok(answer)
        }
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirm() {
        let mut out = Vec::new();
        let mut input = "y\n".as_bytes();
        let mut terminal = Terminal::new(&mut out, &mut input);
        assert!(terminal.confirm("Sure?").unwrap());
        assert!(!terminal.confirm("Again?").unwrap());
        assert!(String::from_utf8(out).unwrap().starts_with("Sure? [y/N]: "));
    }

    #[test]
    fn test_assume_yes_does_not_read() {
        let mut out = Vec::new();
        let mut input = "n\n".as_bytes();
        let mut terminal = Terminal::new(&mut out, &mut input).assume_yes(true);
        assert!(terminal.confirm("Sure?").unwrap());
        assert!(out.is_empty());
    }

    #[test]
    fn test_prompt_default() {
        let mut out = Vec::new();
        let mut input = "\nvalue\n".as_bytes();
        let mut terminal = Terminal::new(&mut out, &mut input);
        assert_eq!(terminal.prompt("Name", "x").unwrap(), "x");
        assert_eq!(terminal.prompt("Name", "x").unwrap(), "value");
    }
}
