//! # Terminal Console
//!
//! Prompting and output primitives for the menu shell.
//!
//! ## Design
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Console<R, W>                                   │
//! │                                                                         │
//! │  Production:  Console::stdio()   → BufReader<Stdin> / Stdout            │
//! │  Tests:       Console::new(...)  → Cursor<&[u8]>   / Vec<u8>            │
//! │                                                                         │
//! │  Every prompt reads one trimmed line. `back` or `X` (any case) aborts   │
//! │  the current sub-flow; typed prompts re-ask on bad input, at most       │
//! │  MAX_ATTEMPTS times, in a bounded loop.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use colored::Colorize;
use std::fmt::Display;
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

use usms_core::Money;

/// How many times a typed prompt re-asks before the sub-flow aborts.
pub const MAX_ATTEMPTS: u32 = 5;

/// Returns true when the input is a sub-flow abort sentinel.
pub fn is_exit(input: &str) -> bool {
    let lower = input.trim().to_ascii_lowercase();
    lower == "x" || lower == "back"
}

/// A line-oriented console over an injectable reader and writer.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl Console<BufReader<Stdin>, Stdout> {
    /// The production console over stdin/stdout.
    pub fn stdio() -> Self {
        Console {
            input: BufReader::new(io::stdin()),
            output: io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Console { input, output }
    }

    // =========================================================================
    // Output
    // =========================================================================

    /// Plain line of output.
    pub fn say(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }

    /// Green success line.
    pub fn success(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", text.to_string().green())
    }

    /// Red error line.
    pub fn error(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", text.to_string().red())
    }

    /// Yellow warning line.
    pub fn warn(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{}", text.to_string().yellow())
    }

    /// Section heading with separators.
    pub fn heading(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", format!("=== {title} ===").cyan().bold())
    }

    pub fn blank(&mut self) -> io::Result<()> {
        writeln!(self.output)
    }

    // =========================================================================
    // Input
    // =========================================================================

    /// Reads one trimmed line after printing a prompt. EOF reads as the
    /// exit sentinel so a closed stdin unwinds every menu.
    pub fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        let bytes = self.input.read_line(&mut line)?;
        if bytes == 0 {
            return Ok("x".to_string());
        }
        Ok(line.trim().to_string())
    }

    /// Reads a line; `None` when the operator backs out (`back`/`X`/EOF).
    /// Empty input comes back as `Some("")` so blank-keeps-current flows
    /// can use it.
    pub fn prompt(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let line = self.read_line(prompt)?;
        if is_exit(&line) {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Reads a non-empty line, re-asking on blank input.
    pub fn prompt_nonempty(&mut self, prompt: &str) -> io::Result<Option<String>> {
        for _ in 0..MAX_ATTEMPTS {
            match self.prompt(prompt)? {
                None => return Ok(None),
                Some(line) if line.is_empty() => {
                    self.error("Input cannot be empty.")?;
                }
                Some(line) => return Ok(Some(line)),
            }
        }
        self.error("Too many invalid attempts.")?;
        Ok(None)
    }

    /// Reads an integer, re-asking on unparsable input.
    pub fn prompt_i64(&mut self, prompt: &str) -> io::Result<Option<i64>> {
        for _ in 0..MAX_ATTEMPTS {
            match self.prompt(prompt)? {
                None => return Ok(None),
                Some(line) => match line.parse::<i64>() {
                    Ok(value) => return Ok(Some(value)),
                    Err(_) => self.error("Please enter a whole number.")?,
                },
            }
        }
        self.error("Too many invalid attempts.")?;
        Ok(None)
    }

    /// Reads an integer within an inclusive range.
    pub fn prompt_i64_in(&mut self, prompt: &str, min: i64, max: i64) -> io::Result<Option<i64>> {
        for _ in 0..MAX_ATTEMPTS {
            match self.prompt(prompt)? {
                None => return Ok(None),
                Some(line) => match line.parse::<i64>() {
                    Ok(value) if (min..=max).contains(&value) => return Ok(Some(value)),
                    _ => self.error(format!("Please enter a number from {min} to {max}."))?,
                },
            }
        }
        self.error("Too many invalid attempts.")?;
        Ok(None)
    }

    /// Reads a peso amount like `250` or `250.00`.
    pub fn prompt_money(&mut self, prompt: &str) -> io::Result<Option<Money>> {
        for _ in 0..MAX_ATTEMPTS {
            match self.prompt(prompt)? {
                None => return Ok(None),
                Some(line) => match Money::parse(&line) {
                    Some(amount) if !amount.is_negative() => return Ok(Some(amount)),
                    _ => self.error("Please enter an amount like 250 or 250.00.")?,
                },
            }
        }
        self.error("Too many invalid attempts.")?;
        Ok(None)
    }

    /// Y/N confirmation. Backing out or exhausting attempts counts as no.
    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        for _ in 0..MAX_ATTEMPTS {
            let line = self.read_line(&format!("{prompt} [Y/N]: "))?;
            match line.to_ascii_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" | "x" | "back" => return Ok(false),
                _ => self.error("Please answer Y or N.")?,
            }
        }
        Ok(false)
    }

    /// Waits for Enter before redrawing the menu.
    pub fn pause(&mut self) -> io::Result<()> {
        self.read_line("\nPress Enter to continue...")?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn console(input: &str) -> Console<Cursor<Vec<u8>>, Vec<u8>> {
        Console::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_exit_sentinels() {
        assert!(is_exit("x"));
        assert!(is_exit(" X "));
        assert!(is_exit("BACK"));
        assert!(!is_exit("xx"));
        assert!(!is_exit("3"));
    }

    #[test]
    fn test_prompt_i64_retries_then_succeeds() {
        let mut c = console("abc\n\n42\n");
        assert_eq!(c.prompt_i64("qty: ").unwrap(), Some(42));
    }

    #[test]
    fn test_prompt_i64_aborts_on_back() {
        let mut c = console("back\n");
        assert_eq!(c.prompt_i64("qty: ").unwrap(), None);
    }

    #[test]
    fn test_prompt_i64_gives_up_after_max_attempts() {
        let mut c = console("a\nb\nc\nd\ne\n42\n");
        assert_eq!(c.prompt_i64("qty: ").unwrap(), None);
    }

    #[test]
    fn test_prompt_i64_in_enforces_range() {
        let mut c = console("0\n11\n7\n");
        assert_eq!(c.prompt_i64_in("page: ", 1, 10).unwrap(), Some(7));
    }

    #[test]
    fn test_eof_reads_as_exit() {
        let mut c = console("");
        assert_eq!(c.prompt("name: ").unwrap(), None);
    }

    #[test]
    fn test_prompt_money() {
        let mut c = console("cheap\n250.00\n");
        assert_eq!(c.prompt_money("price: ").unwrap(), Some(Money::from_cents(25000)));
    }

    #[test]
    fn test_confirm() {
        let mut c = console("maybe\nY\n");
        assert!(c.confirm("Proceed?").unwrap());

        let mut c = console("n\n");
        assert!(!c.confirm("Proceed?").unwrap());

        // Backing out is a refusal
        let mut c = console("x\n");
        assert!(!c.confirm("Proceed?").unwrap());
    }

    #[test]
    fn test_blank_input_passes_through_prompt() {
        let mut c = console("\n");
        assert_eq!(c.prompt("keep current: ").unwrap(), Some(String::new()));
    }
}
