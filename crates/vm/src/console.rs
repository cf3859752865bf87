//! Text input and output used by the I/O opcodes.
//!
//! A [`Console`] is either wired to the process's stdio or fully captured,
//! so tests and embedders can script input and inspect output.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};

#[derive(Debug)]
enum Input {
    Stdin,
    Scripted(VecDeque<String>),
}

#[derive(Debug)]
enum Output {
    Stdout,
    Stderr,
    Captured(Vec<u8>),
}

impl Output {
    fn write_line(&mut self, text: &str) -> io::Result<()> {
        match self {
            Output::Stdout => writeln!(io::stdout().lock(), "{text}"),
            Output::Stderr => writeln!(io::stderr().lock(), "{text}"),
            Output::Captured(buf) => {
                buf.extend_from_slice(text.as_bytes());
                buf.push(b'\n');
                Ok(())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout => io::stdout().flush(),
            Output::Stderr => io::stderr().flush(),
            Output::Captured(_) => Ok(()),
        }
    }

    fn captured(&self) -> &str {
        match self {
            Output::Captured(buf) => std::str::from_utf8(buf).unwrap_or_default(),
            _ => "",
        }
    }
}

/// Line-oriented input, program output, and a diagnostics channel.
#[derive(Debug)]
pub struct Console {
    input: Input,
    output: Output,
    diagnostics: Output,
}

impl Console {
    /// Stdin for input, stdout for output, stderr for diagnostics.
    pub fn stdio() -> Self {
        Self {
            input: Input::Stdin,
            output: Output::Stdout,
            diagnostics: Output::Stderr,
        }
    }

    /// Scripted input lines; output and diagnostics are captured.
    pub fn captured<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: Input::Scripted(input.into_iter().map(Into::into).collect()),
            output: Output::Captured(Vec::new()),
            diagnostics: Output::Captured(Vec::new()),
        }
    }

    /// Read one line without its terminator. `None` at end of input.
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        match &mut self.input {
            Input::Scripted(lines) => Ok(lines.pop_front()),
            Input::Stdin => {
                self.output.flush()?;
                let mut line = String::new();
                if io::stdin().lock().read_line(&mut line)? == 0 {
                    return Ok(None);
                }
                let trimmed = line.trim_end_matches(['\r', '\n']).len();
                line.truncate(trimmed);
                Ok(Some(line))
            }
        }
    }

    /// Write one line of program output.
    pub fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.output.write_line(text)
    }

    /// Write one line to the diagnostics channel.
    pub fn diagnostic(&mut self, text: &str) -> io::Result<()> {
        self.diagnostics.write_line(text)
    }

    /// Captured program output. Empty when wired to stdio.
    pub fn output(&self) -> &str {
        self.output.captured()
    }

    /// Captured diagnostics. Empty when wired to stdio.
    pub fn diagnostics(&self) -> &str {
        self.diagnostics.captured()
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::stdio()
    }
}
