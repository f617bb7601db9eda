use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::fmt;
use std::io::{self, Write};

/// Line-oriented console the interpreter talks to.
///
/// `read_line` blocks until a full line is available and returns it without
/// the trailing newline; `write_line` appends one. Reads are the only
/// suspension points of the whole interpreter, so "the process was killed
/// while waiting for input" is the normal crash scenario the snapshot design
/// recovers from.
pub trait UserConsole {
    fn read_line(&mut self) -> Result<String>;

    fn write_line(&mut self, line: &str) -> Result<()>;
}

/// Error raised by console implementations.
#[derive(Debug)]
pub enum ConsoleError {
    /// No more input will ever arrive (EOF, Ctrl-C, or a drained script).
    Closed,
    Io(std::io::Error),
}

impl ConsoleError {
    /// Whether `err` is a [`ConsoleError::Closed`] in an `anyhow` wrapper.
    pub fn is_closed(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<ConsoleError>(), Some(ConsoleError::Closed))
    }
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConsoleError::Closed => write!(f, "console input closed"),
            ConsoleError::Io(err) => write!(f, "console i/o error: {}", err),
        }
    }
}

impl std::error::Error for ConsoleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConsoleError::Closed => None,
            ConsoleError::Io(err) => Some(err),
        }
    }
}

/// Interactive console with line editing and history, for the binary.
pub struct ReplConsole {
    editor: DefaultEditor,
    prompt: String,
}

impl ReplConsole {
    pub fn new(prompt: impl Into<String>) -> Result<Self> {
        Ok(Self {
            editor: DefaultEditor::new()?,
            prompt: prompt.into(),
        })
    }
}

impl UserConsole for ReplConsole {
    fn read_line(&mut self) -> Result<String> {
        match self.editor.readline(&self.prompt) {
            Ok(line) => {
                let _ = self.editor.add_history_entry(line.as_str());
                Ok(line)
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                Err(ConsoleError::Closed.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        let mut stdout = io::stdout().lock();
        writeln!(stdout, "{}", line).map_err(ConsoleError::Io)?;
        Ok(())
    }
}
