use crate::command::INITIAL_SEED;
use crate::commands::{dispatch, load};
use crate::console::{ConsoleError, UserConsole};
use crate::storage::Storage;
use anyhow::{Context, Result};
use tracing::debug;

/// The interpreter driver: resumes whatever command a previous process left
/// in storage, then settles into the read-dispatch-run loop.
///
/// The driver owns nothing but the carried pseudo-random seed; console and
/// storage are borrowed per run, so embedders (and tests) keep them and can
/// inspect both after the loop ends.
///
/// Example
/// ```
/// use calc_commands::Interpreter;
/// use calc_commands::io_adapters::{MemoryStorage, ScriptedConsole};
///
/// let mut console = ScriptedConsole::new(["add", "3", "4", "exit"]);
/// let mut storage = MemoryStorage::new();
/// Interpreter::default().run(&mut console, &mut storage).unwrap();
/// assert_eq!(console.output(), vec!["7"]);
/// ```
pub struct Interpreter {
    seed: i64,
}

impl Interpreter {
    pub fn new() -> Self {
        Self { seed: INITIAL_SEED }
    }

    /// An interpreter whose first-ever seed is `seed` instead of the default.
    pub fn with_seed(seed: i64) -> Self {
        Self { seed }
    }

    /// Runs the interpreter until `exit` or until console input closes.
    ///
    /// Startup first finishes any command a previous process left behind:
    /// a non-empty storage blob is decoded, re-saved (round-trip
    /// normalization) and, unless already complete, driven to completion
    /// before the first prompt. Its final seed is carried into the loop.
    pub fn run(&mut self, console: &mut dyn UserConsole, storage: &mut dyn Storage) -> Result<()> {
        self.resume(console, storage)?;

        loop {
            let line = match console.read_line() {
                Ok(line) => line,
                Err(err) if ConsoleError::is_closed(&err) => {
                    debug!("console closed, leaving the loop");
                    return Ok(());
                }
                Err(err) => return Err(err),
            };

            if line.trim() == "exit" {
                storage.write(&[])?;
                return Ok(());
            }

            let mut command = dispatch(&line, self.seed);
            debug!(kind = ?command.kind(), "dispatched");
            command.save(storage)?;
            command.run(console, storage)?;
            self.seed = command.seed();
        }
    }

    fn resume(&mut self, console: &mut dyn UserConsole, storage: &mut dyn Storage) -> Result<()> {
        let blob = storage.read()?;
        if blob.is_empty() {
            return Ok(());
        }

        let mut command = load(&blob).context("can't restore the interrupted command")?;
        debug!(kind = ?command.kind(), pending = command.schedule().len(), "resuming");
        command.save(storage)?;
        if !command.is_complete() {
            command.run(console, storage)?;
        }
        self.seed = command.seed();
        Ok(())
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}
