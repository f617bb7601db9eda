use crate::console::{ConsoleError, UserConsole};
use crate::storage::Storage;
use anyhow::Result;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Memory-backed console for tests and non-interactive embedding.
///
/// Reads come from a queue of prepared lines; writes are captured in order.
/// An optional interaction budget makes every read and write past the limit
/// fail with [`ConsoleError::Closed`], which is how the tests simulate a
/// process killed at an arbitrary point.
pub struct ScriptedConsole {
    input: VecDeque<String>,
    output: Rc<RefCell<Vec<String>>>,
    budget: Option<usize>,
    interactions: usize,
}

impl ScriptedConsole {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: lines.into_iter().map(Into::into).collect(),
            output: Rc::new(RefCell::new(Vec::new())),
            budget: None,
            interactions: 0,
        }
    }

    /// Convenience: create a console and return (console, output_handle), so
    /// callers that hand the console off can still read what it captured.
    pub fn with_handle<I, S>(lines: I) -> (Self, Rc<RefCell<Vec<String>>>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let console = Self::new(lines);
        let handle = console.output.clone();
        (console, handle)
    }

    /// A console that dies after `budget` successful interactions.
    pub fn with_budget<I, S>(lines: I, budget: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            budget: Some(budget),
            ..Self::new(lines)
        }
    }

    /// Captured output so far, in write order.
    pub fn output(&self) -> Vec<String> {
        self.output.borrow().clone()
    }

    /// Lines that were never consumed (the "still unread" user input after a
    /// simulated crash).
    pub fn remaining_input(&self) -> Vec<String> {
        self.input.iter().cloned().collect()
    }

    /// Successful reads plus writes performed through this console.
    pub fn interactions(&self) -> usize {
        self.interactions
    }

    fn charge(&mut self) -> Result<()> {
        if let Some(budget) = &mut self.budget {
            if *budget == 0 {
                return Err(ConsoleError::Closed.into());
            }
            *budget -= 1;
        }
        self.interactions += 1;
        Ok(())
    }
}

impl UserConsole for ScriptedConsole {
    fn read_line(&mut self) -> Result<String> {
        self.charge()?;
        match self.input.pop_front() {
            Some(line) => Ok(line),
            None => Err(ConsoleError::Closed.into()),
        }
    }

    fn write_line(&mut self, line: &str) -> Result<()> {
        self.charge()?;
        self.output.borrow_mut().push(line.to_string());
        Ok(())
    }
}

/// Memory-backed snapshot storage.
///
/// Clones share the same blob, so a test can keep one "disk" alive across
/// two interpreter runs and observe what a restart would find.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blob: Rc<RefCell<Vec<u8>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience: create storage and return (storage, blob_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let storage = Self::new();
        let handle = storage.blob.clone();
        (storage, handle)
    }

    pub fn blob(&self) -> Vec<u8> {
        self.blob.borrow().clone()
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self) -> Result<Vec<u8>> {
        Ok(self.blob.borrow().clone())
    }

    fn write(&mut self, blob: &[u8]) -> Result<()> {
        *self.blob.borrow_mut() = blob.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_console_replays_lines_and_captures_output() {
        let mut console = ScriptedConsole::new(["first", "second"]);

        assert_eq!(console.read_line().unwrap(), "first");
        console.write_line("out").unwrap();
        assert_eq!(console.read_line().unwrap(), "second");

        assert_eq!(console.output(), vec!["out"]);
        assert_eq!(console.interactions(), 3);
        assert!(console.remaining_input().is_empty());
    }

    #[test]
    fn test_drained_console_reports_closed() {
        let mut console = ScriptedConsole::new(Vec::<String>::new());
        let err = console.read_line().unwrap_err();
        assert!(ConsoleError::is_closed(&err));
    }

    #[test]
    fn test_budget_cuts_both_reads_and_writes() {
        let mut console = ScriptedConsole::with_budget(["a", "b"], 2);

        assert_eq!(console.read_line().unwrap(), "a");
        console.write_line("out").unwrap();

        assert!(ConsoleError::is_closed(&console.read_line().unwrap_err()));
        assert!(ConsoleError::is_closed(&console.write_line("x").unwrap_err()));
        // the unread line is still there for the "restarted" console
        assert_eq!(console.remaining_input(), vec!["b"]);
    }

    #[test]
    fn test_memory_storage_clones_share_the_blob() {
        let mut storage = MemoryStorage::new();
        let mut restarted = storage.clone();

        storage.write(&[9, 9]).unwrap();
        assert_eq!(restarted.read().unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_handles_outlive_boxed_adapters() {
        let (console, output) = ScriptedConsole::with_handle(["hello"]);
        let (storage, blob) = MemoryStorage::with_handle();

        let mut console: Box<dyn UserConsole> = Box::new(console);
        let mut storage: Box<dyn Storage> = Box::new(storage);
        let line = console.read_line().unwrap();
        console.write_line(&line).unwrap();
        storage.write(&[4, 2]).unwrap();

        assert_eq!(*output.borrow(), vec!["hello"]);
        assert_eq!(*blob.borrow(), vec![4, 2]);
    }
}
