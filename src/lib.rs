//! A crash-resilient command-line calculator.
//!
//! This crate provides a small fixed-vocabulary interpreter (`add`, `median`,
//! `rand`, `help`) whose distinguishing feature is durability: the command
//! being executed persists a full snapshot of its remaining work after every
//! atomic step. Kill the process at any point, mid-command or mid-prompt,
//! and the next start resumes exactly where it stopped, producing the same
//! console output an uninterrupted run would have.
//!
//! The main entry point is [`Interpreter`], which drives a
//! [`console::UserConsole`] and a [`storage::Storage`]. Both are traits:
//! the binary wires up a rustyline console and a file-backed store, while
//! [`io_adapters`] provides in-memory doubles for tests and embedding.

pub mod codec;
pub mod command;
mod commands;
pub mod console;
mod interpreter;
pub mod io_adapters;
pub mod storage;

/// Just a convenient re-export of the interpreter driver.
///
/// See [`Interpreter`] for the high-level API and examples.
pub use interpreter::Interpreter;
