//! The concrete commands the interpreter knows about.
//!
//! Every command follows the same discipline: a fixed initial [`Schedule`],
//! one console interaction per step, a snapshot after each step. The schedules
//! and snapshot trailers per command:
//!
//! | Command  | Initial schedule        | Trailer                          |
//! |----------|-------------------------|----------------------------------|
//! | add      | Read, Read, Write       | accumulated numbers              |
//! | median   | Read (grows on count)   | accumulated numbers, first flag  |
//! | rand     | Read (grows on count)   | none                             |
//! | help     | three Writes (own queue)| pending (step, text) entries     |
//! | not found| Write                   | none                             |

use crate::codec::{ByteReader, ByteWriter};
use crate::command::{CommandKind, Resumable, SNAPSHOT_VERSION, Schedule, StepKind};
use crate::console::UserConsole;
use anyhow::{Context, Result, bail};
use std::collections::VecDeque;

pub(crate) const NOT_FOUND_MESSAGE: &str =
    "Command not found, use help to list the available commands";

pub(crate) const HELP_INTRO: &str = "Specify the command you want help with";
pub(crate) const COMMAND_LIST: &str = "Available commands: add, median, rand";
pub(crate) const EXIT_HINT: &str = "Type end to leave help mode";
pub(crate) const TOPIC_ADD: &str = "Computes the sum of two numbers";
pub(crate) const TOPIC_MEDIAN: &str = "Computes the median of a list of numbers";
pub(crate) const TOPIC_RAND: &str = "Generates a list of random numbers";
pub(crate) const UNKNOWN_TOPIC: &str = "No such command";

// Park-Miller minimal standard generator.
const RAND_MULTIPLIER: i64 = 16807;
const RAND_MODULUS: i64 = 2_147_483_647;

/// Builds the command a trimmed input line asks for. Anything that is not a
/// known token becomes [`NotFoundCommand`]; `exit` never reaches this point.
pub(crate) fn dispatch(input: &str, seed: i64) -> Box<dyn Resumable> {
    match input.trim() {
        "add" => Box::new(AddCommand::new(seed)),
        "median" => Box::new(MedianCommand::new(seed)),
        "help" => Box::new(HelpCommand::new(seed)),
        "rand" => Box::new(RandomCommand::new(seed)),
        _ => Box::new(NotFoundCommand::new(seed)),
    }
}

/// Reconstructs the in-flight command from a snapshot blob.
pub(crate) fn load(blob: &[u8]) -> Result<Box<dyn Resumable>> {
    let mut reader = ByteReader::new(blob);

    let version = reader.take_u8()?;
    if version != SNAPSHOT_VERSION {
        bail!("unsupported snapshot version {}", version);
    }
    let kind = CommandKind::from_byte(reader.take_u8()?)?;
    let seed = reader.take_i64()?;
    let schedule = Schedule::decode(&mut reader)?;

    let command: Box<dyn Resumable> = match kind {
        CommandKind::NotFound => Box::new(NotFoundCommand { seed, schedule }),
        CommandKind::Help => Box::new(HelpCommand::decode(seed, schedule, &mut reader)?),
        CommandKind::Random => Box::new(RandomCommand { seed, schedule }),
        CommandKind::Add => Box::new(AddCommand::decode(seed, schedule, &mut reader)?),
        CommandKind::Median => Box::new(MedianCommand::decode(seed, schedule, &mut reader)?),
    };

    if !reader.is_empty() {
        bail!("snapshot has {} trailing bytes", reader.remaining());
    }
    Ok(command)
}

fn read_number(console: &mut dyn UserConsole) -> Result<i32> {
    let line = console.read_line()?;
    line.trim()
        .parse()
        .with_context(|| format!("expected a number, got {:?}", line))
}

fn encode_numbers(writer: &mut ByteWriter, values: &[i32]) {
    writer.put_u32(values.len() as u32);
    for value in values {
        writer.put_i32(*value);
    }
}

fn decode_numbers(reader: &mut ByteReader) -> Result<Vec<i32>> {
    let count = reader.take_u32()? as usize;
    let mut values = Vec::new();
    for _ in 0..count {
        values.push(reader.take_i32()?);
    }
    Ok(values)
}

/// `add`: reads two numbers, prints their sum.
#[derive(Debug)]
pub struct AddCommand {
    seed: i64,
    schedule: Schedule,
    terms: Vec<i32>,
}

impl AddCommand {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            schedule: [StepKind::Read, StepKind::Read, StepKind::Write]
                .into_iter()
                .collect(),
            terms: Vec::new(),
        }
    }

    fn decode(seed: i64, schedule: Schedule, reader: &mut ByteReader) -> Result<Self> {
        Ok(Self {
            seed,
            schedule,
            terms: decode_numbers(reader)?,
        })
    }
}

impl Resumable for AddCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::Add
    }

    fn seed(&self) -> i64 {
        self.seed
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn step(&mut self, console: &mut dyn UserConsole) -> Result<()> {
        match self.schedule.front().context("step on a completed command")? {
            StepKind::Read => {
                let term = read_number(console)?;
                self.terms.push(term);
            }
            StepKind::Write => {
                let sum: i32 = self.terms.iter().sum();
                console.write_line(&sum.to_string())?;
            }
        }
        self.schedule.advance();
        Ok(())
    }

    fn encode_state(&self, writer: &mut ByteWriter) {
        encode_numbers(writer, &self.terms);
    }
}

/// `median`: reads a count, then that many numbers, prints their median.
#[derive(Debug)]
pub struct MedianCommand {
    seed: i64,
    schedule: Schedule,
    values: Vec<i32>,
    first_launch: bool,
}

impl MedianCommand {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            schedule: [StepKind::Read].into_iter().collect(),
            values: Vec::new(),
            first_launch: true,
        }
    }

    fn decode(seed: i64, schedule: Schedule, reader: &mut ByteReader) -> Result<Self> {
        let values = decode_numbers(reader)?;
        let first_launch = reader.take_bool()?;
        Ok(Self {
            seed,
            schedule,
            values,
            first_launch,
        })
    }

    fn median(&mut self) -> f64 {
        self.values.sort_unstable();
        let count = self.values.len();
        if count == 0 {
            return 0.0;
        }
        if count % 2 == 1 {
            f64::from(self.values[count / 2])
        } else {
            let middle = i64::from(self.values[count / 2 - 1]) + i64::from(self.values[count / 2]);
            middle as f64 / 2.0
        }
    }
}

impl Resumable for MedianCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::Median
    }

    fn seed(&self) -> i64 {
        self.seed
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn step(&mut self, console: &mut dyn UserConsole) -> Result<()> {
        match self.schedule.front().context("step on a completed command")? {
            StepKind::Read => {
                if self.first_launch {
                    let count = read_number(console)?;
                    self.schedule
                        .push_many(StepKind::Read, usize::try_from(count).unwrap_or(0));
                    self.schedule.push(StepKind::Write);
                    self.first_launch = false;
                } else {
                    let value = read_number(console)?;
                    self.values.push(value);
                }
            }
            StepKind::Write => {
                let median = self.median();
                console.write_line(&median.to_string())?;
            }
        }
        self.schedule.advance();
        Ok(())
    }

    fn encode_state(&self, writer: &mut ByteWriter) {
        encode_numbers(writer, &self.values);
        writer.put_bool(self.first_launch);
    }
}

/// `rand`: reads a count, prints that many generator values.
#[derive(Debug)]
pub struct RandomCommand {
    seed: i64,
    schedule: Schedule,
}

impl RandomCommand {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            schedule: [StepKind::Read].into_iter().collect(),
        }
    }
}

impl Resumable for RandomCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::Random
    }

    fn seed(&self) -> i64 {
        self.seed
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn step(&mut self, console: &mut dyn UserConsole) -> Result<()> {
        match self.schedule.front().context("step on a completed command")? {
            StepKind::Read => {
                let count = read_number(console)?;
                self.schedule
                    .push_many(StepKind::Write, usize::try_from(count).unwrap_or(0));
            }
            StepKind::Write => {
                console.write_line(&self.seed.to_string())?;
                self.seed = RAND_MULTIPLIER * self.seed % RAND_MODULUS;
            }
        }
        self.schedule.advance();
        Ok(())
    }
}

/// One pending entry of the help browser: either a line to print or a pause
/// waiting for the user's topic choice.
#[derive(Debug, Clone, PartialEq, Eq)]
struct HelpEntry {
    kind: StepKind,
    text: String,
}

impl HelpEntry {
    fn write(text: &str) -> Self {
        Self {
            kind: StepKind::Write,
            text: text.to_string(),
        }
    }

    fn read() -> Self {
        Self {
            kind: StepKind::Read,
            text: String::new(),
        }
    }
}

/// `help`: interactive topic browser.
///
/// The pending message queue *is* this command's schedule: each entry is a
/// step with its text attached. Completeness is judged on the queue, and the
/// generic schedule stays empty (it is still part of the snapshot layout).
#[derive(Debug)]
pub struct HelpCommand {
    seed: i64,
    schedule: Schedule,
    messages: VecDeque<HelpEntry>,
}

impl HelpCommand {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            schedule: Schedule::new(),
            messages: VecDeque::from([
                HelpEntry::write(HELP_INTRO),
                HelpEntry::write(COMMAND_LIST),
                HelpEntry::write(EXIT_HINT),
            ]),
        }
    }

    fn decode(seed: i64, schedule: Schedule, reader: &mut ByteReader) -> Result<Self> {
        let count = reader.take_u32()? as usize;
        let mut messages = VecDeque::new();
        for _ in 0..count {
            messages.push_back(HelpEntry {
                kind: StepKind::from_byte(reader.take_u8()?)?,
                text: reader.take_str()?,
            });
        }
        Ok(Self {
            seed,
            schedule,
            messages,
        })
    }

    fn queue_topic(&mut self, description: &str) {
        self.messages.push_back(HelpEntry::write(description));
        self.messages.push_back(HelpEntry::write(EXIT_HINT));
    }
}

impl Resumable for HelpCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::Help
    }

    fn seed(&self) -> i64 {
        self.seed
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn is_complete(&self) -> bool {
        self.messages.is_empty()
    }

    fn step(&mut self, console: &mut dyn UserConsole) -> Result<()> {
        let entry = self
            .messages
            .front()
            .cloned()
            .context("step on a completed command")?;
        match entry.kind {
            StepKind::Read => {
                let topic = console.read_line()?;
                match topic.trim() {
                    "end" => {}
                    "add" => self.queue_topic(TOPIC_ADD),
                    "median" => self.queue_topic(TOPIC_MEDIAN),
                    "rand" => self.queue_topic(TOPIC_RAND),
                    _ => {
                        self.messages.push_back(HelpEntry::write(UNKNOWN_TOPIC));
                        self.messages.push_back(HelpEntry::write(COMMAND_LIST));
                        self.messages.push_back(HelpEntry::write(EXIT_HINT));
                    }
                }
            }
            StepKind::Write => {
                console.write_line(&entry.text)?;
                if entry.text == EXIT_HINT {
                    self.messages.push_back(HelpEntry::read());
                }
            }
        }
        self.messages.pop_front();
        Ok(())
    }

    fn encode_state(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.messages.len() as u32);
        for entry in &self.messages {
            writer.put_u8(entry.kind.to_byte());
            writer.put_str(&entry.text);
        }
    }
}

/// Fallback for unrecognized input: prints one fixed line.
#[derive(Debug)]
pub struct NotFoundCommand {
    seed: i64,
    schedule: Schedule,
}

impl NotFoundCommand {
    pub fn new(seed: i64) -> Self {
        Self {
            seed,
            schedule: [StepKind::Write].into_iter().collect(),
        }
    }
}

impl Resumable for NotFoundCommand {
    fn kind(&self) -> CommandKind {
        CommandKind::NotFound
    }

    fn seed(&self) -> i64 {
        self.seed
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn step(&mut self, console: &mut dyn UserConsole) -> Result<()> {
        match self.schedule.front().context("step on a completed command")? {
            StepKind::Write => console.write_line(NOT_FOUND_MESSAGE)?,
            // can only appear in a hand-crafted snapshot; nothing to do
            StepKind::Read => {}
        }
        self.schedule.advance();
        Ok(())
    }
}
