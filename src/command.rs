use crate::codec::{ByteReader, ByteWriter};
use crate::console::UserConsole;
use crate::storage::Storage;
use anyhow::{Result, bail};
use std::collections::VecDeque;

/// Leading byte of every snapshot. Bumped when the layout changes.
pub const SNAPSHOT_VERSION: u8 = 1;

/// Seed of the pseudo-random generator on the very first run.
pub const INITIAL_SEED: i64 = 420;

/// One atomic console interaction of a command.
///
/// A command's remaining work is a queue of these; executing one and
/// persisting the result is the unit the crash-recovery contract is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Consume one line from the console.
    Read,
    /// Produce one line on the console.
    Write,
}

impl StepKind {
    pub(crate) fn to_byte(self) -> u8 {
        match self {
            StepKind::Read => 0,
            StepKind::Write => 1,
        }
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(StepKind::Read),
            1 => Ok(StepKind::Write),
            other => bail!("unknown step tag {}", other),
        }
    }
}

/// Tag identifying a command variant inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    NotFound = 0,
    Help = 1,
    Random = 2,
    Add = 3,
    Median = 4,
}

impl CommandKind {
    pub(crate) fn to_byte(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_byte(byte: u8) -> Result<Self> {
        match byte {
            0 => Ok(CommandKind::NotFound),
            1 => Ok(CommandKind::Help),
            2 => Ok(CommandKind::Random),
            3 => Ok(CommandKind::Add),
            4 => Ok(CommandKind::Median),
            other => bail!("unknown command tag {}", other),
        }
    }
}

/// Ordered queue of the steps a command still has to execute.
///
/// Steps are consumed strictly from the front; commands may append more at
/// the back while running (e.g. `rand` schedules one write per requested
/// number), but the queue is never reordered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schedule {
    steps: VecDeque<StepKind>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: StepKind) {
        self.steps.push_back(step);
    }

    pub fn push_many(&mut self, step: StepKind, count: usize) {
        for _ in 0..count {
            self.steps.push_back(step);
        }
    }

    /// The step to execute next, if any.
    pub fn front(&self) -> Option<StepKind> {
        self.steps.front().copied()
    }

    /// Drops the front step. Called once the step has been executed.
    pub fn advance(&mut self) {
        self.steps.pop_front();
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn encode(&self, writer: &mut ByteWriter) {
        writer.put_u32(self.steps.len() as u32);
        for step in &self.steps {
            writer.put_u8(step.to_byte());
        }
    }

    pub(crate) fn decode(reader: &mut ByteReader) -> Result<Self> {
        let count = reader.take_u32()? as usize;
        let mut steps = VecDeque::new();
        for _ in 0..count {
            steps.push_back(StepKind::from_byte(reader.take_u8()?)?);
        }
        Ok(Self { steps })
    }
}

impl FromIterator<StepKind> for Schedule {
    fn from_iter<I: IntoIterator<Item = StepKind>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// A resumable unit of interpreter work, corresponding to one user-issued
/// instruction.
///
/// A command owns a [`Schedule`] of pending steps plus whatever it has
/// accumulated so far, and executes one step at a time. The provided
/// [`run`](Resumable::run) loop persists a full snapshot after every step:
/// a process killed between two iterations loses at most the one console
/// interaction the snapshot does not yet account for, and replay picks up
/// at the next scheduled step.
pub trait Resumable: std::fmt::Debug {
    fn kind(&self) -> CommandKind;

    /// Current pseudo-random generator state. Only `rand` advances it; every
    /// other command carries it through unchanged.
    fn seed(&self) -> i64;

    fn schedule(&self) -> &Schedule;

    /// Executes exactly one scheduled step: one console read or write, any
    /// bookkeeping it implies, then dropping the step from the schedule.
    fn step(&mut self, console: &mut dyn UserConsole) -> Result<()>;

    /// Appends the variant-specific trailer to the snapshot. The default
    /// writes nothing; commands with accumulated state override it.
    fn encode_state(&self, _writer: &mut ByteWriter) {}

    fn is_complete(&self) -> bool {
        self.schedule().is_empty()
    }

    /// Serializes the full command state: version, kind tag, seed, schedule,
    /// then the variant trailer.
    fn encode(&self) -> Vec<u8> {
        let mut writer = ByteWriter::new();
        writer.put_u8(SNAPSHOT_VERSION);
        writer.put_u8(self.kind().to_byte());
        writer.put_i64(self.seed());
        self.schedule().encode(&mut writer);
        self.encode_state(&mut writer);
        writer.into_bytes()
    }

    fn save(&self, storage: &mut dyn Storage) -> Result<()> {
        storage.write(&self.encode())
    }

    /// Drives the command to completion, persisting after every step.
    fn run(&mut self, console: &mut dyn UserConsole, storage: &mut dyn Storage) -> Result<()> {
        while !self.is_complete() {
            self.step(console)?;
            self.save(storage)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_tags_round_trip() {
        for step in [StepKind::Read, StepKind::Write] {
            assert_eq!(StepKind::from_byte(step.to_byte()).unwrap(), step);
        }
        assert!(StepKind::from_byte(7).is_err());
    }

    #[test]
    fn test_command_tags_match_snapshot_layout() {
        assert_eq!(CommandKind::NotFound.to_byte(), 0);
        assert_eq!(CommandKind::Help.to_byte(), 1);
        assert_eq!(CommandKind::Random.to_byte(), 2);
        assert_eq!(CommandKind::Add.to_byte(), 3);
        assert_eq!(CommandKind::Median.to_byte(), 4);
        assert!(CommandKind::from_byte(5).is_err());
    }

    #[test]
    fn test_schedule_is_fifo() {
        let mut schedule: Schedule = [StepKind::Read, StepKind::Write].into_iter().collect();
        schedule.push_many(StepKind::Write, 2);

        assert_eq!(schedule.len(), 4);
        assert_eq!(schedule.front(), Some(StepKind::Read));
        schedule.advance();
        assert_eq!(schedule.front(), Some(StepKind::Write));
        schedule.advance();
        schedule.advance();
        schedule.advance();
        assert!(schedule.is_empty());
        assert_eq!(schedule.front(), None);
    }

    #[test]
    fn test_schedule_codec_round_trip() {
        let schedule: Schedule = [StepKind::Read, StepKind::Read, StepKind::Write]
            .into_iter()
            .collect();

        let mut writer = ByteWriter::new();
        schedule.encode(&mut writer);
        let bytes = writer.into_bytes();

        let mut reader = ByteReader::new(&bytes);
        let restored = Schedule::decode(&mut reader).unwrap();
        assert_eq!(restored, schedule);
        assert!(reader.is_empty());
    }
}
