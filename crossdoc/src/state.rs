use crate::Direction;
use std::time::Duration;

use bitflags::bitflags;

bitflags! {
  /// Per-square flags of a [SolveState].
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct StateFlags: u8 {
    /// The solver revealed this square instead of solving it.
    const CHEATED = 0x01;
    /// The solver marked this square (e.g. as a guess).
    const MARKED = 0x02;
  }
}

/// Square counts produced by [Document::statistics](crate::Document::statistics).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SquareStats {
  /// Every square used by the puzzle.
  pub total: usize,
  /// Squares holding the right answer.
  pub solved: usize,
  /// Squares holding the right answer, but revealed.
  pub cheated: usize,
  /// Squares holding a wrong answer.
  pub wrong: usize,
  /// Filled squares whose answer the puzzle doesn't know.
  pub unknown: usize,
}

/// Which word, and which square within it, the solver is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
  pub direction: Direction,
  pub number: u16,
  /// Index of the square within the word.
  pub cell: usize,
}

/// Everything a solver has done to a puzzle: entries, flags, time spent and the
/// current selection. A state is tied to a [Document](crate::Document) only by
/// having the same dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolveState {
  width: usize,
  height: usize,
  entries: Vec<Option<String>>,
  flags: Vec<StateFlags>,
  play_time: Duration,
  last_played: Option<i64>,
  selection: Option<Selection>,
  stats: SquareStats,
}

impl SolveState {
  pub fn new(width: usize, height: usize) -> Self {
    Self {
      width,
      height,
      entries: vec![None; width * height],
      flags: vec![StateFlags::empty(); width * height],
      play_time: Duration::ZERO,
      last_played: None,
      selection: None,
      stats: SquareStats::default(),
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  /// What the solver wrote in the given square, if anything.
  pub fn entry(&self, row: usize, column: usize) -> Option<&str> {
    self.entries[self.index(row, column)].as_deref()
  }

  pub fn set_entry(&mut self, row: usize, column: usize, entry: Option<&str>) {
    let index = self.index(row, column);
    self.entries[index] = entry.map(str::to_string);
  }

  pub fn is_flag_set(&self, flag: StateFlags, row: usize, column: usize) -> bool {
    self.flags[self.index(row, column)].contains(flag)
  }

  pub fn set_flag(&mut self, flag: StateFlags, row: usize, column: usize, set: bool) {
    let index = self.index(row, column);
    self.flags[index].set(flag, set);
  }

  pub fn play_time(&self) -> Duration {
    self.play_time
  }

  pub fn set_play_time(&mut self, play_time: Duration) {
    self.play_time = play_time;
  }

  /// When the puzzle was last played, in milliseconds since the Unix epoch.
  pub fn last_played(&self) -> Option<i64> {
    self.last_played
  }

  pub fn set_last_played(&mut self, millis: i64) {
    self.last_played = Some(millis);
  }

  pub fn selection(&self) -> Option<Selection> {
    self.selection
  }

  pub fn set_selection(&mut self, selection: Option<Selection>) {
    self.selection = selection;
  }

  /// The counts stored by the last
  /// [Document::update_statistics](crate::Document::update_statistics).
  pub fn stats(&self) -> SquareStats {
    self.stats
  }

  pub(crate) fn set_stats(&mut self, stats: SquareStats) {
    self.stats = stats;
  }

  /// Whether every square has been solved, honestly or not.
  pub fn is_completed(&self) -> bool {
    self.stats.solved + self.stats.cheated >= self.stats.total
  }

  /// Whether the solver has entered anything at all.
  pub fn is_blank(&self) -> bool {
    self.entries.iter().all(Option::is_none)
  }

  fn index(&self, row: usize, column: usize) -> usize {
    assert!(
      row < self.height && column < self.width,
      "({row}, {column}) is outside a {}x{} state",
      self.width,
      self.height
    );
    row * self.width + column
  }
}
