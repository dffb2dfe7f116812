use crate::Direction::{self, Across, Down};
use crate::{Error, Result};
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

use bitflags::bitflags;

bitflags! {
  /// Attributes of a single solution [Cell].
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct CellAttributes: u8 {
    /// The square is drawn with a circle in it.
    const CIRCLED = 0x01;
    /// The puzzle doesn't know what belongs in this square.
    const NO_SOLUTION = 0x02;
  }
}

/// The solution of one square. Usually a single letter, but "rebus" squares hold
/// several characters. An empty string stands for an unused square.
///
/// Two cells are equal when their characters are equal; attributes are ignored.
#[derive(Clone, Eq)]
pub struct Cell {
  chars: String,
  attributes: CellAttributes,
}

impl Cell {
  pub fn new(chars: impl Into<String>, attributes: CellAttributes) -> Self {
    Self {
      chars: chars.into(),
      attributes,
    }
  }

  pub fn chars(&self) -> &str {
    &self.chars
  }

  pub fn attributes(&self) -> CellAttributes {
    self.attributes
  }

  pub fn is_empty(&self) -> bool {
    self.chars.is_empty()
  }

  pub fn is_circled(&self) -> bool {
    self.attributes.contains(CellAttributes::CIRCLED)
  }

  /// Whether this cell holds more than one character.
  pub fn is_rebus(&self) -> bool {
    self.chars.chars().nth(1).is_some()
  }

  /// Whether the given entry is exactly this cell's solution.
  pub fn matches(&self, entry: Option<&str>) -> bool {
    entry == Some(self.chars.as_str())
  }
}

impl PartialEq for Cell {
  fn eq(&self, other: &Self) -> bool {
    self.chars == other.chars
  }
}

impl Hash for Cell {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.chars.hash(state);
  }
}

impl Debug for Cell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.chars.chars().count() {
      0 => write!(f, " "),
      1 => write!(f, "{}", self.chars),
      _ => write!(f, "[{}]", self.chars),
    }
  }
}

impl Display for Cell {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// One entry of the puzzle: a numbered run of cells in one direction, plus its clue.
///
/// Words are identified by their direction and number alone, so two words compare
/// equal even if their contents differ.
#[derive(Clone)]
pub struct Word {
  number: u16,
  direction: Direction,
  start_row: usize,
  start_column: usize,
  hint: Option<String>,
  hint_url: Option<String>,
  citation: Option<String>,
  cells: Vec<Cell>,
}

impl Word {
  pub fn number(&self) -> u16 {
    self.number
  }

  pub fn direction(&self) -> Direction {
    self.direction
  }

  pub fn start_row(&self) -> usize {
    self.start_row
  }

  pub fn start_column(&self) -> usize {
    self.start_column
  }

  /// The clue text.
  pub fn hint(&self) -> Option<&str> {
    self.hint.as_deref()
  }

  pub fn hint_url(&self) -> Option<&str> {
    self.hint_url.as_deref()
  }

  pub fn citation(&self) -> Option<&str> {
    self.citation.as_deref()
  }

  pub fn cells(&self) -> &[Cell] {
    &self.cells
  }

  pub fn cell(&self, index: usize) -> Option<&Cell> {
    self.cells.get(index)
  }

  /// The number of squares this word spans.
  pub fn len(&self) -> usize {
    self.cells.len()
  }

  pub fn is_empty(&self) -> bool {
    self.cells.is_empty()
  }

  /// The `(row, column)` of every square of this word, in order.
  pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
    (0..self.cells.len()).map(move |i| match self.direction {
      Across => (self.start_row, self.start_column + i),
      Down => (self.start_row + i, self.start_column),
    })
  }

  /// Whether this word passes through the given square.
  pub fn covers(&self, row: usize, column: usize) -> bool {
    match self.direction {
      Across => {
        row == self.start_row
          && column >= self.start_column
          && column < self.start_column + self.cells.len()
      }
      Down => {
        column == self.start_column
          && row >= self.start_row
          && row < self.start_row + self.cells.len()
      }
    }
  }
}

impl PartialEq for Word {
  fn eq(&self, other: &Self) -> bool {
    self.direction == other.direction && self.number == other.number
  }
}

impl Eq for Word {}

impl Hash for Word {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.direction.hash(state);
    self.number.hash(state);
  }
}

impl Debug for Word {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "{} {}: {} (",
      self.number,
      self.direction,
      self.hint.as_deref().unwrap_or("")
    )?;
    for cell in &self.cells {
      write!(f, "{}", cell)?;
    }
    write!(f, ")")
  }
}

impl Display for Word {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Accumulates the parts of a [Word]. The number and direction are required.
#[derive(Debug, Clone, Default)]
pub struct WordBuilder {
  number: Option<u16>,
  direction: Option<Direction>,
  start_row: usize,
  start_column: usize,
  hint: Option<String>,
  hint_url: Option<String>,
  citation: Option<String>,
  cells: Vec<Cell>,
}

impl WordBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn number(mut self, number: u16) -> Self {
    self.number = Some(number);
    self
  }

  pub fn direction(mut self, direction: Direction) -> Self {
    self.direction = Some(direction);
    self
  }

  pub fn start(mut self, row: usize, column: usize) -> Self {
    self.start_row = row;
    self.start_column = column;
    self
  }

  pub fn hint(mut self, hint: impl Into<String>) -> Self {
    self.hint = Some(hint.into());
    self
  }

  pub fn hint_url(mut self, url: impl Into<String>) -> Self {
    self.hint_url = Some(url.into());
    self
  }

  pub fn citation(mut self, citation: impl Into<String>) -> Self {
    self.citation = Some(citation.into());
    self
  }

  pub fn cell(mut self, chars: impl Into<String>, attributes: CellAttributes) -> Self {
    self.cells.push(Cell::new(chars, attributes));
    self
  }

  pub fn cells(mut self, cells: impl IntoIterator<Item = Cell>) -> Self {
    self.cells.extend(cells);
    self
  }

  /// Convenience for plain words: one cell per character of `letters`.
  pub fn letters(self, letters: &str) -> Self {
    self.cells(
      letters
        .chars()
        .map(|c| Cell::new(c, CellAttributes::empty())),
    )
  }

  pub fn build(self) -> Result<Word> {
    let number = match self.number {
      Some(n) if n > 0 => n,
      Some(n) => return Err(Error::InvalidArgument(format!("Word number not valid: {n}"))),
      None => return Err(Error::InvalidArgument("Missing hint number".into())),
    };
    let direction = self
      .direction
      .ok_or_else(|| Error::InvalidArgument("Missing word direction".into()))?;

    Ok(Word {
      number,
      direction,
      start_row: self.start_row,
      start_column: self.start_column,
      hint: self.hint,
      hint_url: self.hint_url,
      citation: self.citation,
      cells: self.cells,
    })
  }
}
