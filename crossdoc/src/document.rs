use crate::Direction::{self, Across, Down};
use crate::state::{SolveState, SquareStats, StateFlags};
use crate::word::{Cell, CellAttributes, Word};
use crate::{Error, Result, hash};
use std::collections::BTreeSet;
use std::hash::{Hash, Hasher};

use bitflags::bitflags;
use once_cell::sync::OnceCell;

/// The characters a puzzle accepts when nothing else is specified.
pub const ALPHABET_ENGLISH: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";

bitflags! {
  /// Puzzle-wide flags.
  #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
  pub struct DocumentFlags: u32 {
    /// The puzzle was published without a solution.
    const NO_SOLUTION = 0x01;
  }
}

/// A built crossword puzzle. Documents are immutable; use a [DocumentBuilder] to
/// make a modified copy.
///
/// Two documents are equal when their [content hashes](Document::hash) are equal,
/// so differences in title, author and other metadata don't matter.
#[derive(Debug, Clone)]
pub struct Document {
  width: usize,
  height: usize,
  square_count: usize,
  flags: DocumentFlags,
  title: Option<String>,
  description: Option<String>,
  author: Option<String>,
  copyright: Option<String>,
  comment: Option<String>,
  date: Option<i64>,
  words_across: Vec<Word>,
  words_down: Vec<Word>,
  alphabet: BTreeSet<char>,
  cell_map: OnceCell<CellMap>,
  hash: OnceCell<String>,
}

impl Document {
  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  /// The number of distinct squares used by at least one word.
  pub fn square_count(&self) -> usize {
    self.square_count
  }

  pub fn flags(&self) -> DocumentFlags {
    self.flags
  }

  pub fn title(&self) -> Option<&str> {
    self.title.as_deref()
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  pub fn author(&self) -> Option<&str> {
    self.author.as_deref()
  }

  pub fn copyright(&self) -> Option<&str> {
    self.copyright.as_deref()
  }

  /// Free-form notes attached to the puzzle.
  pub fn comment(&self) -> Option<&str> {
    self.comment.as_deref()
  }

  /// Publication date, in milliseconds since the Unix epoch.
  pub fn date(&self) -> Option<i64> {
    self.date
  }

  /// Across words, sorted by number.
  pub fn words_across(&self) -> &[Word] {
    &self.words_across
  }

  /// Down words, sorted by number.
  pub fn words_down(&self) -> &[Word] {
    &self.words_down
  }

  /// All words: across first, then down.
  pub fn words(&self) -> impl Iterator<Item = &Word> {
    self.words_across.iter().chain(self.words_down.iter())
  }

  /// The characters a solver may enter.
  pub fn alphabet(&self) -> &BTreeSet<char> {
    &self.alphabet
  }

  /// Which cell, if any, occupies each square. Computed on first use.
  pub fn cell_map(&self) -> &CellMap {
    self.cell_map.get_or_init(|| CellMap::build(self))
  }

  /// A hex-encoded fingerprint of the puzzle's geometry, clues and solution.
  /// Computed on first use.
  pub fn hash(&self) -> &str {
    self.hash.get_or_init(|| hash::content_hash(self))
  }

  /// Creates an empty [SolveState] of the right size for this puzzle.
  pub fn new_state(&self) -> SolveState {
    SolveState::new(self.width, self.height)
  }

  /// Returns the word before `word`, treating the across words followed by the down
  /// words as one circular list. `None` means "from the start of the puzzle", which
  /// yields the last word.
  pub fn previous_word(&self, word: Option<&Word>) -> Option<&Word> {
    if let Some(word) = word {
      if let Some(index) = self.index_of(word.direction(), word.number()) {
        let (same, other) = self.lists(word.direction());
        if index > 0 {
          return Some(&same[index - 1]);
        }
        if let Some(last) = other.last() {
          return Some(last);
        }
      }
    }

    self.words_down.last().or(self.words_across.last())
  }

  /// Returns the word after `word`, treating the across words followed by the down
  /// words as one circular list. `None` means "from the start of the puzzle", which
  /// yields the first word.
  pub fn next_word(&self, word: Option<&Word>) -> Option<&Word> {
    if let Some(word) = word {
      if let Some(index) = self.index_of(word.direction(), word.number()) {
        let (same, other) = self.lists(word.direction());
        if index + 1 < same.len() {
          return Some(&same[index + 1]);
        }
        if let Some(first) = other.first() {
          return Some(first);
        }
      }
    }

    self.words_across.first().or(self.words_down.first())
  }

  /// Finds the word with the given direction and number.
  pub fn find_word(&self, direction: Direction, number: u16) -> Option<&Word> {
    let index = self.index_of(direction, number)?;
    Some(&self.list(direction)[index])
  }

  /// Finds the word with the given direction that passes through `(row, column)`.
  pub fn find_word_at(&self, direction: Direction, row: usize, column: usize) -> Option<&Word> {
    self
      .list(direction)
      .iter()
      .find(|word| word.covers(row, column))
  }

  /// Counts how many squares of `state` are solved, wrong, and so on.
  pub fn statistics(&self, state: &SolveState) -> Result<SquareStats> {
    if state.width() != self.width || state.height() != self.height {
      return Err(Error::DimensionMismatch {
        width: self.width,
        height: self.height,
        actual_width: state.width(),
        actual_height: state.height(),
      });
    }

    let mut stats = SquareStats::default();
    let mut done = vec![false; self.width * self.height];

    for word in self.words() {
      for ((row, column), cell) in word.positions().zip(word.cells()) {
        let index = row * self.width + column;
        if done[index] {
          continue;
        }
        done[index] = true;

        stats.total += 1;
        let entry = state.entry(row, column);
        if cell.attributes().contains(CellAttributes::NO_SOLUTION) && entry.is_some() {
          stats.unknown += 1;
        } else if cell.matches(entry) && state.is_flag_set(StateFlags::CHEATED, row, column) {
          stats.cheated += 1;
        } else if cell.matches(entry) {
          stats.solved += 1;
        } else if entry.is_some() {
          stats.wrong += 1;
        }
      }
    }

    Ok(stats)
  }

  /// Recomputes the statistics of `state` and stores them in it.
  pub fn update_statistics(&self, state: &mut SolveState) -> Result<()> {
    let stats = self.statistics(state)?;
    state.set_stats(stats);
    Ok(())
  }

  fn list(&self, direction: Direction) -> &[Word] {
    match direction {
      Across => &self.words_across,
      Down => &self.words_down,
    }
  }

  /// The list for `direction`, and the list for the other direction.
  fn lists(&self, direction: Direction) -> (&[Word], &[Word]) {
    (self.list(direction), self.list(!direction))
  }

  fn index_of(&self, direction: Direction, number: u16) -> Option<usize> {
    self
      .list(direction)
      .iter()
      .position(|word| word.number() == number)
  }
}

impl PartialEq for Document {
  fn eq(&self, other: &Self) -> bool {
    self.hash() == other.hash()
  }
}

impl Eq for Document {}

impl Hash for Document {
  fn hash<H: Hasher>(&self, state: &mut H) {
    Document::hash(self).hash(state);
  }
}

/// A row-major grid saying which [Cell] occupies each square of a [Document].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellMap {
  width: usize,
  height: usize,
  cells: Vec<Option<Cell>>,
}

impl CellMap {
  fn build(document: &Document) -> Self {
    let (width, height) = (document.width, document.height);
    let mut cells = vec![None; width * height];

    for word in document.words() {
      for ((row, column), cell) in word.positions().zip(word.cells()) {
        cells[row * width + column] = Some(cell.clone());
      }
    }

    Self {
      width,
      height,
      cells,
    }
  }

  pub fn width(&self) -> usize {
    self.width
  }

  pub fn height(&self) -> usize {
    self.height
  }

  /// The cell at the given square, or `None` if it's unused or out of range.
  pub fn get(&self, row: usize, column: usize) -> Option<&Cell> {
    if row >= self.height || column >= self.width {
      return None;
    }
    self.cells[row * self.width + column].as_ref()
  }

  /// The rows of the grid, top to bottom.
  pub fn rows(&self) -> impl Iterator<Item = &[Option<Cell>]> {
    self.cells.chunks(self.width.max(1))
  }
}

/// Accumulates the parts of a [Document]. Words may be added in any order; they are
/// sorted when the document is built. No numbering is done here, so words must
/// already carry their clue numbers.
#[derive(Debug, Clone)]
pub struct DocumentBuilder {
  width: usize,
  height: usize,
  flags: DocumentFlags,
  title: Option<String>,
  description: Option<String>,
  author: Option<String>,
  copyright: Option<String>,
  comment: Option<String>,
  date: Option<i64>,
  alphabet: BTreeSet<char>,
  words: Vec<Word>,
}

impl Default for DocumentBuilder {
  fn default() -> Self {
    Self {
      width: 0,
      height: 0,
      flags: DocumentFlags::empty(),
      title: None,
      description: None,
      author: None,
      copyright: None,
      comment: None,
      date: None,
      alphabet: ALPHABET_ENGLISH.chars().collect(),
      words: Vec::new(),
    }
  }
}

impl DocumentBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Starts from a copy of everything in `document`.
  pub fn from_document(document: &Document) -> Self {
    Self {
      width: document.width,
      height: document.height,
      flags: document.flags,
      title: document.title.clone(),
      description: document.description.clone(),
      author: document.author.clone(),
      copyright: document.copyright.clone(),
      comment: document.comment.clone(),
      date: document.date,
      alphabet: document.alphabet.clone(),
      words: document.words().cloned().collect(),
    }
  }

  pub fn width(&mut self, width: usize) -> &mut Self {
    self.width = width;
    self
  }

  pub fn height(&mut self, height: usize) -> &mut Self {
    self.height = height;
    self
  }

  pub fn flags(&mut self, flags: DocumentFlags) -> &mut Self {
    self.flags = flags;
    self
  }

  pub fn title(&mut self, title: impl Into<String>) -> &mut Self {
    self.title = Some(title.into());
    self
  }

  pub fn description(&mut self, description: impl Into<String>) -> &mut Self {
    self.description = Some(description.into());
    self
  }

  pub fn author(&mut self, author: impl Into<String>) -> &mut Self {
    self.author = Some(author.into());
    self
  }

  pub fn copyright(&mut self, copyright: impl Into<String>) -> &mut Self {
    self.copyright = Some(copyright.into());
    self
  }

  pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
    self.comment = Some(comment.into());
    self
  }

  pub fn date(&mut self, millis: i64) -> &mut Self {
    self.date = Some(millis);
    self
  }

  /// Replaces the alphabet.
  pub fn alphabet(&mut self, alphabet: impl IntoIterator<Item = char>) -> &mut Self {
    self.alphabet = alphabet.into_iter().collect();
    self
  }

  pub fn add_word(&mut self, word: Word) -> &mut Self {
    self.words.push(word);
    self
  }

  pub fn build(self) -> Result<Document> {
    let square_count = self.count_squares()?;

    let (mut words_across, mut words_down): (Vec<Word>, Vec<Word>) = self
      .words
      .into_iter()
      .partition(|word| word.direction() == Across);
    words_across.sort_by_key(Word::number);
    words_down.sort_by_key(Word::number);

    Ok(Document {
      width: self.width,
      height: self.height,
      square_count,
      flags: self.flags,
      title: self.title,
      description: self.description,
      author: self.author,
      copyright: self.copyright,
      comment: self.comment,
      date: self.date,
      words_across,
      words_down,
      alphabet: self.alphabet,
      cell_map: OnceCell::new(),
      hash: OnceCell::new(),
    })
  }

  /// Counts the squares covered by at least one word. A square shared by an across
  /// and a down word counts once.
  fn count_squares(&self) -> Result<usize> {
    let mut count = 0;
    let mut done = vec![false; self.width * self.height];

    for word in &self.words {
      let fits = match word.direction() {
        Across => word.start_row() < self.height && word.start_column() + word.len() <= self.width,
        Down => word.start_column() < self.width && word.start_row() + word.len() <= self.height,
      };
      if !fits {
        return Err(Error::InvalidArgument(format!(
          "Word {word} doesn't fit in a {}x{} grid",
          self.width, self.height
        )));
      }

      for (row, column) in word.positions() {
        let index = row * self.width + column;
        if !done[index] {
          done[index] = true;
          count += 1;
        }
      }
    }

    Ok(count)
  }
}
