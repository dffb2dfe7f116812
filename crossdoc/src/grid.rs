//! Raw `.puz` grids, before they're turned into words.

use crate::Direction::{self, Across, Down};
use std::fmt::Debug;
use std::fmt::Display;

/// Marks a black square in `.puz` grids.
pub(crate) const BLACK: u8 = b'.';
/// Marks an empty white square in a `.puz` player grid.
pub(crate) const EMPTY: u8 = b'-';

/// A position in a grid: (row, column)
pub(crate) type Pos = (usize, usize);

/// A square in a `.puz` grid.
#[derive(Copy, Clone, Eq, PartialEq)]
pub(crate) enum Square {
  /// A black square where nothing can be entered.
  Black,
  /// A square where a letter could be entered, but that is currently empty.
  Empty,
  /// A square with a letter written in it.
  Letter(char),
}

impl Square {
  /// Whether this is [Square::Black].
  pub(crate) fn is_black(&self) -> bool {
    *self == Self::Black
  }

  /// Whether this is not a black square, i.e. either a [Square::Empty] or [Square::Letter].
  pub(crate) fn is_white(&self) -> bool {
    !self.is_black()
  }

  /// The character this square was stored as.
  pub(crate) fn symbol(&self) -> char {
    match self {
      Self::Black => BLACK as char,
      Self::Empty => EMPTY as char,
      Self::Letter(c) => *c,
    }
  }
}

impl Debug for Square {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Black => write!(f, "■"),
      Self::Empty => write!(f, " "),
      Self::Letter(c) => write!(f, "{}", c),
    }
  }
}

impl Display for Square {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Grid bytes are single ISO-8859-1 characters, which map one-to-one onto the
/// first 256 code points.
impl From<&u8> for Square {
  fn from(value: &u8) -> Self {
    match *value {
      BLACK => Self::Black,
      EMPTY => Self::Empty,
      other => Self::Letter(other as char),
    }
  }
}

/// A grid of squares: either the solution of a puzzle, or a partially-solved state.
#[derive(Eq, PartialEq)]
pub(crate) struct Grid {
  width: usize,
  height: usize,
  squares: Vec<Square>,
}

impl Grid {
  /// Create a new grid from the given bytes, one per square, row by row.
  pub(crate) fn parse(bytes: &[u8], width: usize, height: usize) -> Self {
    assert_eq!(bytes.len(), width * height);

    Self {
      width,
      height,
      squares: bytes.iter().map(Square::from).collect(),
    }
  }

  /// The size of this grid, expressed as (width, height).
  fn size(&self) -> (usize, usize) {
    (self.width, self.height)
  }

  /// An iterator over all the positions of this grid, from left to right and top to bottom.
  pub(crate) fn positions(&self) -> GridPosIter {
    GridPosIter::new(self.size())
  }

  /// Returns the [Square] at the given [Pos].
  pub(crate) fn get(&self, (r, c): Pos) -> Square {
    self.squares[r * self.width + c]
  }

  /// Returns the square immediately above the given position, or
  /// `Square::Black` if the given position is on the top edge of the grid.
  fn up_neighbor(&self, (row, col): Pos) -> Square {
    if row == 0 {
      Square::Black
    } else {
      self.get((row - 1, col))
    }
  }

  /// Returns the square immediately below the given position, or
  /// `Square::Black` if the given position is on the bottom edge of the grid.
  fn down_neighbor(&self, (row, col): Pos) -> Square {
    if row + 1 == self.height {
      Square::Black
    } else {
      self.get((row + 1, col))
    }
  }

  /// Returns the square immediately to the left of the given position, or
  /// `Square::Black` if the given position is on the left edge of the grid.
  fn left_neighbor(&self, (row, col): Pos) -> Square {
    if col == 0 {
      Square::Black
    } else {
      self.get((row, col - 1))
    }
  }

  /// Returns the square immediately to the right of the given position, or
  /// `Square::Black` if the given position is on the right edge of the grid.
  fn right_neighbor(&self, (row, col): Pos) -> Square {
    if col + 1 == self.width {
      Square::Black
    } else {
      self.get((row, col + 1))
    }
  }

  pub(crate) fn starts(&self, pos: Pos, direction: Direction) -> bool {
    match direction {
      Across => self.starts_across(pos),
      Down => self.starts_down(pos),
    }
  }

  /// Whether the given position is the start of an Across entry.
  fn starts_across(&self, pos: Pos) -> bool {
    if self.get(pos).is_black() {
      return false;
    }

    self.left_neighbor(pos).is_black() && self.right_neighbor(pos).is_white()
  }

  /// Whether the given position is the start of a Down entry.
  fn starts_down(&self, pos: Pos) -> bool {
    if self.get(pos).is_black() {
      return false;
    }

    self.up_neighbor(pos).is_black() && self.down_neighbor(pos).is_white()
  }

  /// The positions of the word starting at `start`, up to the next black square
  /// or the edge of the grid.
  pub(crate) fn span(&self, start: Pos, direction: Direction) -> Vec<Pos> {
    let (row, col) = start;
    match direction {
      Across => (col..self.width)
        .map(|c| (row, c))
        .take_while(|&p| self.get(p).is_white())
        .collect(),
      Down => (row..self.height)
        .map(|r| (r, col))
        .take_while(|&p| self.get(p).is_white())
        .collect(),
    }
  }
}

/// Iterator over all the positions in the grid.
pub(crate) struct GridPosIter {
  pos: (usize, usize),
  size: (usize, usize),
}

impl GridPosIter {
  fn new(size: (usize, usize)) -> Self {
    Self { pos: (0, 0), size }
  }
}

impl Iterator for GridPosIter {
  type Item = Pos;
  fn next(&mut self) -> Option<Self::Item> {
    let (width, height) = self.size;
    let (row, col) = self.pos;

    if row == height || width == 0 {
      return None;
    }

    if col == width - 1 {
      self.pos = (row + 1, 0);
    } else {
      self.pos = (row, col + 1);
    }

    Some((row, col))
  }
}

impl Debug for Grid {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    for row in self.squares.chunks(self.width.max(1)) {
      for sq in row {
        write!(f, "{}", sq)?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

impl Display for Grid {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "\n{:?}", self)
  }
}
