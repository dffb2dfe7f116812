//! Shared helpers for the crossdoc integration tests.

#![allow(dead_code)]

use crossdoc::Direction::{self, Across, Down};
use crossdoc::{Cell, CellAttributes, Document, DocumentBuilder, WordBuilder};

/// A 5x5 puzzle with two black squares.
pub const FIVE: &[&str] = &["SWAP.", "TOTAL", "ARISE", "RESET", ".SEAT"];

pub fn hint(number: u16, direction: Direction) -> String {
  format!("Clue {number} {direction}")
}

/// Builds a puzzle from rows of letters (`.` for black squares), numbering it the
/// way crosswords are numbered. `rebus` replaces the letters of some squares and
/// `circled` marks some squares.
pub fn grid_builder(
  rows: &[&str],
  rebus: &[(usize, usize, &str)],
  circled: &[(usize, usize)],
) -> DocumentBuilder {
  let grid: Vec<Vec<char>> = rows.iter().map(|row| row.chars().collect()).collect();
  let height = grid.len();
  let width = grid.first().map_or(0, Vec::len);

  let white = |r: usize, c: usize| r < height && c < width && grid[r][c] != '.';
  let cell = |r: usize, c: usize| {
    let chars = rebus
      .iter()
      .find(|&&(rr, cc, _)| (rr, cc) == (r, c))
      .map_or_else(|| grid[r][c].to_string(), |&(_, _, s)| s.to_string());
    let attributes = if circled.contains(&(r, c)) {
      CellAttributes::CIRCLED
    } else {
      CellAttributes::empty()
    };
    Cell::new(chars, attributes)
  };

  let mut builder = DocumentBuilder::new();
  builder.width(width).height(height);

  let mut number = 0;
  for r in 0..height {
    for c in 0..width {
      if !white(r, c) {
        continue;
      }
      let across = (c == 0 || !white(r, c - 1)) && white(r, c + 1);
      let down = (r == 0 || !white(r - 1, c)) && white(r + 1, c);
      if !across && !down {
        continue;
      }

      number += 1;
      if across {
        let cells = (c..width).take_while(|&cc| white(r, cc)).map(|cc| cell(r, cc));
        builder.add_word(word(number, Across, (r, c), cells));
      }
      if down {
        let cells = (r..height).take_while(|&rr| white(rr, c)).map(|rr| cell(rr, c));
        builder.add_word(word(number, Down, (r, c), cells));
      }
    }
  }

  builder
}

fn word(
  number: u16,
  direction: Direction,
  (row, col): (usize, usize),
  cells: impl IntoIterator<Item = Cell>,
) -> crossdoc::Word {
  WordBuilder::new()
    .number(number)
    .direction(direction)
    .start(row, col)
    .hint(hint(number, direction))
    .cells(cells)
    .build()
    .unwrap()
}

pub fn grid_document(rows: &[&str]) -> Document {
  grid_builder(rows, &[], &[]).build().unwrap()
}

/// [FIVE] with a title, author, copyright and notes.
pub fn five() -> Document {
  let mut builder = grid_builder(FIVE, &[], &[]);
  builder
    .title("Five by five")
    .author("A. Setter")
    .copyright("© 2024")
    .comment("No theme.");
  builder.build().unwrap()
}
