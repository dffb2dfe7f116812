//! This crate is meant to be used as the foundation for a crossword puzzle app.
//! It provides no UI itself. Instead it gives you an immutable, cross-referenced
//! [Document] describing a puzzle, and a [SolveState] you can mutate while the user
//! solves it.
//!
//! Puzzles are loaded from `.puz` files, a de facto standard format for crossword
//! puzzles. Locked (scrambled) `.puz` files are unlocked either with a known key or by
//! trying every possible key.
//!
//! ```no_run
//! use crossdoc::PuzReader;
//!
//! let data = std::fs::read("puzzle.puz")?;
//! let document = PuzReader::new().read(&data)?;
//! println!("{} ({} squares)", document.title().unwrap_or(""), document.square_count());
//! # Ok::<(), crossdoc::Error>(())
//! ```

use Direction::{Across, Down};
use std::fmt::Display;
use std::ops::Not;

use thiserror::Error;

mod checksum;
mod document;
mod grid;
mod hash;
mod puz;
mod scramble;
mod state;
mod word;
mod writer;

pub use checksum::{Checksum, ChecksumMismatch};
pub use document::{ALPHABET_ENGLISH, CellMap, Document, DocumentBuilder, DocumentFlags};
pub use puz::{Decoded, PuzReader};
pub use scramble::MAX_KEY;
pub use state::{Selection, SolveState, SquareStats, StateFlags};
pub use word::{Cell, CellAttributes, Word, WordBuilder};
pub use writer::PuzWriter;

/// The two crossword directions: `Across` and `Down`
#[derive(Debug, Eq, PartialEq, Hash, Copy, Clone, PartialOrd, Ord)]
pub enum Direction {
  Across,
  Down,
}

impl Direction {
  /// The numeric code used for this direction in serialized forms.
  pub fn code(self) -> u8 {
    match self {
      Across => 0,
      Down => 1,
    }
  }
}

impl Not for Direction {
  type Output = Self;
  fn not(self) -> Self {
    match self {
      Across => Down,
      Down => Across,
    }
  }
}

impl TryFrom<u8> for Direction {
  type Error = Error;

  fn try_from(code: u8) -> Result<Self> {
    match code {
      0 => Ok(Across),
      1 => Ok(Down),
      _ => Err(Error::InvalidArgument(format!("Direction not valid: {code}"))),
    }
  }
}

impl Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Across => write!(f, "Across"),
      Down => write!(f, "Down"),
    }
  }
}

/// The errors that may be produced by functions in this crate.
#[derive(Debug, Error)]
pub enum Error {
  /// Unexpectedly reached the end of the data at the given byte offset.
  #[error("unexpected end of data at byte {offset} while reading {what}")]
  EofError { offset: usize, what: &'static str },

  /// The data does not follow the `.puz` layout.
  #[error("parse error: {0}")]
  ParseError(String),

  /// Got an error while decoding or encoding a string, possibly because it was
  /// incorrectly encoded or because the wrong encoding was selected.
  #[error("encoding error: {0}")]
  EncodingError(String),

  /// The puzzle is scrambled and no key reproduced its checksum.
  #[error("puzzle is locked and could not be unlocked")]
  LockedError,

  /// The caller passed a value this crate can't work with.
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  /// A [SolveState] doesn't have the same size as the [Document] it was used with.
  #[error("state is {actual_width}x{actual_height} but the puzzle is {width}x{height}")]
  DimensionMismatch {
    width: usize,
    height: usize,
    actual_width: usize,
    actual_height: usize,
  },

  /// An [I/O error](std::io::Error) occurred.
  #[error("I/O error: {0}")]
  IoError(#[from] std::io::Error),
}

impl Error {
  /// Whether this error means the input wasn't a well-formed puzzle, as opposed to
  /// the caller misusing the API.
  pub fn is_format_error(&self) -> bool {
    matches!(
      self,
      Self::EofError { .. } | Self::ParseError(_) | Self::EncodingError(_) | Self::LockedError
    )
  }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn direction_codes() {
    assert_eq!(Direction::try_from(0).unwrap(), Across);
    assert_eq!(Direction::try_from(1).unwrap(), Down);
    assert_eq!(Across.code(), 0);
    assert_eq!(Down.code(), 1);
    assert_eq!(!Across, Down);

    let err = Direction::try_from(2).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert!(!err.is_format_error());
  }

  #[test]
  fn format_errors() {
    assert!(Error::LockedError.is_format_error());
    assert!(
      Error::EofError {
        offset: 3,
        what: "width"
      }
      .is_format_error()
    );
    assert!(!Error::IoError(std::io::Error::other("boom")).is_format_error());
  }
}
