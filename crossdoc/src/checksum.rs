//! Checksum logic. See
//! <https://gist.github.com/sliminality/dab21fa834eae0a70193c7cd69c356d5#checksums>

use std::fmt::Debug;
use std::fmt::Display;

#[must_use]
pub(crate) fn checksum_region(base: &[u8], input_checksum: u16) -> u16 {
  let mut checksum = input_checksum;
  for &byte in base {
    if checksum & 0x0001_u16 != 0 {
      checksum = (checksum >> 1) + 0x8000
    } else {
      checksum >>= 1;
    }
    checksum = checksum.wrapping_add(byte as u16);
  }
  checksum
}

/// For metadata (title, author, copyright, or notes), we do nothing if the string is
/// empty, but if it's not empty we include the \0 byte in the calculation.
#[must_use]
fn checksum_metadata_string(s: &[u8], input_checksum: u16) -> u16 {
  if s == b"\0" {
    return input_checksum;
  }

  checksum_region(s, input_checksum)
}

/// For clues, we do not include the trailing \0 byte.
#[must_use]
fn checksum_clue(s: &[u8], input_checksum: u16) -> u16 {
  checksum_region(&s[0..s.len() - 1], input_checksum)
}

/// The parts of a `.puz` file that its header checksums cover. Strings are the raw,
/// encoded bytes including their trailing NUL.
pub(crate) struct ChecksumInput<'a> {
  /// The eight bytes starting with the width.
  pub cib: &'a [u8],
  pub solution: &'a [u8],
  pub player: &'a [u8],
  pub title: &'a [u8],
  pub author: &'a [u8],
  pub copyright: &'a [u8],
  pub clues: &'a [&'a [u8]],
  pub notes: &'a [u8],
}

/// The checksums stored in a `.puz` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct HeaderChecksums {
  pub cib: u16,
  pub overall: u16,
  pub masked: [u8; 8],
}

impl ChecksumInput<'_> {
  fn strings_checksum(&self, input_checksum: u16) -> u16 {
    let mut c = input_checksum;
    c = checksum_metadata_string(self.title, c);
    c = checksum_metadata_string(self.author, c);
    c = checksum_metadata_string(self.copyright, c);
    for clue in self.clues {
      c = checksum_clue(clue, c);
    }
    checksum_metadata_string(self.notes, c)
  }

  pub(crate) fn compute(&self) -> HeaderChecksums {
    let cib = checksum_region(self.cib, 0);

    let overall = {
      let mut c = checksum_region(self.solution, cib);
      c = checksum_region(self.player, c);
      self.strings_checksum(c)
    };

    let solution_checksum = checksum_region(self.solution, 0);
    let grid_checksum = checksum_region(self.player, 0);
    let partial_board_checksum = self.strings_checksum(0);

    let masked = [
      0x49 ^ (cib & 0xFF) as u8,
      0x43 ^ (solution_checksum & 0xFF) as u8,
      0x48 ^ (grid_checksum & 0xFF) as u8,
      0x45 ^ (partial_board_checksum & 0xFF) as u8,
      0x41 ^ ((cib & 0xFF00) >> 8) as u8,
      0x54 ^ ((solution_checksum & 0xFF00) >> 8) as u8,
      0x45 ^ ((grid_checksum & 0xFF00) >> 8) as u8,
      0x44 ^ ((partial_board_checksum & 0xFF00) >> 8) as u8,
    ];

    HeaderChecksums {
      cib,
      overall,
      masked,
    }
  }

  /// Compares the checksums a file claims to have against the ones computed from
  /// its contents.
  pub(crate) fn verify(&self, stored: &HeaderChecksums) -> Vec<ChecksumMismatch> {
    let expected = self.compute();
    let mut mismatches = vec![];

    if stored.cib != expected.cib {
      mismatches.push(ChecksumMismatch {
        checksum: Checksum::CIB,
        expected: expected.cib,
        actual: stored.cib,
      });
    }

    if stored.overall != expected.overall {
      mismatches.push(ChecksumMismatch {
        checksum: Checksum::Overall,
        expected: expected.overall,
        actual: stored.overall,
      });
    }

    for (i, (expected, actual)) in expected.masked.iter().zip(stored.masked.iter()).enumerate() {
      if expected != actual {
        mismatches.push(ChecksumMismatch {
          checksum: Checksum::Masked(i),
          expected: *expected as u16,
          actual: *actual as u16,
        })
      }
    }

    mismatches
  }
}

/// Returned when parsing a .puz file succeeded, but one or more of the checksums
/// in the file didn't match the expected value. May indicate a corrupted .puz file,
/// or a file written by a tool that computes them differently.
#[derive(Clone, Eq, PartialEq)]
pub struct ChecksumMismatch {
  pub checksum: Checksum,
  pub expected: u16,
  pub actual: u16,
}

impl Debug for ChecksumMismatch {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(
      f,
      "Mismatch on checksum {}: Expected {:#x} but got {:#x}",
      self.checksum, self.expected, self.actual
    )
  }
}

impl Display for ChecksumMismatch {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{:?}", self)
  }
}

/// Identifies one of the checksums in a `.puz` file.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Checksum {
  /// Covers the width, height, clue count and puzzle type.
  CIB,
  /// Covers the whole puzzle.
  Overall,
  /// One of the eight bytes of the "masked" checksums.
  Masked(usize),
  /// The checksum of an extension section, by tag.
  Section(String),
}

impl Display for Checksum {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Section(tag) => write!(f, "Section({tag})"),
      other => write!(f, "{:?}", other),
    }
  }
}
