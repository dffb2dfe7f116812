//! Locking and unlocking of scrambled `.puz` solutions.
//!
//! A locked solution has had its letters permuted and shifted with a four-digit key.
//! The letters are taken column by column (skipping black squares), and for each key
//! digit in turn they are Caesar-shifted, rotated and interleaved. The header keeps
//! the checksum of the unscrambled letters, which is the only way to tell whether a
//! key is right.

use crate::checksum::checksum_region;
use crate::grid::BLACK;
use crate::{Error, Result};

use rayon::prelude::*;
use tracing::debug;

/// The largest key a puzzle can be locked with.
pub const MAX_KEY: u16 = 9999;

pub(crate) fn check_key(key: u16) -> Result<u16> {
  if key > MAX_KEY {
    return Err(Error::InvalidArgument(format!(
      "Key {key} is out of range (0-{MAX_KEY})"
    )));
  }
  Ok(key)
}

/// The decimal digits of `key`, most significant first.
fn key_digits(key: u16) -> [u8; 4] {
  [
    (key / 1000 % 10) as u8,
    (key / 100 % 10) as u8,
    (key / 10 % 10) as u8,
    (key % 10) as u8,
  ]
}

/// The letters of a row-major grid, column by column, without black squares.
pub(crate) fn column_major_letters(grid: &[u8], width: usize, height: usize) -> Vec<u8> {
  (0..width)
    .flat_map(|c| (0..height).map(move |r| grid[r * width + c]))
    .filter(|&b| b != BLACK)
    .collect()
}

/// Writes `letters` back into the white squares of `grid`, column by column.
fn scatter_column_major(grid: &mut [u8], width: usize, height: usize, letters: &[u8]) {
  let mut letters = letters.iter();
  for c in 0..width {
    for r in 0..height {
      let square = &mut grid[r * width + c];
      if *square != BLACK {
        if let Some(&letter) = letters.next() {
          *square = letter;
        }
      }
    }
  }
}

/// Checksum of the letters in reading order used by the lock.
pub(crate) fn letters_checksum(grid: &[u8], width: usize, height: usize) -> u16 {
  checksum_region(&column_major_letters(grid, width, height), 0)
}

/// `ABCDEF` becomes `DAEBFC`: the back half interleaved with the front half.
fn shuffle(letters: &[u8]) -> Vec<u8> {
  let mid = letters.len() / 2;
  let mut out = Vec::with_capacity(letters.len());
  for i in 0..mid {
    out.push(letters[mid + i]);
    out.push(letters[i]);
  }
  if letters.len() % 2 == 1 {
    out.push(letters[letters.len() - 1]);
  }
  out
}

/// Undoes [shuffle]: odd-indexed letters followed by even-indexed ones.
fn unshuffle(letters: &[u8]) -> Vec<u8> {
  letters
    .iter()
    .skip(1)
    .step_by(2)
    .chain(letters.iter().step_by(2))
    .copied()
    .collect()
}

fn shift_forward(letter: u8, digit: u8) -> u8 {
  let code = letter as u16 + digit as u16;
  if code > b'Z' as u16 {
    (code - 26) as u8
  } else {
    code as u8
  }
}

fn shift_back(letter: u8, digit: u8) -> u8 {
  let mut code = letter as i16 - digit as i16;
  if code < b'A' as i16 {
    code += 26;
  }
  code as u8
}

pub(crate) fn scramble_letters(letters: &[u8], key: u16) -> Vec<u8> {
  let digits = key_digits(key);
  let mut out = letters.to_vec();
  if out.is_empty() {
    return out;
  }

  for &digit in digits.iter() {
    for (i, letter) in out.iter_mut().enumerate() {
      *letter = shift_forward(*letter, digits[i % digits.len()]);
    }
    let len = out.len();
    out.rotate_left(digit as usize % len);
    out = shuffle(&out);
  }
  out
}

pub(crate) fn unscramble_letters(letters: &[u8], key: u16) -> Vec<u8> {
  let digits = key_digits(key);
  let mut out = letters.to_vec();
  if out.is_empty() {
    return out;
  }

  for &digit in digits.iter().rev() {
    out = unshuffle(&out);
    let len = out.len();
    out.rotate_right(digit as usize % len);
    for (i, letter) in out.iter_mut().enumerate() {
      *letter = shift_back(*letter, digits[i % digits.len()]);
    }
  }
  out
}

/// Scrambles the white squares of `grid` in place. Only `A..Z` can be scrambled.
/// Returns the checksum to store in the header.
pub(crate) fn lock(grid: &mut [u8], width: usize, height: usize, key: u16) -> Result<u16> {
  check_key(key)?;
  let letters = column_major_letters(grid, width, height);
  if let Some(bad) = letters.iter().find(|b| !b.is_ascii_uppercase()) {
    return Err(Error::InvalidArgument(format!(
      "Can't scramble a grid containing {:?}",
      *bad as char
    )));
  }

  let checksum = checksum_region(&letters, 0);
  scatter_column_major(grid, width, height, &scramble_letters(&letters, key));
  Ok(checksum)
}

/// Unscrambles `grid` in place, with `key` if given, otherwise by trying every key
/// from 0 up. Every attempt works on its own copy of the letters; `grid` is only
/// written once a key reproduces `checksum`. Returns the key that worked.
pub(crate) fn unlock(
  grid: &mut [u8],
  width: usize,
  height: usize,
  checksum: u16,
  key: Option<u16>,
) -> Result<u16> {
  if let Some(key) = key {
    check_key(key)?;
  }

  let letters = column_major_letters(grid, width, height);
  let attempt = |key: u16| {
    let plain = unscramble_letters(&letters, key);
    (checksum_region(&plain, 0) == checksum).then_some((key, plain))
  };

  let found = match key {
    Some(key) => attempt(key),
    // Several keys may reproduce a 16-bit checksum; the lowest one wins.
    None => (0..=MAX_KEY).into_par_iter().find_map_first(attempt),
  };

  let (key, plain) = found.ok_or(Error::LockedError)?;
  debug!(key, "unlocked scrambled solution");
  scatter_column_major(grid, width, height, &plain);
  Ok(key)
}
