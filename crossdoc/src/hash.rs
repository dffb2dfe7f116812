//! The content fingerprint of a [Document].
//!
//! Only the geometry, the clues and the cells go into the hash. Title, author,
//! copyright, notes and date are left out, so a puzzle republished under a different
//! byline still hashes the same.

use crate::document::Document;
use crate::word::Word;

use sha2::{Digest, Sha256};

/// Feeds fixed-width, length-prefixed fields into the digest so that adjacent
/// fields can't run into each other.
struct CanonicalWriter {
  digest: Sha256,
}

impl CanonicalWriter {
  fn new() -> Self {
    Self {
      digest: Sha256::new(),
    }
  }

  fn put_u8(&mut self, value: u8) {
    self.digest.update([value]);
  }

  fn put_u16(&mut self, value: u16) {
    self.digest.update(value.to_be_bytes());
  }

  /// Sizes and positions go in at 64 bits so no `usize` is ever cut short.
  fn put_usize(&mut self, value: usize) {
    self.digest.update((value as u64).to_be_bytes());
  }

  fn put_str(&mut self, value: &str) {
    self.put_usize(value.len());
    self.digest.update(value.as_bytes());
  }

  fn put_opt_str(&mut self, value: Option<&str>) {
    match value {
      Some(s) => {
        self.put_u8(1);
        self.put_str(s);
      }
      None => self.put_u8(0),
    }
  }

  fn put_word(&mut self, word: &Word) {
    self.put_u16(word.number());
    self.put_opt_str(word.hint());
    self.put_usize(word.start_row());
    self.put_usize(word.start_column());
    for cell in word.cells() {
      self.put_u8(cell.attributes().bits());
      self.put_str(cell.chars());
    }
  }

  fn finish(self) -> String {
    hex::encode(self.digest.finalize())
  }
}

pub(crate) fn content_hash(document: &Document) -> String {
  let mut writer = CanonicalWriter::new();
  writer.put_usize(document.width());
  writer.put_usize(document.height());
  for word in document.words() {
    writer.put_word(word);
  }
  writer.finish()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::Direction::{Across, Down};
  use crate::document::DocumentBuilder;
  use crate::word::{CellAttributes, WordBuilder};

  fn two_by_two(hint: &str, attributes: CellAttributes) -> Document {
    let mut builder = DocumentBuilder::new();
    builder
      .width(2)
      .height(2)
      .add_word(
        WordBuilder::new()
          .number(1)
          .direction(Across)
          .hint(hint)
          .cell("A", attributes)
          .cell("B", CellAttributes::empty())
          .build()
          .unwrap(),
      )
      .add_word(
        WordBuilder::new()
          .number(1)
          .direction(Down)
          .hint("down")
          .letters("AC")
          .build()
          .unwrap(),
      );
    builder.build().unwrap()
  }

  #[test]
  fn hash_is_hex_sha256() {
    let hash = content_hash(&two_by_two("across", CellAttributes::empty()));
    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
  }

  #[test]
  fn hash_is_deterministic() {
    let a = two_by_two("across", CellAttributes::empty());
    let b = two_by_two("across", CellAttributes::empty());
    assert_eq!(content_hash(&a), content_hash(&b));
  }

  #[test]
  fn far_positions_are_not_truncated() {
    let word_at = |row| {
      WordBuilder::new()
        .number(1)
        .direction(Across)
        .start(row, 0)
        .letters("A")
        .build()
        .unwrap()
    };
    let hash_of = |word: &Word| {
      let mut writer = CanonicalWriter::new();
      writer.put_word(word);
      writer.finish()
    };
    assert_ne!(hash_of(&word_at(0)), hash_of(&word_at(1 << 16)));
    assert_ne!(hash_of(&word_at(1)), hash_of(&word_at((1 << 16) + 1)));
  }

  #[test]
  fn hints_and_attributes_change_the_hash() {
    let base = content_hash(&two_by_two("across", CellAttributes::empty()));
    assert_ne!(base, content_hash(&two_by_two("across!", CellAttributes::empty())));
    assert_ne!(base, content_hash(&two_by_two("across", CellAttributes::CIRCLED)));
  }
}
