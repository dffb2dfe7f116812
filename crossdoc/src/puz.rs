//! Reading `.puz` files.
//!
//! The format has no official documentation, but
//! <https://gist.github.com/sliminality/dab21fa834eae0a70193c7cd69c356d5> describes
//! it well and is what this module follows.

use crate::Direction::{Across, Down};
use crate::checksum::{Checksum, ChecksumInput, ChecksumMismatch, HeaderChecksums, checksum_region};
use crate::document::{ALPHABET_ENGLISH, Document, DocumentBuilder, DocumentFlags};
use crate::grid::{BLACK, EMPTY, Grid, Pos};
use crate::scramble::{check_key, unlock};
use crate::state::{SolveState, StateFlags};
use crate::word::{Cell, CellAttributes, Word, WordBuilder};
use crate::{Error, Result};
use std::collections::HashMap;
use std::fmt::Debug;
use std::io::Read;
use std::time::Duration;

use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian};
use encoding::all::ISO_8859_1;
use encoding::label::encoding_from_whatwg_label;
use encoding::{DecoderTrap, Encoding, EncodingRef};
use tracing::{debug, warn};

pub(crate) const MAGIC: &[u8] = b"ACROSS&DOWN\0";

pub(crate) const GEXT: &[u8; 4] = b"GEXT";
pub(crate) const GRBS: &[u8; 4] = b"GRBS";
pub(crate) const RTBL: &[u8; 4] = b"RTBL";
pub(crate) const RUSR: &[u8; 4] = b"RUSR";
pub(crate) const LTIM: &[u8; 4] = b"LTIM";

/// `GEXT` bit for a square whose answer was revealed.
pub(crate) const GEXT_REVEALED: u8 = 0x40;
/// `GEXT` bit for a circled square.
pub(crate) const GEXT_CIRCLED: u8 = 0x80;

/// Rebus table indices are stored 0-based and must fit the 1-based `GRBS` byte.
pub(crate) const MAX_REBUS_INDEX: u16 = 254;

bitflags! {
  /// The "solution state" field of the header.
  #[derive(Debug, Clone, Copy, PartialEq, Eq)]
  pub(crate) struct PuzzleType: u16 {
    const NO_SOLUTION = 0x0002;
    const SCRAMBLED = 0x0004;
  }
}

/// Everything [PuzReader::decode] found in a `.puz` file.
#[derive(Debug)]
pub struct Decoded {
  pub document: Document,
  /// The player's progress as saved in the file.
  pub state: SolveState,
  /// Checksums in the file that don't match its contents. These never stop a file
  /// from being read.
  pub checksum_mismatches: Vec<ChecksumMismatch>,
  /// The key the solution was unlocked with, if it was scrambled.
  pub key: Option<u16>,
  /// The format version, e.g. `1.3`.
  pub version: String,
}

/// Reads [Document]s from `.puz` data.
///
/// ```no_run
/// # use crossdoc::PuzReader;
/// let reader = PuzReader::with_encoding("windows-1252")?.with_key(1234);
/// let decoded = reader.decode(&std::fs::read("locked.puz")?)?;
/// assert_eq!(decoded.key, Some(1234));
/// # Ok::<(), crossdoc::Error>(())
/// ```
#[derive(Clone)]
pub struct PuzReader {
  encoding: EncodingRef,
  key: Option<u16>,
}

impl Debug for PuzReader {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PuzReader")
      .field("encoding", &self.encoding.name())
      .field("key", &self.key)
      .finish()
  }
}

impl Default for PuzReader {
  fn default() -> Self {
    Self {
      encoding: ISO_8859_1,
      key: None,
    }
  }
}

impl PuzReader {
  /// A reader that decodes text as ISO-8859-1 and unlocks scrambled puzzles by
  /// trying every key.
  pub fn new() -> Self {
    Self::default()
  }

  /// A reader that decodes text with the encoding known by the given
  /// [WHATWG label](https://encoding.spec.whatwg.org/#names-and-labels).
  pub fn with_encoding(label: &str) -> Result<Self> {
    Ok(Self {
      encoding: lookup_encoding(label)?,
      ..Self::default()
    })
  }

  /// Unlocks scrambled puzzles with `key` instead of searching for it. Keys above
  /// [MAX_KEY](crate::MAX_KEY) are rejected when reading.
  pub fn with_key(mut self, key: u16) -> Self {
    self.key = Some(key);
    self
  }

  /// Reads the [Document] in `data`.
  pub fn read(&self, data: &[u8]) -> Result<Document> {
    Ok(self.decode(data)?.document)
  }

  /// Reads the [Document] in everything `reader` produces.
  pub fn read_from<R: Read>(&self, mut reader: R) -> Result<Document> {
    let mut data = vec![];
    reader.read_to_end(&mut data)?;
    self.read(&data)
  }

  /// Reads the [Document] in `data`, along with the player's progress and anything
  /// else the file says about itself.
  pub fn decode(&self, data: &[u8]) -> Result<Decoded> {
    if let Some(key) = self.key {
      check_key(key)?;
    }

    let mut scanner = Scanner::new(data);

    let overall_checksum = scanner.parse_short("overall checksum")?;
    scanner.take_exact(MAGIC, "file magic")?;

    let cib_checksum = scanner.parse_short("CIB checksum")?;
    let mut masked_checksums = [0; 8];
    masked_checksums.copy_from_slice(scanner.take_n_bytes(8, "masked checksums")?);

    let version = scanner.take_n_bytes(4, "version")?;
    // Reserved 1C
    scanner.take_n_bytes(2, "reserved bytes")?;
    let scrambled_checksum = scanner.parse_short("scrambled checksum")?;
    // Nothing is known to live in 0x20 through 0x2B.
    scanner.take_n_bytes(12, "reserved bytes")?;

    let cib = scanner.take_n_bytes(8, "puzzle header")?;
    let width = cib[0] as usize;
    let height = cib[1] as usize;
    let num_clues = LittleEndian::read_u16(&cib[2..4]);
    let puzzle_type = PuzzleType::from_bits_retain(LittleEndian::read_u16(&cib[6..8]));
    debug!(width, height, num_clues, ?puzzle_type, "read puz header");

    let solution_bytes = scanner.take_n_bytes(width * height, "solution grid")?;
    let player_bytes = scanner.take_n_bytes(width * height, "player grid")?;

    let title = scanner.parse_nul_terminated_string("title")?;
    let author = scanner.parse_nul_terminated_string("author")?;
    let copyright = scanner.parse_nul_terminated_string("copyright")?;
    let clues = (0..num_clues)
      .map(|_| scanner.parse_nul_terminated_string("clue"))
      .collect::<Result<Vec<_>>>()?;
    let notes = scanner.parse_nul_terminated_string("notes")?;

    let mut checksum_mismatches = ChecksumInput {
      cib,
      solution: solution_bytes,
      player: player_bytes,
      title,
      author,
      copyright,
      clues: &clues,
      notes,
    }
    .verify(&HeaderChecksums {
      cib: cib_checksum,
      overall: overall_checksum,
      masked: masked_checksums,
    });

    let sections = parse_sections(&mut scanner, &mut checksum_mismatches)?;
    for mismatch in &checksum_mismatches {
      warn!(%mismatch, "checksum mismatch");
    }

    let extras = Extras::parse(&sections, width * height, self.encoding)?;

    let mut solution = solution_bytes.to_vec();
    let key = if puzzle_type.contains(PuzzleType::SCRAMBLED) {
      Some(unlock(
        &mut solution,
        width,
        height,
        scrambled_checksum,
        self.key,
      )?)
    } else {
      None
    };

    let grid = Grid::parse(&solution, width, height);
    let clues = clues
      .into_iter()
      .map(|clue| decode_str(self.encoding, clue))
      .collect::<Result<Vec<String>>>()?;

    let no_solution = puzzle_type.contains(PuzzleType::NO_SOLUTION);
    let cell_at = |(row, col): Pos| -> Result<Cell> {
      let index = row * width + col;
      let mut attributes = CellAttributes::empty();
      if extras.markup(index) & GEXT_CIRCLED != 0 {
        attributes |= CellAttributes::CIRCLED;
      }
      if no_solution {
        attributes |= CellAttributes::NO_SOLUTION;
      }

      let chars = match extras.rebus(index) {
        0 => grid.get((row, col)).symbol().to_string(),
        n => extras
          .rebus_table
          .get(&n)
          .cloned()
          .ok_or_else(|| Error::ParseError(format!("No rebus solution for index {n}")))?,
      };
      Ok(Cell::new(chars, attributes))
    };

    let words = extract_words(&grid, clues, cell_at)?;

    let mut builder = DocumentBuilder::new();
    builder
      .width(width)
      .height(height)
      .alphabet(
        ALPHABET_ENGLISH
          .chars()
          .chain(solution.iter().filter(|&&b| b != BLACK).map(|&b| b as char)),
      );
    if no_solution {
      builder.flags(DocumentFlags::NO_SOLUTION);
    }
    if let Some(title) = non_empty(decode_str(self.encoding, title)?) {
      builder.title(title);
    }
    if let Some(author) = non_empty(decode_str(self.encoding, author)?) {
      builder.author(author);
    }
    if let Some(copyright) = non_empty(decode_str(self.encoding, copyright)?) {
      builder.copyright(copyright);
    }
    if let Some(notes) = non_empty(decode_str(self.encoding, notes)?) {
      builder.comment(notes);
    }
    for word in words {
      builder.add_word(word);
    }
    let document = builder.build()?;

    let state = read_state(player_bytes, width, height, &extras);

    Ok(Decoded {
      document,
      state,
      checksum_mismatches,
      key,
      version: version
        .iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect(),
    })
  }
}

pub(crate) fn lookup_encoding(label: &str) -> Result<EncodingRef> {
  encoding_from_whatwg_label(label)
    .ok_or_else(|| Error::InvalidArgument(format!("Unknown encoding: {label}")))
}

/// Turn a NUL-terminated string into a standard String.
fn decode_str(encoding: EncodingRef, bytes: &[u8]) -> Result<String> {
  let text = bytes.strip_suffix(b"\0").unwrap_or(bytes);
  encoding.decode(text, DecoderTrap::Strict).map_err(|e| {
    Error::EncodingError(format!(
      "Failed parsing {:?} as {}: {}",
      text,
      encoding.name(),
      e
    ))
  })
}

fn non_empty(s: String) -> Option<String> {
  if s.is_empty() { None } else { Some(s) }
}

/// Numbers the grid the way every crossword does: left to right, top to bottom,
/// one number per square that starts an across word, a down word, or both. Each
/// word takes the next clue, across before down.
fn extract_words(
  grid: &Grid,
  clues: Vec<String>,
  cell_at: impl Fn(Pos) -> Result<Cell>,
) -> Result<Vec<Word>> {
  let mut starts = vec![];
  let mut number: u16 = 0;

  for pos in grid.positions() {
    let starts_across = grid.starts(pos, Across);
    let starts_down = grid.starts(pos, Down);
    if !starts_across && !starts_down {
      continue;
    }

    number += 1;
    if starts_across {
      starts.push((number, Across, pos));
    }
    if starts_down {
      starts.push((number, Down, pos));
    }
  }

  if starts.len() != clues.len() {
    return Err(Error::ParseError(format!(
      "Grid has {} words but the file has {} clues",
      starts.len(),
      clues.len()
    )));
  }

  starts
    .into_iter()
    .zip(clues)
    .map(|((number, direction, (row, col)), clue)| {
      let cells = grid
        .span((row, col), direction)
        .into_iter()
        .map(&cell_at)
        .collect::<Result<Vec<Cell>>>()?;
      let mut word = WordBuilder::new()
        .number(number)
        .direction(direction)
        .start(row, col)
        .cells(cells);
      // Words without a hint are written with an empty clue.
      if !clue.is_empty() {
        word = word.hint(clue);
      }
      word.build()
    })
    .collect()
}

fn read_state(player: &[u8], width: usize, height: usize, extras: &Extras) -> SolveState {
  let mut state = SolveState::new(width, height);

  for (index, &byte) in player.iter().enumerate() {
    let (row, col) = (index / width, index % width);
    let user_rebus = extras
      .user_rebus
      .as_ref()
      .and_then(|entries| entries.get(index))
      .and_then(Option::as_deref);

    match (byte, user_rebus) {
      (_, Some(entry)) => state.set_entry(row, col, Some(entry)),
      (BLACK | EMPTY, None) => {}
      (letter, None) => state.set_entry(row, col, Some((letter as char).to_string().as_str())),
    }

    if extras.markup(index) & GEXT_REVEALED != 0 {
      state.set_flag(StateFlags::CHEATED, row, col, true);
    }
  }

  if let Some(play_time) = extras.play_time {
    state.set_play_time(play_time);
  }
  state
}

/// An extension section following the notes.
struct Section<'a> {
  tag: [u8; 4],
  data: &'a [u8],
}

impl Section<'_> {
  fn name(&self) -> String {
    String::from_utf8_lossy(&self.tag).into_owned()
  }
}

fn parse_sections<'a>(
  scanner: &mut Scanner<'a>,
  checksum_mismatches: &mut Vec<ChecksumMismatch>,
) -> Result<Vec<Section<'a>>> {
  let mut sections = vec![];

  // Fewer than four bytes can't hold a section tag.
  while scanner.remaining() >= 4 {
    let mut tag = [0; 4];
    tag.copy_from_slice(scanner.take_n_bytes(4, "section tag")?);
    let len = scanner.parse_short("section length")?;
    let checksum = scanner.parse_short("section checksum")?;
    let data = scanner.take_n_bytes(len as usize, "section data")?;
    scanner.take_exact(b"\0", "section terminator")?;

    let section = Section { tag, data };
    debug!(tag = %section.name(), len, "read section");

    let expected = checksum_region(data, 0);
    if expected != checksum {
      checksum_mismatches.push(ChecksumMismatch {
        checksum: Checksum::Section(section.name()),
        expected,
        actual: checksum,
      });
    }
    sections.push(section);
  }

  if scanner.remaining() > 0 {
    warn!(bytes = scanner.remaining(), "ignoring trailing bytes");
  }
  Ok(sections)
}

/// What the known extension sections say, already validated.
#[derive(Default)]
struct Extras<'a> {
  markup: Option<&'a [u8]>,
  rebus: Option<&'a [u8]>,
  rebus_table: HashMap<u8, String>,
  user_rebus: Option<Vec<Option<String>>>,
  play_time: Option<Duration>,
}

impl<'a> Extras<'a> {
  fn parse(sections: &[Section<'a>], squares: usize, encoding: EncodingRef) -> Result<Self> {
    let mut extras = Self::default();

    for section in sections {
      match &section.tag {
        GEXT => extras.markup = Some(grid_payload(section, squares)?),
        GRBS => extras.rebus = Some(grid_payload(section, squares)?),
        RTBL => extras.rebus_table = parse_rebus_table(&decode_str(encoding, section.data)?)?,
        // Player progress; a damaged record shouldn't make the puzzle unreadable.
        RUSR => match parse_user_rebus(section.data, squares, encoding) {
          Ok(entries) => extras.user_rebus = Some(entries),
          Err(e) => warn!(error = %e, "skipping damaged RUSR section"),
        },
        LTIM => match parse_timer(section.data) {
          Ok(play_time) => extras.play_time = Some(play_time),
          Err(e) => warn!(error = %e, "skipping damaged LTIM section"),
        },
        _ => warn!(tag = %section.name(), "skipping unknown section"),
      }
    }

    // Sections may come in any order, so GRBS is checked once RTBL has been seen.
    if let Some(&n) = extras
      .rebus
      .iter()
      .flat_map(|rebus| rebus.iter())
      .find(|&&n| n != 0 && !extras.rebus_table.contains_key(&n))
    {
      return Err(Error::ParseError(format!("No rebus solution for index {n}")));
    }

    Ok(extras)
  }

  fn markup(&self, index: usize) -> u8 {
    self.markup.map_or(0, |m| m[index])
  }

  fn rebus(&self, index: usize) -> u8 {
    self.rebus.map_or(0, |r| r[index])
  }
}

/// `GEXT` and `GRBS` hold one byte per square.
fn grid_payload<'a>(section: &Section<'a>, squares: usize) -> Result<&'a [u8]> {
  if section.data.len() < squares {
    return Err(Error::ParseError(format!(
      "{} section has {} bytes but the grid has {} squares",
      section.name(),
      section.data.len(),
      squares
    )));
  }
  Ok(&section.data[..squares])
}

/// Parses `" 0:CAT; 1:DOG;"` into `{1: "CAT", 2: "DOG"}`, keyed the way `GRBS`
/// refers to the entries.
fn parse_rebus_table(table: &str) -> Result<HashMap<u8, String>> {
  let mut entries = HashMap::new();

  for entry in table.split(';').map(str::trim_start).filter(|e| !e.is_empty()) {
    let (index, solution) = entry
      .split_once(':')
      .ok_or_else(|| Error::ParseError(format!("Rebus entry {entry:?} has no ':'")))?;
    let index: u16 = index
      .trim()
      .parse()
      .map_err(|e| Error::ParseError(format!("Rebus index {index:?} is not a number: {e}")))?;
    if index > MAX_REBUS_INDEX {
      return Err(Error::ParseError(format!("Rebus index {index} is out of range")));
    }
    if solution.is_empty() {
      return Err(Error::ParseError(format!("Rebus index {index} has no solution")));
    }
    entries.insert(index as u8 + 1, solution.to_string());
  }

  Ok(entries)
}

/// `RUSR` holds one NUL-terminated string per square; empty ones mean the square
/// holds no rebus entry.
fn parse_user_rebus(
  data: &[u8],
  squares: usize,
  encoding: EncodingRef,
) -> Result<Vec<Option<String>>> {
  let mut scanner = Scanner::new(data);
  (0..squares)
    .map(|_| {
      let entry = decode_str(encoding, scanner.parse_nul_terminated_string("RUSR entry")?)?;
      Ok(non_empty(entry))
    })
    .collect()
}

/// `LTIM` is `"<seconds>,<stopped>"`.
fn parse_timer(data: &[u8]) -> Result<Duration> {
  let text = String::from_utf8_lossy(data);
  let seconds = text
    .split(',')
    .next()
    .and_then(|s| s.trim().parse::<u64>().ok())
    .ok_or_else(|| Error::ParseError(format!("Timer {text:?} not valid")))?;
  Ok(Duration::from_secs(seconds))
}

// Loosely based on
// https://depth-first.com/articles/2021/12/16/a-beginners-guide-to-parsing-in-rust/
struct Scanner<'a> {
  cursor: usize,
  data: &'a [u8],
}

impl Debug for Scanner<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Scanner")
      .field("cursor", &self.cursor)
      .finish()
  }
}

impl<'a> Scanner<'a> {
  fn new(data: &'a [u8]) -> Self {
    Self { cursor: 0, data }
  }

  fn remaining(&self) -> usize {
    self.data.len() - self.cursor
  }

  fn eof(&self, what: &'static str) -> Error {
    Error::EofError {
      offset: self.data.len(),
      what,
    }
  }

  /// Consume the next two bytes and return them as a `u16`, interpreted as little-endian.
  fn parse_short(&mut self, what: &'static str) -> Result<u16> {
    Ok(LittleEndian::read_u16(self.take_n_bytes(2, what)?))
  }

  /// Take the next `expected.len()` bytes, if they match `expected`.
  fn take_exact(&mut self, expected: &[u8], what: &'static str) -> Result<()> {
    let actual = self.take_n_bytes(expected.len(), what)?;
    if let Some(i) = actual.iter().zip(expected).position(|(a, e)| a != e) {
      return Err(Error::ParseError(format!(
        "Expected byte 0x{:X} at position 0x{:X} in {} but got 0x{:X}",
        expected[i],
        self.cursor - expected.len() + i,
        what,
        actual[i]
      )));
    }
    Ok(())
  }

  /// Take the next `n` bytes.
  fn take_n_bytes(&mut self, n: usize, what: &'static str) -> Result<&'a [u8]> {
    if n > self.remaining() {
      return Err(self.eof(what));
    }

    let data = &self.data[self.cursor..self.cursor + n];
    self.cursor += n;
    Ok(data)
  }

  /// Parses a C-style NUL-terminated string, including the NUL byte. In
  /// this function, we return just the raw bytes as they appear in the
  /// file. Converting them to a string is done later.
  fn parse_nul_terminated_string(&mut self, what: &'static str) -> Result<&'a [u8]> {
    let rest = &self.data[self.cursor..];
    let len = rest
      .iter()
      .position(|&b| b == 0)
      .ok_or_else(|| self.eof(what))?;
    self.take_n_bytes(len + 1, what)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::writer::PuzWriter;

  /// ```text
  /// CAT
  /// O.O
  /// WET
  /// ```
  fn ring() -> Document {
    let mut builder = DocumentBuilder::new();
    builder.width(3).height(3).title("Ring").author("Someone");
    for (number, direction, (row, col), hint, letters) in [
      (1, Across, (0, 0), "Feline", "CAT"),
      (3, Across, (2, 0), "Damp", "WET"),
      (1, Down, (0, 0), "Bovine", "COW"),
      (2, Down, (0, 2), "Small child", "TOT"),
    ] {
      builder.add_word(
        WordBuilder::new()
          .number(number)
          .direction(direction)
          .start(row, col)
          .hint(hint)
          .letters(letters)
          .build()
          .unwrap(),
      );
    }
    builder.build().unwrap()
  }

  fn ring_bytes() -> Vec<u8> {
    PuzWriter::new().to_bytes(&ring()).unwrap()
  }

  #[test]
  fn scanner_reports_eof() {
    let mut scanner = Scanner::new(b"\x01\x02\x03");
    assert_eq!(scanner.parse_short("short").unwrap(), 0x0201);
    assert!(matches!(
      scanner.parse_short("short"),
      Err(Error::EofError { offset: 3, what: "short" })
    ));
    assert_eq!(scanner.take_n_bytes(1, "byte").unwrap(), b"\x03");
    assert_eq!(scanner.remaining(), 0);
    assert!(scanner.take_n_bytes(1, "byte").is_err());
  }

  #[test]
  fn scanner_strings() {
    let mut scanner = Scanner::new(b"ab\0\0c");
    assert_eq!(scanner.parse_nul_terminated_string("s").unwrap(), b"ab\0");
    assert_eq!(scanner.parse_nul_terminated_string("s").unwrap(), b"\0");
    assert!(matches!(
      scanner.parse_nul_terminated_string("s"),
      Err(Error::EofError { .. })
    ));
  }

  #[test]
  fn scanner_take_exact() {
    assert!(Scanner::new(b"AB").take_exact(b"AB", "magic").is_ok());
    assert!(matches!(
      Scanner::new(b"AC").take_exact(b"AB", "magic"),
      Err(Error::ParseError(_))
    ));
    assert!(matches!(
      Scanner::new(b"A").take_exact(b"AB", "magic"),
      Err(Error::EofError { .. })
    ));
  }

  #[test]
  fn decodes_ring() {
    let decoded = PuzReader::new().decode(&ring_bytes()).unwrap();
    assert!(decoded.checksum_mismatches.is_empty());
    assert_eq!(decoded.key, None);
    assert_eq!(decoded.version, "1.3");

    let document = decoded.document;
    assert_eq!((document.width(), document.height()), (3, 3));
    assert_eq!(document.square_count(), 8);
    assert_eq!(document.title(), Some("Ring"));
    assert_eq!(document.copyright(), None);
    assert_eq!(document.hash(), ring().hash());

    let numbers: Vec<_> = document.words_across().iter().map(Word::number).collect();
    assert_eq!(numbers, [1, 3]);
    let tot = document.find_word(Down, 2).unwrap();
    assert_eq!(tot.hint(), Some("Small child"));
    assert_eq!((tot.start_row(), tot.start_column()), (0, 2));

    assert!(decoded.state.is_blank());
  }

  #[test]
  fn rejects_bad_magic() {
    let mut data = ring_bytes();
    data[2] = b'a';
    assert!(matches!(PuzReader::new().read(&data), Err(Error::ParseError(_))));
  }

  #[test]
  fn rejects_truncated_files() {
    let data = ring_bytes();
    for len in [0, 1, 10, 0x2D, 0x34 + 5, data.len() - 1] {
      let err = PuzReader::new().read(&data[..len]).unwrap_err();
      assert!(err.is_format_error(), "{len}: {err}");
    }
  }

  #[test]
  fn reports_checksum_mismatches_without_failing() {
    let mut data = ring_bytes();
    data[0] ^= 0xFF;
    data[0x10] ^= 0xFF;
    let decoded = PuzReader::new().decode(&data).unwrap();
    let checksums: Vec<_> = decoded
      .checksum_mismatches
      .iter()
      .map(|m| m.checksum.clone())
      .collect();
    assert_eq!(checksums, [Checksum::Overall, Checksum::Masked(0)]);
  }

  #[test]
  fn clue_count_must_match_the_grid() {
    let mut data = ring_bytes();
    // Claim one clue fewer and drop the empty notes, so the last clue becomes
    // the notes.
    data[0x2E] -= 1;
    data.pop();
    assert!(matches!(PuzReader::new().read(&data), Err(Error::ParseError(_))));
  }

  #[test]
  fn unknown_sections_are_skipped() {
    let mut data = ring_bytes();
    data.extend_from_slice(b"ZZZZ\x02\x00");
    data.extend_from_slice(&checksum_region(b"hi", 0).to_le_bytes());
    data.extend_from_slice(b"hi\0");
    let decoded = PuzReader::new().decode(&data).unwrap();
    assert!(decoded.checksum_mismatches.is_empty());
    assert_eq!(decoded.document, ring());
  }

  #[test]
  fn section_checksums_are_verified() {
    let mut data = ring_bytes();
    data.extend_from_slice(b"ZZZZ\x02\x00\x00\x00hi\0");
    let decoded = PuzReader::new().decode(&data).unwrap();
    assert_eq!(
      decoded.checksum_mismatches[0].checksum,
      Checksum::Section("ZZZZ".into())
    );
  }

  #[test]
  fn short_grid_sections_are_rejected() {
    let mut data = ring_bytes();
    data.extend_from_slice(b"GEXT\x02\x00\x00\x00\x80\x00\0");
    assert!(matches!(PuzReader::new().read(&data), Err(Error::ParseError(_))));
  }

  #[test]
  fn rebus_without_table_is_rejected() {
    let mut data = ring_bytes();
    let grbs = [1, 0, 0, 0, 0, 0, 0, 0, 0];
    data.extend_from_slice(b"GRBS\x09\x00");
    data.extend_from_slice(&checksum_region(&grbs, 0).to_le_bytes());
    data.extend_from_slice(&grbs);
    data.push(0);
    assert!(matches!(PuzReader::new().read(&data), Err(Error::ParseError(_))));
  }

  fn with_section(mut data: Vec<u8>, tag: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    data.extend_from_slice(tag);
    data.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    data.extend_from_slice(&checksum_region(payload, 0).to_le_bytes());
    data.extend_from_slice(payload);
    data.push(0);
    data
  }

  #[test]
  fn rebus_indices_are_checked_on_every_square() {
    // The middle square of the ring is black and in no word.
    let data = with_section(ring_bytes(), GRBS, &[0, 0, 0, 0, 7, 0, 0, 0, 0]);
    assert!(matches!(PuzReader::new().read(&data), Err(Error::ParseError(_))));
  }

  #[test]
  fn rebus_table_may_follow_the_rebus_grid() {
    let data = with_section(ring_bytes(), GRBS, &[3, 0, 0, 0, 0, 0, 0, 0, 0]);
    let data = with_section(data, RTBL, b" 2:CAR;");
    let document = PuzReader::new().read(&data).unwrap();
    let cat = document.find_word(Across, 1).unwrap();
    assert_eq!(cat.cells()[0].chars(), "CAR");
  }

  #[test]
  fn damaged_progress_sections_are_skipped() {
    let data = with_section(ring_bytes(), LTIM, b"soon,0");
    let data = with_section(data, RUSR, b"\0CAT\0");
    let decoded = PuzReader::new().decode(&data).unwrap();
    assert_eq!(decoded.document, ring());
    assert_eq!(decoded.state.play_time(), Duration::ZERO);
    assert!(decoded.state.is_blank());
  }

  #[test]
  fn trailing_bytes_too_short_for_a_section_are_ignored() {
    for tail in [&b"\0"[..], b"\0\0", b"GE\0"] {
      let mut data = ring_bytes();
      data.extend_from_slice(tail);
      let decoded = PuzReader::new().decode(&data).unwrap();
      assert_eq!(decoded.document, ring());
    }
  }

  #[test]
  fn rebus_tables() {
    let table = parse_rebus_table(" 0:CAT; 9:DOG;").unwrap();
    assert_eq!(table.get(&1).map(String::as_str), Some("CAT"));
    assert_eq!(table.get(&10).map(String::as_str), Some("DOG"));
    assert!(parse_rebus_table("").unwrap().is_empty());

    for bad in ["0CAT;", "x:CAT;", "255:CAT;", "-1:CAT;", "0:;", " 3:"] {
      assert!(matches!(parse_rebus_table(bad), Err(Error::ParseError(_))), "{bad}");
    }
  }

  #[test]
  fn timers() {
    assert_eq!(parse_timer(b"95,0").unwrap(), Duration::from_secs(95));
    assert_eq!(parse_timer(b"3,1").unwrap(), Duration::from_secs(3));
    assert!(parse_timer(b"soon,0").is_err());
  }

  #[test]
  fn user_rebus_entries() {
    let entries = parse_user_rebus(b"\0CAT\0\0", 3, ISO_8859_1).unwrap();
    assert_eq!(entries, [None, Some("CAT".to_string()), None]);
    assert!(parse_user_rebus(b"\0CAT\0", 3, ISO_8859_1).is_err());
  }

  #[test]
  fn out_of_range_key_is_rejected_up_front() {
    let err = PuzReader::new().with_key(10_000).read(b"").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
  }

  #[test]
  fn encodings() {
    assert!(PuzReader::with_encoding("utf-8").is_ok());
    assert!(PuzReader::with_encoding("latin1").is_ok());
    assert!(matches!(
      PuzReader::with_encoding("klingon"),
      Err(Error::InvalidArgument(_))
    ));

    assert_eq!(decode_str(ISO_8859_1, b"Caf\xE9\0").unwrap(), "Café");
    let utf8 = lookup_encoding("utf-8").unwrap();
    assert_eq!(decode_str(utf8, "Café\0".as_bytes()).unwrap(), "Café");
    assert!(matches!(decode_str(utf8, b"\xFF\0"), Err(Error::EncodingError(_))));
  }
}
