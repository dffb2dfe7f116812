//! Writing `.puz` files.

use crate::checksum::{ChecksumInput, checksum_region};
use crate::document::{Document, DocumentFlags};
use crate::grid::{BLACK, EMPTY};
use crate::puz::{
  GEXT, GEXT_CIRCLED, GEXT_REVEALED, GRBS, LTIM, MAGIC, MAX_REBUS_INDEX, PuzzleType, RTBL, RUSR,
  lookup_encoding,
};
use crate::scramble::{check_key, lock};
use crate::state::{SolveState, StateFlags};
use crate::word::Word;
use crate::{Error, Result};
use std::fmt::Debug;
use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use encoding::all::ISO_8859_1;
use encoding::{EncoderTrap, Encoding, EncodingRef};
use tracing::debug;

/// Writes [Document]s as `.puz` data, optionally with a player's progress and
/// optionally locked with a key.
///
/// ```
/// # use crossdoc::{Direction, DocumentBuilder, PuzReader, PuzWriter, WordBuilder};
/// let mut builder = DocumentBuilder::new();
/// builder.width(2).height(1).add_word(
///   WordBuilder::new()
///     .number(1)
///     .direction(Direction::Across)
///     .hint("Greeting")
///     .letters("HI")
///     .build()?,
/// );
/// let document = builder.build()?;
///
/// let bytes = PuzWriter::new().to_bytes(&document)?;
/// assert_eq!(PuzReader::new().read(&bytes)?, document);
/// # Ok::<(), crossdoc::Error>(())
/// ```
#[derive(Clone)]
pub struct PuzWriter<'a> {
  encoding: EncodingRef,
  version: [u8; 4],
  scramble_key: Option<u16>,
  state: Option<&'a SolveState>,
}

impl Debug for PuzWriter<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("PuzWriter")
      .field("encoding", &self.encoding.name())
      .field("version", &self.version)
      .field("scramble_key", &self.scramble_key)
      .field("state", &self.state.is_some())
      .finish()
  }
}

impl Default for PuzWriter<'_> {
  fn default() -> Self {
    Self {
      encoding: ISO_8859_1,
      version: *b"1.3\0",
      scramble_key: None,
      state: None,
    }
  }
}

impl<'a> PuzWriter<'a> {
  /// A writer that encodes text as ISO-8859-1 and writes version `1.3` files.
  pub fn new() -> Self {
    Self::default()
  }

  /// A writer that encodes text with the encoding known by the given
  /// [WHATWG label](https://encoding.spec.whatwg.org/#names-and-labels).
  pub fn with_encoding(label: &str) -> Result<Self> {
    Ok(Self {
      encoding: lookup_encoding(label)?,
      ..Self::default()
    })
  }

  /// Sets the version string, e.g. `1.2`. At most three ASCII characters.
  pub fn with_version(mut self, version: &str) -> Result<Self> {
    if version.len() > 3 || !version.is_ascii() {
      return Err(Error::InvalidArgument(format!("Version not valid: {version:?}")));
    }
    self.version = [0; 4];
    self.version[..version.len()].copy_from_slice(version.as_bytes());
    Ok(self)
  }

  /// Locks the solution with `key`, which must be at most [MAX_KEY](crate::MAX_KEY).
  pub fn with_scramble_key(mut self, key: u16) -> Self {
    self.scramble_key = Some(key);
    self
  }

  /// Saves `state` in the player grid instead of leaving it empty.
  pub fn with_state(mut self, state: &'a SolveState) -> Self {
    self.state = Some(state);
    self
  }

  pub fn write<W: Write>(&self, document: &Document, mut out: W) -> Result<()> {
    out.write_all(&self.to_bytes(document)?)?;
    Ok(())
  }

  pub fn to_bytes(&self, document: &Document) -> Result<Vec<u8>> {
    if let Some(key) = self.scramble_key {
      check_key(key)?;
    }

    let (width, height) = (document.width(), document.height());
    if width > u8::MAX as usize || height > u8::MAX as usize {
      return Err(Error::InvalidArgument(format!(
        "A {width}x{height} puzzle is too big for a .puz file"
      )));
    }
    if let Some(state) = self.state {
      if state.width() != width || state.height() != height {
        return Err(Error::DimensionMismatch {
          width,
          height,
          actual_width: state.width(),
          actual_height: state.height(),
        });
      }
    }

    let squares = width * height;
    let mut solution = vec![BLACK; squares];
    let mut player = vec![BLACK; squares];
    let mut markup = vec![0; squares];
    let mut rebus = vec![0; squares];
    let mut rebus_solutions: Vec<&str> = vec![];
    let mut user_rebus: Vec<Option<&str>> = vec![None; squares];

    let cells = document.cell_map();
    for row in 0..height {
      for col in 0..width {
        let index = row * width + col;
        let Some(cell) = cells.get(row, col).filter(|cell| !cell.is_empty()) else {
          continue;
        };

        solution[index] = grid_byte(cell.chars())?;
        player[index] = EMPTY;
        if cell.is_circled() {
          markup[index] |= GEXT_CIRCLED;
        }

        if cell.is_rebus() {
          let position = rebus_solutions.iter().position(|&s| s == cell.chars());
          let n = position.unwrap_or_else(|| {
            rebus_solutions.push(cell.chars());
            rebus_solutions.len() - 1
          });
          if n > MAX_REBUS_INDEX as usize {
            return Err(Error::InvalidArgument("Too many distinct rebus squares".into()));
          }
          rebus[index] = n as u8 + 1;
        }

        if let Some(state) = self.state {
          if let Some(entry) = state.entry(row, col) {
            player[index] = grid_byte(entry)?;
            if entry.chars().nth(1).is_some() {
              user_rebus[index] = Some(entry);
            }
          }
          if state.is_flag_set(StateFlags::CHEATED, row, col) {
            markup[index] |= GEXT_REVEALED;
          }
        }
      }
    }

    // The order in which a reader numbers the grid.
    let mut words: Vec<&Word> = document.words().collect();
    words.sort_by_key(|word| (word.start_row(), word.start_column(), word.direction()));
    if words.len() > u16::MAX as usize {
      return Err(Error::InvalidArgument("Too many clues for a .puz file".into()));
    }
    let clues = words
      .iter()
      .map(|word| self.encode_str(word.hint().unwrap_or("")))
      .collect::<Result<Vec<_>>>()?;
    let clues: Vec<&[u8]> = clues.iter().map(Vec::as_slice).collect();

    let mut puzzle_type = PuzzleType::empty();
    if document.flags().contains(DocumentFlags::NO_SOLUTION) {
      puzzle_type |= PuzzleType::NO_SOLUTION;
    }
    let mut scrambled_checksum = 0;
    if let Some(key) = self.scramble_key {
      scrambled_checksum = lock(&mut solution, width, height, key)?;
      puzzle_type |= PuzzleType::SCRAMBLED;
      debug!(key, "scrambled solution");
    }

    let mut cib = Vec::with_capacity(8);
    cib.push(width as u8);
    cib.push(height as u8);
    cib.write_u16::<LittleEndian>(clues.len() as u16)?;
    cib.write_u16::<LittleEndian>(0x0001)?;
    cib.write_u16::<LittleEndian>(puzzle_type.bits())?;

    let title = self.encode_str(document.title().unwrap_or(""))?;
    let author = self.encode_str(document.author().unwrap_or(""))?;
    let copyright = self.encode_str(document.copyright().unwrap_or(""))?;
    let notes = self.encode_str(document.comment().unwrap_or(""))?;

    let checksums = ChecksumInput {
      cib: &cib,
      solution: &solution,
      player: &player,
      title: &title,
      author: &author,
      copyright: &copyright,
      clues: &clues,
      notes: &notes,
    }
    .compute();

    let mut out = Vec::new();
    out.write_u16::<LittleEndian>(checksums.overall)?;
    out.write_all(MAGIC)?;
    out.write_u16::<LittleEndian>(checksums.cib)?;
    out.write_all(&checksums.masked)?;
    out.write_all(&self.version)?;
    out.write_all(&[0; 2])?;
    out.write_u16::<LittleEndian>(scrambled_checksum)?;
    out.write_all(&[0; 12])?;
    out.write_all(&cib)?;
    out.write_all(&solution)?;
    out.write_all(&player)?;
    out.write_all(&title)?;
    out.write_all(&author)?;
    out.write_all(&copyright)?;
    for clue in &clues {
      out.write_all(clue)?;
    }
    out.write_all(&notes)?;

    if !rebus_solutions.is_empty() {
      write_section(&mut out, GRBS, &rebus)?;
      let mut table = String::new();
      for (i, solution) in rebus_solutions.iter().enumerate() {
        if solution.contains(';') {
          return Err(Error::InvalidArgument(format!(
            "Rebus {solution:?} can't contain ';'"
          )));
        }
        table.push_str(&format!("{i:2}:{solution};"));
      }
      write_section(&mut out, RTBL, &self.encode_text(&table)?)?;
    }

    if markup.iter().any(|&b| b != 0) {
      write_section(&mut out, GEXT, &markup)?;
    }

    if user_rebus.iter().any(Option::is_some) {
      let mut data = vec![];
      for entry in &user_rebus {
        data.extend(self.encode_str(entry.unwrap_or(""))?);
      }
      write_section(&mut out, RUSR, &data)?;
    }

    if let Some(state) = self.state.filter(|state| !state.play_time().is_zero()) {
      let timer = format!("{},0", state.play_time().as_secs());
      write_section(&mut out, LTIM, timer.as_bytes())?;
    }

    Ok(out)
  }

  fn encode_text(&self, s: &str) -> Result<Vec<u8>> {
    self
      .encoding
      .encode(s, EncoderTrap::Strict)
      .map_err(|e| Error::EncodingError(format!("Failed encoding {s:?} as {}: {e}", self.encoding.name())))
  }

  /// Encodes `s` as a NUL-terminated string.
  fn encode_str(&self, s: &str) -> Result<Vec<u8>> {
    if s.contains('\0') {
      return Err(Error::InvalidArgument(format!("{s:?} contains a NUL character")));
    }
    let mut bytes = self.encode_text(s)?;
    bytes.push(0);
    Ok(bytes)
  }
}

/// Grids hold one ISO-8859-1 byte per square; rebus squares keep their first
/// character there.
fn grid_byte(chars: &str) -> Result<u8> {
  match chars.chars().next() {
    Some(c) if (c as u32) <= 0xFF && c != '\0' && c != BLACK as char => Ok(c as u8),
    _ => Err(Error::InvalidArgument(format!(
      "{chars:?} can't be stored in a .puz grid"
    ))),
  }
}

fn write_section(out: &mut Vec<u8>, tag: &[u8; 4], data: &[u8]) -> Result<()> {
  let len = u16::try_from(data.len()).map_err(|_| {
    Error::InvalidArgument(format!(
      "{} section is too long",
      String::from_utf8_lossy(tag)
    ))
  })?;
  out.write_all(tag)?;
  out.write_u16::<LittleEndian>(len)?;
  out.write_u16::<LittleEndian>(checksum_region(data, 0))?;
  out.write_all(data)?;
  out.push(0);
  Ok(())
}
