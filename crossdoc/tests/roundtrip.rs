mod common;

use common::{FIVE, five, grid_builder, grid_document, hint};
use crossdoc::Direction::{Across, Down};
use crossdoc::{
  CellAttributes, Checksum, DocumentBuilder, DocumentFlags, Error, PuzReader, PuzWriter,
  StateFlags, WordBuilder,
};
use std::collections::HashSet;
use std::io::Cursor;
use std::time::Duration;

#[test]
fn write_then_read_gives_the_same_document() {
  let document = five();
  let mut bytes = vec![];
  PuzWriter::new().write(&document, &mut bytes).unwrap();

  let decoded = PuzReader::new().decode(&bytes).unwrap();
  assert!(decoded.checksum_mismatches.is_empty());
  assert_eq!(decoded.key, None);

  let read = decoded.document;
  assert_eq!(read, document);
  assert_eq!(read.hash(), document.hash());
  assert_eq!((read.width(), read.height()), (5, 5));
  assert_eq!(read.square_count(), document.square_count());
  assert_eq!(read.square_count(), 23);
  assert_eq!(read.title(), Some("Five by five"));
  assert_eq!(read.author(), Some("A. Setter"));
  assert_eq!(read.copyright(), Some("© 2024"));
  assert_eq!(read.comment(), Some("No theme."));
}

#[test]
fn words_without_hints_survive_a_round_trip() {
  let mut builder = DocumentBuilder::new();
  builder.width(2).height(2);
  for (number, direction, (row, col), letters) in [
    (1, Across, (0, 0), "AB"),
    (3, Across, (1, 0), "CD"),
    (1, Down, (0, 0), "AC"),
    (2, Down, (0, 1), "BD"),
  ] {
    let mut word = WordBuilder::new()
      .number(number)
      .direction(direction)
      .start(row, col)
      .letters(letters);
    if number == 3 {
      word = word.hint("Only clue");
    }
    builder.add_word(word.build().unwrap());
  }
  let document = builder.build().unwrap();

  let read = PuzReader::new()
    .read(&PuzWriter::new().to_bytes(&document).unwrap())
    .unwrap();
  assert_eq!(read.find_word(Across, 1).unwrap().hint(), None);
  assert_eq!(read.find_word(Down, 2).unwrap().hint(), None);
  assert_eq!(read.find_word(Across, 3).unwrap().hint(), Some("Only clue"));
  assert_eq!(read, document);
  assert_eq!(read.hash(), document.hash());
}

#[test]
fn read_from_any_reader() {
  let bytes = PuzWriter::new().to_bytes(&five()).unwrap();
  let document = PuzReader::new().read_from(Cursor::new(bytes)).unwrap();
  assert_eq!(document, five());
}

#[test]
fn words_match_the_grid() {
  let document = PuzReader::new()
    .read(&PuzWriter::new().to_bytes(&five()).unwrap())
    .unwrap();

  let across: Vec<u16> = document.words_across().iter().map(|w| w.number()).collect();
  let down: Vec<u16> = document.words_down().iter().map(|w| w.number()).collect();
  assert_eq!(across, [1, 5, 7, 8, 9]);
  assert_eq!(down, [1, 2, 3, 4, 6]);

  for word in document.words() {
    assert_eq!(word.hint(), Some(hint(word.number(), word.direction()).as_str()));
    let letters: String = word.cells().iter().map(|c| c.chars()).collect();
    let expected: String = word
      .positions()
      .map(|(r, c)| FIVE[r].as_bytes()[c] as char)
      .collect();
    assert_eq!(letters, expected, "{word}");
  }

  assert_eq!(document.find_word(Down, 1).unwrap().len(), 4);
  assert_eq!(document.find_word(Down, 6).unwrap().start_row(), 1);
  assert_eq!(document.find_word_at(Across, 4, 3).unwrap().number(), 9);
  assert_eq!(
    document.alphabet().len(),
    26,
    "grid letters are all in A-Z already"
  );
}

#[test]
fn rebus_and_circles_survive() {
  let mut builder = grid_builder(FIVE, &[(2, 2, "RIS"), (3, 3, "ETC")], &[(0, 0), (2, 2)]);
  builder.title("Rebus");
  let document = builder.build().unwrap();

  let bytes = PuzWriter::new().to_bytes(&document).unwrap();
  let read = PuzReader::new().read(&bytes).unwrap();
  assert_eq!(read, document);

  let cells = read.cell_map();
  assert_eq!(cells.get(2, 2).unwrap().chars(), "RIS");
  assert!(cells.get(2, 2).unwrap().is_circled());
  assert!(cells.get(2, 2).unwrap().is_rebus());
  assert_eq!(cells.get(3, 3).unwrap().chars(), "ETC");
  assert!(!cells.get(3, 3).unwrap().is_circled());
  assert!(cells.get(0, 0).unwrap().is_circled());
  assert!(cells.get(0, 4).is_none());
}

#[test]
fn player_progress_survives() {
  let document = five();
  let mut state = document.new_state();
  state.set_entry(0, 0, Some("S"));
  state.set_entry(0, 1, Some("W"));
  state.set_entry(1, 1, Some("Q"));
  state.set_entry(2, 2, Some("RIS"));
  state.set_flag(StateFlags::CHEATED, 0, 1, true);
  state.set_play_time(Duration::from_secs(3600));

  let bytes = PuzWriter::new().with_state(&state).to_bytes(&document).unwrap();
  let decoded = PuzReader::new().decode(&bytes).unwrap();
  assert!(decoded.checksum_mismatches.is_empty());

  let mut saved = decoded.state;
  assert_eq!(saved.entry(0, 0), Some("S"));
  assert_eq!(saved.entry(2, 2), Some("RIS"));
  assert_eq!(saved.entry(4, 4), None);
  assert!(saved.is_flag_set(StateFlags::CHEATED, 0, 1));
  assert_eq!(saved.play_time(), Duration::from_secs(3600));

  decoded.document.update_statistics(&mut saved).unwrap();
  let stats = saved.stats();
  assert_eq!(stats.total, 23);
  assert_eq!(stats.solved, 1);
  assert_eq!(stats.cheated, 1);
  // "Q" where "O" belongs, and "RIS" where "I" belongs.
  assert_eq!(stats.wrong, 2);
  assert!(!saved.is_completed());
}

#[test]
fn no_solution_puzzles() {
  let mut builder = DocumentBuilder::from_document(&five());
  builder.flags(DocumentFlags::NO_SOLUTION);
  let document = builder.build().unwrap();

  let read = PuzReader::new()
    .read(&PuzWriter::new().to_bytes(&document).unwrap())
    .unwrap();
  assert!(read.flags().contains(DocumentFlags::NO_SOLUTION));
  assert!(
    read
      .words()
      .flat_map(|w| w.cells())
      .all(|c| c.attributes().contains(CellAttributes::NO_SOLUTION))
  );

  let mut state = read.new_state();
  state.set_entry(0, 0, Some("X"));
  let stats = read.statistics(&state).unwrap();
  assert_eq!((stats.unknown, stats.wrong), (1, 0));
}

#[test]
fn bad_magic_is_rejected() {
  let mut bytes = PuzWriter::new().to_bytes(&five()).unwrap();
  bytes[5] = b'?';
  let err = PuzReader::new().read(&bytes).unwrap_err();
  assert!(matches!(err, Error::ParseError(_)), "{err}");
  assert!(err.is_format_error());
}

#[test]
fn every_truncation_is_a_format_error() {
  let bytes = PuzWriter::new().to_bytes(&five()).unwrap();
  for len in 0..bytes.len() {
    let err = PuzReader::new().read(&bytes[..len]).unwrap_err();
    assert!(err.is_format_error(), "{len}: {err}");
  }
}

#[test]
fn corrupted_checksums_are_reported() {
  let mut bytes = PuzWriter::new().to_bytes(&five()).unwrap();
  // CIB checksum
  bytes[0x0E] ^= 0x01;
  let decoded = PuzReader::new().decode(&bytes).unwrap();
  assert_eq!(decoded.document, five());

  let checksums: HashSet<String> = decoded
    .checksum_mismatches
    .iter()
    .map(|m| m.checksum.to_string())
    .collect();
  assert!(checksums.contains(&Checksum::CIB.to_string()));
  assert!(!checksums.contains(&Checksum::Overall.to_string()));
}

#[test]
fn empty_grids() {
  let document = grid_document(&[]);
  let read = PuzReader::new()
    .read(&PuzWriter::new().to_bytes(&document).unwrap())
    .unwrap();
  assert_eq!(read, document);
  assert_eq!(read.square_count(), 0);
  assert!(read.next_word(None).is_none());
}
