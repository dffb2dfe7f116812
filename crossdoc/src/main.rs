use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossdoc::{Decoded, PuzReader, PuzWriter};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Inspect, fingerprint and unlock .puz crossword files
#[derive(Parser, Debug)]
#[command(name = "crossdoc", version)]
struct Cli {
  /// WHATWG label of the encoding used for text (title, clues, notes)
  #[arg(long, global = true, default_value = "iso-8859-1")]
  encoding: String,

  /// Log decoding details
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print a puzzle's metadata, size and content hash
  Info { file: PathBuf },
  /// Print the content hash of each file
  Hash {
    #[arg(required = true)]
    files: Vec<PathBuf>,
  },
  /// Try to read every .puz file in a directory
  Check { dir: PathBuf },
  /// Write an unlocked copy of a scrambled puzzle
  Unlock {
    file: PathBuf,
    #[arg(short, long)]
    output: PathBuf,
    /// The four-digit key; every key is tried when it's not given
    #[arg(long)]
    key: Option<u16>,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .try_init();
}

fn reader(encoding: &str) -> Result<PuzReader> {
  // The WHATWG table maps this label to windows-1252, which rejects a few bytes.
  if encoding.eq_ignore_ascii_case("iso-8859-1") {
    return Ok(PuzReader::new());
  }
  PuzReader::with_encoding(encoding).with_context(|| format!("unsupported encoding {encoding}"))
}

fn writer<'a>(encoding: &str) -> Result<PuzWriter<'a>> {
  if encoding.eq_ignore_ascii_case("iso-8859-1") {
    return Ok(PuzWriter::new());
  }
  PuzWriter::with_encoding(encoding).with_context(|| format!("unsupported encoding {encoding}"))
}

fn decode(reader: &PuzReader, path: &Path) -> Result<Decoded> {
  let data = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
  reader
    .decode(&data)
    .with_context(|| format!("decoding {}", path.display()))
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);
  let reader = reader(&cli.encoding)?;

  match cli.command {
    Command::Info { file } => {
      let decoded = decode(&reader, &file)?;
      let document = &decoded.document;
      println!("Title:      {}", document.title().unwrap_or(""));
      println!("Author:     {}", document.author().unwrap_or(""));
      println!("Copyright:  {}", document.copyright().unwrap_or(""));
      println!("Version:    {}", decoded.version);
      println!("Size:       {}x{}", document.width(), document.height());
      println!("Squares:    {}", document.square_count());
      println!(
        "Words:      {} across, {} down",
        document.words_across().len(),
        document.words_down().len()
      );
      if let Some(key) = decoded.key {
        println!("Key:        {key}");
      }
      println!("Hash:       {}", document.hash());
      for mismatch in &decoded.checksum_mismatches {
        println!("Warning:    {mismatch}");
      }
    }
    Command::Hash { files } => {
      for file in files {
        let document = decode(&reader, &file)?.document;
        println!("{}  {}", document.hash(), file.display());
      }
    }
    Command::Check { dir } => {
      let mut success = 0;
      let mut failure = 0;

      let entries = fs::read_dir(&dir).with_context(|| format!("listing {}", dir.display()))?;
      for entry in entries {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "puz") {
          continue;
        }

        match decode(&reader, &path) {
          Ok(decoded) if decoded.checksum_mismatches.is_empty() => {
            println!(
              "Parsed '{}' successfully from {}",
              decoded.document.title().unwrap_or(""),
              path.display()
            );
            success += 1;
          }
          Ok(decoded) => {
            println!(
              "Parsed '{}' with checksum mismatches: {:?}",
              decoded.document.title().unwrap_or(""),
              decoded.checksum_mismatches
            );
            success += 1;
          }
          Err(e) => {
            println!("Failed with {:#} from {}", e, path.display());
            failure += 1;
          }
        }
      }
      println!("{success} parsed, {failure} failed");
    }
    Command::Unlock { file, output, key } => {
      let reader = match key {
        Some(key) => reader.with_key(key),
        None => reader,
      };
      let decoded = decode(&reader, &file)?;
      let bytes = writer(&cli.encoding)?
        .with_state(&decoded.state)
        .to_bytes(&decoded.document)
        .context("re-encoding the unlocked puzzle")?;
      fs::write(&output, bytes).with_context(|| format!("writing {}", output.display()))?;

      match decoded.key {
        Some(key) => info!(key, "unlocked"),
        None => info!("puzzle was not locked"),
      }
      println!("Wrote {}", output.display());
    }
  }

  Ok(())
}
