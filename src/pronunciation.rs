use lazy_static::lazy_static;
use regex::Regex;
use std::{collections::HashMap, io::{BufRead, BufReader}, fs::File, path::Path};
use tracing::info;

use crate::error::{OracleError, Result};

/// One pronunciation: a sequence of ARPAbet phonemes such as `["F", "AY1", "ER0"]`.
pub type Pronunciation = Vec<String>;

/// A phoneme carries stress when its last character is a digit (`AY1`, `ER0`).
pub fn carries_stress(phoneme: &str) -> bool {
  phoneme.chars().last().map_or(false, |c| c.is_ascii_digit())
}

/// Read-only table from spelling to pronunciation variants, in CMU dict format.
///
/// Keys are case-sensitive. Load it once and share it behind an `Arc`.
#[derive(Clone, Debug, Default)]
pub struct PronouncingDictionary {
  entries: HashMap<String, Vec<Pronunciation>>
}

lazy_static! {
  static ref COMMENT_STRIPPING_RE: Regex = Regex::new(r"\s*\#.*").unwrap();
  static ref VARIANT_SUFFIX_RE: Regex = Regex::new(r"\(\d+\)$").unwrap();
}

impl PronouncingDictionary {
  pub fn parse(text: &str) -> Result<PronouncingDictionary> {
    let mut dictionary = PronouncingDictionary::default();
    for (i, line) in text.lines().enumerate() {
      dictionary.add_line(i + 1, line)?;
    }
    Ok(dictionary)
  }

  pub fn load(path: &Path) -> Result<PronouncingDictionary> {
    let to_load_error = |source| OracleError::DictionaryLoad { path: path.to_owned(), source };

    let mut dictionary = PronouncingDictionary::default();
    let reader = BufReader::new(File::open(path).map_err(to_load_error)?);
    for (i, line) in reader.lines().enumerate() {
      let line = line.map_err(to_load_error)?;
      dictionary.add_line(i + 1, &line)?;
    }

    info!("Loaded pronouncing dictionary with {} words from {}", dictionary.len(), path.display());
    Ok(dictionary)
  }

  fn add_line(&mut self, line_number: usize, line: &str) -> Result<()> {
    if line.starts_with(";;;") {
      return Ok(());
    }
    let line = COMMENT_STRIPPING_RE.replace(line, "");
    let mut tokens = line.split_whitespace();
    let Some(word_and_number) = tokens.next() else {
      return Ok(());
    };
    let word = VARIANT_SUFFIX_RE.replace(word_and_number, "").into_owned();
    let pronunciation: Pronunciation = tokens.map(|t| t.to_owned()).collect();
    if word.is_empty() || pronunciation.is_empty() {
      return Err(OracleError::MalformedDictionaryLine { line_number, line: line.into_owned() });
    }
    self.entries.entry(word).or_default().push(pronunciation);
    Ok(())
  }

  /// Pronunciation variants for exactly this spelling, in file order. Empty when absent.
  pub fn lookup(&self, word: &str) -> &[Pronunciation] {
    self.entries.get(word).map(|ps| ps.as_slice()).unwrap_or(&[])
  }

  pub fn contains(&self, word: &str) -> bool {
    self.entries.contains_key(word)
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}
