//! Poem, stanza and line types, plus the line-level syllable aggregation.
//!
//! All three are immutable once built. A `Poem` parses itself into stanzas on
//! first use and keeps the result.

use std::path::Path;
use std::sync::OnceLock;

use itertools::Itertools;

use crate::config::StripSets;
use crate::error::{OracleError, Result};
use crate::parser::parse_into_stanzas;
use crate::syllables::SyllableEstimator;

/// Splits a line into word tokens on whitespace, then splits hyphenated
/// compounds into their parts: `"blood-flow of"` gives `["blood", "flow", "of"]`.
pub fn tokenize(text: &str) -> Vec<String> {
  text.split_whitespace()
    .flat_map(|word| word.split('-'))
    .filter(|part| !part.is_empty())
    .map(|part| part.to_owned())
    .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
  text: String,
  tokens: Vec<String>,
}

impl Line {
  pub fn new(text: impl Into<String>) -> Result<Line> {
    let text = text.into();
    if text.is_empty() {
      return Err(OracleError::EmptyLine);
    }
    let tokens = tokenize(&text);
    Ok(Line { text, tokens })
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn tokens(&self) -> &[String] {
    &self.tokens
  }

  /// Whitespace-delimited words of the raw text. Hyphenated words count once.
  pub fn words(&self) -> impl Iterator<Item = &str> {
    self.text.split_whitespace()
  }

  /// Sum of the first syllable estimate of every token.
  pub fn total_syllables(&self, estimator: &SyllableEstimator) -> usize {
    self.tokens.iter().map(|t| estimator.estimate(t)[0]).sum()
  }

  /// Every distinct syllable count per token, first-discovered order kept.
  pub fn syllable_pattern(&self, estimator: &SyllableEstimator) -> Vec<Vec<usize>> {
    self.tokens.iter().map(|t| {
      estimator.estimate(t).into_iter().unique().collect()
    }).collect()
  }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Stanza {
  lines: Vec<Line>,
}

impl Stanza {
  pub fn new(lines: Vec<Line>) -> Result<Stanza> {
    if lines.is_empty() {
      return Err(OracleError::EmptyStanza);
    }
    Ok(Stanza { lines })
  }

  /// Builds a stanza straight from line texts.
  pub fn from_texts<S: AsRef<str>>(texts: &[S]) -> Result<Stanza> {
    let lines = texts.iter().map(|t| Line::new(t.as_ref())).collect::<Result<Vec<Line>>>()?;
    Stanza::new(lines)
  }

  pub fn lines(&self) -> &[Line] {
    &self.lines
  }

  pub fn line_count(&self) -> usize {
    self.lines.len()
  }

  pub fn text(&self) -> String {
    self.lines.iter().map(|l| l.text()).join("\n")
  }
}

fn check_identifier(identifier: &str) -> Result<()> {
  // Anything that can be a file stem is accepted.
  let malformed = identifier.is_empty() || identifier.contains(|c: char| c == '/' || c == '\0');
  if malformed {
    return Err(OracleError::MalformedIdentifier(identifier.to_owned()));
  }
  Ok(())
}

#[derive(Debug)]
pub struct Poem {
  text: String,
  identifier: String,
  title_markers: String,
  stanzas: OnceLock<Vec<Stanza>>,
}

impl Poem {
  /// `identifier` is the poem's title or file stem, used to recognise a title line.
  pub fn new(text: impl Into<String>, identifier: impl Into<String>) -> Result<Poem> {
    let text = text.into();
    let identifier = identifier.into();
    if text.trim().is_empty() {
      return Err(OracleError::EmptyPoem);
    }
    check_identifier(&identifier)?;
    Ok(Poem {
      text,
      identifier,
      title_markers: StripSets::default().title_markers,
      stanzas: OnceLock::new(),
    })
  }

  pub fn from_path(text: impl Into<String>, path: &Path) -> Result<Poem> {
    match path.file_stem().and_then(|s| s.to_str()) {
      Some(stem) => Poem::new(text, stem),
      None => Err(OracleError::MalformedIdentifier(path.display().to_string()))
    }
  }

  pub fn with_title_markers(mut self, markers: impl Into<String>) -> Poem {
    self.title_markers = markers.into();
    self.stanzas = OnceLock::new();
    self
  }

  pub fn text(&self) -> &str {
    &self.text
  }

  pub fn identifier(&self) -> &str {
    &self.identifier
  }

  pub fn stanzas(&self) -> Result<&[Stanza]> {
    if let Some(stanzas) = self.stanzas.get() {
      return Ok(stanzas.as_slice());
    }
    let parsed = parse_into_stanzas(&self.text, &self.identifier, &self.title_markers)?;
    Ok(self.stanzas.get_or_init(|| parsed).as_slice())
  }
}
