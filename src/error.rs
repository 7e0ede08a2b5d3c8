use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, OracleError>;

/// Everything that can go wrong while loading resources or analysing a poem.
///
/// The first four variants are precondition violations raised when a domain
/// object is constructed. Callers decide whether to report them (HTTP 400) or
/// skip the poem (batch runs).
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
  #[error("Line text cannot be empty")]
  EmptyLine,

  #[error("Stanza must contain at least one Line")]
  EmptyStanza,

  #[error("Poem text cannot be empty")]
  EmptyPoem,

  #[error("Malformed poem identifier: {0:?}")]
  MalformedIdentifier(String),

  #[error("Could not load pronouncing dictionary from {path}: {source}")]
  DictionaryLoad { path: PathBuf, source: io::Error },

  #[error("Malformed dictionary entry on line {line_number}: {line:?}")]
  MalformedDictionaryLine { line_number: usize, line: String },

  #[error("The directory {0} does not exist or is not a directory")]
  NotADirectory(PathBuf),

  #[error(transparent)]
  Io(#[from] io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

impl OracleError {
  /// True for errors caused by the caller's input rather than the environment.
  pub fn is_precondition(&self) -> bool {
    matches!(self,
      OracleError::EmptyLine
      | OracleError::EmptyStanza
      | OracleError::EmptyPoem
      | OracleError::MalformedIdentifier(_))
  }
}
