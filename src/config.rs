use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Serialize, Deserialize};

use crate::error::Result;

/// Character sets trimmed from the ends of words, patterns and lines.
///
/// Different stages historically trimmed slightly different sets. They are
/// kept separate here, each with its own default, so a deployment can
/// standardise them if it wants to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StripSets {
  /// Trimmed from a lower-cased token before the second dictionary lookup.
  pub word: String,
  /// Trimmed from a joined anaphora pattern.
  pub pattern: String,
  /// Markdown markers trimmed from each line of a poem.
  pub title_markers: String,
}

impl Default for StripSets {
  fn default() -> Self {
    StripSets {
      word: ".,;:!?\"'()[]{}#*_".to_owned(),
      pattern: ".,!?\":;".to_owned(),
      title_markers: "#*".to_owned(),
    }
  }
}

pub fn strip_chars<'a>(text: &'a str, set: &str) -> &'a str {
  text.trim_matches(|c: char| set.contains(c))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host: String,
  pub port: u16,
  pub dist_dir: PathBuf,
  pub allowed_origins: Vec<String>,
  pub max_body_bytes: usize,
}

impl Default for ServerConfig {
  fn default() -> Self {
    ServerConfig {
      host: "127.0.0.1".to_owned(),
      port: 8000,
      dist_dir: PathBuf::from("dist"),
      allowed_origins: vec!["http://localhost:5173".to_owned()],
      max_body_bytes: 1 << 20,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
  pub dictionary_path: PathBuf,
  pub strip: StripSets,
  pub server: ServerConfig,
  /// Log wall-clock timings of analysis runs.
  pub perf: bool,
}

impl Default for OracleConfig {
  fn default() -> Self {
    OracleConfig {
      dictionary_path: PathBuf::from("res/cmudict.dict"),
      strip: StripSets::default(),
      server: ServerConfig::default(),
      perf: std::env::var("ORACLE_LOOKOUT").map(|v| v == "1").unwrap_or(false),
    }
  }
}

impl OracleConfig {
  pub fn from_json_str(text: &str) -> Result<OracleConfig> {
    Ok(serde_json::from_str(text)?)
  }

  pub fn from_json_file(path: &Path) -> Result<OracleConfig> {
    let reader = io::BufReader::new(fs::File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
  }

  /// Reads `path` when given, otherwise falls back to the defaults.
  pub fn load_or_default(path: Option<&Path>) -> Result<OracleConfig> {
    match path {
      Some(path) => Self::from_json_file(path),
      None => Ok(OracleConfig::default())
    }
  }
}
