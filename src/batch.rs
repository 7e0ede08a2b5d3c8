//! Folder-at-a-time analysis: every `.txt`/`.md` poem in a folder gets a
//! `<stem>_analysis.txt` report written next to it.
//!
//! Poems are processed in parallel. A poem that cannot be read or analysed
//! produces an error outcome for that file only.

use std::fs;
use std::path::{Path, PathBuf};

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::analyzer::{Analyzer, PoemAnalysis};
use crate::error::{OracleError, Result};
use crate::lookout;

const ANALYSIS_SUFFIX: &str = "_analysis.txt";

/// Result of processing one poem file.
#[derive(Debug)]
pub struct BatchOutcome {
  pub file_name: String,
  /// Where the report was written.
  pub result: Result<PathBuf>,
}

fn is_poem_file(name: &str) -> bool {
  (name.ends_with(".txt") || name.ends_with(".md")) && !name.ends_with(ANALYSIS_SUFFIX)
}

/// Names of the non-blank poem files in `folder`, sorted.
pub fn poem_file_names(folder: &Path) -> Result<Vec<String>> {
  let mut names = vec![];
  for entry in fs::read_dir(folder)? {
    let entry = entry?;
    if !entry.file_type()?.is_file() {
      continue;
    }
    let Some(name) = entry.file_name().to_str().map(|n| n.to_owned()) else {
      continue;
    };
    if !is_poem_file(&name) {
      continue;
    }
    // Unreadable files are kept so that they show up as failures later.
    let blank = fs::read_to_string(entry.path()).map(|t| t.trim().is_empty()).unwrap_or(false);
    if !blank {
      names.push(name);
    }
  }
  names.sort();
  Ok(names)
}

pub fn analysis_path(poem_path: &Path) -> PathBuf {
  let stem = poem_path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
  poem_path.with_file_name(format!("{}{}", stem, ANALYSIS_SUFFIX))
}

pub fn format_analysis(analysis: &PoemAnalysis) -> String {
  let mut out = String::new();
  for (i, text) in analysis.stanza_texts.iter().enumerate() {
    out.push_str(&format!("Stanza {}:\n{}\n", i + 1, text));
    out.push_str(&format!("Lines: {}\n", analysis.line_counts[i]));
    out.push_str(&format!("Syllables per line: [{}]\n", analysis.syllables_per_line[i].iter().join(", ")));
    if let Some(anaphora) = analysis.anaphora.get(i).filter(|a| !a.is_empty()) {
      out.push_str(&format!("Anaphora: [{}]\n", anaphora.iter().join(", ")));
    }
    out.push('\n');
  }
  out
}

/// Analyses one poem file and writes its report. Returns the report's path.
pub fn write_poem_analysis(poem_path: &Path, analyzer: &Analyzer) -> Result<PathBuf> {
  let text = fs::read_to_string(poem_path)?;
  let identifier = poem_path.file_stem()
    .and_then(|s| s.to_str())
    .ok_or_else(|| OracleError::MalformedIdentifier(poem_path.display().to_string()))?;

  let analysis = analyzer.analyze_text(text, identifier)?;

  let output_path = analysis_path(poem_path);
  fs::write(&output_path, format_analysis(&analysis))?;
  Ok(output_path)
}

pub fn analyze_folder(folder: &Path, analyzer: &Analyzer, perf: bool) -> Result<Vec<BatchOutcome>> {
  if !folder.is_dir() {
    return Err(OracleError::NotADirectory(folder.to_owned()));
  }

  let names = poem_file_names(folder)?;
  if names.is_empty() {
    warn!("No valid poems found in {}", folder.display());
  }

  let outcomes = lookout::watch("analyze_folder", perf, || {
    names.into_par_iter().map(|file_name| {
      let result = write_poem_analysis(&folder.join(&file_name), analyzer);
      if let Err(e) = &result {
        warn!("Skipping {}: {}", file_name, e);
      }
      BatchOutcome { file_name, result }
    }).collect::<Vec<BatchOutcome>>()
  });

  info!("Processed {} poems in {}", outcomes.len(), folder.display());
  Ok(outcomes)
}
