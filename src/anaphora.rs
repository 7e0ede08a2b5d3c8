use std::collections::HashMap;

use itertools::Itertools;
use tracing::debug;

use crate::config::strip_chars;
use crate::poem::Stanza;

/// The first `pattern_length` words of a line, lower-cased and trimmed of `strip` as a whole.
fn opening_pattern(words: &[&str], pattern_length: usize, strip: &str) -> String {
  let joined = words[.. pattern_length].join(" ").to_lowercase();
  strip_chars(&joined, strip).to_owned()
}

/// Candidate matches for one pattern length: every occurrence of each pattern
/// that reaches the highest count, provided that count is at least 2.
fn matches_of_length(lines: &[Vec<&str>], pattern_length: usize, strip: &str) -> Vec<String> {
  let patterns: Vec<String> = lines.iter()
    .filter(|words| words.len() >= pattern_length)
    .map(|words| opening_pattern(words, pattern_length, strip))
    .collect();

  let counts: HashMap<&String, usize> = patterns.iter().counts();
  let max_count = counts.values().copied().max().unwrap_or(0);
  if max_count < 2 {
    return vec![];
  }

  patterns.iter()
    .unique()
    .filter(|p| counts[p] == max_count)
    .flat_map(|p| std::iter::repeat(p.clone()).take(max_count))
    .collect()
}

/// Finds the repeated line opening that best characterises a stanza.
///
/// Openings of 2 up to (longest line's word count - 1) words are tried; a full
/// line never counts. The length producing the most matches wins, and among
/// equally good lengths the longest one wins. Each returned entry is one
/// matching line's pattern, so the result's length is the number of matches.
pub fn detect(stanza: &Stanza, strip: &str) -> Vec<String> {
  if stanza.line_count() < 2 {
    return vec![];
  }

  let lines: Vec<Vec<&str>> = stanza.lines().iter().map(|l| l.words().collect()).collect();
  let max_words_per_line = lines.iter().map(|words| words.len()).max().unwrap_or(0);
  let max_pattern_length = max_words_per_line.saturating_sub(1);

  let mut best_matches: Vec<String> = vec![];
  for pattern_length in 2 ..= max_pattern_length {
    let current_matches = matches_of_length(&lines, pattern_length, strip);
    if !current_matches.is_empty() && current_matches.len() >= best_matches.len() {
      best_matches = current_matches;
    }
  }

  if !best_matches.is_empty() {
    debug!("Anaphora {:?} found {} times", best_matches[0], best_matches.len());
  }
  best_matches
}
