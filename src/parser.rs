use tracing::debug;

use crate::error::Result;
use crate::poem::{Line, Stanza};

/// Whether `line` looks like a poem title: quoted, all caps, or equal to the poem's identifier.
pub fn is_title_line(line: &str, identifier: &str) -> bool {
  let stripped = line.trim();

  let double_quoted = stripped.starts_with('"') && stripped.ends_with('"');
  let single_quoted = stripped.starts_with('\'') && stripped.ends_with('\'');
  let upper = stripped.chars().any(|c| c.is_uppercase()) && !stripped.chars().any(|c| c.is_lowercase());

  double_quoted || single_quoted || upper || stripped == identifier
}

/// Splits poem text into stanzas on blank lines.
///
/// Every line is trimmed of whitespace and of leading/trailing `title_markers`. A title
/// line at the head of the first stanza is dropped, and so are stanzas left empty.
/// Later stanzas keep their opening line whatever it looks like.
pub fn parse_into_stanzas(text: &str, identifier: &str, title_markers: &str) -> Result<Vec<Stanza>> {
  let cleaned: String = text.lines().map(|l| l.trim()).collect::<Vec<&str>>().join("\n");

  let mut stanzas = vec![];
  let mut title_checked = false;
  for chunk in cleaned.split("\n\n") {
    let mut lines: Vec<&str> = chunk.split('\n')
      .map(|l| l.trim_matches(|c: char| c.is_whitespace() || title_markers.contains(c)))
      .filter(|l| !l.is_empty())
      .collect();

    if lines.is_empty() {
      continue;
    }

    if !title_checked {
      title_checked = true;
      if is_title_line(lines[0], identifier) {
        debug!("Dropping title line {:?}", lines[0]);
        lines.remove(0);
      }
    }

    if lines.is_empty() {
      continue;
    }

    let lines = lines.into_iter().map(Line::new).collect::<Result<Vec<Line>>>()?;
    stanzas.push(Stanza::new(lines)?);
  }

  Ok(stanzas)
}
