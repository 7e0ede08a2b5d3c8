use std::sync::Arc;

use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::anaphora;
use crate::config::OracleConfig;
use crate::error::Result;
use crate::lookout;
use crate::poem::Poem;
use crate::pronunciation::PronouncingDictionary;
use crate::syllables::SyllableEstimator;

/// Per-stanza results for one poem. All vectors have one entry per stanza.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoemAnalysis {
  pub stanza_texts: Vec<String>,
  pub line_counts: Vec<usize>,
  pub syllables_per_line: Vec<Vec<usize>>,
  pub anaphora: Vec<Vec<String>>,
}

pub fn analyze_poem(poem: &Poem, estimator: &SyllableEstimator) -> Result<PoemAnalysis> {
  let pattern_strip = &estimator.strip_sets().pattern;
  let mut analysis = PoemAnalysis {
    stanza_texts: vec![],
    line_counts: vec![],
    syllables_per_line: vec![],
    anaphora: vec![],
  };

  for stanza in poem.stanzas()? {
    analysis.stanza_texts.push(stanza.text());
    analysis.line_counts.push(stanza.line_count());
    analysis.syllables_per_line.push(
      stanza.lines().iter().map(|line| line.total_syllables(estimator)).collect()
    );
    analysis.anaphora.push(anaphora::detect(stanza, pattern_strip));
  }

  debug!("Analysed {:?}: {} stanzas", poem.identifier(), analysis.stanza_texts.len());
  Ok(analysis)
}

/// The estimator plus the settings needed to build and analyse poems.
///
/// Shared by the batch runner and the HTTP server.
#[derive(Clone)]
pub struct Analyzer {
  estimator: SyllableEstimator,
  perf: bool,
}

impl Analyzer {
  pub fn new(estimator: SyllableEstimator, perf: bool) -> Self {
    Analyzer { estimator, perf }
  }

  pub fn from_config(dictionary: Arc<PronouncingDictionary>, config: &OracleConfig) -> Self {
    Analyzer::new(SyllableEstimator::new(dictionary, config.strip.clone()), config.perf)
  }

  pub fn estimator(&self) -> &SyllableEstimator {
    &self.estimator
  }

  pub fn poem(&self, text: impl Into<String>, identifier: impl Into<String>) -> Result<Poem> {
    let markers = self.estimator.strip_sets().title_markers.clone();
    Ok(Poem::new(text, identifier)?.with_title_markers(markers))
  }

  pub fn analyze(&self, poem: &Poem) -> Result<PoemAnalysis> {
    lookout::watch("analyze_poem", self.perf, || analyze_poem(poem, &self.estimator))
  }

  pub fn analyze_text(&self, text: impl Into<String>, identifier: impl Into<String>) -> Result<PoemAnalysis> {
    self.analyze(&self.poem(text, identifier)?)
  }
}
