pub mod error;
pub mod config;
pub mod pronunciation;
pub mod syllables;
pub mod poem;
pub mod parser;
pub mod anaphora;
pub mod analyzer;
pub mod lookout;
pub mod batch;
pub mod server;

pub use analyzer::{analyze_poem, Analyzer, PoemAnalysis};
pub use error::{OracleError, Result};
pub use poem::{tokenize, Line, Poem, Stanza};
pub use pronunciation::PronouncingDictionary;
pub use syllables::{fallback_estimate, SyllableEstimator};

/// Installs the `tracing` subscriber used by the binaries. `RUST_LOG` picks the level;
/// `default_directive` applies when it is unset.
pub fn init_logging(default_directive: &str) {
  use tracing_subscriber::EnvFilter;

  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).with_target(false).try_init();
}
