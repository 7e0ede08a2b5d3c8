use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use console::style;
use itertools::Itertools;
use poem_oracle::config::StripSets;
use poem_oracle::{tokenize, PronouncingDictionary, SyllableEstimator};

#[derive(Parser, Debug)]
#[command()]
struct Args {
  #[arg()]
  sentence: String,

  #[arg(long, default_value = "res/cmudict.dict")]
  dictionary: PathBuf,
}

fn main() {
  let args = Args::parse();

  let dictionary = match PronouncingDictionary::load(&args.dictionary) {
    Ok(d) => d,
    Err(e) => {
      eprintln!("{}", e);
      std::process::exit(1);
    }
  };
  let estimator = SyllableEstimator::new(Arc::new(dictionary), StripSets::default());

  let mut total = 0;
  for token in tokenize(&args.sentence) {
    let counts = estimator.estimate(&token);
    total += counts[0];

    let known = estimator.dictionary().contains(&token)
      || estimator.dictionary().contains(&token.to_lowercase());
    let counts_text = format!("{}", counts.iter().format("/"));
    if known {
      print!("{}({}) ", token, style(counts_text).cyan());
    }
    else {
      print!("{}({}) ", style(&token).dim(), style(counts_text).yellow());
    }
  }
  println!("\n{} syllables", total);
}
