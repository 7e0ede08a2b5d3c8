use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use console::style;
use poem_oracle::batch::analyze_folder;
use poem_oracle::config::OracleConfig;
use poem_oracle::{Analyzer, PronouncingDictionary};

#[derive(Parser, Debug)]
#[command(name = "oracle", about = "Oracle of the Abyss - Poem Analyzer")]
struct Args {
  /// Folder containing poems (relative or absolute path)
  #[arg(long, default_value = "user poems")]
  folder: PathBuf,

  /// CMU-format pronouncing dictionary
  #[arg(long)]
  dictionary: Option<PathBuf>,

  /// JSON configuration file
  #[arg(long)]
  config: Option<PathBuf>,

  /// Enable performance monitoring
  #[arg(long)]
  perf: bool,
}

fn fail(message: impl std::fmt::Display) -> ! {
  eprintln!("{} {}", style("Error:").red().bold(), message);
  process::exit(1);
}

fn main() {
  poem_oracle::init_logging("info");
  let args = Args::parse();

  let mut config = OracleConfig::load_or_default(args.config.as_deref()).unwrap_or_else(|e| fail(e));
  if let Some(dictionary) = args.dictionary {
    config.dictionary_path = dictionary;
  }
  config.perf |= args.perf;

  let dictionary = PronouncingDictionary::load(&config.dictionary_path).unwrap_or_else(|e| fail(e));
  let analyzer = Analyzer::from_config(Arc::new(dictionary), &config);

  let outcomes = analyze_folder(&args.folder, &analyzer, config.perf).unwrap_or_else(|e| fail(e));

  if outcomes.is_empty() {
    println!("No valid poems found in '{}'.", args.folder.display());
    return;
  }

  for outcome in &outcomes {
    match &outcome.result {
      Ok(path) => println!("{} {} -> {}", style("ok").green(), outcome.file_name, path.display()),
      Err(e) => println!("{} {}: {}", style("failed").red(), outcome.file_name, e)
    }
  }
}
