use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;
use poem_oracle::config::OracleConfig;
use poem_oracle::server::start_server;
use poem_oracle::{Analyzer, PronouncingDictionary};

#[derive(Parser, Debug)]
#[command(name = "oracle_server", about = "Serve the poem analyzer over HTTP")]
struct Args {
  #[arg(long)]
  host: Option<String>,

  #[arg(long)]
  port: Option<u16>,

  /// CMU-format pronouncing dictionary
  #[arg(long)]
  dictionary: Option<PathBuf>,

  /// Built front-end directory
  #[arg(long)]
  dist: Option<PathBuf>,

  /// JSON configuration file
  #[arg(long)]
  config: Option<PathBuf>,

  #[arg(long)]
  perf: bool,
}

fn fail(message: impl std::fmt::Display) -> ! {
  eprintln!("Error: {}", message);
  process::exit(1);
}

fn main() {
  poem_oracle::init_logging("info");
  let args = Args::parse();

  let mut config = OracleConfig::load_or_default(args.config.as_deref()).unwrap_or_else(|e| fail(e));
  if let Some(host) = args.host { config.server.host = host; }
  if let Some(port) = args.port { config.server.port = port; }
  if let Some(dictionary) = args.dictionary { config.dictionary_path = dictionary; }
  if let Some(dist) = args.dist { config.server.dist_dir = dist; }
  config.perf |= args.perf;

  // Without the dictionary nothing can be served.
  let dictionary = PronouncingDictionary::load(&config.dictionary_path).unwrap_or_else(|e| fail(e));
  let analyzer = Analyzer::from_config(Arc::new(dictionary), &config);

  let (handle, addr) = start_server(config.server.clone(), analyzer).unwrap_or_else(|e| fail(e));
  println!("Listening on http://{}", addr);
  handle.join();
}
