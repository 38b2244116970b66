use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use itertools::Itertools;
use structured::{match_code, EditorCallbacks, MatchOptions, Outcome, PatternSource};
use tracing::Level;

/// Look for a JavaScript pattern in a piece of code
#[derive(Parser, Debug)]
#[command(name = "smatch")]
#[command(long_about = Some("Structurally match JavaScript code against a pattern"))]
struct Args {
  /// File containing the code to search
  #[arg(conflicts_with = "code")]
  pub file: Option<PathBuf>,
  /// The code to search, instead of a file
  #[arg(short, long)]
  pub code: Option<String>,
  /// The pattern
  #[arg(short, long, required_unless_present = "pattern_file")]
  pub pattern: Option<String>,
  /// File containing the pattern
  #[arg(long, conflicts_with = "pattern")]
  pub pattern_file: Option<PathBuf>,
  /// The pattern is the body of a function, eg. `function() { _ += 1; }`
  #[arg(short, long, default_value_t = false)]
  pub wrapped: bool,
  /// Pair each pattern statement with its first occurrence in the code
  #[arg(long, default_value_t = false)]
  pub order_matters: bool,
  /// Treat equivalent operator forms such as `a += 1` and `a++` as equal
  #[arg(short, long, default_value_t = false)]
  pub equivalence: bool,
  /// Log more, repeat for even more
  #[arg(short, long, action = clap::ArgAction::Count)]
  pub verbose: u8,
}
impl Args {
  fn code(&self) -> Result<String, String> {
    match (&self.code, &self.file) {
      (Some(code), _) => Ok(code.clone()),
      (None, Some(path)) => fs::read_to_string(path).map_err(|e| format!("Cannot read {}\n{e}", path.display())),
      (None, None) => Err("Either a file or --code is required".to_string()),
    }
  }

  fn pattern(&self) -> Result<PatternSource, String> {
    let text = match (&self.pattern, &self.pattern_file) {
      (Some(text), _) => text.clone(),
      (None, Some(path)) =>
        fs::read_to_string(path).map_err(|e| format!("Cannot read {}\n{e}", path.display()))?,
      (None, None) => return Err("Either --pattern or --pattern-file is required".to_string()),
    };
    Ok(if self.wrapped { PatternSource::Wrapped(text) } else { PatternSource::Text(text) })
  }

  fn level(&self) -> Level {
    match self.verbose {
      0 => Level::WARN,
      1 => Level::INFO,
      2 => Level::DEBUG,
      _ => Level::TRACE,
    }
  }
}

fn run(args: &Args) -> Result<Outcome, String> {
  let mut opts = MatchOptions::new().order_matters(args.order_matters);
  if args.equivalence {
    opts = opts.editor_callbacks(EditorCallbacks::default());
  }
  match_code(args.code()?, args.pattern()?, &opts).map_err(|e| e.to_string())
}

pub fn main() -> ExitCode {
  let args = Args::parse();
  tracing_subscriber::fmt().with_max_level(args.level()).with_writer(std::io::stderr).init();
  match run(&args) {
    Err(e) => {
      eprintln!("{e}");
      ExitCode::from(2)
    },
    Ok(Outcome::Failed { diagnostic }) => {
      println!("no match");
      if let Some(msg) = diagnostic {
        println!("{msg}");
      }
      ExitCode::FAILURE
    },
    Ok(Outcome::Matched(bindings)) => {
      println!("{}", bindings.root);
      for (name, capture) in bindings.vars.iter().sorted_by(|a, b| a.0.cmp(b.0)) {
        println!("${name} = {capture}");
      }
      if !bindings.anonymous.is_empty() {
        println!("_ = {}", bindings.anonymous.iter().join(", "));
      }
      ExitCode::SUCCESS
    },
  }
}
