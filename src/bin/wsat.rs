//! Command-line driver: read a DIMACS CNF file, dispatch a batch of independent WalkSAT
//! trials across a worker pool, and report the best weighted-unsat count found.
//!
//! Mirrors the demo task from the source this crate's design was lifted from — one
//! `Task` that reads the formula once, hands out `jobs_per_worker` blind trials per
//! worker, and prints each trial's result as it arrives.

use std::fs;
use std::process::ExitCode;

use clap::Parser;
use log::info;

use wsat::{dimacs, dispatcher, DispatcherConfig, Formula, SearchConfig, SearchOutcome, Task};

#[derive(Parser)]
#[command(author, version, about = "Weighted WalkSAT over a master/worker trial dispatcher")]
struct Cli {
  /// Path to a DIMACS CNF file.
  path: String,

  /// Number of worker threads. Defaults to the available parallelism minus one; `0`
  /// runs every trial sequentially on the calling thread.
  #[arg(long)]
  workers: Option<usize>,

  /// Number of trials to run per worker.
  #[arg(long, default_value_t = 1)]
  jobs_per_worker: usize,

  /// Per-trial wall-clock budget, in seconds.
  #[arg(long, default_value_t = 5.0)]
  max_time_s: f64,

  /// Optional per-trial flip cap, on top of the time budget.
  #[arg(long)]
  max_flips: Option<u64>,

  /// Probability of a random-walk flip versus a greedy one, in `[0, 1]`.
  #[arg(long, default_value_t = 0.1)]
  rand_var_prob: f64,

  /// Base seed offset; worker `r`'s first trial seeds from `seed_offset + r`.
  #[arg(long, default_value_t = 1000)]
  seed_offset: u64,

  /// Zero out one clause's weight by index, demonstrating that a clause can be made
  /// invisible to the search objective without removing it from the formula.
  #[arg(long)]
  zero_weight_clause: Option<usize>,
}

#[derive(Clone)]
struct SolverTask {
  formula: Formula,
  size: usize,
  seed: u64,
  step: u64,
  seed_offset: u64,
  jobs_per_worker: usize,
  max_time_s: f64,
  max_flips: Option<u64>,
  rand_var_prob: f64,
  best: Option<SearchOutcome>,
}

impl Task for SolverTask {
  type Item = ();
  type Outcome = SearchOutcome;

  fn setup(&mut self, size: usize) {
    self.size = size;
  }

  fn produce(&mut self) -> Box<dyn Iterator<Item = ()> + Send> {
    let worker_count = self.size.saturating_sub(1).max(1);
    Box::new(std::iter::repeat(()).take(self.jobs_per_worker * worker_count))
  }

  fn consume(&mut self, result: SearchOutcome) {
    println!("trial seed={} best_unsat_weight={}", result.seed, result.best_unsat_weight);
    let better = match &self.best {
      Some(best) => result.best_unsat_weight < best.best_unsat_weight,
      None => true,
    };
    if better {
      self.best = Some(result);
    }
  }

  fn finalize(&mut self) {
    match &self.best {
      Some(best) if best.satisfiable() => println!("SAT (best_unsat_weight=0, seed={})", best.seed),
      Some(best) => println!("UNSAT after budget (best_unsat_weight={}, seed={})", best.best_unsat_weight, best.seed),
      None => println!("no trials ran"),
    }
  }

  fn setup_worker(&mut self, rank: usize, size: usize) {
    self.seed = self.seed_offset + rank as u64;
    self.step = (size.saturating_sub(1)).max(1) as u64;
  }

  fn apply(&mut self, _item: ()) -> SearchOutcome {
    info!("running walksat with seed {}", self.seed);
    let config = SearchConfig {
      seed: self.seed,
      max_time_s: self.max_time_s,
      rand_var_prob: self.rand_var_prob,
      max_flips: self.max_flips,
    };
    let outcome =
      wsat::run_trial(&self.formula, &config).expect("rand_var_prob was validated before dispatch");
    self.seed += self.step;
    outcome
  }
}

fn main() -> ExitCode {
  env_logger::init();
  let cli = Cli::parse();

  let text = match fs::read_to_string(&cli.path) {
    Ok(text) => text,
    Err(err) => {
      eprintln!("error: could not read {}: {}", cli.path, err);
      return ExitCode::FAILURE;
    }
  };

  let clauses = dimacs::parse(&text);
  let mut weights = vec![1.0; clauses.len()];
  if let Some(index) = cli.zero_weight_clause {
    if let Some(w) = weights.get_mut(index) {
      *w = 0.0;
    }
  }

  let formula = match Formula::new(clauses, Some(weights), None) {
    Ok(formula) => formula,
    Err(err) => {
      eprintln!("error: {}", err);
      return ExitCode::FAILURE;
    }
  };

  if !(0.0..=1.0).contains(&cli.rand_var_prob) {
    eprintln!("error: --rand-var-prob must lie in [0, 1], got {}", cli.rand_var_prob);
    return ExitCode::FAILURE;
  }

  let task = SolverTask {
    formula,
    size: 1,
    seed: 0,
    step: 1,
    seed_offset: cli.seed_offset,
    jobs_per_worker: cli.jobs_per_worker.max(1),
    max_time_s: cli.max_time_s,
    max_flips: cli.max_flips,
    rand_var_prob: cli.rand_var_prob,
    best: None,
  };

  let workers = cli.workers.unwrap_or_else(|| DispatcherConfig::default().workers);
  match dispatcher::run_task(task, DispatcherConfig { workers }) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("error: {}", err);
      ExitCode::FAILURE
    }
  }
}
