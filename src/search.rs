/*!

  The WalkSAT search engine (component C3): one time-bounded local-search trial over a
  `Formula`, with incremental break-count maintenance (via `SearchState`), tie-breaking,
  noise, and a weighted unsat objective.

*/

use std::time::Instant;

use crate::errors::{Error, Result};
use crate::formula::{Formula, SearchState};
use crate::rng::Rng;

#[derive(Clone, Debug)]
pub struct SearchConfig {
  pub seed: u64,
  pub max_time_s: f64,
  pub rand_var_prob: f64,
  pub max_flips: Option<u64>,
}

impl Default for SearchConfig {
  fn default() -> Self {
    SearchConfig { seed: 0, max_time_s: 5.0, rand_var_prob: 0.3, max_flips: None }
  }
}

/// The result of one trial: the best weighted-unsat value seen and the assignment that
/// achieved it, plus the seed the trial ran with (always returned, for traceability even
/// when the caller supplied it) and the number of flips actually performed.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
  pub best_unsat_weight: f64,
  /// 1-indexed; `best_assignment[0]` is unused filler.
  pub best_assignment: Vec<bool>,
  pub seed: u64,
  pub flips_performed: u64,
}

impl SearchOutcome {
  pub fn satisfiable(&self) -> bool {
    self.best_unsat_weight == 0.0
  }
}

/// Runs one WalkSAT trial to completion: time budget, optional flip cap, or a fully
/// satisfying assignment, whichever comes first.
pub fn run_trial(formula: &Formula, config: &SearchConfig) -> Result<SearchOutcome> {
  if !(0.0..=1.0).contains(&config.rand_var_prob) {
    return Err(Error::InvalidNoise(config.rand_var_prob));
  }

  let mut rng = Rng::with_seed(config.seed);
  let mut state = SearchState::init(formula, &mut rng);

  let mut best_unsat_weight = state.unsat_weight();
  let mut best_assignment = state.assignment().to_vec();

  let clock = Instant::now();
  let mut flips: u64 = 0;

  while !state.is_satisfied() {
    if let Some(cap) = config.max_flips {
      if flips >= cap {
        break;
      }
    }
    if clock.elapsed().as_secs_f64() >= config.max_time_s {
      break;
    }

    let clause_index = state.unsat_set()[rng.choose_index(state.unsat_set().len())];
    let clause = &formula.clauses()[clause_index];

    let variable = if rng.uniform_real() < config.rand_var_prob {
      // Random-walk step: uniformly random variable among the clause's literals.
      clause[rng.choose_index(clause.len())].var()
    } else {
      // Greedy step: the variable minimizing (weighted) break count, ties broken
      // uniformly at random among the tied variables.
      pick_greedy_variable(&state, clause, &mut rng)
    };

    state.flip(variable);
    flips += 1;

    if state.unsat_weight() < best_unsat_weight {
      best_unsat_weight = state.unsat_weight();
      best_assignment = state.assignment().to_vec();
    }
  }

  Ok(SearchOutcome { best_unsat_weight, best_assignment, seed: config.seed, flips_performed: flips })
}

fn pick_greedy_variable(state: &SearchState<'_>, clause: &crate::clause::Clause, rng: &mut Rng) -> usize {
  let mut best_break = f64::INFINITY;
  let mut tied = Vec::new();
  for literal in clause.iter() {
    let v = literal.var();
    let bc = state.break_count(v);
    if bc < best_break {
      best_break = bc;
      tied.clear();
      tied.push(v);
    } else if bc == best_break {
      tied.push(v);
    }
  }
  tied[rng.choose_index(tied.len())]
}

#[cfg(test)]
mod tests {
  use super::*;

  fn formula(clauses: Vec<Vec<i32>>) -> Formula {
    Formula::new(clauses, None, None).unwrap()
  }

  #[test]
  fn satisfiable_formula_is_solved() {
    let f = formula(vec![vec![1, -2], vec![2, 3]]);
    let config = SearchConfig { seed: 1, max_time_s: 2.0, rand_var_prob: 0.3, max_flips: None };
    let outcome = run_trial(&f, &config).unwrap();
    assert!(outcome.satisfiable());
    for clause in f.clauses().iter() {
      assert!(clause.iter().any(|l| l.evaluate(&outcome.best_assignment)));
    }
  }

  #[test]
  fn unsatisfiable_formula_reports_positive_unsat_weight() {
    let f = formula(vec![vec![1, -2], vec![-1], vec![2]]);
    let config = SearchConfig { seed: 1, max_time_s: 1.0, rand_var_prob: 0.3, max_flips: Some(2000) };
    let outcome = run_trial(&f, &config).unwrap();
    assert!(outcome.best_unsat_weight >= 1.0);
    assert!(!outcome.satisfiable());
  }

  #[test]
  fn weighted_clause_can_be_ignored_with_zero_weight() {
    let f = Formula::new(vec![vec![1, 2], vec![1], vec![-2]], Some(vec![1.0, 1.0, 0.0]), None).unwrap();
    let config = SearchConfig { seed: 2, max_time_s: 1.0, rand_var_prob: 0.2, max_flips: Some(5000) };
    let outcome = run_trial(&f, &config).unwrap();
    assert_eq!(outcome.best_unsat_weight, 0.0);
  }

  #[test]
  fn minimum_achievable_weighted_unsat_is_one() {
    let f = Formula::new(
      vec![vec![1, 2], vec![1], vec![-2], vec![-1]],
      Some(vec![1.0, 1.0, 1.0, 1.0]),
      None,
    )
    .unwrap();
    let config = SearchConfig { seed: 4, max_time_s: 2.0, rand_var_prob: 0.3, max_flips: Some(20_000) };
    let outcome = run_trial(&f, &config).unwrap();
    assert_eq!(outcome.best_unsat_weight, 1.0);
  }

  #[test]
  fn empty_formula_is_trivially_satisfied() {
    let f = formula(vec![]);
    let config = SearchConfig::default();
    let outcome = run_trial(&f, &config).unwrap();
    assert_eq!(outcome.best_unsat_weight, 0.0);
  }

  #[test]
  fn seed_determinism_with_flip_cap_and_no_time_budget() {
    let f = formula(vec![vec![1, -2], vec![2, 3], vec![-1, -3], vec![1, 2, 3]]);
    let config = SearchConfig {
      seed: 777,
      max_time_s: f64::INFINITY,
      rand_var_prob: 0.3,
      max_flips: Some(500),
    };
    let a = run_trial(&f, &config).unwrap();
    let b = run_trial(&f, &config).unwrap();
    assert_eq!(a.best_unsat_weight, b.best_unsat_weight);
    assert_eq!(a.best_assignment, b.best_assignment);
  }

  #[test]
  fn best_unsat_weight_is_monotone_non_increasing() {
    // Re-run with progressively larger flip caps; the achieved best must never regress.
    let f = formula(vec![vec![1, -2], vec![-1], vec![2], vec![1, 2, 3]]);
    let mut previous = f64::INFINITY;
    for cap in [10u64, 50, 200, 1000] {
      let config = SearchConfig { seed: 9, max_time_s: f64::INFINITY, rand_var_prob: 0.3, max_flips: Some(cap) };
      let outcome = run_trial(&f, &config).unwrap();
      assert!(outcome.best_unsat_weight <= previous + 1e-9);
      previous = outcome.best_unsat_weight;
    }
  }

  #[test]
  fn rand_var_prob_endpoints_are_valid() {
    let f = formula(vec![vec![1, -2], vec![2, 3]]);
    for prob in [0.0, 1.0] {
      let config = SearchConfig { seed: 3, max_time_s: 1.0, rand_var_prob: prob, max_flips: Some(1000) };
      assert!(run_trial(&f, &config).is_ok());
    }
  }

  #[test]
  fn out_of_range_noise_is_rejected() {
    let f = formula(vec![vec![1, 2]]);
    let config = SearchConfig { seed: 0, max_time_s: 1.0, rand_var_prob: 1.5, max_flips: None };
    assert!(matches!(run_trial(&f, &config), Err(Error::InvalidNoise(_))));
  }
}
