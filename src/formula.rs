/*!

  The `Formula` model (component C2): clauses, literals, the static variable→clause index,
  and the incrementally maintained per-clause satisfy-count / unsatisfied-clause-set
  bookkeeping a WalkSAT trial needs.

  `Formula` itself is built once per trial (or once per worker and reused across trials —
  it never changes during search) and is read-only thereafter. The mutable half —
  assignment, `sat_count`, `unsat_set`, `unsat_weight` — lives in `SearchState`, which
  borrows the `Formula` it was built from. Splitting it this way means a flip touches only
  `SearchState`, never `Formula`, and a single `Formula` can back many concurrent trials
  (one `SearchState` each) without synchronization.

*/

use crate::clause::{Clause, ClauseVector};
use crate::errors::{Error, Result};
use crate::literal::Literal;
use crate::rng::Rng;
use crate::BoolVariable;

/// Static index: for each variable, the clauses it appears in and the polarity it
/// appears with. Built once, read-only during search.
pub type VarToClauses = Vec<Vec<(usize, bool)>>;

#[derive(Clone, Debug)]
pub struct Formula {
  clauses: ClauseVector,
  weights: Vec<f64>,
  num_variables: usize,
  var_to_clauses: VarToClauses,
  uniform_weights: bool,
}

impl Formula {
  /// Builds a `Formula` from raw signed-integer clauses, an optional same-length weight
  /// vector (default: all `1.0`), and an optional explicit variable count.
  ///
  /// Empty clauses are dropped before search: DIMACS producers normally never emit one,
  /// and treating the clause list as "whatever survives degenerate input" keeps the
  /// search loop from being permanently stuck on a clause no flip can ever satisfy.
  /// Weights are positional against the *input* clause list, so a clause's weight is
  /// dropped alongside it.
  pub fn new(
    raw_clauses: Vec<Vec<i32>>,
    weights: Option<Vec<f64>>,
    num_variables: Option<usize>,
  ) -> Result<Formula> {
    let weights = weights.unwrap_or_else(|| vec![1.0; raw_clauses.len()]);
    if weights.len() != raw_clauses.len() {
      return Err(Error::WeightLengthMismatch { weights: weights.len(), clauses: raw_clauses.len() });
    }

    let mut clauses = ClauseVector::new();
    let mut kept_weights = Vec::with_capacity(raw_clauses.len());
    let mut inferred_max_var: BoolVariable = 0;

    for (raw_clause, weight) in raw_clauses.into_iter().zip(weights.into_iter()) {
      if raw_clause.is_empty() {
        continue;
      }
      let mut literals = Vec::with_capacity(raw_clause.len());
      for value in raw_clause {
        if value == 0 {
          return Err(Error::ZeroVariable);
        }
        let literal = Literal::new(value);
        inferred_max_var = inferred_max_var.max(literal.var());
        // Duplicate literals behave as the clause with duplicates removed: keep only
        // the first occurrence so `sat_count` counts each distinct literal once.
        if !literals.contains(&literal) {
          literals.push(literal);
        }
      }
      clauses.push(Clause::new(literals));
      kept_weights.push(weight);
    }

    let num_variables = num_variables.unwrap_or(inferred_max_var);
    let uniform_weights = kept_weights.iter().all(|&w| w == 1.0);
    let var_to_clauses = build_var_to_clauses(&clauses, num_variables);

    Ok(Formula { clauses, weights: kept_weights, num_variables, var_to_clauses, uniform_weights })
  }

  pub fn clauses(&self) -> &ClauseVector {
    &self.clauses
  }

  pub fn weight(&self, clause: usize) -> f64 {
    self.weights[clause]
  }

  pub fn num_variables(&self) -> usize {
    self.num_variables
  }

  pub fn num_clauses(&self) -> usize {
    self.clauses.len()
  }

  pub fn uniform_weights(&self) -> bool {
    self.uniform_weights
  }

  fn clauses_containing(&self, v: BoolVariable) -> &[(usize, bool)] {
    &self.var_to_clauses[v]
  }
}

fn build_var_to_clauses(clauses: &ClauseVector, num_variables: usize) -> VarToClauses {
  let mut index: VarToClauses = vec![Vec::new(); num_variables + 1];
  for (c, clause) in clauses.iter().enumerate() {
    for literal in clause.iter() {
      index[literal.var()].push((c, !literal.is_negated()));
    }
  }
  index
}

/// The mutable per-trial state: the current assignment plus the incrementally maintained
/// `sat_count`/`unsat_set`/`unsat_weight` derived from it. One `SearchState` belongs to
/// exactly one trial; it is created at trial start and dropped at trial end.
pub struct SearchState<'f> {
  formula: &'f Formula,
  /// 1-indexed; `assignment[0]` is unused filler so variable ids can index directly.
  assignment: Vec<bool>,
  sat_count: Vec<u32>,
  unsat_set: Vec<usize>,
  /// `unsat_pos[c] == Some(i)` iff clause `c` is unsatisfied and sits at `unsat_set[i]`.
  unsat_pos: Vec<Option<usize>>,
  unsat_weight: f64,
}

impl<'f> SearchState<'f> {
  /// Assigns every variable uniformly at random and computes `sat_count`, `unsat_set`,
  /// and `unsat_weight` from scratch.
  pub fn init(formula: &'f Formula, rng: &mut Rng) -> SearchState<'f> {
    let mut assignment = vec![false; formula.num_variables + 1];
    for v in assignment.iter_mut().skip(1) {
      *v = rng.uniform_int(2) == 1;
    }

    let mut sat_count = vec![0u32; formula.num_clauses()];
    for (c, clause) in formula.clauses().iter().enumerate() {
      sat_count[c] = clause.iter().filter(|l| l.evaluate(&assignment)).count() as u32;
    }

    let mut unsat_set = Vec::new();
    let mut unsat_pos = vec![None; formula.num_clauses()];
    let mut unsat_weight = 0.0;
    for (c, &count) in sat_count.iter().enumerate() {
      if count == 0 {
        unsat_pos[c] = Some(unsat_set.len());
        unsat_set.push(c);
        unsat_weight += formula.weight(c);
      }
    }

    SearchState { formula, assignment, sat_count, unsat_set, unsat_pos, unsat_weight }
  }

  pub fn assignment(&self) -> &[bool] {
    &self.assignment
  }

  pub fn unsat_weight(&self) -> f64 {
    self.unsat_weight
  }

  pub fn unsat_set(&self) -> &[usize] {
    &self.unsat_set
  }

  pub fn is_satisfied(&self) -> bool {
    self.unsat_set.is_empty()
  }

  /// Number of clauses containing `v` that are currently satisfied by the sole literal
  /// `v` contributes — i.e. the clauses that would become unsatisfied if `v` were
  /// flipped — weighted by clause weight. Dispatches on `Formula::uniform_weights` so the
  /// common unweighted case (every clause weight `1.0`) counts clauses with integer
  /// increments instead of repeatedly fetching and summing `f64` weights.
  pub fn break_count(&self, v: BoolVariable) -> f64 {
    if self.formula.uniform_weights() {
      self.break_count_unweighted(v) as f64
    } else {
      self.break_count_weighted(v)
    }
  }

  fn break_count_unweighted(&self, v: BoolVariable) -> u32 {
    let mut total = 0;
    for &(c, positive_polarity) in self.formula.clauses_containing(v) {
      if self.sat_count[c] != 1 {
        continue;
      }
      // sat_count[c] == 1: exactly one literal in c is true. v is that sole true
      // literal iff v's value agrees with the polarity it appears with in c.
      if self.assignment[v] == positive_polarity {
        total += 1;
      }
    }
    total
  }

  fn break_count_weighted(&self, v: BoolVariable) -> f64 {
    let mut total = 0.0;
    for &(c, positive_polarity) in self.formula.clauses_containing(v) {
      if self.sat_count[c] != 1 {
        continue;
      }
      if self.assignment[v] == positive_polarity {
        total += self.formula.weight(c);
      }
    }
    total
  }

  /// Toggles `v`'s value and updates `sat_count`, `unsat_set`, and `unsat_weight` for
  /// exactly the clauses in `var_to_clauses[v]` — no other clause's state changes.
  pub fn flip(&mut self, v: BoolVariable) {
    self.assignment[v] = !self.assignment[v];
    for &(c, positive_polarity) in self.formula.clauses_containing(v) {
      let literal_now_true = self.assignment[v] == positive_polarity;
      let was_satisfied = self.sat_count[c] > 0;
      if literal_now_true {
        self.sat_count[c] += 1;
      } else {
        self.sat_count[c] -= 1;
      }
      let is_satisfied = self.sat_count[c] > 0;

      if was_satisfied && !is_satisfied {
        self.mark_unsat(c);
      } else if !was_satisfied && is_satisfied {
        self.mark_sat(c);
      }
    }
  }

  fn mark_unsat(&mut self, c: usize) {
    self.unsat_pos[c] = Some(self.unsat_set.len());
    self.unsat_set.push(c);
    self.unsat_weight += self.formula.weight(c);
  }

  fn mark_sat(&mut self, c: usize) {
    let pos = self.unsat_pos[c].take().expect("clause must be tracked as unsat before being cleared");
    let last = self.unsat_set.len() - 1;
    self.unsat_set.swap(pos, last);
    self.unsat_set.pop();
    if pos < self.unsat_set.len() {
      self.unsat_pos[self.unsat_set[pos]] = Some(pos);
    }
    self.unsat_weight -= self.formula.weight(c);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn formula(clauses: Vec<Vec<i32>>) -> Formula {
    Formula::new(clauses, None, None).unwrap()
  }

  #[test]
  fn drops_empty_clauses() {
    let f = Formula::new(vec![vec![1, 2], vec![]], None, None).unwrap();
    assert_eq!(f.num_clauses(), 1);
  }

  #[test]
  fn infers_num_variables_as_max_abs_literal() {
    let f = formula(vec![vec![-6, -2], vec![-2, 3, 3]]);
    assert_eq!(f.num_variables(), 6);
  }

  #[test]
  fn zero_variable_is_rejected() {
    let err = Formula::new(vec![vec![1, 0, 2]], None, None).unwrap_err();
    assert!(matches!(err, Error::ZeroVariable));
  }

  #[test]
  fn weight_length_mismatch_is_rejected() {
    let err = Formula::new(vec![vec![1], vec![2]], Some(vec![1.0]), None).unwrap_err();
    assert!(matches!(err, Error::WeightLengthMismatch { .. }));
  }

  #[test]
  fn invariant_sat_count_matches_unsat_set() {
    let f = formula(vec![vec![1, -2], vec![-1], vec![2]]);
    let mut rng = Rng::with_seed(1);
    let mut state = SearchState::init(&f, &mut rng);
    for v in 1..=f.num_variables() {
      state.flip(v);
      let recomputed_unsat: Vec<usize> = (0..f.num_clauses())
        .filter(|&c| {
          f.clauses()[c].iter().filter(|l| l.evaluate(state.assignment())).count() == 0
        })
        .collect();
      let mut tracked = state.unsat_set().to_vec();
      tracked.sort_unstable();
      let mut recomputed = recomputed_unsat;
      recomputed.sort_unstable();
      assert_eq!(tracked, recomputed);
    }
  }

  #[test]
  fn duplicate_literal_behaves_as_deduplicated() {
    let with_dup = formula(vec![vec![1, 1, 2]]);
    let deduped = formula(vec![vec![1, 2]]);
    assert_eq!(with_dup.clauses()[0].len(), deduped.clauses()[0].len());

    let mut rng_a = Rng::with_seed(9);
    let mut rng_b = Rng::with_seed(9);
    let state_a = SearchState::init(&with_dup, &mut rng_a);
    let state_b = SearchState::init(&deduped, &mut rng_b);
    assert_eq!(state_a.break_count(1), state_b.break_count(1));
  }

  #[test]
  fn unsat_weight_matches_sum_over_unsat_set() {
    let f = Formula::new(
      vec![vec![1, 2], vec![1], vec![-2], vec![-1]],
      Some(vec![1.0, 1.0, 1.0, 1.0]),
      None,
    )
    .unwrap();
    let mut rng = Rng::with_seed(3);
    let mut state = SearchState::init(&f, &mut rng);
    for v in 1..=f.num_variables() {
      state.flip(v);
      let recomputed: f64 = state.unsat_set().iter().map(|&c| f.weight(c)).sum();
      assert!((state.unsat_weight() - recomputed).abs() < 1e-9);
    }
  }

  #[test]
  fn zero_weight_clause_does_not_affect_break_count() {
    let f = Formula::new(vec![vec![1, 2], vec![1], vec![-2]], Some(vec![1.0, 1.0, 0.0]), None).unwrap();
    let f_all_ones = Formula::new(vec![vec![1, 2], vec![1], vec![-2]], None, None).unwrap();
    let mut rng_a = Rng::with_seed(5);
    let mut rng_b = Rng::with_seed(5);
    let state_a = SearchState::init(&f, &mut rng_a);
    let state_b = SearchState::init(&f_all_ones, &mut rng_b);
    for v in 1..=f.num_variables() {
      // break_count with the zero-weighted clause must never exceed the unweighted
      // count by the contribution of clause 2 (index 2, weight 0).
      let bc = state_a.break_count(v);
      let bc_unweighted_equivalent = state_b.break_count(v);
      assert!(bc <= bc_unweighted_equivalent + 1e-9);
    }
  }

  #[test]
  fn flip_only_touches_clauses_containing_the_variable() {
    let f = formula(vec![vec![1, 2], vec![3, -1], vec![2, 3]]);
    let mut rng = Rng::with_seed(11);
    let mut state = SearchState::init(&f, &mut rng);
    let before: Vec<u32> = state.sat_count.clone();
    state.flip(2);
    let after: Vec<u32> = state.sat_count.clone();
    for c in 0..f.num_clauses() {
      let touches_v2 = f.clauses()[c].contains_variable(2);
      if !touches_v2 {
        assert_eq!(before[c], after[c], "clause {} does not contain v2 but changed", c);
      }
    }
  }
}
