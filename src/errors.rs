/*!

  The error kinds the crate surfaces. Input errors are raised at formula-construction
  time, before any trial runs; transport errors are fatal to the whole dispatcher run;
  worker errors abort the job rather than being silently swallowed. Budget exhaustion and
  "no solution found" are not errors — they are ordinary `SearchOutcome` values (see
  `crate::search`).

*/

use thiserror::Error as DeriveError;

#[derive(Debug, DeriveError)]
pub enum Error {
  #[error("malformed DIMACS input: {0}")]
  Dimacs(String),

  #[error("variable id 0 is not allowed in a clause body")]
  ZeroVariable,

  #[error("weight vector has length {weights}, but the formula has {clauses} clauses")]
  WeightLengthMismatch { weights: usize, clauses: usize },

  #[error("rand_var_prob must lie in [0, 1], got {0}")]
  InvalidNoise(f64),

  #[error("transport send/recv failed: {0}")]
  Transport(String),

  #[error("worker {rank} failed: {source}")]
  Worker { rank: usize, source: Box<dyn std::error::Error + Send + Sync> },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_messages_are_descriptive() {
    let err = Error::WeightLengthMismatch { weights: 2, clauses: 3 };
    assert_eq!(
      err.to_string(),
      "weight vector has length 2, but the formula has 3 clauses"
    );
  }
}
