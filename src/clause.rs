/*!

A `Clause` is a nonempty ordered sequence of `Literal`s OR'ed together. For example
$x_1 \lor \overline{x}_2 \lor \overline{x}_3 \lor x_4$.

Clauses are read-only once a `Formula` is built; the incremental bookkeeping lives in
`crate::formula`.

*/

use std::fmt::{Display, Formatter};
use std::ops::Index;

use crate::{BoolVariable, Literal, LiteralVector};

pub type ClauseVector = Vec<Clause>;

#[derive(Clone, Eq, PartialEq, Debug, Hash, Default)]
pub struct Clause {
  literals: LiteralVector,
}

impl Clause {
  pub fn new(literals: LiteralVector) -> Clause {
    Clause { literals }
  }

  pub fn literals(&self) -> &LiteralVector {
    &self.literals
  }

  pub fn len(&self) -> usize {
    self.literals.len()
  }

  pub fn is_empty(&self) -> bool {
    self.literals.is_empty()
  }

  pub fn contains_variable(&self, variable: BoolVariable) -> bool {
    self.literals.iter().any(|l| l.var() == variable)
  }

  /// `true` if every literal currently evaluates to the same truth value under
  /// `assignment` that would make the clause trivially satisfied regardless of that
  /// value — i.e. the clause contains both `x` and `¬x` for some variable.
  pub fn is_tautological(&self) -> bool {
    self.literals.iter().any(|&a| self.literals.iter().any(|&b| a == !b))
  }

  pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
    self.literals.iter()
  }
}

impl Index<usize> for Clause {
  type Output = Literal;

  fn index(&self, index: usize) -> &Self::Output {
    &self.literals[index]
  }
}

impl Display for Clause {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    use itertools::Itertools;
    write!(f, "{}", self.literals.iter().join(" "))
  }
}
