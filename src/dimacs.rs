/*!

  A deliberately minimal DIMACS CNF reader. Parsing is a collaborator at the boundary of
  this crate, not a core concern: it exists only to turn text into the `Vec<Vec<i32>>`
  shape `Formula::new` accepts, nothing more (no preprocessing, no tautology removal, no
  validation beyond what the format itself implies).

  A DIMACS file can bundle more than one `p cnf` problem back to back; `parse_all` yields
  every one of them, matching `c`-comment-skipping and `0`-terminated clause bodies.
  `parse` is a thin convenience over the first problem only.

*/

/// Splits `text` into however many CNF problems it contains. Lines starting with `c`
/// are comments; a `p` line starts a new problem (its clause/variable counts are not
/// validated — the next `0`-terminated groups of literals decide the real clause list).
/// Trailing empty clause bodies are dropped, matching how a stray blank line or a run of
/// whitespace between `0`s should be read as "no clause", not an empty one.
pub fn parse_all(text: &str) -> Vec<Vec<Vec<i32>>> {
  let mut problems = Vec::new();
  let mut current: Option<Vec<Vec<i32>>> = None;

  for line in text.lines() {
    let line = line.trim();
    if line.is_empty() {
      continue;
    }
    let mut fields = line.split_whitespace();
    let first = match fields.next() {
      Some(f) => f,
      None => continue,
    };
    if first == "c" {
      continue;
    }
    if first == "p" {
      if let Some(problem) = current.take() {
        problems.push(problem.into_iter().filter(|c| !c.is_empty()).collect());
      }
      current = Some(vec![Vec::new()]);
      continue;
    }

    let problem = match current.as_mut() {
      Some(p) => p,
      None => continue, // literals before any `p` line: ignored, not a formula yet
    };

    for field in std::iter::once(first).chain(fields) {
      match field.parse::<i32>() {
        Ok(0) => problem.push(Vec::new()),
        Ok(literal) => {
          problem.last_mut().expect("a clause slot always exists once a problem starts").push(literal)
        }
        Err(_) => continue,
      }
    }
  }

  if let Some(problem) = current {
    problems.push(problem.into_iter().filter(|c| !c.is_empty()).collect());
  }

  problems
}

/// Parses only the first CNF problem in `text`. Returns an empty clause list if `text`
/// contains no `p` line at all.
pub fn parse(text: &str) -> Vec<Vec<i32>> {
  parse_all(text).into_iter().next().unwrap_or_default()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_single_problem() {
    let text = "c a comment\np cnf 3 2\n1 -2 0\n2 3 0\n";
    let clauses = parse(text);
    assert_eq!(clauses, vec![vec![1, -2], vec![2, 3]]);
  }

  #[test]
  fn ignores_blank_lines_and_comments() {
    let text = "\nc start\np cnf 2 1\n\n1 2 0\nc trailing\n";
    assert_eq!(parse(text), vec![vec![1, 2]]);
  }

  #[test]
  fn clauses_may_span_multiple_lines() {
    let text = "p cnf 3 1\n1 -2\n3 0\n";
    assert_eq!(parse(text), vec![vec![1, -2, 3]]);
  }

  #[test]
  fn parse_all_yields_every_bundled_problem() {
    let text = "p cnf 2 1\n1 2 0\np cnf 2 1\n-1 -2 0\n";
    let problems = parse_all(text);
    assert_eq!(problems, vec![vec![vec![1, 2]], vec![vec![-1, -2]]]);
  }

  #[test]
  fn no_p_line_yields_no_problems() {
    assert_eq!(parse_all("c just a comment\n"), Vec::<Vec<Vec<i32>>>::new());
    assert_eq!(parse(""), Vec::<Vec<i32>>::new());
  }
}
