/*!

  The task contract (component C5): the dispatcher is generic over *what* work gets
  done, and a `Task` implementation supplies that. Mirrors
  `original_source/mpi_runner.py`'s base `Task` class — `setup`/`produce`/`consume`/
  `finalize` run master-side, `setup_worker`/`apply`/`finalize_worker` run worker-side —
  translated from a duck-typed base class into a trait with defaulted hooks.

  Each worker runs its own `Clone` of the `Task` the caller hands to `run_task`, just as
  each MPI rank in the source ran its own process-local instance of the same class; the
  master keeps the original.

*/

/// One unit of dispatchable work and the shape of the answer a worker computes for it.
pub trait Task: Clone + Send + 'static {
  type Item: Send;
  type Outcome: Send;

  /// One-time master-side setup, given the total participant count (including the
  /// master). Default: no-op.
  fn setup(&mut self, _size: usize) {}

  /// The finite sequence of work items to dispatch, as a lazy iterator. Called exactly
  /// once, after `setup`. The dispatcher's produce stage pulls one item at a time as
  /// workers free up rather than draining this eagerly, so the whole stream never has to
  /// sit in memory at once — the bounded `free`/`outbox`/`inflight_tokens` queues only
  /// bound memory if `produce` itself stays lazy.
  fn produce(&mut self) -> Box<dyn Iterator<Item = Self::Item> + Send>;

  /// Called once per result, in arrival order, master-side only.
  fn consume(&mut self, result: Self::Outcome);

  /// Master-side cleanup, called once after every result has been consumed (even if a
  /// worker failed partway through). Default: no-op.
  fn finalize(&mut self) {}

  /// Per-worker setup, given this worker's rank and the total participant count.
  /// Default: no-op.
  fn setup_worker(&mut self, _rank: usize, _size: usize) {}

  /// The pure per-item computation a worker performs.
  fn apply(&mut self, item: Self::Item) -> Self::Outcome;

  /// Worker-side cleanup, called once after this worker's last item (or immediately, if
  /// it was never assigned one). Default: no-op.
  fn finalize_worker(&mut self) {}
}

#[cfg(test)]
mod tests {
  use super::*;

  #[derive(Clone)]
  struct Doubler {
    seen: Vec<i32>,
  }

  impl Task for Doubler {
    type Item = i32;
    type Outcome = i32;

    fn produce(&mut self) -> Box<dyn Iterator<Item = i32> + Send> {
      Box::new(vec![1, 2, 3].into_iter())
    }

    fn consume(&mut self, result: i32) {
      self.seen.push(result);
    }

    fn apply(&mut self, item: i32) -> i32 {
      item * 2
    }
  }

  #[test]
  fn default_hooks_are_no_ops() {
    let mut task = Doubler { seen: Vec::new() };
    task.setup(1);
    task.setup_worker(0, 1);
    for item in task.produce() {
      let result = task.apply(item);
      task.consume(result);
    }
    task.finalize_worker();
    task.finalize();
    assert_eq!(task.seen, vec![2, 4, 6]);
  }
}
