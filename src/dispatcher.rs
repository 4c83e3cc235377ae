/*!

  The dispatcher (component C6): runs a `Task` to completion, either inline on the
  calling thread (when there are no workers) or over a master/worker thread group.

  The distributed path is a direct translation of `original_source/mpi_runner.py`'s
  `run_task`: the master splits into three cooperating stages — produce, send, recv —
  connected by three bounded internal queues (`free`, `outbox`, `inflight_tokens`), each
  bounded by the worker count so a fast producer can never race arbitrarily far ahead of
  the workers actually consuming items. MPI ranks become OS threads; `Comm.send`/`recv`
  become `crate::transport::Comm`; the `queue.Queue` objects become bounded
  `crossbeam-channel` channels.

*/

use crossbeam_channel::bounded;

use crate::errors::{Error, Result};
use crate::task::Task;
use crate::transport::{channel_transport, Comm, Frame};

#[derive(Clone, Copy, Debug)]
pub struct DispatcherConfig {
  /// Number of worker threads. `0` runs the task sequentially, inline, on the calling
  /// thread — no channels, no extra threads.
  pub workers: usize,
}

impl Default for DispatcherConfig {
  fn default() -> Self {
    // `available_parallelism` includes the calling thread itself, which will be the
    // master and does no `apply` work of its own, so workers = total - 1.
    let total = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    DispatcherConfig { workers: total.saturating_sub(1) }
  }
}

enum OutboxMessage<Item> {
  Item(usize, Item),
  Sentinel,
}

enum InflightToken {
  Continuation,
  Termination,
}

/// Runs `task` to completion under `config`. Consumes `task` and returns once every
/// worker has been sent its shutdown sentinel and master-side `finalize` has run.
pub fn run_task<T: Task>(mut task: T, config: DispatcherConfig) -> Result<()> {
  if config.workers == 0 {
    return run_sequential(task);
  }

  let worker_count = config.workers;
  let size = worker_count + 1;

  task.setup(size);
  let items = task.produce();

  // One bounded channel per rank, tagged with the sender's rank, capacity bounded by
  // the worker count — the same backpressure bound the internal queues below use.
  let mut comms = channel_transport::<T::Item, T::Outcome>(size, worker_count);
  let worker_comms: Vec<_> = comms.split_off(1);
  let master_comm = comms.pop().expect("rank 0 always exists");

  let (free_tx, free_rx) = bounded::<usize>(worker_count);
  let (outbox_tx, outbox_rx) = bounded::<OutboxMessage<T::Item>>(worker_count);
  let (inflight_tx, inflight_rx) = bounded::<InflightToken>(worker_count);

  for rank in 1..size {
    free_tx.send(rank).expect("free pool has room for every worker rank");
  }

  let recv_outcome: Result<()> = std::thread::scope(|scope| {
    for worker_comm in worker_comms {
      let mut worker_task = task.clone();
      scope.spawn(move || run_worker(&mut worker_task, worker_comm));
    }

    // Produce stage: hand items to idle workers as they free up, then mark the stream
    // exhausted once per worker so the send stage can wind down. `free_rx`/`outbox_tx`
    // erroring out (rather than blocking forever) means a fatal worker/transport error
    // detected downstream unwinds this stage instead of wedging it.
    scope.spawn(move || {
      for item in items {
        let rank = match free_rx.recv() {
          Ok(rank) => rank,
          Err(_) => break, // recv stage aborted the run: no worker will ever free up again
        };
        if outbox_tx.send(OutboxMessage::Item(rank, item)).is_err() {
          break; // send stage already wound down
        }
      }
      for _ in 1..size {
        if outbox_tx.send(OutboxMessage::Sentinel).is_err() {
          break;
        }
      }
    });

    // Send stage: transmit items to their assigned worker; stop at the first sentinel.
    let master_comm_for_send = &master_comm;
    scope.spawn(move || {
      loop {
        match outbox_rx.recv() {
          Ok(OutboxMessage::Item(rank, item)) => {
            if master_comm_for_send.send(rank, Frame::Work(item)).is_err() {
              let _ = inflight_tx.send(InflightToken::Termination);
              break;
            }
            if inflight_tx.send(InflightToken::Continuation).is_err() {
              break;
            }
          }
          Ok(OutboxMessage::Sentinel) | Err(_) => {
            let _ = inflight_tx.send(InflightToken::Termination);
            break;
          }
        }
      }
    });

    // Recv stage: one token per dispatched item, then the termination token. Only this
    // stage touches `task.consume`, so no synchronization is needed around it. `free_tx`
    // and `task` are moved in (rather than borrowed, as `master_comm_for_recv` is) so
    // that any early `break` below — a fatal worker or transport error — drops `free_tx`
    // on the way out, unblocking the produce stage's `free_rx.recv()` instead of leaving
    // it waiting forever for a rank that will never free up again.
    let master_comm_for_recv = &master_comm;
    let recv_handle = scope.spawn(move || -> Result<()> {
      let mut worker_error = None;
      loop {
        match inflight_rx.recv() {
          Ok(InflightToken::Continuation) => match master_comm_for_recv.recv() {
            Ok((rank, Frame::Result(result))) => {
              task.consume(result);
              let _ = free_tx.send(rank);
            }
            Ok((rank, Frame::Error(message))) => {
              worker_error.get_or_insert(Error::Worker { rank, source: message.into() });
              break;
            }
            Ok((rank, Frame::Shutdown)) => {
              worker_error.get_or_insert(Error::Worker {
                rank,
                source: format!("worker {} disconnected before answering", rank).into(),
              });
              break;
            }
            Ok((rank, Frame::Work(_))) => {
              worker_error
                .get_or_insert(Error::Worker { rank, source: "worker sent a work item to the master".into() });
              break;
            }
            Err(err) => {
              worker_error.get_or_insert(err);
              break;
            }
          },
          Ok(InflightToken::Termination) => break,
          Err(_) => break,
        }
      }
      for rank in 1..size {
        let _ = master_comm_for_recv.send(rank, Frame::Shutdown);
      }
      task.finalize();
      match worker_error {
        Some(err) => Err(err),
        None => Ok(()),
      }
    });

    recv_handle.join().unwrap_or_else(|_| Err(Error::Transport("recv stage panicked".to_string())))
  });

  recv_outcome
}

fn run_worker<T: Task>(task: &mut T, comm: impl Comm<T::Item, T::Outcome>) {
  let rank = comm.rank();
  let size = comm.size();
  task.setup_worker(rank, size);

  loop {
    match comm.recv() {
      Ok((_, Frame::Work(item))) => {
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| task.apply(item)));
        match outcome {
          Ok(result) => {
            if comm.send(0, Frame::Result(result)).is_err() {
              break;
            }
          }
          Err(payload) => {
            // `apply` panicked: tell the master explicitly rather than just
            // disconnecting, so its blocking `recv()` for this item is guaranteed to
            // complete instead of waiting forever for a response that was never coming.
            let _ = comm.send(0, Frame::Error(panic_message(payload)));
            break;
          }
        }
      }
      Ok((_, Frame::Shutdown)) | Err(_) => break,
      // a worker never receives a result or another worker's error report
      Ok((_, Frame::Result(_))) | Ok((_, Frame::Error(_))) => break,
    }
  }

  task.finalize_worker();
}

/// Renders a `catch_unwind` payload as a human-readable message, covering the two
/// payload shapes `panic!`/`assert!`/`unwrap`/`expect` actually produce (`&'static str`
/// and `String`); anything else came from a custom panic payload type.
fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
  if let Some(message) = payload.downcast_ref::<&str>() {
    message.to_string()
  } else if let Some(message) = payload.downcast_ref::<String>() {
    message.clone()
  } else {
    "worker panicked with a non-string payload".to_string()
  }
}

fn run_sequential<T: Task>(mut task: T) -> Result<()> {
  task.setup(1);
  task.setup_worker(0, 1);
  for item in task.produce() {
    let result = task.apply(item);
    task.consume(result);
  }
  task.finalize_worker();
  task.finalize();
  Ok(())
}
