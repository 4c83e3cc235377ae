/*!

  The transport abstraction (component C4): typed, point-to-point, FIFO-per-pair message
  passing between ranks, plus `size`/`rank` queries. Mirrors the shape of
  `original_source/mpi_runner.py`'s `Comm` class (and its `MPI_Comm` implementation over
  `mpi4py`) closely enough that an out-of-process transport could implement the same
  trait without the dispatcher or any `Task` needing to change.

  The bundled `ChannelComm` realizes the trait in-process over bounded
  `crossbeam-channel` queues, treated as a swappable collaborator so an out-of-process
  transport (MPI, a socket pool, whatever) could stand in without touching the
  dispatcher or any `Task`.

*/

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::errors::{Error, Result};

/// What travels over the wire in either direction. Master→worker sends `Work` or the
/// `Shutdown` sentinel; worker→master sends `Result` or, if `apply` panicked, `Error`
/// carrying the panic payload. A tagged union rather than a nullable payload, so a
/// `Shutdown` sentinel (or a worker failure) can never be confused with a real item.
#[derive(Clone, Debug)]
pub enum Frame<Item, Outcome> {
  Work(Item),
  Result(Outcome),
  Error(String),
  Shutdown,
}

pub trait Comm<Item, Outcome>: Send {
  /// Total participant count, including the master.
  fn size(&self) -> usize;
  /// This participant's id in `[0, size)`; the master is always rank 0.
  fn rank(&self) -> usize;
  /// Blocks until handoff. Ordered and reliable for any fixed `(self.rank(), dest)` pair.
  fn send(&self, dest: usize, frame: Frame<Item, Outcome>) -> Result<()>;
  /// Blocks until any message arrives; returns the sender's rank alongside the payload.
  /// No ordering guarantee across distinct source ranks.
  fn recv(&self) -> Result<(usize, Frame<Item, Outcome>)>;
}

/// An in-process `Comm` built from one bounded channel per rank: messages addressed to
/// rank `r` are carried on `r`'s channel, tagged with the sender's rank so `recv` can
/// report its source.
pub struct ChannelComm<Item, Outcome> {
  rank: usize,
  size: usize,
  inbox: Receiver<(usize, Frame<Item, Outcome>)>,
  outboxes: Vec<Sender<(usize, Frame<Item, Outcome>)>>,
}

impl<Item, Outcome> Comm<Item, Outcome> for ChannelComm<Item, Outcome> {
  fn size(&self) -> usize {
    self.size
  }

  fn rank(&self) -> usize {
    self.rank
  }

  fn send(&self, dest: usize, frame: Frame<Item, Outcome>) -> Result<()> {
    self.outboxes[dest]
      .send((self.rank, frame))
      .map_err(|_| Error::Transport(format!("rank {} could not reach rank {}", self.rank, dest)))
  }

  fn recv(&self) -> Result<(usize, Frame<Item, Outcome>)> {
    self
      .inbox
      .recv()
      .map_err(|_| Error::Transport(format!("rank {} found no live sender", self.rank)))
  }
}

/// Builds one `ChannelComm` per rank `0..size` (rank 0 is the master), each channel
/// bounded to `capacity`.
pub fn channel_transport<Item, Outcome>(size: usize, capacity: usize) -> Vec<ChannelComm<Item, Outcome>> {
  assert!(size >= 1, "a transport group needs at least one participant");
  let channels: Vec<(Sender<(usize, Frame<Item, Outcome>)>, Receiver<(usize, Frame<Item, Outcome>)>)> =
    (0..size).map(|_| bounded(capacity.max(1))).collect();

  let outboxes: Vec<Sender<(usize, Frame<Item, Outcome>)>> = channels.iter().map(|(s, _)| s.clone()).collect();

  channels
    .into_iter()
    .enumerate()
    .map(|(rank, (_, inbox))| ChannelComm { rank, size, inbox, outboxes: outboxes.clone() })
    .collect()
}
