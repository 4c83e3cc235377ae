pub mod clause;
pub mod dimacs;
pub mod dispatcher;
pub mod errors;
pub mod formula;
pub mod literal;
pub mod rng;
pub mod search;
pub mod task;
pub mod transport;

pub use clause::{Clause, ClauseVector};
pub use dispatcher::{run_task, DispatcherConfig};
pub use errors::{Error, Result};
pub use formula::{Formula, SearchState};
pub use literal::{Literal, LiteralVector};
pub use rng::Rng;
pub use search::{run_trial, SearchConfig, SearchOutcome};
pub use task::Task;
pub use transport::{channel_transport, ChannelComm, Comm, Frame};

/// A bool variable $x_j$ has corresponding literals $x_j$ and $\overline{x}_j$. Variables
/// are 1-indexed, matching DIMACS convention, so index `0` of any `assignment`/`sat_count`
/// slice keyed by `BoolVariable` is unused filler.
pub type BoolVariable = usize;
