//! dsched-scheduler: the client event loop.
//!
//! Signals readiness, classifies each event the ds-server pushes back, and
//! hands job arrivals to the configured placement policy. One job is in
//! flight at a time.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── Session (handshake, lock-step REDY / SCHD / QUIT)
//!   ├── PlacementPolicy (queries the Session as its Inventory)
//!   └── RunSummary (counters reported on exit)
//! ```

pub mod error;
pub mod scheduler;
pub mod summary;

pub use error::{SchedulerError, SchedulerResult};
pub use scheduler::{LoopState, RunOutcome, Scheduler};
pub use summary::RunSummary;
