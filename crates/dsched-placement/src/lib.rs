//! dsched placement: picks the server each incoming job runs on.
//!
//! Policies see the simulator only through the [`Inventory`] trait, so every
//! decision is made against a fresh listing fetched for that job.
//!
//! # Components
//!
//! - **`fitness`**: closest-fit candidate selection
//! - **`load_balancer`**: round-robin index over a fixed server set
//! - **`policy`**: the policy trait, its variants and their codes
//!
//! [`Inventory`]: dsched_proto::Inventory

pub mod fitness;
pub mod load_balancer;
pub mod policy;

pub use fitness::closest_fit;
pub use load_balancer::RoundRobinBalancer;
pub use policy::{
    ClosestFit, FastestTurnaround, FirstCapable, LargestRoundRobin, PlacementPolicy, PolicyKind,
};
