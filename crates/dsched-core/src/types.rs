//! Shared types used across dsched crates.

use serde::{Deserialize, Serialize};

/// Resource demand of a single job along the three capacity dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    pub core: u32,
    pub memory: u32,
    pub disk: u32,
}

impl Demand {
    pub fn new(core: u32, memory: u32, disk: u32) -> Self {
        Self { core, memory, disk }
    }
}

/// A job announced by the simulator through `JOBN` or `JOBP`.
///
/// Lives only until its placement decision has been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: u32,
    pub submit_time: u64,
    pub est_runtime: u64,
    pub core: u32,
    pub memory: u32,
    pub disk: u32,
}

impl JobRecord {
    pub fn demand(&self) -> Demand {
        Demand::new(self.core, self.memory, self.disk)
    }
}

/// Snapshot of one server as reported by a `GETS` listing.
///
/// Only valid for the decision it was fetched for; the simulator's view
/// moves on as soon as the next event is processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRecord {
    pub server_type: String,
    pub server_id: u32,
    /// Status token (`inactive`, `booting`, `idle`, `active`, `unavailable`).
    /// Not interpreted by any policy.
    pub state: String,
    /// `-1` while the server has never been booted.
    pub start_time: i64,
    pub core: u32,
    pub memory: u32,
    pub disk: u32,
    pub waiting_jobs: u32,
    pub running_jobs: u32,
}

impl ResourceRecord {
    /// Core slack left after placing `demand`. Negative when the server is too small.
    pub fn core_fitness(&self, demand: &Demand) -> i64 {
        i64::from(self.core) - i64::from(demand.core)
    }

    pub fn memory_fitness(&self, demand: &Demand) -> i64 {
        i64::from(self.memory) - i64::from(demand.memory)
    }

    /// `type id` pair used in `SCHD` and `EJWT`.
    pub fn key(&self) -> String {
        format!("{} {}", self.server_type, self.server_id)
    }
}
