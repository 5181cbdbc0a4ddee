//! Placement policies.
//!
//! Every policy fetches a fresh listing for the job it is placing and
//! returns `Ok(None)` when no server qualifies. Inventory errors are
//! protocol errors and propagate unchanged.

use dsched_core::{Demand, ResourceRecord};
use dsched_proto::{GetsMode, Inventory, ProtocolResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::fitness::closest_fit;
use crate::load_balancer::RoundRobinBalancer;

/// A placement algorithm, fixed for the lifetime of a session.
pub trait PlacementPolicy: Send {
    fn kind(&self) -> PolicyKind;

    fn place(
        &mut self,
        demand: &Demand,
        inventory: &mut dyn Inventory,
    ) -> ProtocolResult<Option<ResourceRecord>>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    FirstCapable,
    #[default]
    ClosestFit,
    FastestTurnaround,
    LargestRoundRobin,
}

impl PolicyKind {
    /// Map a short command-line code to a policy.
    ///
    /// `bf`, `ff` and `wf` are accepted for compatibility and all run
    /// closest-fit; `atl` runs fastest-turnaround.
    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "fc" => Some(PolicyKind::FirstCapable),
            "cf" | "bf" | "ff" | "wf" => Some(PolicyKind::ClosestFit),
            "ft" | "atl" => Some(PolicyKind::FastestTurnaround),
            "lrr" => Some(PolicyKind::LargestRoundRobin),
            _ => None,
        }
    }

    /// Like [`PolicyKind::from_code`], falling back to the default policy.
    pub fn from_code_or_default(code: &str) -> Self {
        Self::from_code(code).unwrap_or_else(|| {
            let fallback = Self::default();
            warn!(%code, policy = fallback.name(), "unrecognized algorithm code, using default");
            fallback
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            PolicyKind::FirstCapable => "first-capable",
            PolicyKind::ClosestFit => "closest-fit",
            PolicyKind::FastestTurnaround => "fastest-turnaround",
            PolicyKind::LargestRoundRobin => "largest-round-robin",
        }
    }

    pub fn build(&self) -> Box<dyn PlacementPolicy> {
        match self {
            PolicyKind::FirstCapable => Box::new(FirstCapable),
            PolicyKind::ClosestFit => Box::new(ClosestFit),
            PolicyKind::FastestTurnaround => Box::new(FastestTurnaround),
            PolicyKind::LargestRoundRobin => Box::new(LargestRoundRobin::new()),
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `Available` servers, or `Capable` ones when nothing is free right now.
fn available_or_capable(
    demand: &Demand,
    inventory: &mut dyn Inventory,
) -> ProtocolResult<Vec<ResourceRecord>> {
    let servers = inventory.query(GetsMode::Available, demand)?;
    if !servers.is_empty() {
        return Ok(servers);
    }
    debug!(?demand, "no available server, falling back to capable");
    inventory.query(GetsMode::Capable, demand)
}

/// First server of the `Capable` listing.
#[derive(Debug, Default)]
pub struct FirstCapable;

impl PlacementPolicy for FirstCapable {
    fn kind(&self) -> PolicyKind {
        PolicyKind::FirstCapable
    }

    fn place(
        &mut self,
        demand: &Demand,
        inventory: &mut dyn Inventory,
    ) -> ProtocolResult<Option<ResourceRecord>> {
        Ok(inventory
            .query(GetsMode::Capable, demand)?
            .into_iter()
            .next())
    }
}

/// Smallest core slack, memory slack as tie-break. See [`closest_fit`].
#[derive(Debug, Default)]
pub struct ClosestFit;

impl PlacementPolicy for ClosestFit {
    fn kind(&self) -> PolicyKind {
        PolicyKind::ClosestFit
    }

    fn place(
        &mut self,
        demand: &Demand,
        inventory: &mut dyn Inventory,
    ) -> ProtocolResult<Option<ResourceRecord>> {
        let mut servers = available_or_capable(demand, inventory)?;
        Ok(closest_fit(&servers, demand).map(|idx| servers.swap_remove(idx)))
    }
}

/// Server with the smallest estimated waiting time.
///
/// Costs one `EJWT` round trip per candidate.
#[derive(Debug, Default)]
pub struct FastestTurnaround;

impl PlacementPolicy for FastestTurnaround {
    fn kind(&self) -> PolicyKind {
        PolicyKind::FastestTurnaround
    }

    fn place(
        &mut self,
        demand: &Demand,
        inventory: &mut dyn Inventory,
    ) -> ProtocolResult<Option<ResourceRecord>> {
        let servers = available_or_capable(demand, inventory)?;

        let mut best: Option<(usize, u64)> = None;
        for (idx, server) in servers.iter().enumerate() {
            let wait = inventory.estimated_wait(server)?;
            debug!(server = %server.key(), wait, "estimated wait");
            if best.is_none_or(|(_, min)| wait < min) {
                best = Some((idx, wait));
            }
        }

        Ok(best.map(|(idx, _)| servers[idx].clone()))
    }
}

/// Round-robin over every server of the largest type.
///
/// The server set is discovered with `GETS All` on the first job and
/// reused for the rest of the session.
#[derive(Debug, Default)]
pub struct LargestRoundRobin {
    servers: Vec<ResourceRecord>,
    balancer: RoundRobinBalancer,
}

impl LargestRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed server set, empty until the first job was placed.
    pub fn servers(&self) -> &[ResourceRecord] {
        &self.servers
    }

    fn discover(&mut self, demand: &Demand, inventory: &mut dyn Inventory) -> ProtocolResult<()> {
        let all = inventory.query(GetsMode::All, demand)?;
        let Some(max_core) = all.iter().map(|s| s.core).max() else {
            return Ok(());
        };
        let Some(largest_type) = all
            .iter()
            .find(|s| s.core == max_core)
            .map(|s| s.server_type.clone())
        else {
            return Ok(());
        };

        self.servers = all
            .into_iter()
            .filter(|s| s.server_type == largest_type && s.core == max_core)
            .collect();
        self.balancer.reset();

        info!(
            server_type = %largest_type,
            cores = max_core,
            count = self.servers.len(),
            "largest server type selected"
        );
        Ok(())
    }
}

impl PlacementPolicy for LargestRoundRobin {
    fn kind(&self) -> PolicyKind {
        PolicyKind::LargestRoundRobin
    }

    fn place(
        &mut self,
        demand: &Demand,
        inventory: &mut dyn Inventory,
    ) -> ProtocolResult<Option<ResourceRecord>> {
        if self.servers.is_empty() {
            self.discover(demand, inventory)?;
        }
        Ok(self
            .balancer
            .next(self.servers.len())
            .map(|idx| self.servers[idx].clone()))
    }
}
