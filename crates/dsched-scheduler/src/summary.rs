//! Per-session counters, printed when the simulator runs out of jobs.

use std::collections::BTreeMap;

use dsched_core::ResourceRecord;
use dsched_placement::PolicyKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub policy: PolicyKind,
    /// `JOBN` and `JOBP` events.
    pub jobs_received: u64,
    pub jobs_scheduled: u64,
    /// Jobs for which no server qualified, so no `SCHD` was sent.
    pub placements_withheld: u64,
    pub completions: u64,
    /// Unrecognized events and `ERR` replies to `REDY`.
    pub ignored_events: u64,
    pub final_time: Option<u64>,
    /// Server type → number of jobs scheduled onto it.
    pub per_server_type: BTreeMap<String, u64>,
}

impl RunSummary {
    pub fn new(policy: PolicyKind) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    pub fn record_scheduled(&mut self, server: &ResourceRecord) {
        self.jobs_scheduled += 1;
        *self
            .per_server_type
            .entry(server.server_type.clone())
            .or_insert(0) += 1;
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn format_text(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("Policy:              {}\n", self.policy));
        out.push_str(&format!("Jobs received:       {}\n", self.jobs_received));
        out.push_str(&format!("Jobs scheduled:      {}\n", self.jobs_scheduled));
        out.push_str(&format!("Placements withheld: {}\n", self.placements_withheld));
        out.push_str(&format!("Completions:         {}\n", self.completions));
        if self.ignored_events > 0 {
            out.push_str(&format!("Ignored events:      {}\n", self.ignored_events));
        }
        match self.final_time {
            Some(t) => out.push_str(&format!("Final sim time:      {t}\n")),
            None => out.push_str("Final sim time:      -\n"),
        }

        if !self.per_server_type.is_empty() {
            out.push_str("\nBy server type:\n");
            for (server_type, count) in &self.per_server_type {
                out.push_str(&format!("  {server_type:<16} {count}\n"));
            }
        }

        out
    }
}
