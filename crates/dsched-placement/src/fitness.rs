//! Closest-fit candidate selection.
//!
//! Fitness is the slack a server keeps after taking a job:
//! `capacity - demand`, per dimension. Selection order:
//! 1. smallest non-negative core fitness
//! 2. on equal core fitness, smallest non-negative memory fitness
//! 3. with no non-negative core fitness at all, the least negative one
//!
//! The first candidate seen wins exact ties.

use dsched_core::{Demand, ResourceRecord};

/// Index of the closest-fitting candidate, or `None` for an empty list.
pub fn closest_fit(candidates: &[ResourceRecord], demand: &Demand) -> Option<usize> {
    // (index, core fitness, memory fitness)
    let mut chosen: Option<(usize, i64, i64)> = None;
    // (index, core fitness), only for servers short on cores
    let mut backup: Option<(usize, i64)> = None;

    for (idx, server) in candidates.iter().enumerate() {
        let core = server.core_fitness(demand);
        let memory = server.memory_fitness(demand);

        if core >= 0 {
            let better = match chosen {
                None => true,
                Some((_, best_core, best_memory)) => {
                    core < best_core
                        || (core == best_core
                            && memory >= 0
                            && (best_memory < 0 || memory < best_memory))
                }
            };
            if better {
                chosen = Some((idx, core, memory));
            }
        } else if backup.is_none_or(|(_, best_core)| core > best_core) {
            backup = Some((idx, core));
        }
    }

    chosen
        .map(|(idx, _, _)| idx)
        .or(backup.map(|(idx, _)| idx))
}
