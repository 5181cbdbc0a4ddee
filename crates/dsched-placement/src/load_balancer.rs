//! Round-robin load balancer.
//!
//! Hands out indices `0, 1, ..., count - 1, 0, 1, ...` over a server set.
//! The session is single-threaded, so a plain counter carried in the
//! policy's state is enough.

/// A round-robin cursor into a server list.
#[derive(Debug, Default)]
pub struct RoundRobinBalancer {
    position: usize,
}

impl RoundRobinBalancer {
    pub fn new() -> Self {
        Self { position: 0 }
    }

    /// Select the next index, wrapping from `count - 1` back to `0`.
    ///
    /// Returns `None` if count is zero.
    pub fn next(&mut self, count: usize) -> Option<usize> {
        if count == 0 {
            return None;
        }
        let idx = if self.position < count { self.position } else { 0 };
        self.position = if idx + 1 < count { idx + 1 } else { 0 };
        Some(idx)
    }

    /// Reset the cursor to zero.
    pub fn reset(&mut self) {
        self.position = 0;
    }

    /// Index the next call will return (for diagnostics).
    pub fn current(&self) -> usize {
        self.position
    }
}
