//! Resource inventory queries.
//!
//! # GETS exchange
//!
//! ```text
//! → GETS Capable 2 900 2500
//! ← DATA 3 124
//! → OK
//! ← joon 0 inactive -1 16 64000 512000 0 0     (3 record lines)
//! → OK
//! ← .
//! ```
//!
//! With `DATA 0 ...` the record lines are skipped: the client answers `OK`
//! once and reads the `.` terminator.

use dsched_core::{Demand, ResourceRecord};
use tracing::debug;

use crate::command::{Command, GetsMode};
use crate::error::{ProtocolError, ProtocolResult};
use crate::message::{ServerMessage, parse_estimate, parse_resource};
use crate::session::Session;

/// What a placement policy may ask the simulator.
pub trait Inventory {
    /// One-shot listing in the order the simulator sent it.
    fn query(&mut self, mode: GetsMode, demand: &Demand) -> ProtocolResult<Vec<ResourceRecord>>;

    /// Estimated time until a job queued on `server` would start.
    fn estimated_wait(&mut self, server: &ResourceRecord) -> ProtocolResult<u64>;
}

impl Inventory for Session {
    fn query(&mut self, mode: GetsMode, demand: &Demand) -> ProtocolResult<Vec<ResourceRecord>> {
        let request = mode.request(demand);
        let reply = self.request(request.command, &request.args)?;

        let header = match ServerMessage::decode(&reply)? {
            ServerMessage::Data(header) => header,
            _ => {
                return Err(ProtocolError::UnexpectedReply {
                    expected: "DATA",
                    got: reply,
                });
            }
        };

        // nRecs comes off the wire; never pre-size from it.
        let mut servers = Vec::new();
        if header.records > 0 {
            self.send(Command::Ok, &[])?;
            for line in self.receive_batch(header.records)? {
                servers.push(parse_resource(&line)?);
            }
        }

        let terminator = self.request(Command::Ok, &[])?;
        if ServerMessage::decode(&terminator).ok() != Some(ServerMessage::EndOfData) {
            return Err(ProtocolError::UnexpectedReply {
                expected: ".",
                got: terminator,
            });
        }

        debug!(%mode, count = servers.len(), "inventory fetched");
        Ok(servers)
    }

    fn estimated_wait(&mut self, server: &ResourceRecord) -> ProtocolResult<u64> {
        let reply = self.request(
            Command::Ejwt,
            &[server.server_type.clone(), server.server_id.to_string()],
        )?;
        parse_estimate(&reply)
    }
}
