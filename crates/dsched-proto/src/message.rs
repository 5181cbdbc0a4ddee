//! Incoming message decoding.
//!
//! The first whitespace-separated token selects the message; the remaining
//! tokens are positional fields. Missing fields and non-numeric values are
//! reported as [`ProtocolError::Malformed`]. Trailing fields beyond the ones
//! listed here are ignored.
//!
//! ```text
//! JOBN <submitTime> <jobID> <estRuntime> <core> <mem> <disk>
//! JOBP <submitTime> <jobID> <estRuntime> <core> <mem> <disk>
//! JCPL <endTime> <jobID> <type> <id>
//! RESF <type> <id> <time>
//! RESR <type> <id> <time>
//! DATA <nRecs> <recLen>
//! CHKQ | NONE | OK | QUIT | .
//! ERR <message...>
//! ```

use std::str::FromStr;

use dsched_core::{JobRecord, ResourceRecord};

use crate::error::{ProtocolError, ProtocolResult};

/// Header announcing a paginated `GETS` listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataHeader {
    pub records: usize,
    pub record_len: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub end_time: u64,
    pub job_id: u32,
    pub server_type: String,
    pub server_id: u32,
}

/// Body of `RESF` and `RESR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNotice {
    pub server_type: String,
    pub server_id: u32,
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    Data(DataHeader),
    JobNew(JobRecord),
    JobPreempted(JobRecord),
    JobCompleted(Completion),
    ResourceFailed(ResourceNotice),
    ResourceRecovered(ResourceNotice),
    CheckQueue,
    /// No more jobs; the session should quit.
    None,
    Ok,
    Err(String),
    Quit,
    /// The `.` line closing a `GETS` exchange.
    EndOfData,
}

impl ServerMessage {
    pub fn decode(line: &str) -> ProtocolResult<Self> {
        let fields = Fields::split(line)?;
        let msg = match fields.command {
            "JOBN" => ServerMessage::JobNew(fields.job()?),
            "JOBP" => ServerMessage::JobPreempted(fields.job()?),
            "JCPL" => ServerMessage::JobCompleted(Completion {
                end_time: fields.num(1, "endTime")?,
                job_id: fields.num(2, "jobID")?,
                server_type: fields.text(3, "serverType")?.to_string(),
                server_id: fields.num(4, "serverID")?,
            }),
            "RESF" => ServerMessage::ResourceFailed(fields.notice()?),
            "RESR" => ServerMessage::ResourceRecovered(fields.notice()?),
            "DATA" => ServerMessage::Data(DataHeader {
                records: fields.num(1, "nRecs")?,
                record_len: fields.num(2, "recLen")?,
            }),
            "CHKQ" => ServerMessage::CheckQueue,
            "NONE" => ServerMessage::None,
            "OK" => ServerMessage::Ok,
            "QUIT" => ServerMessage::Quit,
            "." => ServerMessage::EndOfData,
            "ERR" | "ERR:" => ServerMessage::Err(fields.rest(1)),
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };
        Ok(msg)
    }

    /// Simulated time carried by job events.
    pub fn timestamp(&self) -> Option<u64> {
        match self {
            ServerMessage::JobNew(job) | ServerMessage::JobPreempted(job) => Some(job.submit_time),
            ServerMessage::JobCompleted(c) => Some(c.end_time),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ServerMessage::Data(_) => "DATA",
            ServerMessage::JobNew(_) => "JOBN",
            ServerMessage::JobPreempted(_) => "JOBP",
            ServerMessage::JobCompleted(_) => "JCPL",
            ServerMessage::ResourceFailed(_) => "RESF",
            ServerMessage::ResourceRecovered(_) => "RESR",
            ServerMessage::CheckQueue => "CHKQ",
            ServerMessage::None => "NONE",
            ServerMessage::Ok => "OK",
            ServerMessage::Err(_) => "ERR",
            ServerMessage::Quit => "QUIT",
            ServerMessage::EndOfData => ".",
        }
    }
}

/// Decode one server line of a `GETS` listing.
///
/// `<type> <id> <state> <startTime> <core> <mem> <disk> <waiting> <running>`
pub fn parse_resource(line: &str) -> ProtocolResult<ResourceRecord> {
    let fields = Fields::positional("record", line)?;
    Ok(ResourceRecord {
        server_type: fields.text(0, "serverType")?.to_string(),
        server_id: fields.num(1, "serverID")?,
        state: fields.text(2, "state")?.to_string(),
        start_time: fields.num(3, "startTime")?,
        core: fields.num(4, "core")?,
        memory: fields.num(5, "memory")?,
        disk: fields.num(6, "disk")?,
        waiting_jobs: fields.num(7, "waitingJobs")?,
        running_jobs: fields.num(8, "runningJobs")?,
    })
}

/// Decode the integer reply to `EJWT`.
pub fn parse_estimate(line: &str) -> ProtocolResult<u64> {
    Fields::positional("EJWT reply", line)?.num(0, "estimate")
}

struct Fields<'a> {
    command: &'a str,
    line: &'a str,
    tokens: Vec<&'a str>,
}

impl<'a> Fields<'a> {
    /// Split a message whose first token is its command.
    fn split(line: &'a str) -> ProtocolResult<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let command = tokens
            .first()
            .copied()
            .ok_or_else(|| ProtocolError::malformed("message", line, "empty line"))?;
        Ok(Self {
            command,
            line,
            tokens,
        })
    }

    /// Split a line that has no command token.
    fn positional(label: &'a str, line: &'a str) -> ProtocolResult<Self> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(ProtocolError::malformed(label, line, "empty line"));
        }
        Ok(Self {
            command: label,
            line,
            tokens,
        })
    }

    fn text(&self, idx: usize, name: &str) -> ProtocolResult<&'a str> {
        self.tokens.get(idx).copied().ok_or_else(|| {
            ProtocolError::malformed(
                self.command,
                self.line,
                format!("missing {name} (field {idx}, got {} tokens)", self.tokens.len()),
            )
        })
    }

    fn num<T: FromStr>(&self, idx: usize, name: &str) -> ProtocolResult<T> {
        let raw = self.text(idx, name)?;
        raw.parse().map_err(|_| {
            ProtocolError::malformed(
                self.command,
                self.line,
                format!("{name} is not a number: {raw:?}"),
            )
        })
    }

    fn rest(&self, from: usize) -> String {
        self.tokens.get(from..).unwrap_or_default().join(" ")
    }

    fn job(&self) -> ProtocolResult<JobRecord> {
        Ok(JobRecord {
            submit_time: self.num(1, "submitTime")?,
            job_id: self.num(2, "jobID")?,
            est_runtime: self.num(3, "estRuntime")?,
            core: self.num(4, "core")?,
            memory: self.num(5, "memory")?,
            disk: self.num(6, "disk")?,
        })
    }

    fn notice(&self) -> ProtocolResult<ResourceNotice> {
        Ok(ResourceNotice {
            server_type: self.text(1, "serverType")?.to_string(),
            server_id: self.num(2, "serverID")?,
            time: self.num(3, "time")?,
        })
    }
}
