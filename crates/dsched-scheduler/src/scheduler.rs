//! Scheduler: the client control loop.
//!
//! ```text
//! Handshaking ──HELO/AUTH──▶ Ready ──NONE──▶ Terminated
//!                             │  ▲
//!                     REDY    │  │  JOBN/JOBP → policy → SCHD
//!                             ▼  │  JCPL      → advance time
//!                           event   other     → ignore
//! ```
//!
//! The loop keeps its mutable state (current time via the session, the
//! policy's own cursor, the run summary) in fields; nothing is global.

use dsched_core::JobRecord;
use dsched_placement::PlacementPolicy;
use dsched_proto::{Command, ProtocolError, ServerMessage, Session};
use tracing::{debug, info, warn};

use crate::error::{SchedulerError, SchedulerResult};
use crate::summary::RunSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    Handshaking,
    Ready,
    Terminated,
}

/// What a finished session hands back to the caller.
#[derive(Debug)]
pub struct RunOutcome {
    /// Status returned by closing the connection (0 on a clean close).
    pub exit_status: i32,
    pub summary: RunSummary,
}

pub struct Scheduler {
    session: Session,
    policy: Box<dyn PlacementPolicy>,
    state: LoopState,
    summary: RunSummary,
}

impl Scheduler {
    pub fn new(session: Session, policy: Box<dyn PlacementPolicy>) -> Self {
        let summary = RunSummary::new(policy.kind());
        Self {
            session,
            policy,
            state: LoopState::Handshaking,
            summary,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Drive a whole session: handshake, event loop, graceful quit.
    pub fn run(mut self, user: &str) -> SchedulerResult<RunOutcome> {
        self.session.handshake(user)?;
        self.state = LoopState::Ready;
        info!(policy = %self.policy.kind(), "ready for jobs");

        while self.step()? {}

        self.shutdown()
    }

    /// One `REDY` round trip. Returns `false` once the server sent `NONE`.
    pub fn step(&mut self) -> SchedulerResult<bool> {
        let line = self.session.request(Command::Redy, &[])?;

        let event = match ServerMessage::decode(&line) {
            Ok(event) => event,
            Err(e @ ProtocolError::UnknownCommand(_)) => {
                warn!(error = %e, %line, "ignoring unrecognized event");
                self.summary.ignored_events += 1;
                return Ok(true);
            }
            Err(e) => return Err(e.into()),
        };

        if let Some(time) = event.timestamp() {
            self.session.observe_time(time);
            self.summary.final_time = self.session.current_time();
        }

        match event {
            ServerMessage::JobNew(job) | ServerMessage::JobPreempted(job) => {
                self.summary.jobs_received += 1;
                self.handle_job(job)?;
            }
            ServerMessage::JobCompleted(done) => {
                self.summary.completions += 1;
                debug!(
                    job_id = done.job_id,
                    server_type = %done.server_type,
                    server_id = done.server_id,
                    "job completed"
                );
            }
            ServerMessage::ResourceFailed(notice) => {
                info!(server_type = %notice.server_type, server_id = notice.server_id, time = notice.time, "server failed");
            }
            ServerMessage::ResourceRecovered(notice) => {
                info!(server_type = %notice.server_type, server_id = notice.server_id, time = notice.time, "server recovered");
            }
            ServerMessage::None => {
                info!("no more jobs");
                return Ok(false);
            }
            ServerMessage::Err(message) => {
                warn!(%message, "server answered REDY with ERR, continuing");
                self.summary.ignored_events += 1;
            }
            other => {
                debug!(event = other.name(), "no action for event");
            }
        }

        Ok(true)
    }

    fn handle_job(&mut self, job: JobRecord) -> SchedulerResult<()> {
        let demand = job.demand();

        let Some(server) = self.policy.place(&demand, &mut self.session)? else {
            warn!(job_id = job.job_id, ?demand, "no server qualifies, placement withheld");
            self.summary.placements_withheld += 1;
            return Ok(());
        };

        let reply = self.session.request(
            Command::Schd,
            &[
                job.job_id.to_string(),
                server.server_type.clone(),
                server.server_id.to_string(),
            ],
        )?;
        if ServerMessage::decode(&reply).ok() != Some(ServerMessage::Ok) {
            return Err(SchedulerError::Rejected {
                command: "SCHD",
                message: reply,
            });
        }

        info!(job_id = job.job_id, server = %server.key(), "job scheduled");
        self.summary.record_scheduled(&server);
        Ok(())
    }

    /// `QUIT` → `QUIT`, then release the connection.
    fn shutdown(mut self) -> SchedulerResult<RunOutcome> {
        let reply = self.session.request(Command::Quit, &[])?;
        if ServerMessage::decode(&reply).ok() != Some(ServerMessage::Quit) {
            return Err(ProtocolError::UnexpectedReply {
                expected: "QUIT",
                got: reply,
            }
            .into());
        }

        self.state = LoopState::Terminated;
        let exit_status = self.session.close();
        info!(exit_status, "session terminated");

        Ok(RunOutcome {
            exit_status,
            summary: self.summary,
        })
    }
}
