//! Lock-step protocol session.
//!
//! Every [`Session::send`] must be answered by a [`Session::receive`] (or a
//! [`Session::receive_batch`] for multi-line replies) before the next send.
//! Breaking that rule is a [`ProtocolError::OutOfTurn`], never a silent
//! reordering.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::command::{Command, Request};
use crate::error::{ProtocolError, ProtocolResult};
use crate::transport::{TcpTransport, Transport};

pub struct Session {
    transport: Box<dyn Transport>,
    established: bool,
    awaiting_reply: bool,
    last_received: String,
    current_time: Option<u64>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport)
            .field("established", &self.established)
            .field("awaiting_reply", &self.awaiting_reply)
            .field("current_time", &self.current_time)
            .finish()
    }
}

impl Session {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            established: false,
            awaiting_reply: false,
            last_received: String::new(),
            current_time: None,
        }
    }

    /// Open a TCP session. The handshake is not performed yet.
    pub fn connect(
        host: &str,
        port: u16,
        connect_timeout: Duration,
        read_timeout: Option<Duration>,
    ) -> ProtocolResult<Self> {
        let transport = TcpTransport::connect(host, port, connect_timeout, read_timeout)?;
        Ok(Self::new(Box::new(transport)))
    }

    /// `HELO` → `OK`, then `AUTH <user>` → `OK`.
    pub fn handshake(&mut self, user: &str) -> ProtocolResult<()> {
        let reply = self.request(Command::Helo, &[])?;
        expect_ok(&reply)?;

        let reply = self.request(Command::Auth, &[user.to_string()])?;
        expect_ok(&reply)?;

        self.established = true;
        info!(%user, "handshake complete");
        Ok(())
    }

    pub fn send(&mut self, command: Command, args: &[String]) -> ProtocolResult<()> {
        if self.awaiting_reply {
            return Err(ProtocolError::OutOfTurn("send while a reply is outstanding"));
        }
        let line = Request::with_args(command, args.to_vec()).encode();
        self.transport.write_line(&line)?;
        self.awaiting_reply = true;
        debug!(line = %line.trim_end(), "sent");
        Ok(())
    }

    /// Block until the reply to the last send arrives.
    pub fn receive(&mut self) -> ProtocolResult<String> {
        if !self.awaiting_reply {
            return Err(ProtocolError::OutOfTurn("receive with no request outstanding"));
        }
        let line = self.read_one()?;
        self.awaiting_reply = false;
        Ok(line)
    }

    /// Receive a reply spanning exactly `count` lines.
    pub fn receive_batch(&mut self, count: usize) -> ProtocolResult<Vec<String>> {
        if !self.awaiting_reply {
            return Err(ProtocolError::OutOfTurn("receive with no request outstanding"));
        }
        let mut lines = Vec::new();
        for _ in 0..count {
            lines.push(self.read_one()?);
        }
        self.awaiting_reply = false;
        Ok(lines)
    }

    pub fn request(&mut self, command: Command, args: &[String]) -> ProtocolResult<String> {
        self.send(command, args)?;
        self.receive()
    }

    fn read_one(&mut self) -> ProtocolResult<String> {
        let line = self.transport.read_line()?.ok_or(ProtocolError::Closed)?;
        debug!(line = %line, "received");
        self.last_received.clone_from(&line);
        Ok(line)
    }

    pub fn is_established(&self) -> bool {
        self.established
    }

    pub fn last_received(&self) -> &str {
        &self.last_received
    }

    /// Advance simulated time. Time never moves backwards.
    pub fn observe_time(&mut self, time: u64) {
        match self.current_time {
            Some(current) if time < current => {
                warn!(current, reported = time, "ignoring timestamp older than current time");
            }
            _ => self.current_time = Some(time),
        }
    }

    pub fn current_time(&self) -> Option<u64> {
        self.current_time
    }

    /// Release the connection and return the process exit status.
    pub fn close(mut self) -> i32 {
        match self.transport.close() {
            Ok(()) => {
                debug!("connection closed");
                0
            }
            Err(e) => {
                warn!(error = %e, "connection did not close cleanly");
                1
            }
        }
    }
}

fn expect_ok(reply: &str) -> ProtocolResult<()> {
    if reply.trim() == "OK" {
        Ok(())
    } else {
        Err(ProtocolError::UnexpectedReply {
            expected: "OK",
            got: reply.to_string(),
        })
    }
}
