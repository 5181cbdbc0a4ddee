//! Outgoing command vocabulary and request encoding.
//!
//! ```text
//! HELO                      greeting
//! AUTH <user>               authentication
//! REDY                      ready for the next event
//! GETS All | Capable|Avail <core> <mem> <disk>
//! OK                        acknowledgment
//! SCHD <jobID> <type> <id>  placement decision
//! EJWT <type> <id>          estimated waiting time
//! QUIT                      graceful termination
//! ```
//!
//! `ENQJ DEQJ LSTQ CNTJ LSTJ MIGJ KILJ TERM` are recognized so they can be
//! encoded and parsed, but no placement policy issues them.

use std::fmt;
use std::str::FromStr;

use dsched_core::Demand;

use crate::error::ProtocolError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    Helo,
    Auth,
    Redy,
    Ok,
    Gets,
    Schd,
    Enqj,
    Deqj,
    Lstq,
    Cntj,
    Ejwt,
    Lstj,
    Migj,
    Kilj,
    Term,
    Quit,
}

impl Command {
    pub const ALL: [Command; 16] = [
        Command::Helo,
        Command::Auth,
        Command::Redy,
        Command::Ok,
        Command::Gets,
        Command::Schd,
        Command::Enqj,
        Command::Deqj,
        Command::Lstq,
        Command::Cntj,
        Command::Ejwt,
        Command::Lstj,
        Command::Migj,
        Command::Kilj,
        Command::Term,
        Command::Quit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::Helo => "HELO",
            Command::Auth => "AUTH",
            Command::Redy => "REDY",
            Command::Ok => "OK",
            Command::Gets => "GETS",
            Command::Schd => "SCHD",
            Command::Enqj => "ENQJ",
            Command::Deqj => "DEQJ",
            Command::Lstq => "LSTQ",
            Command::Cntj => "CNTJ",
            Command::Ejwt => "EJWT",
            Command::Lstj => "LSTJ",
            Command::Migj => "MIGJ",
            Command::Kilj => "KILJ",
            Command::Term => "TERM",
            Command::Quit => "QUIT",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownCommand(s.to_string()))
    }
}

/// A command plus its positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub command: Command,
    pub args: Vec<String>,
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            args: Vec::new(),
        }
    }

    pub fn with_args(command: Command, args: Vec<String>) -> Self {
        Self { command, args }
    }

    /// Serialize as a single newline-terminated line.
    pub fn encode(&self) -> String {
        if self.args.is_empty() {
            format!("{}\n", self.command)
        } else {
            format!("{} {}\n", self.command, self.args.join(" "))
        }
    }

    /// Parse a line produced by [`Request::encode`].
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut tokens = line.split_whitespace();
        let head = tokens
            .next()
            .ok_or_else(|| ProtocolError::malformed("request", line, "empty line"))?;
        let command = head.parse()?;
        Ok(Self {
            command,
            args: tokens.map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.encode().trim_end())
    }
}

/// Filter applied to a `GETS` listing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GetsMode {
    /// Every server the simulator knows about.
    All,
    /// Servers whose total capacity could ever run the demand.
    Capable,
    /// Servers that can run the demand right now.
    Available,
}

impl GetsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GetsMode::All => "All",
            GetsMode::Capable => "Capable",
            GetsMode::Available => "Avail",
        }
    }

    /// Arguments of the `GETS` request. `All` carries no demand.
    pub fn request(&self, demand: &Demand) -> Request {
        let mut args = vec![self.as_str().to_string()];
        if *self != GetsMode::All {
            args.extend([
                demand.core.to_string(),
                demand.memory.to_string(),
                demand.disk.to_string(),
            ]);
        }
        Request::with_args(Command::Gets, args)
    }
}

impl fmt::Display for GetsMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_without_args_is_bare_command() {
        assert_eq!(Request::new(Command::Redy).encode(), "REDY\n");
        assert_eq!(Request::new(Command::Quit).encode(), "QUIT\n");
    }

    #[test]
    fn encode_joins_args_with_single_spaces() {
        let req = Request::with_args(
            Command::Schd,
            vec!["3".into(), "joon".into(), "0".into()],
        );
        assert_eq!(req.encode(), "SCHD 3 joon 0\n");
    }

    #[test]
    fn parse_reverses_encode() {
        let req = Request::with_args(Command::Ejwt, vec!["medium".into(), "2".into()]);
        assert_eq!(Request::parse(&req.encode()).unwrap(), req);

        let bare = Request::new(Command::Helo);
        assert_eq!(Request::parse(&bare.encode()).unwrap(), bare);
    }

    #[test]
    fn parse_collapses_whitespace_runs() {
        let req = Request::parse("AUTH   alice\t\n").unwrap();
        assert_eq!(req.command, Command::Auth);
        assert_eq!(req.args, vec!["alice".to_string()]);
    }

    #[test]
    fn every_command_name_parses_back() {
        for cmd in Command::ALL {
            assert_eq!(cmd.as_str().parse::<Command>().unwrap(), cmd);
        }
    }

    #[test]
    fn unknown_command_is_reported() {
        let err = Request::parse("PING").unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownCommand(ref t) if t == "PING"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn empty_request_line_is_malformed() {
        assert!(matches!(
            Request::parse("   ").unwrap_err(),
            ProtocolError::Malformed { .. }
        ));
    }

    #[test]
    fn gets_all_has_no_demand() {
        let demand = Demand::new(2, 4, 10);
        assert_eq!(GetsMode::All.request(&demand).encode(), "GETS All\n");
    }

    #[test]
    fn gets_available_uses_avail_token() {
        let demand = Demand::new(2, 900, 2500);
        assert_eq!(
            GetsMode::Available.request(&demand).encode(),
            "GETS Avail 2 900 2500\n"
        );
        assert_eq!(
            GetsMode::Capable.request(&demand).encode(),
            "GETS Capable 2 900 2500\n"
        );
    }
}
