//! Session integration tests.
//!
//! Runs the full client against a small in-process ds-server that speaks
//! the line protocol over a real TCP socket on a random port.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread::JoinHandle;
use std::time::Duration;

use dsched_placement::PolicyKind;
use dsched_proto::{ProtocolError, Session};
use dsched_scheduler::{Scheduler, SchedulerError};

/// `(type, id, core, memory, disk, estimated wait)`
type ServerSpec = (&'static str, u32, u32, u32, u32, u64);

struct FakeServer {
    servers: Vec<ServerSpec>,
    /// Lines pushed in reply to successive `REDY`s; `NONE` once exhausted.
    events: Vec<String>,
    /// Close the socket after this many `REDY`s.
    drop_after_redy: Option<usize>,
}

impl FakeServer {
    fn new(servers: Vec<ServerSpec>, events: &[&str]) -> Self {
        Self {
            servers,
            events: events.iter().map(|s| s.to_string()).collect(),
            drop_after_redy: None,
        }
    }

    fn record(s: &ServerSpec) -> String {
        format!("{} {} inactive -1 {} {} {} 0 0", s.0, s.1, s.2, s.3, s.4)
    }

    /// Serve one client; returns every `SCHD` line it received.
    fn spawn(self) -> (u16, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind to random port");
        let port = listener.local_addr().expect("local addr").port();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            self.serve(stream)
        });
        (port, handle)
    }

    fn serve(self, stream: TcpStream) -> Vec<String> {
        let mut writer = stream.try_clone().unwrap();
        let mut reader = BufReader::new(stream);
        let mut events = self.events.into_iter();
        let mut pending: Vec<String> = Vec::new();
        let mut redy_count = 0;
        let mut scheduled = Vec::new();

        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).unwrap_or(0) == 0 {
                break;
            }
            let tokens: Vec<&str> = line.split_whitespace().collect();

            let reply = match tokens[0] {
                "HELO" | "AUTH" => "OK".to_string(),
                "REDY" => {
                    redy_count += 1;
                    if self.drop_after_redy == Some(redy_count) {
                        break;
                    }
                    events.next().unwrap_or_else(|| "NONE".to_string())
                }
                "GETS" => {
                    let core: u32 = tokens.get(2).map_or(0, |c| c.parse().unwrap());
                    pending = self
                        .servers
                        .iter()
                        .filter(|s| match tokens[1] {
                            "All" => true,
                            "Capable" => s.2 >= core,
                            // Everything is busy in this simulator.
                            _ => false,
                        })
                        .map(Self::record)
                        .collect();
                    format!("DATA {} 124", pending.len())
                }
                "OK" if !pending.is_empty() => pending.drain(..).collect::<Vec<_>>().join("\n"),
                "OK" => ".".to_string(),
                "EJWT" => {
                    let id: u32 = tokens[2].parse().unwrap();
                    self.servers
                        .iter()
                        .find(|s| s.0 == tokens[1] && s.1 == id)
                        .map_or("0".to_string(), |s| s.5.to_string())
                }
                "SCHD" => {
                    scheduled.push(line.trim_end().to_string());
                    "OK".to_string()
                }
                "QUIT" => {
                    writer.write_all(b"QUIT\n").unwrap();
                    break;
                }
                _ => "ERR: unknown command".to_string(),
            };
            writer.write_all(format!("{reply}\n").as_bytes()).unwrap();
        }
        scheduled
    }
}

fn pool() -> Vec<ServerSpec> {
    vec![
        ("tiny", 0, 1, 4000, 16000, 900),
        ("small", 0, 2, 8000, 32000, 300),
        ("small", 1, 2, 8000, 32000, 100),
        ("large", 0, 8, 32000, 128000, 100),
        ("large", 1, 8, 32000, 128000, 50),
    ]
}

fn connect(port: u16) -> Session {
    Session::connect(
        "127.0.0.1",
        port,
        Duration::from_secs(2),
        Some(Duration::from_secs(5)),
    )
    .unwrap()
}

fn run(kind: PolicyKind, server: FakeServer) -> (Result<i32, SchedulerError>, Vec<String>) {
    let (port, handle) = server.spawn();
    let scheduler = Scheduler::new(connect(port), kind.build());
    let result = scheduler.run("tester").map(|o| o.exit_status);
    (result, handle.join().unwrap())
}

#[test]
fn immediate_none_exits_zero() {
    let (status, scheduled) = run(PolicyKind::ClosestFit, FakeServer::new(pool(), &[]));

    assert_eq!(status.unwrap(), 0);
    assert!(scheduled.is_empty());
}

#[test]
fn closest_fit_session_over_tcp() {
    let events = [
        "JOBN 0 0 100 2 1000 1000",
        "JOBN 10 1 100 6 1000 1000",
        "JCPL 90 0 small 0",
        "JOBN 95 2 100 1 1000 1000",
    ];
    let (status, scheduled) = run(PolicyKind::ClosestFit, FakeServer::new(pool(), &events));

    assert_eq!(status.unwrap(), 0);
    assert_eq!(
        scheduled,
        vec!["SCHD 0 small 0", "SCHD 1 large 0", "SCHD 2 tiny 0"]
    );
}

#[test]
fn first_capable_session_over_tcp() {
    let events = ["JOBN 0 0 100 2 1000 1000", "JOBN 5 1 100 1 500 500"];
    let (status, scheduled) = run(PolicyKind::FirstCapable, FakeServer::new(pool(), &events));

    assert_eq!(status.unwrap(), 0);
    assert_eq!(scheduled, vec!["SCHD 0 small 0", "SCHD 1 tiny 0"]);
}

#[test]
fn fastest_turnaround_session_over_tcp() {
    let events = ["JOBN 0 7 100 2 1000 1000"];
    let (status, scheduled) =
        run(PolicyKind::FastestTurnaround, FakeServer::new(pool(), &events));

    assert_eq!(status.unwrap(), 0);
    assert_eq!(scheduled, vec!["SCHD 7 large 1"]);
}

#[test]
fn largest_round_robin_session_over_tcp() {
    let events = [
        "JOBN 0 0 100 1 100 100",
        "JOBN 1 1 100 1 100 100",
        "JOBP 2 2 100 1 100 100",
    ];
    let (status, scheduled) =
        run(PolicyKind::LargestRoundRobin, FakeServer::new(pool(), &events));

    assert_eq!(status.unwrap(), 0);
    assert_eq!(
        scheduled,
        vec!["SCHD 0 large 0", "SCHD 1 large 1", "SCHD 2 large 0"]
    );
}

#[test]
fn oversized_job_gets_no_schd() {
    let events = ["JOBN 0 0 100 64 1000 1000"];
    let (status, scheduled) = run(PolicyKind::ClosestFit, FakeServer::new(pool(), &events));

    assert_eq!(status.unwrap(), 0);
    assert!(scheduled.is_empty());
}

#[test]
fn server_hangup_is_fatal() {
    let mut server = FakeServer::new(pool(), &["JOBN 0 0 100 1 100 100"]);
    server.drop_after_redy = Some(2);

    let (status, scheduled) = run(PolicyKind::FirstCapable, server);

    assert!(matches!(
        status.unwrap_err(),
        SchedulerError::Protocol(ProtocolError::Closed)
    ));
    assert_eq!(scheduled, vec!["SCHD 0 tiny 0"]);
}
