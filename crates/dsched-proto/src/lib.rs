//! dsched-proto: the ds-server wire protocol.
//!
//! Newline-terminated ASCII lines, fields separated by runs of whitespace,
//! strict request/response turn-taking.
//!
//! # Components
//!
//! - **`command`**: outgoing vocabulary and request encoding
//! - **`message`**: incoming vocabulary and line decoding
//! - **`transport`**: line transport over TCP
//! - **`session`**: handshake and lock-step send/receive
//! - **`inventory`**: paginated `GETS` listings and `EJWT` estimates

pub mod command;
pub mod error;
pub mod inventory;
pub mod message;
pub mod session;
pub mod transport;

pub use command::{Command, GetsMode, Request};
pub use error::{ProtocolError, ProtocolResult};
pub use inventory::Inventory;
pub use message::{Completion, DataHeader, ResourceNotice, ServerMessage};
pub use session::Session;
pub use transport::{TcpTransport, Transport};
