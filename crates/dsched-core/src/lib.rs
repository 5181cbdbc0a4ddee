pub mod config;
pub mod types;

pub use config::{ClientConfig, Settings};
pub use types::*;
