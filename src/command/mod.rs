//! Command grammar: fixed trigger phrases mapped to commands.

mod matcher;

pub use matcher::{Command, match_command};
