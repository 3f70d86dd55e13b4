//! Listening session.
//!
//! Drives the loop of listening windows, command matching and dispatch until
//! the user shuts the assistant down, the input ends, or a signal arrives.

mod listener;

pub use listener::{ListeningSession, SessionEnd};
