//! Text-to-speech module.
//!
//! Provides the Edge and Typecast engines behind a single [`TtsEngine`], with
//! playback through an external audio player.

mod edge;
mod engine;
mod player;
mod text;
mod typecast;

pub use engine::{Speaker, TtsEngine, print_voices};
pub use player::Player;
