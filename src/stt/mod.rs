//! Speech-to-text input.
//!
//! Recognition itself is external; this module turns its output into
//! [`RecognitionEvent`]s for the listening session.

mod recognizer;

pub use recognizer::{EventSource, LineRecognizer, RecognitionEvent};
