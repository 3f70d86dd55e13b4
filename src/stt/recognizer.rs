//! Line-protocol recognizer.
//!
//! Reads recognition events, one per line, from standard input or from the
//! stdout of an external recognizer command. Each line is either a JSON event
//! (`{"type":"final","text":"..."}`) or plain text, which counts as a final
//! transcript. Blank lines are silence.

use std::io::BufRead;
use std::process::Stdio;

use anyhow::{Context, Result};
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::RecognitionError;

/// Events buffered between the reader and the session.
const EVENT_CHANNEL_SIZE: usize = 32;

/// Output of the speech recognizer.
#[derive(Debug)]
pub enum RecognitionEvent {
    /// Unstable interim hypothesis
    Partial(String),
    /// Stable, complete transcript
    Final(String),
    Silence,
    Error(RecognitionError),
}

/// Source of recognition events for the listening session.
pub trait EventSource {
    /// Next event, or `None` once the input has ended.
    async fn next_event(&mut self) -> Option<RecognitionEvent>;

    /// Drop events queued while the assistant was busy. Returns how many were dropped.
    fn discard_pending(&mut self) -> usize {
        0
    }
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum WireEvent {
    Partial {
        text: String,
    },
    Final {
        text: String,
    },
    Silence,
    Error {
        #[serde(default)]
        message: String,
    },
}

/// Parse one protocol line.
pub fn parse_line(line: &str) -> RecognitionEvent {
    let line = line.trim();
    if line.is_empty() {
        return RecognitionEvent::Silence;
    }
    if !line.starts_with('{') {
        return RecognitionEvent::Final(line.to_string());
    }

    match serde_json::from_str::<WireEvent>(line) {
        Ok(WireEvent::Partial { text }) => RecognitionEvent::Partial(text),
        Ok(WireEvent::Final { text }) => RecognitionEvent::Final(text),
        Ok(WireEvent::Silence) => RecognitionEvent::Silence,
        Ok(WireEvent::Error { message }) => RecognitionEvent::Error(RecognitionError::Reported(message)),
        Err(e) => RecognitionEvent::Error(RecognitionError::Protocol(e.to_string())),
    }
}

/// Recognizer fed by a line stream on a background reader.
pub struct LineRecognizer {
    event_rx: mpsc::Receiver<RecognitionEvent>,
    _child: Option<Child>, // External recognizer, killed on drop
}

impl LineRecognizer {
    /// Read events from standard input.
    ///
    /// Uses a plain thread: a blocking stdin read must not hold up runtime shutdown.
    pub fn stdin() -> Self {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let event = match line {
                    Ok(line) => parse_line(&line),
                    Err(e) => RecognitionEvent::Error(e.into()),
                };
                if event_tx.blocking_send(event).is_err() {
                    break;
                }
            }
            debug!("stdin closed");
        });

        info!("🎤 Reading transcripts from stdin");
        Self { event_rx, _child: None }
    }

    /// Run `command` through the shell and read events from its stdout.
    pub fn spawn_command(command: &str) -> Result<Self> {
        let mut child = shell(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to start recognizer command: {}", command))?;

        let stdout = child.stdout.take().context("Recognizer stdout not captured")?;
        let mut recognizer = Self::from_reader(stdout);
        recognizer._child = Some(child);

        info!("🎤 Reading transcripts from: {}", command);
        Ok(recognizer)
    }

    /// Read events from any async byte stream.
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                let event = match lines.next_line().await {
                    Ok(Some(line)) => parse_line(&line),
                    Ok(None) => break,
                    Err(e) => {
                        let _ = event_tx.send(RecognitionEvent::Error(e.into())).await;
                        break;
                    }
                };
                if event_tx.send(event).await.is_err() {
                    break;
                }
            }
            debug!("Recognizer stream ended");
        });

        Self { event_rx, _child: None }
    }
}

impl EventSource for LineRecognizer {
    async fn next_event(&mut self) -> Option<RecognitionEvent> {
        self.event_rx.recv().await
    }

    fn discard_pending(&mut self) -> usize {
        let mut discarded = 0;
        while self.event_rx.try_recv().is_ok() {
            discarded += 1;
        }
        discarded
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
