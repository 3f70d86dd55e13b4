//! Listening session state machine.

use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::actions::{Dispatch, Flow};
use crate::command::{Command, match_command};
use crate::stt::{EventSource, RecognitionEvent};

/// Window opened after startup, each dispatch and each elapsed window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(12);

/// Window opened by the wake phrase.
pub const EXTENDED_WINDOW: Duration = Duration::from_secs(30);

/// Pause before listening again after a recognizer error.
const ERROR_BACKOFF: Duration = Duration::from_secs(1);

/// Bounded interval during which a final transcript is awaited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListeningWindow {
    duration: Duration,
    deadline: Instant,
}

impl ListeningWindow {
    fn open(duration: Duration) -> Self {
        Self { duration, deadline: Instant::now() + duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

/// Why the session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user asked to shut down
    Shutdown,
    /// The recognizer input ended
    InputClosed,
    /// Ctrl+C or SIGTERM
    Interrupted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Listening(ListeningWindow),
    Dispatching(Command),
    Terminated(SessionEnd),
}

/// One listening session over a recognizer and a dispatcher.
///
/// Recognition and speech are strictly sequential: events that arrive while a
/// command is being answered are discarded.
pub struct ListeningSession<R, D> {
    recognizer: R,
    dispatcher: D,
    cancel: CancellationToken,
    state: SessionState,
}

impl<R, D> ListeningSession<R, D>
where
    R: EventSource,
    D: Dispatch,
{
    /// Create an idle session. Cancelling `cancel` interrupts it in any state.
    pub fn new(recognizer: R, dispatcher: D, cancel: CancellationToken) -> Self {
        Self { recognizer, dispatcher, cancel, state: SessionState::Idle }
    }

    #[cfg(test)]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run until the session ends.
    pub async fn run(&mut self) -> SessionEnd {
        info!("👂 Listening... say \"여보게\" for a longer window");
        loop {
            if let Some(end) = self.step().await {
                debug!("Session ended: {:?}", end);
                return end;
            }
        }
    }

    /// Advance the state machine by one transition.
    ///
    /// Returns the reason once the session has ended.
    pub async fn step(&mut self) -> Option<SessionEnd> {
        let window = match self.state {
            SessionState::Idle | SessionState::Dispatching(_) => {
                self.listen(DEFAULT_WINDOW);
                return None;
            }
            SessionState::Listening(window) => window,
            SessionState::Terminated(end) => return Some(end),
        };

        let event = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Some(self.finish(SessionEnd::Interrupted)),
            _ = time::sleep_until(window.deadline()) => {
                debug!("⏱️  {}s window elapsed", window.duration().as_secs());
                self.listen(DEFAULT_WINDOW);
                return None;
            }
            event = self.recognizer.next_event() => event,
        };

        match event {
            None => {
                info!("Recognizer input closed");
                Some(self.finish(SessionEnd::InputClosed))
            }
            Some(RecognitionEvent::Partial(text)) => {
                debug!("… {}", text);
                None
            }
            Some(RecognitionEvent::Silence) => None,
            Some(RecognitionEvent::Error(e)) => {
                warn!("Recognizer error, retrying in {}s: {}", ERROR_BACKOFF.as_secs(), e);
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Some(self.finish(SessionEnd::Interrupted)),
                    _ = time::sleep(ERROR_BACKOFF) => {}
                }
                self.listen(DEFAULT_WINDOW);
                None
            }
            Some(RecognitionEvent::Final(text)) => self.handle_transcript(&text).await,
        }
    }

    async fn handle_transcript(&mut self, text: &str) -> Option<SessionEnd> {
        let command = match_command(text);
        info!("🗣️  \"{}\" → {}", text, command);

        match command {
            Command::Unrecognized => None,
            Command::ExtendListening => {
                info!("⏳ Listening window extended to {}s", EXTENDED_WINDOW.as_secs());
                self.listen(EXTENDED_WINDOW);
                None
            }
            command => {
                self.state = SessionState::Dispatching(command);
                let flow = tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => return Some(self.finish(SessionEnd::Interrupted)),
                    flow = self.dispatcher.dispatch(command) => flow,
                };

                let discarded = self.recognizer.discard_pending();
                if discarded > 0 {
                    info!("🗑️  Discarded {} event(s) heard while speaking", discarded);
                }

                match flow {
                    Flow::Terminate => Some(self.finish(SessionEnd::Shutdown)),
                    Flow::Continue => {
                        self.listen(DEFAULT_WINDOW);
                        None
                    }
                }
            }
        }
    }

    fn listen(&mut self, duration: Duration) {
        debug!("Listening for {}s", duration.as_secs());
        self.state = SessionState::Listening(ListeningWindow::open(duration));
    }

    fn finish(&mut self, end: SessionEnd) -> SessionEnd {
        self.state = SessionState::Terminated(end);
        end
    }
}
