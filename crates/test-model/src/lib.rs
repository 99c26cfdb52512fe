//! A local fake model for testing purpose.

mod preset;

use std::collections::{HashMap, VecDeque};
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::future::ready;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll, ready};
use std::time::Duration;

use llm_chat_model::{
    ErrorKind, ModelFinishReason, ModelMessage, ModelProvider,
    ModelProviderError, ModelRequest, ModelResponse, ModelResponseEvent,
};
use tokio::time::{Sleep, sleep};

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl StdError for Error {}

impl ModelProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

pub struct TestModelResponse {
    events: VecDeque<PresetEvent>,
    completed: bool,
    delay: Duration,
    sleep: Option<Pin<Box<Sleep>>>,
}

impl ModelResponse for TestModelResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let this = self.get_mut();
        if this.completed {
            // In case this method is called after completion.
            return Poll::Ready(Ok(None));
        }

        let Some(sleep) = &mut this.sleep else {
            this.sleep = Some(Box::pin(sleep(this.delay)));
            return Pin::new(this).poll_next_event(cx);
        };
        ready!(sleep.as_mut().poll(cx));
        this.sleep = None;

        let event = match this.events.pop_front() {
            Some(PresetEvent::MessageDelta(msg)) => {
                ModelResponseEvent::MessageDelta(msg)
            }
            Some(PresetEvent::Error(message)) => {
                this.completed = true;
                return Poll::Ready(Err(Error {
                    message,
                    kind: ErrorKind::InvalidResponse,
                }));
            }
            None => {
                this.completed = true;
                ModelResponseEvent::Completed(ModelFinishReason::Stop)
            }
        };
        Poll::Ready(Ok(Some(event)))
    }
}

#[derive(Default)]
struct Journal {
    requests: Vec<ModelRequest>,
    attempts: HashMap<usize, u64>,
}

/// A local fake model for testing purpose.
///
/// Before sending requests, you need to script the replies. The reply is
/// picked by counting the user messages in the request, so the first user
/// turn gets the first reply, the second gets the second, and so on. If the
/// script has no reply for a request, an error will be returned.
///
/// Clones share the request journal, so a test can keep one clone around
/// to inspect what the code under test has sent.
///
/// # Note
///
/// This type is not optimized for production use, there are heavy memory
/// copies involved. You should only use it for testing.
#[derive(Clone, Default)]
pub struct TestModelProvider {
    replies: Vec<PresetResponse>,
    models: Vec<String>,
    delay: Option<Duration>,
    journal: Arc<Mutex<Journal>>,
}

impl TestModelProvider {
    /// Appends the reply for the next user turn.
    #[inline]
    pub fn add_reply(&mut self, preset: PresetResponse) {
        self.replies.push(preset);
    }

    /// Sets the identifiers returned by [`ModelProvider::list_models`].
    #[inline]
    pub fn set_models<I, S>(&mut self, models: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = models.into_iter().map(Into::into).collect();
    }

    /// Sets how long the response waits before each event. Defaults to
    /// one millisecond.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }

    /// Returns every request received so far, including failed ones.
    pub fn requests(&self) -> Vec<ModelRequest> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .requests
            .clone()
    }

    fn respond(&self, req: &ModelRequest) -> Result<TestModelResponse, Error> {
        let mut journal =
            self.journal.lock().unwrap_or_else(PoisonError::into_inner);
        journal.requests.push(req.clone());

        let user_turns = req
            .messages
            .iter()
            .filter(|msg| matches!(msg, ModelMessage::User(_)))
            .count();
        let Some(step_idx) = user_turns.checked_sub(1) else {
            return Err(Error {
                message: "request has no user message".to_owned(),
                kind: ErrorKind::Other,
            });
        };
        let Some(preset) = self.replies.get(step_idx) else {
            return Err(Error {
                message: format!("no reply scripted for turn {user_turns}"),
                kind: ErrorKind::Other,
            });
        };

        let attempts = journal.attempts.entry(step_idx).or_default();
        *attempts += 1;
        let failing = match preset.failures {
            Some(0) => true,
            Some(failures) => *attempts <= failures,
            None => false,
        };
        if failing {
            return Err(Error {
                message: "scripted failure".to_owned(),
                kind: ErrorKind::Transport,
            });
        }

        Ok(TestModelResponse {
            events: preset.events.iter().cloned().collect(),
            completed: false,
            delay: self.delay.unwrap_or(Duration::from_millis(1)),
            sleep: None,
        })
    }
}

impl ModelProvider for TestModelProvider {
    type Error = crate::Error;
    type Response = TestModelResponse;

    fn send_request(
        &self,
        req: &ModelRequest,
    ) -> impl Future<Output = Result<Self::Response, Self::Error>> + Send + 'static
    {
        ready(self.respond(req))
    }

    fn list_models(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'static
    {
        ready(Ok(self.models.clone()))
    }
}

impl Debug for TestModelProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestModelProvider")
            .field("replies", &self.replies.len())
            .field("models", &self.models)
            .finish_non_exhaustive()
    }
}
