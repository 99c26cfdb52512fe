use std::collections::VecDeque;
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{self, Poll};

use crate::provider::ModelProviderError;
use crate::response::{ModelFinishReason, ModelResponse, ModelResponseEvent};

/// A response whose events are all known when it is created.
///
/// Providers that answer with a single JSON document (rather than a
/// stream) can decode it upfront and hand the events out through this
/// type.
#[derive(Debug)]
pub struct CompleteResponse<E> {
    events: VecDeque<ModelResponseEvent>,
    _error: PhantomData<fn() -> E>,
}

impl<E> CompleteResponse<E> {
    /// Creates a response that yields the given events in order.
    #[inline]
    pub fn with_events(
        events: impl Into<VecDeque<ModelResponseEvent>>,
    ) -> Self {
        Self {
            events: events.into(),
            _error: PhantomData,
        }
    }

    /// Creates a response that yields `text` as one delta and then finishes
    /// with `reason`. Empty text produces no delta.
    pub fn from_text<S: Into<String>>(
        text: S,
        reason: ModelFinishReason,
    ) -> Self {
        let text = text.into();
        let mut events = VecDeque::with_capacity(2);
        if !text.is_empty() {
            events.push_back(ModelResponseEvent::MessageDelta(text));
        }
        events.push_back(ModelResponseEvent::Completed(reason));
        Self::with_events(events)
    }
}

impl<E: ModelProviderError> ModelResponse for CompleteResponse<E> {
    type Error = E;

    fn poll_next_event(
        self: Pin<&mut Self>,
        _cx: &mut task::Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        Poll::Ready(Ok(self.get_mut().events.pop_front()))
    }
}
