use std::pin::Pin;
use std::task::{Context, Poll, ready};

use llm_chat_model::{
    CompleteResponse, ErrorKind, ModelFinishReason, ModelResponse,
    ModelResponseEvent,
};
use pin_project_lite::pin_project;

use crate::Error;
use crate::io::{Sse, SseError};
use crate::proto::{ChatCompletion, ChatCompletionChunk};

pub struct StreamState {
    sse: Sse,
    id: Option<String>,
    // Set when a chunk carries both the last delta and the finish reason,
    // the reason is reported on the following poll.
    pending_finish_reason: Option<ModelFinishReason>,
    finished: bool,
}

type PinnedFuture<T> = Pin<Box<dyn Future<Output = T> + Send>>;
type NextEvent = Result<(Option<ModelResponseEvent>, StreamState), Error>;

pin_project! {
    /// The response of [`OpenAIProvider`](crate::OpenAIProvider), either
    /// a whole JSON document or a server-sent event stream.
    #[project = OpenAIResponseProj]
    pub enum OpenAIResponse {
        Complete {
            #[pin]
            inner: CompleteResponse<Error>,
        },
        Streaming {
            next_event_fut: Option<PinnedFuture<NextEvent>>,
        },
    }
}

impl OpenAIResponse {
    #[inline]
    pub(crate) fn from_sse(sse: Sse) -> Self {
        let state = StreamState {
            sse,
            id: None,
            pending_finish_reason: None,
            finished: false,
        };
        Self::Streaming {
            next_event_fut: Some(Box::pin(next_event(state))),
        }
    }

    pub(crate) fn from_completion(
        completion: ChatCompletion,
    ) -> Result<Self, Error> {
        let Some(choice) = completion.choices.into_iter().next() else {
            return Err(Error::new(
                "response has no choices",
                ErrorKind::InvalidResponse,
            ));
        };
        let reason = choice
            .finish_reason
            .as_deref()
            .map(ModelFinishReason::from_provider_str)
            .unwrap_or(ModelFinishReason::Stop);
        let text = choice.message.content.unwrap_or_default();
        Ok(Self::Complete {
            inner: CompleteResponse::from_text(text, reason),
        })
    }
}

impl ModelResponse for OpenAIResponse {
    type Error = crate::Error;

    fn poll_next_event(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Result<Option<ModelResponseEvent>, Self::Error>> {
        let next_event_fut = match self.project() {
            OpenAIResponseProj::Complete { inner } => {
                return inner.poll_next_event(cx);
            }
            OpenAIResponseProj::Streaming { next_event_fut } => next_event_fut,
        };
        let Some(fut) = next_event_fut else {
            // The stream has been exhausted.
            return Poll::Ready(Ok(None));
        };
        let (event, state) = match ready!(fut.as_mut().poll(cx)) {
            Ok((Some(event), state)) => (event, state),
            Ok((None, _)) => {
                *next_event_fut = None;
                return Poll::Ready(Ok(None));
            }
            Err(err) => {
                *next_event_fut = None;
                return Poll::Ready(Err(err));
            }
        };

        // The stream may still have more data to pull, create a new future
        // for the next event.
        *next_event_fut = Some(Box::pin(next_event(state)));
        Poll::Ready(Ok(Some(event)))
    }
}

async fn next_event(mut state: StreamState) -> NextEvent {
    if let Some(reason) = state.pending_finish_reason.take() {
        state.finished = true;
        return Ok((Some(ModelResponseEvent::Completed(reason)), state));
    }
    if state.finished {
        return Ok((None, state));
    }

    loop {
        let data = match state.sse.next_event().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                state.finished = true;
                return Ok((None, state));
            }
            Err(SseError::Read(err)) => {
                return Err(Error::new(err.0, ErrorKind::Transport));
            }
            Err(SseError::InvalidPayload) => {
                return Err(Error::new(
                    "malformed event stream",
                    ErrorKind::InvalidResponse,
                ));
            }
        };
        trace!("got sse event: {data}");
        if data == "[DONE]" {
            state.finished = true;
            return Ok((None, state));
        }

        let chunk = serde_json::from_str::<ChatCompletionChunk>(&data)
            .map_err(|err| {
                Error::new(format!("{err}"), ErrorKind::InvalidResponse)
            })?;
        if let Some(error) = chunk.error {
            return Err(Error::new(error.message, ErrorKind::Other));
        }
        if let Some(id) = chunk.id {
            if state.id.get_or_insert_with(|| id.clone()) != &id {
                return Err(Error::new(
                    "chunk id mismatch",
                    ErrorKind::InvalidResponse,
                ));
            }
        }

        // Usage-only chunks carry no choice.
        let Some(choice) = chunk.choices.into_iter().next() else {
            continue;
        };
        let finish_reason = choice
            .finish_reason
            .as_deref()
            .map(ModelFinishReason::from_provider_str);

        match choice.delta.content.filter(|content| !content.is_empty()) {
            Some(content) => {
                state.pending_finish_reason = finish_reason;
                let event = ModelResponseEvent::MessageDelta(content);
                return Ok((Some(event), state));
            }
            None => {
                if let Some(reason) = finish_reason {
                    state.finished = true;
                    let event = ModelResponseEvent::Completed(reason);
                    return Ok((Some(event), state));
                }
            }
        }
    }
}
