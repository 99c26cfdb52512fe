use std::future::poll_fn;
use std::pin::{Pin, pin};
use std::sync::Arc;

use llm_chat_model::{
    ModelFinishReason, ModelProvider, ModelProviderError, ModelRequest,
    ModelResponse, ModelResponseEvent,
};
use tracing::Instrument;

type BoxedError = Box<dyn ModelProviderError>;
type SendRequestResult = Result<ModelClientResponse, BoxedError>;
type BoxedSendRequestFuture =
    Pin<Box<dyn Future<Output = SendRequestResult> + Send>>;
type ListModelsResult = Result<Vec<String>, BoxedError>;
type BoxedListModelsFuture =
    Pin<Box<dyn Future<Output = ListModelsResult> + Send>>;
#[rustfmt::skip]
type HandlerFn = Arc<
    dyn Fn(ModelRequest, Box<dyn Fn(String) + Send + 'static>)
        -> BoxedSendRequestFuture + Send + Sync
>;
type ListModelsFn = Arc<dyn Fn() -> BoxedListModelsFuture + Send + Sync>;

/// A wrapper around a model provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct ModelClient {
    handler_fn: HandlerFn,
    list_models_fn: ListModelsFn,
}

impl ModelClient {
    /// Wraps `provider`.
    pub fn new<P: ModelProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since `ModelClient` doesn't have a
        // generic parameter and we don't want it either.
        let provider = Arc::new(provider);
        let handler_fn: HandlerFn = Arc::new({
            let provider = Arc::clone(&provider);
            move |req, on_delta| {
                let fut = provider.send_request(&req);
                Box::pin(
                    async move {
                        trace!("got a request: {:?}", req);
                        let resp_or_err = fut.await;
                        handle_response::<P>(resp_or_err, on_delta).await
                    }
                    .instrument(trace_span!("model client req")),
                )
            }
        });
        let list_models_fn: ListModelsFn = Arc::new(move || {
            let fut = provider.list_models();
            Box::pin(async move {
                fut.await.map_err(|err| Box::new(err) as BoxedError)
            })
        });
        Self {
            handler_fn,
            list_models_fn,
        }
    }

    /// Sends a request and returns the response once it has been fully
    /// received. `on_delta` is called for every text fragment as it
    /// arrives.
    ///
    /// # Cancel safety
    ///
    /// This method is cancel safe. The response stops streaming further
    /// events when this operation is cancelled.
    #[inline]
    pub async fn send_request(
        &self,
        req: ModelRequest,
        on_delta: impl Fn(String) + Send + 'static,
    ) -> SendRequestResult {
        (self.handler_fn)(req, Box::new(on_delta)).await
    }

    /// Asks the provider for the identifiers of the models it serves.
    #[inline]
    pub async fn list_models(&self) -> ListModelsResult {
        (self.list_models_fn)().await
    }
}

/// A completely received response from the model client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelClientResponse {
    /// The concatenated message text.
    pub text: String,
    /// The reason the model finished generating, if it reported one.
    pub finish_reason: Option<ModelFinishReason>,
}

async fn handle_response<P: ModelProvider + 'static>(
    resp_or_err: Result<P::Response, P::Error>,
    on_delta: Box<dyn Fn(String) + Send + 'static>,
) -> SendRequestResult {
    let resp = match resp_or_err {
        Ok(resp) => resp,
        Err(err) => {
            error!("got an error: {err:?}");
            return Err(Box::new(err));
        }
    };

    let mut text = String::new();
    let mut finish_reason = None;

    trace!("start receiving events");

    let mut pinned_resp = pin!(resp);
    loop {
        let event_or_err =
            poll_fn(|cx| pinned_resp.as_mut().poll_next_event(cx)).await;
        let event = match event_or_err {
            Ok(Some(event)) => event,
            Ok(None) => break,
            Err(err) => {
                error!("got an error: {err:?}");
                return Err(Box::new(err));
            }
        };
        trace!("got an event: {event:?}");

        match event {
            ModelResponseEvent::MessageDelta(delta) => {
                text.push_str(&delta);
                on_delta(delta);
            }
            ModelResponseEvent::Completed(reason) => {
                finish_reason = Some(reason);
            }
        }
    }

    trace!("finished a request");

    if finish_reason == Some(ModelFinishReason::Length) {
        warn!("the reply was cut off by the token limit");
    }
    Ok(ModelClientResponse {
        text,
        finish_reason,
    })
}
