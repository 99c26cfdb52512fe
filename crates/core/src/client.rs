use llm_chat_model::{ModelRequest, SamplingParameters};

use crate::conversation::{Role, Transcript, Turn};
use crate::error::Error;
use crate::model_client::ModelClient;

/// What happens to the user turn when a provider call fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FailurePolicy {
    /// Roll the user turn back, leaving the transcript as it was before
    /// the call.
    #[default]
    DiscardUserTurn,
    /// Keep the user turn. The next call will carry two consecutive user
    /// turns.
    RetainUserTurn,
}

/// A chat session with one provider: the model identifier, the sampling
/// parameters and the transcript sent with every call.
///
/// The transcript only grows through [`send`](Self::send), which appends a
/// user turn and the assistant's reply, so a successful call always adds
/// exactly two turns.
#[derive(Clone)]
pub struct ConversationClient {
    model_client: ModelClient,
    model: String,
    sampling: SamplingParameters,
    initial: Transcript,
    transcript: Transcript,
    failure_policy: FailurePolicy,
}

impl ConversationClient {
    /// Creates a client talking to `model` through `model_client`, with an
    /// empty transcript.
    pub fn new<S: Into<String>>(model_client: ModelClient, model: S) -> Self {
        Self {
            model_client,
            model: model.into(),
            sampling: SamplingParameters::default(),
            initial: Transcript::default(),
            transcript: Transcript::default(),
            failure_policy: FailurePolicy::default(),
        }
    }

    /// Seeds the transcript with a system turn. It survives
    /// [`clear`](Self::clear) and [`switch_model`](Self::switch_model).
    pub fn with_system_prompt<S: Into<String>>(mut self, prompt: S) -> Self {
        self.initial = Transcript::with_system_prompt(prompt);
        self.transcript = self.initial.clone();
        self
    }

    /// Sets the sampling parameters sent with every call.
    #[inline]
    pub fn with_sampling(mut self, sampling: SamplingParameters) -> Self {
        self.sampling = sampling;
        self
    }

    /// Sets what happens to the user turn when a call fails.
    #[inline]
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sends `text` with the whole transcript and returns the reply.
    pub async fn send(&mut self, text: &str) -> Result<String, Error> {
        self.send_with(text, |_| {}).await
    }

    /// Like [`send`](Self::send), but calls `on_delta` with every text
    /// fragment as it arrives.
    pub async fn send_with<F>(
        &mut self,
        text: &str,
        on_delta: F,
    ) -> Result<String, Error>
    where
        F: Fn(String) + Send + 'static,
    {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyInput);
        }

        self.transcript.push(Turn::new(Role::User, text));
        let req = ModelRequest {
            model: self.model.clone(),
            messages: self.transcript.to_messages(),
            sampling: self.sampling,
        };
        debug!(
            "sending {} turns to {}",
            self.transcript.len(),
            self.model
        );

        match self.model_client.send_request(req, on_delta).await {
            Ok(resp) => {
                self.transcript
                    .push(Turn::new(Role::Assistant, resp.text.clone()));
                Ok(resp.text)
            }
            Err(err) => {
                warn!("provider call failed: {err}");
                if self.failure_policy == FailurePolicy::DiscardUserTurn {
                    self.transcript.pop();
                }
                Err(err.into())
            }
        }
    }

    /// Restores the transcript to its initial state.
    pub fn clear(&mut self) {
        self.transcript = self.initial.clone();
    }

    /// Switches to another model and resets the transcript.
    pub fn switch_model<S: Into<String>>(&mut self, model: S) {
        self.model = model.into();
        self.clear();
        info!("switched to model {}", self.model);
    }

    /// Returns the turns exchanged so far, including the system turn.
    #[inline]
    pub fn history(&self) -> &[Turn] {
        self.transcript.turns()
    }

    /// Renders the transcript as `You:` and `AI:` lines.
    #[inline]
    pub fn format_history(&self) -> String {
        self.transcript.format()
    }

    /// Returns the current model identifier.
    #[inline]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Asks the provider which models it serves.
    pub async fn list_models(&self) -> Result<Vec<String>, Error> {
        Ok(self.model_client.list_models().await?)
    }
}
