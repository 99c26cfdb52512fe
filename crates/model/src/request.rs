use serde::{Deserialize, Serialize};

/// A request to be sent to the model provider.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelRequest {
    /// The model identifier, as understood by the provider.
    pub model: String,
    /// The input messages, oldest first.
    pub messages: Vec<ModelMessage>,
    /// Sampling parameters for this request.
    pub sampling: SamplingParameters,
}

/// A complete message.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "role", content = "content", rename_all = "lowercase")]
pub enum ModelMessage {
    /// The system instructions.
    System(String),
    /// A user input text.
    User(String),
    /// An assistant text.
    Assistant(String),
}

impl ModelMessage {
    /// Returns the text of this message.
    #[inline]
    pub fn content(&self) -> &str {
        match self {
            ModelMessage::System(content)
            | ModelMessage::User(content)
            | ModelMessage::Assistant(content) => content,
        }
    }
}

/// Knobs that shape how the model samples its reply.
///
/// Every field is optional, an unset field is left out of the request so
/// that the provider's own default applies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplingParameters {
    /// Sampling temperature.
    pub temperature: Option<f32>,
    /// Nucleus sampling probability mass.
    pub top_p: Option<f32>,
    /// Number of highest probability tokens to keep.
    pub top_k: Option<u32>,
    /// Upper bound of generated tokens.
    pub max_tokens: Option<u32>,
}

impl SamplingParameters {
    /// Creates parameters with only the temperature set.
    #[inline]
    pub fn with_temperature(temperature: f32) -> Self {
        Self {
            temperature: Some(temperature),
            ..Default::default()
        }
    }
}
