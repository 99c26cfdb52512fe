use llm_chat_model::{ModelMessage, ModelRequest};
use serde::{Deserialize, Serialize};

// ------------------------------
// Types received from the server
// ------------------------------

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    pub message: Option<Message>,
    pub done_reason: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Tags {
    #[serde(default)]
    pub models: Vec<TagEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TagEntry {
    pub name: String,
}

// ------------------------
// Types in both directions
// ------------------------

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

// ------------------------
// Types sent to the server
// ------------------------

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    stream: bool,
    #[serde(skip_serializing_if = "Options::is_empty")]
    options: Options,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl Options {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// -----------
// Conversions
// -----------

/// Builds a non-streaming chat request.
pub fn create_request(req: &ModelRequest) -> ChatRequest {
    ChatRequest {
        model: req.model.clone(),
        messages: req
            .messages
            .iter()
            .map(|msg| {
                let role = match msg {
                    ModelMessage::System(_) => "system",
                    ModelMessage::User(_) => "user",
                    ModelMessage::Assistant(_) => "assistant",
                };
                Message {
                    role: role.to_owned(),
                    content: msg.content().to_owned(),
                }
            })
            .collect(),
        stream: false,
        options: Options {
            temperature: req.sampling.temperature,
            top_p: req.sampling.top_p,
            top_k: req.sampling.top_k,
            num_predict: req.sampling.max_tokens,
        },
    }
}

#[cfg(test)]
mod tests {
    use llm_chat_model::SamplingParameters;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_create_request() {
        let request = ModelRequest {
            model: "llama2".to_owned(),
            messages: vec![
                ModelMessage::User("Hello".to_owned()),
                ModelMessage::Assistant("Hi".to_owned()),
                ModelMessage::User("Tell me a joke".to_owned()),
            ],
            sampling: SamplingParameters {
                max_tokens: Some(128),
                ..Default::default()
            },
        };
        let body = serde_json::to_value(create_request(&request)).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "llama2",
                "messages": [
                    { "role": "user", "content": "Hello" },
                    { "role": "assistant", "content": "Hi" },
                    { "role": "user", "content": "Tell me a joke" },
                ],
                "stream": false,
                "options": { "num_predict": 128 },
            })
        );

        let request = ModelRequest {
            sampling: SamplingParameters::default(),
            ..request
        };
        let body = serde_json::to_value(create_request(&request)).unwrap();
        assert!(body.get("options").is_none());
    }
}
