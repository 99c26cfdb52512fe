//! Provider selection and per-provider defaults.

use std::env;
use std::fmt::{self, Debug, Display, Formatter};
use std::str::FromStr;

use llm_chat_core::{ConversationClient, ModelClient};
use llm_chat_gemini_model::{
    GEMINI_BASE_URL, GeminiConfigBuilder, GeminiProvider,
};
use llm_chat_model::SamplingParameters;
use llm_chat_ollama_model::{OLLAMA_HOST, OllamaConfigBuilder, OllamaProvider};
use llm_chat_openai_model::{
    OPENAI_BASE_URL, OPENROUTER_BASE_URL, OpenAIConfigBuilder, OpenAIProvider,
};
use thiserror::Error;

const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant.";

const OPENROUTER_MODELS: &[(&str, &str)] = &[
    ("deepseek-chat", "deepseek/deepseek-chat"),
    ("deepseek-r1", "deepseek/deepseek-r1"),
];

/// Errors that prevent a chat session from starting.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The provider needs an API key and none was found.
    #[error("{var} not found in environment variables.")]
    MissingCredential {
        /// The environment variable that should hold the key.
        var: &'static str,
    },
    /// The provider name is not one of the supported providers.
    #[error(
        "unknown provider `{0}`, expected one of: \
         openai, gemini, ollama, openrouter"
    )]
    UnknownProvider(String),
}

impl ConfigError {
    /// Returns a hint on how to fix the error, if there is one.
    pub fn hint(&self) -> Option<String> {
        match self {
            ConfigError::MissingCredential { var } => Some(format!(
                "Please create a .env file with your API key like this:\n\
                 {var}=your-api-key-here"
            )),
            ConfigError::UnknownProvider(_) => None,
        }
    }
}

/// The closed set of supported providers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    /// OpenAI's chat completion API.
    #[default]
    OpenAI,
    /// Google Gemini.
    Gemini,
    /// A local Ollama server.
    Ollama,
    /// OpenRouter, serving DeepSeek models by default.
    OpenRouter,
}

impl ProviderKind {
    /// Every provider, in the order they are listed to users.
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::OpenAI,
        ProviderKind::Gemini,
        ProviderKind::Ollama,
        ProviderKind::OpenRouter,
    ];

    /// Returns the environment variable holding the API key, or `None`
    /// if the provider needs no key.
    pub fn credential_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Gemini => Some("GOOGLE_API_KEY"),
            ProviderKind::Ollama => None,
            ProviderKind::OpenRouter => Some("OPENROUTER_API_KEY"),
        }
    }

    /// Returns the default base URL.
    pub fn default_endpoint(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => OPENAI_BASE_URL,
            ProviderKind::Gemini => GEMINI_BASE_URL,
            ProviderKind::Ollama => OLLAMA_HOST,
            ProviderKind::OpenRouter => OPENROUTER_BASE_URL,
        }
    }

    /// Returns the model used when none is configured.
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "gpt-3.5-turbo",
            ProviderKind::Gemini => "gemini-2.0-flash-exp",
            ProviderKind::Ollama => "llama2",
            ProviderKind::OpenRouter => "deepseek/deepseek-r1",
        }
    }

    /// Returns the sampling parameters used when none are configured.
    pub fn default_sampling(self) -> SamplingParameters {
        match self {
            ProviderKind::OpenAI | ProviderKind::OpenRouter => {
                SamplingParameters::with_temperature(0.7)
            }
            ProviderKind::Gemini => SamplingParameters {
                temperature: Some(0.7),
                top_p: Some(0.8),
                top_k: Some(40),
                max_tokens: None,
            },
            ProviderKind::Ollama => SamplingParameters::default(),
        }
    }

    /// Returns the system prompt the transcript starts with by default.
    pub fn default_system_prompt(self) -> Option<&'static str> {
        match self {
            ProviderKind::OpenAI | ProviderKind::OpenRouter => {
                Some(DEFAULT_SYSTEM_PROMPT)
            }
            ProviderKind::Gemini | ProviderKind::Ollama => None,
        }
    }

    /// Returns the short model names this provider accepts, paired with
    /// the identifiers they stand for.
    pub fn model_aliases(self) -> &'static [(&'static str, &'static str)] {
        match self {
            ProviderKind::OpenRouter => OPENROUTER_MODELS,
            _ => &[],
        }
    }

    /// Resolves a model name typed by the user. Aliases are looked up by
    /// name or by their 1-based position, anything else is passed through.
    pub fn resolve_model(self, name: &str) -> String {
        let name = name.trim();
        let aliases = self.model_aliases();
        let by_position = name
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|idx| aliases.get(idx));
        let by_name = aliases
            .iter()
            .find(|(alias, _)| alias.eq_ignore_ascii_case(name));
        match by_position.or(by_name) {
            Some((_, id)) => (*id).to_owned(),
            None => name.to_owned(),
        }
    }

    /// Returns the name shown in banners.
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Gemini => "Gemini",
            ProviderKind::Ollama => "Ollama",
            ProviderKind::OpenRouter => "DeepSeek (via OpenRouter)",
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::Ollama => "ollama",
            ProviderKind::OpenRouter => "openrouter",
        };
        f.write_str(s)
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.to_string().eq_ignore_ascii_case(s))
            .or_else(|| {
                // The scripts this replaces were named after the model family.
                s.eq_ignore_ascii_case("deepseek")
                    .then_some(ProviderKind::OpenRouter)
            })
            .ok_or_else(|| ConfigError::UnknownProvider(s.to_owned()))
    }
}

/// Everything needed to talk to one provider.
#[derive(Clone, PartialEq)]
pub struct ProviderConfig {
    /// Which provider to talk to.
    pub kind: ProviderKind,
    /// Base URL of the provider's API.
    pub endpoint: String,
    /// Model identifier, or an alias of one.
    pub model: String,
    /// The API key, if one was found.
    pub credential: Option<String>,
    /// Sampling parameters sent with every call.
    pub sampling: SamplingParameters,
    /// The system turn the transcript starts with.
    pub system_prompt: Option<String>,
    /// Whether to ask for a streamed reply, where the provider supports it.
    pub stream: bool,
}

impl ProviderConfig {
    /// Creates a configuration with the provider's defaults and no
    /// credential.
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            endpoint: kind.default_endpoint().to_owned(),
            model: kind.default_model().to_owned(),
            credential: None,
            sampling: kind.default_sampling(),
            system_prompt: kind.default_system_prompt().map(ToOwned::to_owned),
            stream: false,
        }
    }

    /// Creates a configuration with the provider's defaults, reading the
    /// credential from the process environment.
    #[inline]
    pub fn from_env(kind: ProviderKind) -> Self {
        Self::from_lookup(kind, |var| env::var(var).ok())
    }

    /// Like [`from_env`](Self::from_env), but reads variables through
    /// `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(kind: ProviderKind, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = kind
            .credential_var()
            .and_then(&lookup)
            .map(|value| value.trim().to_owned())
            .filter(|value| !value.is_empty());
        Self {
            credential,
            ..Self::new(kind)
        }
    }

    fn require_credential(&self) -> Result<&str, ConfigError> {
        match (self.kind.credential_var(), self.credential.as_deref()) {
            (None, _) => Ok(""),
            (Some(_), Some(credential)) => Ok(credential),
            (Some(var), None) => Err(ConfigError::MissingCredential { var }),
        }
    }

    /// Checks the configuration and creates a conversation client for it.
    pub fn connect(&self) -> Result<ConversationClient, ConfigError> {
        let credential = self.require_credential()?;
        let model_client = match self.kind {
            ProviderKind::OpenAI | ProviderKind::OpenRouter => {
                let mut builder = OpenAIConfigBuilder::with_api_key(credential)
                    .with_base_url(&self.endpoint)
                    .with_stream(self.stream);
                if self.kind == ProviderKind::OpenRouter {
                    builder = builder.with_header("X-Title", "llm-chat");
                }
                ModelClient::new(OpenAIProvider::new(builder.build()))
            }
            ProviderKind::Gemini => {
                let config = GeminiConfigBuilder::with_api_key(credential)
                    .with_base_url(&self.endpoint)
                    .build();
                ModelClient::new(GeminiProvider::new(config))
            }
            ProviderKind::Ollama => ModelClient::new(self.ollama_provider()),
        };

        let model = self.kind.resolve_model(&self.model);
        debug!("connecting to {} with model {model}", self.kind);
        let mut client = ConversationClient::new(model_client, model)
            .with_sampling(self.sampling);
        if let Some(prompt) = &self.system_prompt {
            client = client.with_system_prompt(prompt.clone());
        }
        Ok(client)
    }

    /// Returns `false` if the provider is known to be unreachable. Only a
    /// local Ollama server is checked, hosted APIs are assumed up.
    pub async fn check_connection(&self) -> bool {
        match self.kind {
            ProviderKind::Ollama => {
                self.ollama_provider().verify_connection().await
            }
            _ => true,
        }
    }

    fn ollama_provider(&self) -> OllamaProvider {
        OllamaProvider::new(
            OllamaConfigBuilder::new()
                .with_host(&self.endpoint)
                .build(),
        )
    }
}

impl Debug for ProviderConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field(
                "credential",
                &self.credential.as_ref().map(|_| "<redacted>"),
            )
            .field("sampling", &self.sampling)
            .field("system_prompt", &self.system_prompt)
            .field("stream", &self.stream)
            .finish()
    }
}
