use std::fmt::{self, Debug, Formatter};

/// Base URL of the Generative Language API.
pub const GEMINI_BASE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta";

/// Builder for [`GeminiConfig`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfigBuilder {
    api_key: String,
    base_url: Option<String>,
}

impl GeminiConfigBuilder {
    /// Creates a builder with the given API key.
    #[inline]
    pub fn with_api_key<S: Into<String>>(api_key: S) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: None,
        }
    }

    /// Sets a custom base URL, e.g. a gateway in front of the API.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> GeminiConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| GEMINI_BASE_URL.to_owned());
        GeminiConfig {
            api_key: self.api_key,
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }
}

impl Debug for GeminiConfigBuilder {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfigBuilder")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Configuration for [`GeminiProvider`](crate::GeminiProvider).
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct GeminiConfig {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
}

impl GeminiConfig {
    pub(crate) fn generate_url(&self, model: &str) -> String {
        // Model ids may be given in their resource form.
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    pub(crate) fn models_url(&self) -> String {
        format!("{}/models", self.base_url)
    }
}

impl Debug for GeminiConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = GeminiConfigBuilder::with_api_key("key").build();
        assert_eq!(
            config.generate_url("gemini-2.0-flash-exp"),
            concat!(
                "https://generativelanguage.googleapis.com/v1beta",
                "/models/gemini-2.0-flash-exp:generateContent",
            )
        );

        let config = GeminiConfigBuilder::with_api_key("AIza-secret")
            .with_base_url("http://127.0.0.1:9000/v1beta/")
            .build();
        assert_eq!(
            config.generate_url("models/gemini-pro"),
            "http://127.0.0.1:9000/v1beta/models/gemini-pro:generateContent"
        );
        assert_eq!(config.models_url(), "http://127.0.0.1:9000/v1beta/models");
        assert!(!format!("{config:?}").contains("AIza-secret"));
    }
}
