/// Address of a locally running Ollama server.
pub const OLLAMA_HOST: &str = "http://localhost:11434";

/// Builder for [`OllamaConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OllamaConfigBuilder {
    host: Option<String>,
}

impl OllamaConfigBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the server address, [`OLLAMA_HOST`] by default.
    #[inline]
    pub fn with_host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OllamaConfig {
        let host = self.host.unwrap_or_else(|| OLLAMA_HOST.to_owned());
        OllamaConfig {
            host: host.trim_end_matches('/').to_owned(),
        }
    }
}

/// Configuration for [`OllamaProvider`](crate::OllamaProvider). Ollama
/// has no authentication, so the server address is all there is.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OllamaConfig {
    pub(crate) host: String,
}

impl OllamaConfig {
    /// Returns the server address.
    #[inline]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[inline]
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

impl Default for OllamaConfig {
    fn default() -> Self {
        OllamaConfigBuilder::new().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let config = OllamaConfig::default();
        assert_eq!(
            config.endpoint("/api/chat"),
            "http://localhost:11434/api/chat"
        );

        let config = OllamaConfigBuilder::new()
            .with_host("http://gpu-box:11434/")
            .build();
        assert_eq!(config.host(), "http://gpu-box:11434");
        assert_eq!(
            config.endpoint("/api/tags"),
            "http://gpu-box:11434/api/tags"
        );
    }
}
