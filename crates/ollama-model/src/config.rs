use std::time::Duration;

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Builder for [`OllamaConfig`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct OllamaConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
}

impl OllamaConfigBuilder {
    /// Creates a builder with default settings.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom base URL.
    #[inline]
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets a timeout applied to every request.
    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Builds the configuration.
    #[inline]
    pub fn build(self) -> OllamaConfig {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        OllamaConfig {
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: self.timeout,
        }
    }
}

/// Configuration for the Ollama provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OllamaConfig {
    pub(crate) base_url: String,
    pub(crate) timeout: Option<Duration>,
}

impl OllamaConfig {
    #[inline]
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = OllamaConfigBuilder::new().build();
        assert_eq!(config.endpoint("/api/tags"), "http://localhost:11434/api/tags");
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn test_trailing_slash() {
        let config = OllamaConfigBuilder::new()
            .with_base_url("http://gpu-box:11434/")
            .with_timeout(Duration::from_secs(30))
            .build();
        assert_eq!(config.endpoint("/api/chat"), "http://gpu-box:11434/api/chat");
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));
    }
}
