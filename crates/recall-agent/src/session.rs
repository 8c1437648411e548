use recall_agent_core::memory::LongTermEntry;
use recall_agent_core::message::Message;
use recall_agent_core::{
    Agent, AgentBuilder, AgentConfig, MemorySnapshot, PipelineError, TurnStage,
};
use recall_agent_model::{ModelInfo, ModelProvider};

use crate::tools::*;

/// A session builder.
///
/// See [`Session`].
pub struct SessionBuilder {
    agent_builder: AgentBuilder,
    weather: Option<WeatherConfig>,
    mail_service_url: Option<String>,
}

impl SessionBuilder {
    /// Creates a session builder with a specified model provider and the
    /// default agent configuration.
    #[inline]
    pub fn with_model_provider<M: ModelProvider + 'static>(provider: M) -> Self {
        Self::new(provider, AgentConfig::default())
    }

    /// Creates a session builder with a specified model provider and agent
    /// configuration.
    pub fn new<M: ModelProvider + 'static>(provider: M, config: AgentConfig) -> Self {
        Self {
            agent_builder: AgentBuilder::new(provider, config),
            weather: None,
            mail_service_url: None,
        }
    }

    /// Sets where the weather tool fetches from.
    #[inline]
    pub fn with_weather(mut self, config: WeatherConfig) -> Self {
        self.weather = Some(config);
        self
    }

    /// Sets the base URL of the mail service used by the email tool.
    #[inline]
    pub fn with_mail_service<S: Into<String>>(mut self, url: S) -> Self {
        self.mail_service_url = Some(url.into());
        self
    }

    /// Attaches a callback to be invoked when the agent is idle.
    #[inline]
    pub fn on_idle(mut self, on_idle: impl Fn() + Send + Sync + 'static) -> Self {
        self.agent_builder = self.agent_builder.on_idle(on_idle);
        self
    }

    /// Attaches a callback to be invoked when a message is added to the
    /// conversation.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_message(on_message);
        self
    }

    /// Attaches a callback to be invoked when the turn stage changes.
    #[inline]
    pub fn on_stage(
        mut self,
        on_stage: impl Fn(TurnStage) + Send + Sync + 'static,
    ) -> Self {
        self.agent_builder = self.agent_builder.on_stage(on_stage);
        self
    }

    /// Builds a new session.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Session {
        let Self {
            agent_builder,
            weather,
            mail_service_url,
        } = self;

        if weather.is_none() {
            warn!("no weather API key configured, weather lookups will fail");
        }
        let weather = weather.unwrap_or_else(|| WeatherConfig::with_api_key(""));
        let email = match mail_service_url {
            Some(url) => EmailTool::new(url),
            None => EmailTool::default(),
        };
        let search = SearchTool::new(agent_builder.memory_search());

        let agent = agent_builder
            .with_tool(WeatherTool::new(weather))
            .with_tool(CalculatorTool::new())
            .with_tool(search)
            .with_tool(email)
            .build();

        Session { agent }
    }
}

/// A chat session, like a window that displays messages and has a input box.
///
/// The session holds a fully configured agent that you can use directly, and it
/// is basically a wrapper around [`Agent`].
pub struct Session {
    agent: Agent,
}

impl Session {
    /// Sends a message to the session.
    #[inline]
    pub fn send_message(&self, message: &str) {
        self.agent.submit(message);
    }

    /// Switches the chat model for the following messages.
    #[inline]
    pub fn select_model(&self, model: &str) {
        self.agent.select_model(model);
    }

    /// Returns the selected chat model.
    #[inline]
    pub fn selected_model(&self) -> Option<String> {
        self.agent.selected_model()
    }

    /// Lists the models of the provider.
    #[inline]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, PipelineError> {
        self.agent.list_models().await
    }

    /// Returns the recent messages, oldest first.
    pub async fn messages(&self) -> Vec<Message> {
        self.snapshot().await.short_term
    }

    /// Returns everything committed to the long-term memory.
    pub async fn memories(&self) -> Vec<LongTermEntry> {
        self.snapshot().await.long_term
    }

    #[inline]
    async fn snapshot(&self) -> MemorySnapshot {
        self.agent.snapshot().await.unwrap_or_default()
    }

    /// Returns the underlying agent.
    #[inline]
    pub fn agent(&self) -> &Agent {
        &self.agent
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use recall_agent_core::AgentConfigBuilder;
    use recall_agent_test_model::{PresetResponse, TestModelProvider};
    use tokio::sync::watch;
    use tokio::time::timeout;

    use super::*;

    #[tokio::test]
    async fn test_calculator_turn() {
        let provider = TestModelProvider::default();
        provider.add_response(PresetResponse::with_content(
            "That is /tool:calculator{expression: (2 + 3) * 5}.",
        ));
        provider.add_response(PresetResponse::with_content(
            "/tool:search{query: anything}",
        ));

        let (idle_tx, mut idle_rx) = watch::channel(0usize);
        let config = AgentConfigBuilder::new().with_model("test").build();
        let session = SessionBuilder::new(provider.clone(), config)
            .with_weather(WeatherConfig::with_api_key("secret"))
            .on_idle(move || idle_tx.send_modify(|n| *n += 1))
            .build();

        session.send_message("What is (2 + 3) * 5?");
        timeout(Duration::from_secs(2), idle_rx.wait_for(|n| *n == 1))
            .await
            .unwrap()
            .unwrap();
        session.send_message("Search please");
        timeout(Duration::from_secs(2), idle_rx.wait_for(|n| *n == 2))
            .await
            .unwrap()
            .unwrap();

        let messages = session.messages().await;
        let contents: Vec<_> = messages.iter().map(|m| m.content()).collect();
        assert_eq!(
            contents,
            [
                "What is (2 + 3) * 5?",
                "That is [calculator result: 25].",
                "Search please",
                "[search result: No relevant memories found.]",
            ]
        );
        assert_eq!(session.memories().await.len(), 4);

        // Every tool is announced to the model.
        let prompt = &provider.chat_requests()[0].messages[0].content;
        for usage in [
            "/tool:weather{location: <location>}",
            "/tool:calculator{expression: <expression>}",
            "/tool:search{query: <query>}",
            "/tool:email{limit: <limit>, page: <page>}",
        ] {
            assert!(prompt.contains(usage), "missing {usage}");
        }
    }
}
