use recall_agent_model::ModelProvider;

use super::orchestrator::{MessageCallback, StageCallback};
use super::{Agent, IdleCallback, Orchestrator, TurnStage};
use crate::config::{AgentConfig, ModelSelection};
use crate::memory::{LongTermMemory, MemorySearch, ShortTermMemory};
use crate::message::Message;
use crate::model_client::ModelClient;
use crate::tool::{Tool, ToolRegistry};

/// [`Agent`] builder.
pub struct AgentBuilder {
    client: ModelClient,
    config: AgentConfig,
    selection: ModelSelection,
    long_term: LongTermMemory,
    tools: ToolRegistry,
    on_idle: Option<IdleCallback>,
    on_stage: Option<StageCallback>,
    on_message: Option<MessageCallback>,
}

impl AgentBuilder {
    /// Creates a new builder with the specified model provider and the
    /// default configuration.
    #[inline]
    pub fn with_model_provider<P: ModelProvider + 'static>(provider: P) -> Self {
        Self::new(provider, AgentConfig::default())
    }

    /// Creates a new builder with the specified model provider and
    /// configuration.
    pub fn new<P: ModelProvider + 'static>(provider: P, config: AgentConfig) -> Self {
        Self {
            client: ModelClient::new(provider, config.max_retry_elapsed),
            selection: ModelSelection::new(
                config.model.clone(),
                config.embedding_model.clone(),
            ),
            config,
            long_term: LongTermMemory::new(),
            tools: ToolRegistry::new(),
            on_idle: None,
            on_stage: None,
            on_message: None,
        }
    }

    /// Returns a search handle over the long-term memory of the agent
    /// being built, e.g. for a tool that recalls past messages.
    #[inline]
    pub fn memory_search(&self) -> MemorySearch {
        MemorySearch::new(
            self.long_term.clone(),
            self.client.clone(),
            self.selection.clone(),
            self.config.similarity_threshold,
        )
    }

    /// Registers a tool.
    #[inline]
    pub fn with_tool<T: Tool>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    /// Attaches a callback to be invoked when the agent is idle.
    ///
    /// It is called once the queue is drained after one or more turns.
    #[inline]
    pub fn on_idle(mut self, on_idle: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_idle = Some(Box::new(on_idle));
        self
    }

    /// Attaches a callback to be invoked on every stage transition.
    #[inline]
    pub fn on_stage(
        mut self,
        on_stage: impl Fn(TurnStage) + Send + Sync + 'static,
    ) -> Self {
        self.on_stage = Some(Box::new(on_stage));
        self
    }

    /// Attaches a callback to be invoked for every message appended to the
    /// short-term memory.
    #[inline]
    pub fn on_message(
        mut self,
        on_message: impl Fn(&Message) + Send + Sync + 'static,
    ) -> Self {
        self.on_message = Some(Box::new(on_message));
        self
    }

    /// Builds a bare orchestrator, to drive turns without a background task.
    ///
    /// The idle callback is not used.
    pub fn build_orchestrator(self) -> Orchestrator {
        self.into_parts().0
    }

    /// Builds the agent and spawns its task.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Agent {
        let (orchestrator, client, selection, on_idle) = self.into_parts();
        Agent::spawn(orchestrator, client, selection, on_idle)
    }

    fn into_parts(
        self,
    ) -> (Orchestrator, ModelClient, ModelSelection, Option<IdleCallback>) {
        let Self {
            client,
            config,
            selection,
            long_term,
            tools,
            on_idle,
            on_stage,
            on_message,
        } = self;

        let orchestrator = Orchestrator::new(
            client.clone(),
            tools,
            selection.clone(),
            ShortTermMemory::with_capacity(config.short_term_capacity),
            long_term,
            config.similarity_threshold,
            on_stage,
            on_message,
        );
        (orchestrator, client, selection, on_idle)
    }
}
