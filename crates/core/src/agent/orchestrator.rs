use recall_agent_model::{ChatMessage, ChatRequest, ModelInfo};
use tracing::Instrument;

use super::prompt;
use super::stage::TurnStage;
use crate::call_parser::{ToolCall, parse_tool_calls, replace_spans};
use crate::config::ModelSelection;
use crate::memory::{self, LongTermEntry, LongTermMemory, MemorySearch, ShortTermMemory};
use crate::message::{Clock, Message, Role};
use crate::model_client::{ModelClient, PipelineError};
use crate::tool::ToolRegistry;

/// The assistant message appended when a turn cannot be completed.
pub const FALLBACK_MESSAGE: &str =
    "Sorry, an error occurred while processing your request.";

pub(crate) type StageCallback = Box<dyn Fn(TurnStage) + Send + Sync>;
pub(crate) type MessageCallback = Box<dyn Fn(&Message) + Send + Sync>;

/// How a turn ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing was done, either no model is selected or the input is blank.
    Skipped,
    /// The turn completed with this assistant message.
    Completed(Message),
    /// The turn failed and this fallback message was appended instead.
    Failed(Message),
}

/// The memories of an agent at one point in time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemorySnapshot {
    /// Recent messages, oldest first.
    pub short_term: Vec<Message>,
    /// Every committed long-term entry, in commit order.
    pub long_term: Vec<LongTermEntry>,
}

/// Drives conversational turns against the model, the tools and the
/// memories.
///
/// Running a turn borrows the orchestrator mutably, so turns on one
/// orchestrator never overlap.
pub struct Orchestrator {
    client: ModelClient,
    tools: ToolRegistry,
    selection: ModelSelection,
    short_term: ShortTermMemory,
    long_term: LongTermMemory,
    threshold: f32,
    clock: Clock,
    stage: TurnStage,
    on_stage: Option<StageCallback>,
    on_message: Option<MessageCallback>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        client: ModelClient,
        tools: ToolRegistry,
        selection: ModelSelection,
        short_term: ShortTermMemory,
        long_term: LongTermMemory,
        threshold: f32,
        on_stage: Option<StageCallback>,
        on_message: Option<MessageCallback>,
    ) -> Self {
        Self {
            client,
            tools,
            selection,
            short_term,
            long_term,
            threshold,
            clock: Clock::default(),
            stage: TurnStage::Idle,
            on_stage,
            on_message,
        }
    }

    /// Runs one turn for the user input.
    ///
    /// Failures never escape: a failed model or embedding request ends the
    /// turn with the fallback message, a failed tool call is rendered into
    /// the reply.
    pub async fn run_turn(&mut self, input: &str) -> TurnOutcome {
        let Some(model) = self.selection.chat_model() else {
            debug!("no model selected, skipping the turn");
            return TurnOutcome::Skipped;
        };
        if input.trim().is_empty() {
            trace!("blank input, skipping the turn");
            return TurnOutcome::Skipped;
        }
        let embedding_model = self
            .selection
            .embedding_model()
            .unwrap_or_else(|| model.clone());

        let span = debug_span!("turn", model = %model);
        self.drive(model, embedding_model, input)
            .instrument(span)
            .await
    }

    async fn drive(
        &mut self,
        model: String,
        embedding_model: String,
        input: &str,
    ) -> TurnOutcome {
        debug!("turn started");
        self.set_stage(TurnStage::Submitting);

        let user = Message::new(Role::User, input, self.clock.now());
        let history = self.short_term.to_vec();
        self.remember(user.clone());

        let outcome = match self
            .respond(model, &embedding_model, &user, &history)
            .await
        {
            Ok(assistant) => TurnOutcome::Completed(assistant),
            Err(err) => {
                error!("turn failed: {err}");
                self.set_stage(TurnStage::Failed);
                let fallback = Message::new(
                    Role::Assistant,
                    FALLBACK_MESSAGE,
                    self.clock.now(),
                );
                self.remember(fallback.clone());
                TurnOutcome::Failed(fallback)
            }
        };

        self.set_stage(TurnStage::Idle);
        debug!("turn finished");
        outcome
    }

    async fn respond(
        &mut self,
        model: String,
        embedding_model: &str,
        user: &Message,
        history: &[Message],
    ) -> Result<Message, PipelineError> {
        let client = &self.client;
        let corpus = self.long_term.entries();
        let relevant = memory::search(
            user.content(),
            |text| client.embed(embedding_model.to_owned(), text),
            &corpus,
            self.threshold,
        )
        .await?;
        debug!("recalled {} memories", relevant.len());
        let relevant: Vec<Message> =
            relevant.into_iter().map(|s| s.entry.message).collect();

        let mut messages = Vec::with_capacity(history.len() + 3);
        messages.push(ChatMessage::system(prompt::system_prompt(
            &self.tools.list(),
        )));
        messages.extend(prompt::context_message(&relevant));
        messages.extend(history.iter().map(Message::to_chat_message));
        messages.push(user.to_chat_message());

        self.set_stage(TurnStage::AwaitingModel);
        let resp = self.client.chat(ChatRequest { model, messages }).await?;
        trace!("model replied: {:?}", resp.message.content);

        self.set_stage(TurnStage::ProcessingTools);
        let content = self.process_tool_calls(&resp.message.content).await;
        let assistant =
            Message::new(Role::Assistant, content, self.clock.now());
        self.remember(assistant.clone());

        self.set_stage(TurnStage::Committing);
        self.commit(user.clone(), embedding_model).await?;
        self.commit(assistant.clone(), embedding_model).await?;
        Ok(assistant)
    }

    /// Executes the tool calls in `content` one after another, left to
    /// right, and replaces each marker with its rendered result.
    pub async fn process_tool_calls(&self, content: &str) -> String {
        let calls = parse_tool_calls(content);
        if calls.is_empty() {
            return content.to_owned();
        }

        let mut replacements = Vec::with_capacity(calls.len());
        for ToolCall { name, args, span } in calls {
            let rendered = match self.tools.dispatch(&name, args).await {
                Ok(result) => format!("[{name} result: {result}]"),
                Err(err) => {
                    warn!("tool `{name}` failed: {err}");
                    format!("[{name} error: {err}]")
                }
            };
            replacements.push((span, rendered));
        }
        replace_spans(content, replacements)
    }

    async fn commit(
        &self,
        message: Message,
        embedding_model: &str,
    ) -> Result<(), PipelineError> {
        let client = &self.client;
        self.long_term
            .commit(message, |text| client.embed(embedding_model.to_owned(), text))
            .await
    }

    fn remember(&mut self, message: Message) {
        if let Some(on_message) = &self.on_message {
            on_message(&message);
        }
        self.short_term.append(message);
    }

    fn set_stage(&mut self, stage: TurnStage) {
        trace!("stage: {} -> {stage}", self.stage);
        self.stage = stage;
        if let Some(on_stage) = &self.on_stage {
            on_stage(stage);
        }
    }

    /// Selects the chat model used by the following turns.
    #[inline]
    pub fn select_model<S: Into<String>>(&mut self, model: S) {
        let model = model.into();
        info!("selected model `{model}`");
        self.selection.select(model);
    }

    /// Returns the selected chat model.
    #[inline]
    pub fn selected_model(&self) -> Option<String> {
        self.selection.chat_model()
    }

    /// Returns the current stage.
    #[inline]
    pub fn stage(&self) -> TurnStage {
        self.stage
    }

    /// Returns the short-term memory.
    #[inline]
    pub fn short_term(&self) -> &ShortTermMemory {
        &self.short_term
    }

    /// Returns the long-term memory.
    #[inline]
    pub fn long_term(&self) -> &LongTermMemory {
        &self.long_term
    }

    /// Returns the registered tools.
    #[inline]
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Returns a search handle over the long-term memory.
    #[inline]
    pub fn memory_search(&self) -> MemorySearch {
        MemorySearch::new(
            self.long_term.clone(),
            self.client.clone(),
            self.selection.clone(),
            self.threshold,
        )
    }

    /// Lists the models of the provider.
    #[inline]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, PipelineError> {
        self.client.list_models().await
    }

    /// Copies both memories out.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            short_term: self.short_term.to_vec(),
            long_term: self.long_term.entries(),
        }
    }
}
