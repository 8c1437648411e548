mod builder;
mod orchestrator;
mod prompt;
mod stage;

use recall_agent_model::ModelInfo;
use tokio::sync::{mpsc, oneshot};
use tracing::Instrument;

use crate::config::ModelSelection;
use crate::model_client::{ModelClient, PipelineError};
pub use builder::AgentBuilder;
pub use orchestrator::{FALLBACK_MESSAGE, MemorySnapshot, Orchestrator, TurnOutcome};
pub use stage::TurnStage;

pub(crate) type IdleCallback = Box<dyn Fn() + Send + Sync>;

enum Command {
    Submit(String),
    SelectModel(String),
    Snapshot(oneshot::Sender<MemorySnapshot>),
}

/// A handle to a running agent.
///
/// The agent owns an [`Orchestrator`] on a background task. Inputs are
/// queued and their turns run strictly one after another, in submission
/// order. Inputs submitted while a turn is in flight wait for it to
/// finish.
///
/// Dropping every handle stops the agent after the queued work is done.
pub struct Agent {
    commands: mpsc::UnboundedSender<Command>,
    client: ModelClient,
    selection: ModelSelection,
}

impl Agent {
    fn spawn(
        orchestrator: Orchestrator,
        client: ModelClient,
        selection: ModelSelection,
        on_idle: Option<IdleCallback>,
    ) -> Self {
        let (commands, rx) = mpsc::unbounded_channel();
        tokio::spawn(
            run_worker(orchestrator, rx, on_idle).instrument(debug_span!("agent")),
        );
        Self {
            commands,
            client,
            selection,
        }
    }

    /// Queues a user input.
    pub fn submit<S: Into<String>>(&self, input: S) {
        self.send(Command::Submit(input.into()));
    }

    /// Selects the chat model for the turns submitted after this call.
    pub fn select_model<S: Into<String>>(&self, model: S) {
        self.send(Command::SelectModel(model.into()));
    }

    /// Returns the selected chat model.
    ///
    /// A selection queued behind running turns shows up once they are
    /// done.
    #[inline]
    pub fn selected_model(&self) -> Option<String> {
        self.selection.chat_model()
    }

    /// Lists the models of the provider, without waiting for the queue.
    #[inline]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, PipelineError> {
        self.client.list_models().await
    }

    /// Returns the memories once the work queued before this call is done.
    ///
    /// Returns `None` if the agent has stopped.
    pub async fn snapshot(&self) -> Option<MemorySnapshot> {
        let (tx, rx) = oneshot::channel();
        self.send(Command::Snapshot(tx));
        rx.await.ok()
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            error!("agent task has stopped, dropping the command");
        }
    }
}

async fn run_worker(
    mut orchestrator: Orchestrator,
    mut commands: mpsc::UnboundedReceiver<Command>,
    on_idle: Option<IdleCallback>,
) {
    let mut busy = false;
    while let Some(command) = commands.recv().await {
        match command {
            Command::Submit(input) => {
                busy = true;
                let outcome = orchestrator.run_turn(&input).await;
                trace!("turn outcome: {outcome:?}");
            }
            Command::SelectModel(model) => orchestrator.select_model(model),
            Command::Snapshot(reply) => {
                // The caller may have given up waiting.
                _ = reply.send(orchestrator.snapshot());
            }
        }
        if busy && commands.is_empty() {
            busy = false;
            if let Some(on_idle) = &on_idle {
                on_idle();
            }
        }
    }
    debug!("agent task exited");
}
