use std::fmt::{self, Display};

/// The stage of the turn pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TurnStage {
    /// No turn is running.
    #[default]
    Idle,
    /// The user message is being recorded and context is being recalled.
    Submitting,
    /// Waiting for the model reply.
    AwaitingModel,
    /// Executing the tool calls found in the reply.
    ProcessingTools,
    /// Committing the turn to the long-term memory.
    Committing,
    /// The turn hit an unrecoverable error.
    Failed,
}

impl TurnStage {
    /// Returns `true` while a turn is in flight.
    #[inline]
    pub fn is_busy(self) -> bool {
        self != TurnStage::Idle
    }
}

impl Display for TurnStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnStage::Idle => write!(f, "idle"),
            TurnStage::Submitting => write!(f, "submitting"),
            TurnStage::AwaitingModel => write!(f, "awaiting model"),
            TurnStage::ProcessingTools => write!(f, "processing tools"),
            TurnStage::Committing => write!(f, "committing"),
            TurnStage::Failed => write!(f, "failed"),
        }
    }
}
