//! Core logic including conversation memory, tool-call parsing and
//! dispatch, and the turn pipeline that ties them to the model.

#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc)]

#[macro_use]
extern crate tracing;

mod agent;
pub mod call_parser;
mod config;
pub mod memory;
pub mod message;
mod model_client;
pub mod tool;

pub use agent::{
    Agent, AgentBuilder, FALLBACK_MESSAGE, MemorySnapshot, Orchestrator,
    TurnOutcome, TurnStage,
};
pub use config::{AgentConfig, AgentConfigBuilder};
pub use model_client::{PipelineError, PipelineErrorKind};
