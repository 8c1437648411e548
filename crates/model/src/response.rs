use serde::{Deserialize, Serialize};

use crate::request::ChatMessage;

/// A fixed-length vector representing a text.
pub type Embedding = Vec<f32>;

/// Describes a model offered by a provider.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelInfo {
    /// The full name of the model, used when sending requests.
    pub name: String,
}

/// A complete reply from the model.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The reply message, its role is always `assistant`.
    pub message: ChatMessage,
    /// Whether the model has finished generating.
    pub done: bool,
}
