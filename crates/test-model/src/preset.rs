use serde::{Deserialize, Serialize};

/// The preset reply for one chat request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PresetResponse {
    /// The assistant content to reply with.
    pub content: String,
    /// If set, the request will fail in the first `failures` attempts with
    /// a rate limit error. `Some(0)` means the request will fail infinitely.
    pub failures: Option<u64>,
}

impl PresetResponse {
    /// Creates a `PresetResponse` with the specified content.
    #[inline]
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            failures: None,
        }
    }

    /// Sets failure times before a successful response.
    #[inline]
    pub fn with_failures(mut self, failures: u64) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Makes a response that always fails.
    #[inline]
    pub fn always_failing() -> Self {
        Self {
            content: String::new(),
            failures: Some(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_deserialize() {
        let response =
            PresetResponse::with_content("I have left a message for you.")
                .with_failures(2);

        let serialized = serde_json::to_string(&response).unwrap();
        let deserialized: PresetResponse =
            serde_json::from_str(&serialized).unwrap();

        assert_eq!(response, deserialized);
        assert_eq!(deserialized.failures, Some(2));
    }
}
