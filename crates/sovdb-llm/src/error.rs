use thiserror::Error;

/// Errors returned by the completion-API client.
#[derive(Debug, Error)]
pub enum LlmError {
    /// No API key configured; the caller should surface "LLM unavailable".
    #[error("completion API key is not configured")]
    MissingApiKey,

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The completion API returned a non-2xx status with a message.
    #[error("completion API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
