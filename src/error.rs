use std::fmt;

/// Error type returned by every fallible adapter operation.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("Chat completion API error ({status}): {body}")]
    Transport { status: u16, body: String },
    #[error("No response body from chat completion API")]
    MissingBody,
    #[error("No choices in chat completion response")]
    NoCandidate,
    #[error("Malformed arguments for tool call `{name}`: {source}")]
    MalformedToolArguments {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(
        "{operation} is not supported by the chat completion adapter; use the service's native endpoint instead"
    )]
    UnsupportedOperation { operation: &'static str },
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Failed to decode chat completion response: {0}")]
    Decode(String),
    #[error("Failed to encode chat completion request: {0}")]
    Encode(String),
}

impl AdapterError {
    /// HTTP status reported by the upstream, when the error carries one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            AdapterError::Transport { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the error came from an HTTP exchange rather than from translation.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            AdapterError::Transport { .. }
                | AdapterError::MissingBody
                | AdapterError::Connection(_)
        )
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        AdapterError::Connection(err.to_string())
    }
}

/// A streamed line that could not be decoded as a chunk record.
///
/// Non-fatal: the stream keeps going and the warning is only reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkParseWarning {
    pub line: String,
    pub message: String,
}

impl fmt::Display for ChunkParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error parsing stream chunk: {} (line: {})", self.message, self.line)
    }
}
