use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("AI provider error: {0}")]
    AiProviderError(String),

    #[error("API error ({status}): {body}")]
    ApiStatus { status: u16, body: String },

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Script host error: {0}")]
    ScriptHostError(String),

    #[error("History error: {0}")]
    HistoryError(String),

    #[error("Could not extract a fixed script from the reply:\n\n{0}")]
    ExtractionError(String),

    #[error("Timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

// Tauri requires command errors to be Serialize; the Display string is what the UI shows.
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
