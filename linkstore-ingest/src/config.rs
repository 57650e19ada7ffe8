use serde::{Deserialize, Serialize};

/// Where the decode+write loop runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestMode {
    /// On the blocking thread pool, off the caller's task.
    #[default]
    Background,
    /// On the caller's thread. Deterministic; meant for tests.
    Inline,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub mode: IngestMode,
}

impl IngestConfig {
    pub fn inline() -> Self {
        Self {
            mode: IngestMode::Inline,
        }
    }
}
