//! Request categories with their own routing preferences.

use serde::{Deserialize, Serialize};

/// A request category. Each profile carries an ordered provider/model
/// preference list per use case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    Chat,
    Code,
    Reasoning,
    Embedding,
}

impl UseCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::Chat => "chat",
            UseCase::Code => "code",
            UseCase::Reasoning => "reasoning",
            UseCase::Embedding => "embedding",
        }
    }
}

impl std::fmt::Display for UseCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UseCase {
    type Err = UnknownUseCase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chat" => Ok(UseCase::Chat),
            "code" => Ok(UseCase::Code),
            "reasoning" => Ok(UseCase::Reasoning),
            "embedding" => Ok(UseCase::Embedding),
            other => Err(UnknownUseCase(other.to_string())),
        }
    }
}

/// Parse failure for a use-case name.
#[derive(Debug, thiserror::Error)]
#[error("unknown use case: {0}")]
pub struct UnknownUseCase(pub String);
