//! Named features a provider or model supports.

use serde::{Deserialize, Serialize};

/// A named feature a model or provider supports.
///
/// Capability names render in snake_case (e.g. `function_calling`), both in
/// serialized form and in routing rejection reasons such as
/// `missing-capability:vision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Streaming,
    Vision,
    FunctionCalling,
    Embeddings,
    LongContext,
    Reasoning,
    StructuredOutput,
}

impl Capability {
    /// Stable snake_case name, matching the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Streaming => "streaming",
            Capability::Vision => "vision",
            Capability::FunctionCalling => "function_calling",
            Capability::Embeddings => "embeddings",
            Capability::LongContext => "long_context",
            Capability::Reasoning => "reasoning",
            Capability::StructuredOutput => "structured_output",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::Capability;

    #[test]
    fn display_matches_serialized_form() {
        let json = serde_json::to_string(&Capability::FunctionCalling).unwrap();
        assert_eq!(json, "\"function_calling\"");
        assert_eq!(Capability::FunctionCalling.to_string(), "function_calling");
    }
}
