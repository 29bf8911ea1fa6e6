//! DeepSeek chat model metadata

use serde::Serialize;

/// Model that always runs in thinking mode
pub const REASONER_MODEL: &str = "deepseek-reasoner";

/// Input/output modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
    Document,
}

/// Optional model capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Reasoning,
    ToolCalling,
    StructuredOutputs,
}

/// USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pricing {
    pub input: f64,
    pub cached_input: f64,
    pub output: f64,
}

/// Static description of a chat model
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelMeta {
    pub name: &'static str,
    pub context_window: u32,
    pub input: &'static [Modality],
    pub output: &'static [Modality],
    pub capabilities: &'static [Capability],
    pub pricing: Pricing,
}

impl ModelMeta {
    #[must_use]
    pub fn supports_input(&self, modality: Modality) -> bool {
        self.input.contains(&modality)
    }

    #[must_use]
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Look up a model by its identifier
    #[must_use]
    pub fn find(name: &str) -> Option<&'static Self> {
        MODELS.iter().find(|meta| meta.name == name)
    }
}

const DEEPSEEK_V3: ModelMeta = ModelMeta {
    name: "deepseek-chat",
    context_window: 65_536,
    input: &[Modality::Text, Modality::Image],
    output: &[Modality::Text],
    capabilities: &[Capability::Reasoning, Capability::ToolCalling],
    pricing: Pricing {
        input: 0.14,
        cached_input: 0.014,
        output: 0.28,
    },
};

const DEEPSEEK_REASONER: ModelMeta = ModelMeta {
    name: REASONER_MODEL,
    context_window: 65_536,
    input: &[Modality::Text, Modality::Image],
    output: &[Modality::Text],
    capabilities: &[Capability::Reasoning],
    pricing: Pricing {
        input: 0.55,
        cached_input: 0.055,
        output: 2.19,
    },
};

const DEEPSEEK_CODER: ModelMeta = ModelMeta {
    name: "deepseek-coder",
    context_window: 163_840,
    input: &[Modality::Text],
    output: &[Modality::Text],
    capabilities: &[Capability::StructuredOutputs, Capability::ToolCalling],
    pricing: Pricing {
        input: 0.14,
        cached_input: 0.014,
        output: 0.28,
    },
};

/// All supported chat models
pub const MODELS: &[ModelMeta] = &[DEEPSEEK_V3, DEEPSEEK_REASONER, DEEPSEEK_CODER];

/// Supported chat model identifiers, in table order
pub const DEEPSEEK_CHAT_MODELS: &[&str] = &[
    DEEPSEEK_V3.name,
    DEEPSEEK_REASONER.name,
    DEEPSEEK_CODER.name,
];
