//! Generative-text collaborator.
//!
//! Treated as a black box: prompt in, JSON out (or failure). Typed decoding
//! happens on this side of the seam via [`generate_typed`].

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CollaboratorError, CollaboratorResult};

/// Which pass a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GenerationTask {
    /// Last-resort URL and contact synthesis
    Discovery,
    Contacts,
    Rules,
    Facilities,
    Audit,
}

impl GenerationTask {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Contacts => "contacts",
            Self::Rules => "rules",
            Self::Facilities => "facilities",
            Self::Audit => "audit",
        }
    }
}

impl fmt::Display for GenerationTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A constrained-output generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub task: GenerationTask,
    pub prompt: String,
    pub temperature: f32,

    /// JSON schema the reply must follow, when the service supports it.
    pub schema: Option<Value>,
}

impl GenerationRequest {
    pub fn new(task: GenerationTask, prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            task,
            prompt: prompt.into(),
            temperature,
            schema: None,
        }
    }

    pub fn with_schema(mut self, schema: Value) -> Self {
        self.schema = Some(schema);
        self
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    /// Run the prompt and return the parsed JSON reply.
    async fn generate(&self, request: &GenerationRequest) -> CollaboratorResult<Value>;
}

/// Generate and decode into `T`. A shape mismatch is a `Malformed` error.
pub async fn generate_typed<T, G>(generator: &G, request: &GenerationRequest) -> CollaboratorResult<T>
where
    T: DeserializeOwned,
    G: Generator + ?Sized,
{
    let value = generator.generate(request).await?;
    serde_json::from_value(value).map_err(|e| CollaboratorError::malformed("generator", e))
}

/// Parse a JSON object out of raw model text.
///
/// Strips markdown fences and falls back to the outermost `{...}` span.
pub fn parse_json_reply(text: &str) -> CollaboratorResult<Value> {
    let trimmed = text
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Ok(value);
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => serde_json::from_str(&trimmed[start..=end])
            .map_err(|e| CollaboratorError::malformed("generator", e)),
        _ => Err(CollaboratorError::malformed(
            "generator",
            "no JSON object in reply",
        )),
    }
}
