//! Overview narrative generation.
//!
//! The engine decides every fact in a summary; a generator only words the overview paragraph from
//! a prepared [`NarrativeRequest`]. [`TemplateGenerator`] is deterministic and never fails.
//! [`RemoteGenerator`] asks an OpenAI-compatible chat-completions endpoint and reports any failure
//! as [`SummaryError::GenerationUnavailable`](crate::SummaryError::GenerationUnavailable).

mod prompts;
mod remote;
mod template;

pub use remote::{RemoteGenerator, RemoteSettings};
pub use template::TemplateGenerator;

use crate::SummaryResult;
use async_trait::async_trait;
use serde::Serialize;
use summary_types::{Audience, SummaryLength};

/// Facts the overview is written from, already filtered and worded for the audience.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct NarrativeRequest {
    pub audience: Audience,
    pub length: SummaryLength,
    pub demographics: String,
    pub chief_complaint: Option<String>,
    pub routine_visit: bool,
    pub problems: Vec<String>,
    pub worsening: Vec<String>,
    pub medication_count: usize,
    pub allergies: Vec<String>,
    pub no_known_allergies: bool,
    pub critical_findings: usize,
    pub findings: usize,
    pub pending: usize,
    pub actions: usize,
    pub urgent_actions: usize,
    /// Request-scoped seed derived from the content hash of the request.
    #[serde(skip)]
    pub seed: u64,
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    /// Stable identifier, part of the cache key.
    fn id(&self) -> &str;

    async fn overview(&self, request: &NarrativeRequest) -> SummaryResult<String>;
}
