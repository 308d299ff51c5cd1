//! Last-resort URL and contact synthesis.
//!
//! Everything returned here is a hypothesis. Candidate URLs are probed before
//! they are fetched, and the contact and fine fields only ever fill gaps.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::agents::prompts;
use crate::agents::schema::{schema_value, DiscoveryReply};
use crate::audit::{EntryStatus, VerificationLog};
use crate::error::CollaboratorError;
use crate::retry::{retry_when, RetryPolicy};
use crate::traits::generator::{generate_typed, GenerationRequest, GenerationTask, Generator};
use crate::types::place::Place;

const STAGE: &str = "discovery";

/// Cleaned discovery reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryHints {
    pub website_url: Option<String>,
    pub department_name: Option<String>,
    pub phone: Option<String>,
    /// Only absolute http(s) URLs survive
    pub candidate_urls: Vec<Url>,
    pub fine_amount: Option<String>,
    pub fine_citation: Option<String>,
}

impl From<DiscoveryReply> for DiscoveryHints {
    fn from(reply: DiscoveryReply) -> Self {
        let candidate_urls = reply
            .candidate_urls
            .iter()
            .filter_map(|raw| Url::parse(raw).ok())
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .collect();
        Self {
            website_url: reply.website_url,
            department_name: reply.department_name,
            phone: reply.official_phone,
            candidate_urls,
            fine_amount: reply.illegal_dumping_fine,
            fine_citation: reply.illegal_dumping_citation,
        }
    }
}

/// Ask the generator for candidate sources. `None` when it cannot answer.
pub async fn discover(
    generator: &dyn Generator,
    place: &Place,
    temperature: f32,
    retry: &RetryPolicy,
    log: &VerificationLog,
) -> Option<DiscoveryHints> {
    let request = &GenerationRequest::new(GenerationTask::Discovery, prompts::discovery(place), temperature)
        .with_schema(schema_value::<DiscoveryReply>());

    let reply = retry_when(retry, "discovery", CollaboratorError::is_transient, |_| async move {
        generate_typed::<DiscoveryReply, _>(generator, request).await
    })
    .await;

    match reply {
        Ok(reply) => {
            let hints = DiscoveryHints::from(reply);
            log.record(
                STAGE,
                EntryStatus::Success,
                format!("{} candidate URLs for {place}", hints.candidate_urls.len()),
            );
            Some(hints)
        }
        Err(e) => {
            log.record(STAGE, EntryStatus::Failed, format!("no discovery for {place}: {e}"));
            None
        }
    }
}
