//! Executive summary client.
//!
//! Turns an already-selected set of records into narrative prose. Unlike the
//! relevance search this takes an order-preserving truncation, not a random
//! sample, and it works on plain [`StatRecord`]s — the search rationale is
//! an artifact of relevance ranking and never enters the summary payload.

use async_trait::async_trait;
use openai_client::{ChatRequest, Message, OpenAIClient};
use tracing::debug;

use crate::error::SummaryError;
use crate::records::StatRecord;

/// Most records ever included in one summary request.
pub const MAX_SUMMARY_RECORDS: usize = 50;

/// Returned verbatim when there is nothing to summarize; no model call is
/// made in that case.
pub const NO_DATA_MESSAGE: &str = "No data available to generate a summary.";

/// The summary capability, behind a seam for test fakes.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, records: &[StatRecord]) -> Result<String, SummaryError>;
}

/// Summarizer backed by the OpenAI free-text chat API.
pub struct OpenAiSummarizer {
    client: OpenAIClient,
    model: String,
}

impl OpenAiSummarizer {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, records: &[StatRecord]) -> Result<String, SummaryError> {
        if records.is_empty() {
            return Ok(NO_DATA_MESSAGE.to_string());
        }

        let sample = &records[..records.len().min(MAX_SUMMARY_RECORDS)];
        debug!(records = records.len(), sent = sample.len(), "generating summary");

        let prompt = build_prompt(sample);
        let request = ChatRequest::new(&self.model)
            .message(Message::user(prompt))
            .temperature(0.4);

        let response = self
            .client
            .chat_completion(request)
            .await
            .map_err(|e| SummaryError::new(e.to_string()))?;

        Ok(response.content.trim().to_string())
    }
}

fn build_prompt(sample: &[StatRecord]) -> String {
    let records_json = serde_json::to_string(sample).unwrap_or_else(|_| "[]".into());

    format!(
        "You are writing for a security analyst assembling a report. Below is \
         a JSON list of cybersecurity statistics. Write an executive-style \
         summary of them: identify the dominant trend, cite concrete figures, \
         synthesize rather than list, and adopt a forward-looking tone. Format \
         the result as short paragraphs or bullet points.\n\nStatistics:\n{records_json}"
    )
}
