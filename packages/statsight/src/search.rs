//! Relevance search client.
//!
//! Sends the analyst's free-text query plus a bounded sample of the dataset
//! to the LLM and parses back a schema-constrained list of relevant records,
//! each annotated with a one-sentence rationale.
//!
//! Degradation contract: a blank model response and a parsed-but-non-array
//! payload both come back as zero results, not errors — malformed but
//! recoverable model output reads as "no results found". Transport failures
//! and unparseable JSON surface as [`SearchError`] for a user-initiated
//! retry; there are no internal retries.

use async_trait::async_trait;
use openai_client::{OpenAIClient, StructuredOutput, StructuredRequest};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::SearchError;
use crate::records::{AiResult, StatRecord};

/// Largest corpus ever sent to the model in one search request.
pub const MAX_SEARCH_CORPUS: usize = 200;

/// The relevance search capability, behind a seam so the coordinator can be
/// driven by a fake in tests.
#[async_trait]
pub trait RelevanceSearch: Send + Sync {
    /// Precondition: `query` is non-blank; the coordinator enforces this
    /// before calling.
    async fn search(
        &self,
        query: &str,
        corpus: &[StatRecord],
    ) -> Result<Vec<AiResult>, SearchError>;
}

/// Draws `count` distinct indices from `0..population`. Injectable so tests
/// can pin the selection.
pub trait Sampler: Send + Sync {
    fn sample(&self, population: usize, count: usize) -> Vec<usize>;
}

/// Uniform sampling without replacement.
pub struct UniformSampler;

impl Sampler for UniformSampler {
    fn sample(&self, population: usize, count: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut rand::thread_rng(), population, count).into_vec()
    }
}

/// Relevance search backed by the OpenAI structured-output API.
pub struct OpenAiRelevanceSearch {
    client: OpenAIClient,
    model: String,
    sampler: Box<dyn Sampler>,
}

impl OpenAiRelevanceSearch {
    pub fn new(client: OpenAIClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            sampler: Box::new(UniformSampler),
        }
    }

    /// Replace the corpus sampler.
    pub fn with_sampler(mut self, sampler: Box<dyn Sampler>) -> Self {
        self.sampler = sampler;
        self
    }

    /// Full corpus up to [`MAX_SEARCH_CORPUS`] records; beyond that, a
    /// random sample of exactly that many, re-ordered to input order.
    fn bounded_corpus<'a>(&self, corpus: &'a [StatRecord]) -> Vec<&'a StatRecord> {
        if corpus.len() <= MAX_SEARCH_CORPUS {
            return corpus.iter().collect();
        }

        let mut indices = self.sampler.sample(corpus.len(), MAX_SEARCH_CORPUS);
        indices.sort_unstable();
        indices.into_iter().map(|i| &corpus[i]).collect()
    }
}

#[async_trait]
impl RelevanceSearch for OpenAiRelevanceSearch {
    async fn search(
        &self,
        query: &str,
        corpus: &[StatRecord],
    ) -> Result<Vec<AiResult>, SearchError> {
        let sample = self.bounded_corpus(corpus);
        debug!(
            query,
            corpus = corpus.len(),
            sent = sample.len(),
            "running relevance search"
        );

        let request = build_request(&self.model, query, &sample);

        let text = self
            .client
            .structured_output(request)
            .await
            .map_err(|e| SearchError::new(e.to_string()))?;

        parse_results(&text)
    }
}

/// Wire shape of the structured response. Strict mode requires an
/// object-rooted schema, so the selected entries ride under one key.
#[derive(Debug, Deserialize, JsonSchema)]
struct RelevantEntries {
    entries: Vec<RelevantEntry>,
}

/// Wire shape of one selected entry. `stat`, `resourceName`, and `reason`
/// are required; the rest mirror the optional dataset columns.
#[derive(Debug, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
struct RelevantEntry {
    stat: String,
    resource_name: String,
    reason: String,
    date: Option<String>,
    company: Option<String>,
    topic: Option<String>,
    technology: Option<String>,
    source: Option<String>,
}

impl From<RelevantEntry> for AiResult {
    fn from(entry: RelevantEntry) -> Self {
        AiResult {
            record: StatRecord {
                date: entry.date.unwrap_or_default(),
                company: entry.company.unwrap_or_default(),
                topic: entry.topic.unwrap_or_default(),
                technology: entry.technology.unwrap_or_default(),
                source: entry.source.unwrap_or_default(),
                stat: entry.stat,
                resource_name: entry.resource_name,
            },
            reason: entry.reason,
        }
    }
}

fn build_request(model: &str, query: &str, sample: &[&StatRecord]) -> StructuredRequest {
    let (system, user) = build_prompts(query, sample);
    StructuredRequest::new(model, system, user, RelevantEntries::openai_schema())
}

fn build_prompts(query: &str, sample: &[&StatRecord]) -> (String, String) {
    let system = "You are a research assistant helping a security analyst find \
        supporting statistics. Interpret the analyst's query, then select only \
        the entries from the provided JSON list that are genuinely relevant to \
        it by keyword, topic, or concept. For each selected entry, copy its \
        fields through unchanged and add a one-sentence reason explaining why \
        it is relevant. If nothing matches, return an empty entry list; never \
        invent entries that are not in the list."
        .to_string();

    let corpus_json = serde_json::to_string(sample).unwrap_or_else(|_| "[]".into());
    let user = format!("Query: {query}\n\nEntries:\n{corpus_json}");

    (system, user)
}

fn parse_results(text: &str) -> Result<Vec<AiResult>, SearchError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(Vec::new());
    }

    let mut value: Value = serde_json::from_str(text)
        .map_err(|e| SearchError::new(format!("model returned invalid JSON: {e}")))?;

    // Unwrap the schema's root object; a bare array is accepted as-is.
    if let Some(entries) = value.get_mut("entries").map(Value::take) {
        value = entries;
    }

    if !value.is_array() {
        warn!("relevance search returned a non-array payload; treating as no results");
        return Ok(Vec::new());
    }

    let entries: Vec<RelevantEntry> = serde_json::from_value(value)
        .map_err(|e| SearchError::new(format!("model returned malformed entries: {e}")))?;

    let total = entries.len();
    let results: Vec<AiResult> = entries
        .into_iter()
        .filter(|e| !e.stat.is_empty() && !e.resource_name.is_empty() && !e.reason.is_empty())
        .map(AiResult::from)
        .collect();

    let dropped = total - results.len();
    if dropped > 0 {
        warn!(dropped, "dropping entries with blank required fields");
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_corpus(n: usize) -> Vec<StatRecord> {
        (0..n)
            .map(|i| StatRecord {
                stat: format!("stat {i}"),
                resource_name: format!("resource {i}"),
                ..Default::default()
            })
            .collect()
    }

    struct FirstN;

    impl Sampler for FirstN {
        fn sample(&self, _population: usize, count: usize) -> Vec<usize> {
            (0..count).collect()
        }
    }

    fn search_client() -> OpenAiRelevanceSearch {
        OpenAiRelevanceSearch::new(OpenAIClient::new("sk-test"), "gpt-4o-mini")
    }

    #[test]
    fn small_corpus_is_sent_whole() {
        let corpus = make_corpus(MAX_SEARCH_CORPUS);
        let sent = search_client().bounded_corpus(&corpus);

        assert_eq!(sent.len(), MAX_SEARCH_CORPUS);
        assert_eq!(sent[0].stat, "stat 0");
        assert_eq!(sent[199].stat, "stat 199");
    }

    #[test]
    fn oversized_corpus_is_sampled_to_exactly_the_cap() {
        let corpus = make_corpus(MAX_SEARCH_CORPUS + 37);
        let sent = search_client().bounded_corpus(&corpus);

        assert_eq!(sent.len(), MAX_SEARCH_CORPUS);
        let distinct: std::collections::BTreeSet<&str> =
            sent.iter().map(|r| r.stat.as_str()).collect();
        assert_eq!(distinct.len(), MAX_SEARCH_CORPUS, "sampling is without replacement");
    }

    #[test]
    fn injected_sampler_pins_the_selection() {
        let corpus = make_corpus(500);
        let sent = search_client()
            .with_sampler(Box::new(FirstN))
            .bounded_corpus(&corpus);

        assert_eq!(sent.len(), MAX_SEARCH_CORPUS);
        assert_eq!(sent[0].stat, "stat 0");
        assert_eq!(sent[199].stat, "stat 199");
    }

    #[test]
    fn prompt_embeds_query_and_every_sampled_record() {
        let corpus = make_corpus(3);
        let sample: Vec<&StatRecord> = corpus.iter().collect();
        let (system, user) = build_prompts("phishing trends", &sample);

        assert!(system.contains("return an empty entry list"));
        assert!(user.contains("Query: phishing trends"));
        for record in &corpus {
            assert!(user.contains(&record.stat));
        }
    }

    #[test]
    fn outbound_request_schema_is_object_rooted() {
        let corpus = make_corpus(2);
        let sample: Vec<&StatRecord> = corpus.iter().collect();
        let request = build_request("gpt-4o-mini", "phishing", &sample);
        let body = serde_json::to_value(&request).unwrap();
        let schema = &body["response_format"]["json_schema"]["schema"];

        // Strict mode rejects any other root type before the model runs
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["properties"]["entries"]["type"], "array");
        assert_eq!(body["response_format"]["json_schema"]["strict"], true);
    }

    #[test]
    fn blank_response_is_zero_results() {
        assert!(parse_results("").unwrap().is_empty());
        assert!(parse_results("   \n").unwrap().is_empty());
    }

    #[test]
    fn non_array_json_degrades_to_zero_results() {
        assert!(parse_results(r#"{"results": []}"#).unwrap().is_empty());
        assert!(parse_results(r#"{"entries": "none"}"#).unwrap().is_empty());
        assert!(parse_results("\"no matches\"").unwrap().is_empty());
    }

    #[test]
    fn object_wrapped_entries_parse_into_results() {
        let results = parse_results(
            r#"{"entries": [{
                "stat": "Average ransom demand reached $2.3M",
                "resourceName": "Report B",
                "reason": "Quantifies ransomware cost."
            }]}"#,
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.resource_name, "Report B");
    }

    #[test]
    fn invalid_json_is_a_search_error() {
        let err = parse_results("not json at all").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to get a response from the AI. Please try again."
        );
    }

    #[test]
    fn well_formed_array_parses_into_results() {
        let results = parse_results(
            r#"[{
                "stat": "60% of breaches involve phishing",
                "resourceName": "Report A",
                "reason": "Directly cites phishing prevalence.",
                "company": "Acme",
                "topic": "Phishing",
                "date": null,
                "technology": null,
                "source": null
            }]"#,
        )
        .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].record.resource_name, "Report A");
        assert_eq!(results[0].record.date, "");
        assert_eq!(results[0].reason, "Directly cites phishing prevalence.");
    }

    #[test]
    fn entries_missing_required_text_are_dropped() {
        let results = parse_results(
            r#"[{"stat": "", "resourceName": "Report A", "reason": "r"}]"#,
        )
        .unwrap();

        assert!(results.is_empty());
    }
}
