//! Research assistant core for a curated table of cybersecurity statistics.
//!
//! Analysts browse the table through facet filters and a free-text term, ask
//! an LLM to pull out the subset relevant to a research question, and
//! optionally have the selected statistics summarized into executive prose.
//! The [`coordinator::Coordinator`] owns all of that session state; the
//! other modules are the pieces it orchestrates:
//!
//! - [`store`] — one-shot dataset load from the remote table.
//! - [`filters`] — pure facet derivation and filtering.
//! - [`search`] — LLM relevance search with a schema-constrained response.
//! - [`summary`] — LLM executive-summary generation.
//!
//! Rendering, storage, and the LLM provider itself are external
//! collaborators reached through the trait seams in those modules.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod filters;
pub mod records;
pub mod search;
pub mod store;
pub mod summary;

pub use config::Config;
pub use coordinator::{ActiveView, Coordinator, DetailSelection, OpState, SummaryView};
pub use error::{DataLoadError, SearchError, SummaryError};
pub use filters::{apply_filters, derive_facets, FilterOptions, FilterSelection};
pub use records::{AiResult, StatRecord};
pub use search::{OpenAiRelevanceSearch, RelevanceSearch, Sampler, UniformSampler, MAX_SEARCH_CORPUS};
pub use store::{DatasetStore, HttpDatasetStore};
pub use summary::{OpenAiSummarizer, Summarizer, MAX_SUMMARY_RECORDS, NO_DATA_MESSAGE};
