//! View coordinator.
//!
//! Owns all session state and decides which of the three views — filtered
//! browse, AI search results, single-record detail overlay — is showing.
//! Each asynchronous operation (dataset load, relevance search, summary) is
//! tracked as one composite [`OpState`] value, so "loading with an error
//! set" and similar illegal flag combinations cannot be represented.
//!
//! Async operations run in two phases: `begin_*` performs admission control
//! and hands back an epoch ticket, `finish_*` applies the completion only if
//! the ticket is still current. A completion that lands after the user has
//! cleared or restarted the operation carries a stale ticket and is dropped
//! on the floor. The `submit_query` / `generate_summary` / `load` wrappers
//! drive both phases around the actual client call.

use tracing::{debug, warn};

use crate::filters::{self, FilterOptions, FilterSelection};
use crate::records::{AiResult, StatRecord};
use crate::search::RelevanceSearch;
use crate::store::DatasetStore;
use crate::summary::Summarizer;

/// Composite state of one asynchronous operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpState<T, E> {
    Idle,
    Loading,
    Ready(T),
    Failed(E),
}

impl<T, E> Default for OpState<T, E> {
    fn default() -> Self {
        OpState::Idle
    }
}

impl<T, E> OpState<T, E> {
    pub fn is_idle(&self) -> bool {
        matches!(self, OpState::Idle)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, OpState::Loading)
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            OpState::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&E> {
        match self {
            OpState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Which of the mutually exclusive screens is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveView {
    /// Startup: dataset not loaded yet
    Loading,
    /// Dataset load failed; terminal for the session
    LoadFailed,
    /// Filtered browse over the full dataset
    Browse,
    /// Relevance search in flight
    Searching,
    /// Relevance search failed; retry by resubmitting
    SearchFailed,
    /// AI-curated result set, possibly empty
    Results,
}

/// Sub-state of the summary panel, meaningful only on the results view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryView {
    Hidden,
    Generating,
    Ready(String),
    Failed(String),
}

/// Record chosen for the detail overlay, carrying the search rationale when
/// it was opened from a result card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailSelection {
    pub record: StatRecord,
    pub reason: Option<String>,
}

/// Ties an in-flight search to the submission that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket(u64);

/// Ties an in-flight summary to the request that started it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryTicket(u64);

/// Orchestrates the three data views and all user actions.
#[derive(Debug, Default)]
pub struct Coordinator {
    dataset: OpState<Vec<StatRecord>, String>,
    selection: FilterSelection,
    query: String,
    search: OpState<Vec<AiResult>, String>,
    search_epoch: u64,
    summary: OpState<String, String>,
    summary_epoch: u64,
    detail: Option<DetailSelection>,
}

impl Coordinator {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Dataset load
    // ------------------------------------------------------------------

    /// Load the dataset; a no-op on every call after the first. A failed
    /// load is terminal for the session.
    pub async fn load(&mut self, store: &dyn DatasetStore) {
        if !self.dataset.is_idle() {
            return;
        }
        self.dataset = OpState::Loading;

        match store.load().await {
            Ok(rows) => {
                debug!(rows = rows.len(), "dataset ready");
                self.dataset = OpState::Ready(rows);
            }
            Err(e) => {
                warn!(error = %e, "dataset load failed");
                self.dataset = OpState::Failed(e.to_string());
            }
        }
    }

    // ------------------------------------------------------------------
    // Browse view: facets and filtering
    // ------------------------------------------------------------------

    pub fn facets(&self) -> FilterOptions {
        self.dataset
            .value()
            .map(|rows| filters::derive_facets(rows))
            .unwrap_or_default()
    }

    /// Records passing the current facet and term filters, in dataset order.
    pub fn visible_records(&self) -> Vec<&StatRecord> {
        self.dataset
            .value()
            .map(|rows| filters::apply_filters(rows, &self.selection))
            .unwrap_or_default()
    }

    pub fn toggle_topic(&mut self, value: &str) {
        self.selection.toggle_topic(value);
    }

    pub fn toggle_company(&mut self, value: &str) {
        self.selection.toggle_company(value);
    }

    pub fn toggle_date(&mut self, value: &str) {
        self.selection.toggle_date(value);
    }

    pub fn set_term(&mut self, term: &str) {
        self.selection.term = term.to_string();
    }

    pub fn reset_filters(&mut self) {
        self.selection.reset();
    }

    pub fn selection(&self) -> &FilterSelection {
        &self.selection
    }

    // ------------------------------------------------------------------
    // Relevance search
    // ------------------------------------------------------------------

    /// Admit a search submission. Returns `None` — leaving every piece of
    /// state untouched — when the query is blank, the dataset is not loaded,
    /// or a search is already in flight. On admission any prior results are
    /// discarded immediately and the summary panel resets.
    pub fn begin_search(&mut self, query: &str) -> Option<SearchTicket> {
        let query = query.trim();
        if query.is_empty() || self.dataset.value().is_none() || self.search.is_loading() {
            return None;
        }

        self.query = query.to_string();
        self.search = OpState::Loading;
        self.summary = OpState::Idle;
        self.search_epoch += 1;
        self.summary_epoch += 1;
        Some(SearchTicket(self.search_epoch))
    }

    /// Apply a search completion. Stale tickets — anything issued before the
    /// latest clear or resubmission — are discarded.
    pub fn finish_search(
        &mut self,
        ticket: SearchTicket,
        outcome: Result<Vec<AiResult>, crate::error::SearchError>,
    ) {
        if ticket.0 != self.search_epoch || !self.search.is_loading() {
            debug!("discarding stale search completion");
            return;
        }

        self.search = match outcome {
            Ok(results) => {
                debug!(results = results.len(), "search succeeded");
                OpState::Ready(results)
            }
            Err(e) => {
                warn!(cause = e.cause(), "search failed");
                OpState::Failed(e.to_string())
            }
        };
    }

    /// Submit a query end to end. Returns `false` when the submission was
    /// rejected by admission control.
    pub async fn submit_query(&mut self, query: &str, search: &dyn RelevanceSearch) -> bool {
        let Some(ticket) = self.begin_search(query) else {
            return false;
        };

        let outcome = {
            let corpus = self.dataset.value().map(Vec::as_slice).unwrap_or(&[]);
            search.search(&self.query, corpus).await
        };

        self.finish_search(ticket, outcome);
        true
    }

    /// Drop the AI result set and return to the browse view. Also resets the
    /// query and the summary panel; an in-flight search or summary
    /// completion becomes stale.
    pub fn clear_search(&mut self) {
        self.query.clear();
        self.search = OpState::Idle;
        self.summary = OpState::Idle;
        self.search_epoch += 1;
        self.summary_epoch += 1;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn search_results(&self) -> Option<&[AiResult]> {
        self.search.value().map(Vec::as_slice)
    }

    pub fn search_error(&self) -> Option<&str> {
        self.search.error().map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Summary panel
    // ------------------------------------------------------------------

    /// Admit a summary request. Only available while the results view is
    /// showing a non-empty result set and no summary is in flight.
    pub fn begin_summary(&mut self) -> Option<SummaryTicket> {
        if self.summary.is_loading() {
            return None;
        }
        match self.search.value() {
            Some(results) if !results.is_empty() => {}
            _ => return None,
        }

        self.summary = OpState::Loading;
        self.summary_epoch += 1;
        Some(SummaryTicket(self.summary_epoch))
    }

    /// Apply a summary completion, discarding stale tickets.
    pub fn finish_summary(
        &mut self,
        ticket: SummaryTicket,
        outcome: Result<String, crate::error::SummaryError>,
    ) {
        if ticket.0 != self.summary_epoch || !self.summary.is_loading() {
            debug!("discarding stale summary completion");
            return;
        }

        self.summary = match outcome {
            Ok(text) => OpState::Ready(text),
            Err(e) => {
                warn!(cause = e.cause(), "summary generation failed");
                OpState::Failed(e.to_string())
            }
        };
    }

    /// Generate a summary of the current results end to end. The search
    /// rationale is stripped structurally: only the underlying records are
    /// handed to the summarizer.
    pub async fn generate_summary(&mut self, summarizer: &dyn Summarizer) -> bool {
        let Some(ticket) = self.begin_summary() else {
            return false;
        };

        let records: Vec<StatRecord> = self
            .search
            .value()
            .map(|results| results.iter().map(|r| r.record.clone()).collect())
            .unwrap_or_default();

        let outcome = summarizer.summarize(&records).await;
        self.finish_summary(ticket, outcome);
        true
    }

    /// Close the summary panel so it can be regenerated. Ignored while a
    /// generation is in flight.
    pub fn dismiss_summary(&mut self) {
        if !self.summary.is_loading() {
            self.summary = OpState::Idle;
        }
    }

    pub fn summary(&self) -> SummaryView {
        match &self.summary {
            OpState::Idle => SummaryView::Hidden,
            OpState::Loading => SummaryView::Generating,
            OpState::Ready(text) => SummaryView::Ready(text.clone()),
            OpState::Failed(message) => SummaryView::Failed(message.clone()),
        }
    }

    // ------------------------------------------------------------------
    // Detail overlay
    // ------------------------------------------------------------------

    /// Open the single-record overlay. Only honored from the browse and
    /// results views; does not change the active view.
    pub fn open_detail(&mut self, record: StatRecord, reason: Option<String>) {
        if matches!(self.active_view(), ActiveView::Browse | ActiveView::Results) {
            self.detail = Some(DetailSelection { record, reason });
        }
    }

    /// Close the overlay. This is the only way it closes: filter and search
    /// changes leave it alone.
    pub fn close_detail(&mut self) {
        self.detail = None;
    }

    pub fn detail(&self) -> Option<&DetailSelection> {
        self.detail.as_ref()
    }

    // ------------------------------------------------------------------
    // Derived view
    // ------------------------------------------------------------------

    pub fn active_view(&self) -> ActiveView {
        match &self.dataset {
            OpState::Idle | OpState::Loading => ActiveView::Loading,
            OpState::Failed(_) => ActiveView::LoadFailed,
            OpState::Ready(_) => match &self.search {
                OpState::Idle => ActiveView::Browse,
                OpState::Loading => ActiveView::Searching,
                OpState::Failed(_) => ActiveView::SearchFailed,
                OpState::Ready(_) => ActiveView::Results,
            },
        }
    }

    pub fn dataset_error(&self) -> Option<&str> {
        self.dataset.error().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;

    fn loaded_coordinator() -> Coordinator {
        let mut coordinator = Coordinator::new();
        coordinator.dataset = OpState::Ready(vec![StatRecord {
            stat: "60% of breaches involve phishing".into(),
            resource_name: "Report A".into(),
            company: "Acme".into(),
            topic: "Phishing".into(),
            ..Default::default()
        }]);
        coordinator
    }

    fn result(stat: &str) -> AiResult {
        AiResult {
            record: StatRecord {
                stat: stat.into(),
                resource_name: "r".into(),
                ..Default::default()
            },
            reason: "relevant".into(),
        }
    }

    #[test]
    fn starts_loading_then_browses() {
        let coordinator = Coordinator::new();
        assert_eq!(coordinator.active_view(), ActiveView::Loading);

        assert_eq!(loaded_coordinator().active_view(), ActiveView::Browse);
    }

    #[test]
    fn blank_query_is_rejected_without_a_transition() {
        let mut coordinator = loaded_coordinator();

        assert!(coordinator.begin_search("   ").is_none());
        assert_eq!(coordinator.active_view(), ActiveView::Browse);
        assert_eq!(coordinator.query(), "");
    }

    #[test]
    fn search_cannot_start_before_the_dataset_loads() {
        let mut coordinator = Coordinator::new();
        assert!(coordinator.begin_search("phishing").is_none());
    }

    #[test]
    fn duplicate_submission_is_ignored_while_in_flight() {
        let mut coordinator = loaded_coordinator();

        let first = coordinator.begin_search("phishing");
        assert!(first.is_some());
        assert_eq!(coordinator.active_view(), ActiveView::Searching);
        assert!(coordinator.begin_search("ransomware").is_none());
    }

    #[test]
    fn zero_results_is_the_results_view_not_an_error() {
        let mut coordinator = loaded_coordinator();

        let ticket = coordinator.begin_search("quantum").unwrap();
        coordinator.finish_search(ticket, Ok(vec![]));

        assert_eq!(coordinator.active_view(), ActiveView::Results);
        assert_eq!(coordinator.search_results(), Some(&[][..]));
        assert!(coordinator.search_error().is_none());
    }

    #[test]
    fn transport_failure_surfaces_the_fixed_message_and_clear_recovers() {
        let mut coordinator = loaded_coordinator();

        let ticket = coordinator.begin_search("phishing").unwrap();
        coordinator.finish_search(ticket, Err(SearchError::new("boom")));

        assert_eq!(coordinator.active_view(), ActiveView::SearchFailed);
        assert_eq!(
            coordinator.search_error(),
            Some("Failed to get a response from the AI. Please try again.")
        );

        coordinator.clear_search();
        assert_eq!(coordinator.active_view(), ActiveView::Browse);
        assert_eq!(coordinator.query(), "");
    }

    #[test]
    fn resubmission_discards_prior_results_immediately() {
        let mut coordinator = loaded_coordinator();

        let ticket = coordinator.begin_search("phishing").unwrap();
        coordinator.finish_search(ticket, Ok(vec![result("a")]));
        assert_eq!(coordinator.active_view(), ActiveView::Results);

        coordinator.begin_search("ransomware").unwrap();
        assert_eq!(coordinator.active_view(), ActiveView::Searching);
        assert!(coordinator.search_results().is_none());
    }

    #[test]
    fn stale_completion_after_clear_is_discarded() {
        let mut coordinator = loaded_coordinator();

        let ticket = coordinator.begin_search("phishing").unwrap();
        coordinator.clear_search();
        coordinator.finish_search(ticket, Ok(vec![result("late")]));

        assert_eq!(coordinator.active_view(), ActiveView::Browse);
        assert!(coordinator.search_results().is_none());
    }

    #[test]
    fn stale_completion_after_resubmission_is_discarded() {
        let mut coordinator = loaded_coordinator();

        let stale = coordinator.begin_search("phishing").unwrap();
        coordinator.clear_search();
        let current = coordinator.begin_search("ransomware").unwrap();

        coordinator.finish_search(stale, Ok(vec![result("stale")]));
        assert_eq!(coordinator.active_view(), ActiveView::Searching);

        coordinator.finish_search(current, Ok(vec![result("fresh")]));
        assert_eq!(coordinator.search_results().unwrap()[0].record.stat, "fresh");
    }

    #[test]
    fn summary_requires_nonempty_results() {
        let mut coordinator = loaded_coordinator();
        assert!(coordinator.begin_summary().is_none(), "no summary from browse");

        let ticket = coordinator.begin_search("quantum").unwrap();
        coordinator.finish_search(ticket, Ok(vec![]));
        assert!(coordinator.begin_summary().is_none(), "no summary over zero results");
    }

    #[test]
    fn summary_lifecycle_generate_dismiss_regenerate() {
        let mut coordinator = loaded_coordinator();
        let ticket = coordinator.begin_search("phishing").unwrap();
        coordinator.finish_search(ticket, Ok(vec![result("a")]));

        let summary_ticket = coordinator.begin_summary().unwrap();
        assert_eq!(coordinator.summary(), SummaryView::Generating);
        assert!(coordinator.begin_summary().is_none(), "one in flight at a time");

        coordinator.finish_summary(summary_ticket, Ok("Narrative.".into()));
        assert_eq!(coordinator.summary(), SummaryView::Ready("Narrative.".into()));

        coordinator.dismiss_summary();
        assert_eq!(coordinator.summary(), SummaryView::Hidden);
        assert!(coordinator.begin_summary().is_some(), "regeneration allowed");
    }

    #[test]
    fn clearing_search_resets_the_summary_and_stales_its_ticket() {
        let mut coordinator = loaded_coordinator();
        let ticket = coordinator.begin_search("phishing").unwrap();
        coordinator.finish_search(ticket, Ok(vec![result("a")]));

        let summary_ticket = coordinator.begin_summary().unwrap();
        coordinator.clear_search();
        coordinator.finish_summary(summary_ticket, Ok("Late narrative.".into()));

        assert_eq!(coordinator.summary(), SummaryView::Hidden);
    }

    #[test]
    fn detail_overlay_is_orthogonal_to_filters_and_views() {
        let mut coordinator = loaded_coordinator();
        let record = coordinator.visible_records()[0].clone();

        coordinator.open_detail(record.clone(), None);
        assert!(coordinator.detail().is_some());
        assert_eq!(coordinator.active_view(), ActiveView::Browse);

        coordinator.toggle_topic("Phishing");
        coordinator.set_term("breach");
        assert!(coordinator.detail().is_some(), "filter changes never close the overlay");

        coordinator.close_detail();
        assert!(coordinator.detail().is_none());
    }

    #[test]
    fn detail_cannot_open_while_searching() {
        let mut coordinator = loaded_coordinator();
        let record = coordinator.visible_records()[0].clone();
        coordinator.begin_search("phishing").unwrap();

        coordinator.open_detail(record, Some("why".into()));
        assert!(coordinator.detail().is_none());
    }

    #[test]
    fn filter_actions_flow_through_the_engine() {
        let mut coordinator = loaded_coordinator();

        coordinator.set_term("ransomware");
        assert!(coordinator.visible_records().is_empty());

        coordinator.set_term("PHISHING");
        assert_eq!(coordinator.visible_records().len(), 1);

        coordinator.reset_filters();
        assert_eq!(coordinator.visible_records().len(), 1);
        assert!(coordinator.selection().is_empty());
    }

    #[test]
    fn facets_are_empty_until_the_dataset_loads() {
        let coordinator = Coordinator::new();
        assert_eq!(coordinator.facets(), FilterOptions::default());
        assert!(coordinator.visible_records().is_empty());
    }
}
