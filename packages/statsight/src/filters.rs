//! Browse-view filter engine.
//!
//! Pure, synchronous, and re-derived from scratch whenever the selection
//! changes. Facet semantics: OR within a facet (an empty selection passes
//! every record), AND across facets, AND the free-text term match.

use std::collections::BTreeSet;

use chrono::NaiveDate;

use crate::records::StatRecord;

/// Distinct facet values derivable from a dataset.
///
/// `topics` and `companies` are sorted lexicographically ascending. `dates`
/// are sorted most recent first by parsed calendar value; strings that do
/// not parse as a date sort after every parseable one, ordered by their raw
/// value ascending, so the whole ordering is a stable total order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub topics: Vec<String>,
    pub companies: Vec<String>,
    pub dates: Vec<String>,
}

/// Active facet selections plus the free-text term. All empty by default:
/// no filters means show everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub topics: BTreeSet<String>,
    pub companies: BTreeSet<String>,
    pub dates: BTreeSet<String>,
    pub term: String,
}

impl FilterSelection {
    /// Add the value to the set if absent, remove it if present.
    pub fn toggle_topic(&mut self, value: &str) {
        toggle(&mut self.topics, value);
    }

    pub fn toggle_company(&mut self, value: &str) {
        toggle(&mut self.companies, value);
    }

    pub fn toggle_date(&mut self, value: &str) {
        toggle(&mut self.dates, value);
    }

    /// Back to the no-filter state.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
            && self.companies.is_empty()
            && self.dates.is_empty()
            && self.term.is_empty()
    }
}

fn toggle(set: &mut BTreeSet<String>, value: &str) {
    if !set.remove(value) {
        set.insert(value.to_string());
    }
}

/// Derive the selectable facet values from the dataset.
///
/// Empty field values are skipped, so an empty dataset yields empty facets
/// rather than an error.
pub fn derive_facets(records: &[StatRecord]) -> FilterOptions {
    let mut topics = BTreeSet::new();
    let mut companies = BTreeSet::new();
    let mut dates = BTreeSet::new();

    for record in records {
        if !record.topic.is_empty() {
            topics.insert(record.topic.clone());
        }
        if !record.company.is_empty() {
            companies.insert(record.company.clone());
        }
        if !record.date.is_empty() {
            dates.insert(record.date.clone());
        }
    }

    let mut dates: Vec<String> = dates.into_iter().collect();
    dates.sort_by(|a, b| compare_dates_desc(a, b));

    FilterOptions {
        topics: topics.into_iter().collect(),
        companies: companies.into_iter().collect(),
        dates,
    }
}

/// Compute the currently visible subset. A record is included iff it passes
/// every facet predicate and the term predicate; input order is preserved.
///
/// The term is trimmed before matching, so a whitespace-only term behaves
/// like the empty term and surrounding whitespace never has to match the
/// record text.
pub fn apply_filters<'a>(
    records: &'a [StatRecord],
    selection: &FilterSelection,
) -> Vec<&'a StatRecord> {
    let term = selection.term.trim().to_lowercase();

    records
        .iter()
        .filter(|r| facet_passes(&selection.topics, &r.topic))
        .filter(|r| facet_passes(&selection.companies, &r.company))
        .filter(|r| facet_passes(&selection.dates, &r.date))
        .filter(|r| term.is_empty() || term_matches(r, &term))
        .collect()
}

fn facet_passes(selected: &BTreeSet<String>, value: &str) -> bool {
    selected.is_empty() || selected.contains(value)
}

fn term_matches(record: &StatRecord, lowercase_term: &str) -> bool {
    [
        &record.stat,
        &record.resource_name,
        &record.company,
        &record.topic,
        &record.technology,
    ]
    .iter()
    .any(|field| field.to_lowercase().contains(lowercase_term))
}

/// Most recent parsed date first; unparseable values sort after all
/// parseable ones, by raw string ascending. Raw string breaks ties between
/// distinct spellings of the same calendar day.
fn compare_dates_desc(a: &str, b: &str) -> std::cmp::Ordering {
    match (parse_display_date(a), parse_display_date(b)) {
        (Some(da), Some(db)) => db.cmp(&da).then_with(|| a.cmp(b)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Best-effort parse of a free-form display date. Handles the formats seen
/// in the dataset; month-only and year-only values resolve to their first
/// day so they still order sensibly.
pub(crate) fn parse_display_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    const DAY_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d", "%B %d, %Y", "%d %B %Y"];
    for format in DAY_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    // "March 2024" and similar month-granularity values
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{raw} 1"), "%B %Y %d") {
        return Some(date);
    }

    // Bare year
    if raw.len() == 4 {
        if let Ok(year) = raw.parse::<i32>() {
            return NaiveDate::from_ymd_opt(year, 1, 1);
        }
    }

    None
}
