//! Record types for the statistics dataset.

use serde::{Deserialize, Deserializer, Serialize};

/// One statistic entry as stored in the remote table.
///
/// `stat` and `resource_name` are expected to be populated; every other
/// column may be missing, null, or an empty string, and all three cases read
/// back as `""`. An empty field means "absent", never an error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatRecord {
    /// Free-form display date; not guaranteed parseable for every row.
    #[serde(deserialize_with = "null_as_empty")]
    pub date: String,

    /// Publisher name.
    #[serde(deserialize_with = "null_as_empty")]
    pub company: String,

    /// Category tag.
    #[serde(deserialize_with = "null_as_empty")]
    pub topic: String,

    /// Technology tag.
    #[serde(deserialize_with = "null_as_empty")]
    pub technology: String,

    /// Source URL, possibly empty.
    #[serde(deserialize_with = "null_as_empty")]
    pub source: String,

    /// The statistic text itself; primary display content.
    #[serde(deserialize_with = "null_as_empty")]
    pub stat: String,

    /// Title of the originating resource.
    #[serde(deserialize_with = "null_as_empty")]
    pub resource_name: String,
}

/// A record the relevance search selected, annotated with the model's
/// one-sentence justification. Transient: dropped when the search is
/// cleared or re-run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResult {
    pub record: StatRecord,
    pub reason: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
