//! Response body shapes read by the tracing transport
//!
//! Only the counters that end up as span tags are modelled. Missing and
//! `null` fields decode to zero, and zero is treated as "not present".

use serde::{Deserialize, Deserializer};

/// Decode `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Total number of hits, in either of the forms Elasticsearch has used
///
/// Up to 6.x `hits.total` is a plain integer; from 7.x it is an object with
/// a `value` and a `relation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TotalHits {
    Count(i64),
    Object {
        #[serde(default, deserialize_with = "null_as_default")]
        value: i64,
    },
}

impl TotalHits {
    pub fn value(&self) -> i64 {
        match *self {
            TotalHits::Count(value) | TotalHits::Object { value } => value,
        }
    }
}

impl Default for TotalHits {
    fn default() -> Self {
        TotalHits::Count(0)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct Hits {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: TotalHits,
}

#[derive(Debug, Default, Deserialize)]
pub struct Shards {
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: i64,
}

/// Body shape when only hits are tagged
#[derive(Debug, Default, Deserialize)]
pub struct HitsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hits: Hits,
}

/// Body shape when only shards are tagged
#[derive(Debug, Default, Deserialize)]
pub struct ShardsResponse {
    #[serde(default, rename = "_shards", deserialize_with = "null_as_default")]
    pub shards: Shards,
}

/// Body shape when both hits and shards are tagged
#[derive(Debug, Default, Deserialize)]
pub struct HitsAndShardsResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    pub hits: Hits,
    #[serde(default, rename = "_shards", deserialize_with = "null_as_default")]
    pub shards: Shards,
}

/// Structured error body of a non-2xx response
#[derive(Debug, Default, Deserialize)]
pub struct ErrorResponse {
    #[serde(default, rename = "type", deserialize_with = "null_as_default")]
    pub error_type: String,
}

/// Counters extracted from a successful response
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResultCounts {
    pub hits: Option<i64>,
    pub shards: Option<i64>,
}

/// Which counters to extract, picked from the two tagging toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountSelection {
    Hits,
    Shards,
    Both,
}

impl CountSelection {
    /// Select from the toggles; `None` when neither is enabled
    pub fn from_toggles(total_hits: bool, total_shards: bool) -> Option<Self> {
        match (total_hits, total_shards) {
            (true, true) => Some(CountSelection::Both),
            (true, false) => Some(CountSelection::Hits),
            (false, true) => Some(CountSelection::Shards),
            (false, false) => None,
        }
    }

    /// Decode the body with the matching shape
    ///
    /// Counts that are missing or not strictly positive come back as `None`.
    pub fn parse(self, body: &[u8]) -> Result<ResultCounts, serde_json::Error> {
        let (hits, shards) = match self {
            CountSelection::Hits => {
                let res: HitsResponse = serde_json::from_slice(body)?;
                (Some(res.hits.total.value()), None)
            }
            CountSelection::Shards => {
                let res: ShardsResponse = serde_json::from_slice(body)?;
                (None, Some(res.shards.total))
            }
            CountSelection::Both => {
                let res: HitsAndShardsResponse = serde_json::from_slice(body)?;
                (Some(res.hits.total.value()), Some(res.shards.total))
            }
        };

        Ok(ResultCounts {
            hits: hits.filter(|n| *n > 0),
            shards: shards.filter(|n| *n > 0),
        })
    }
}
