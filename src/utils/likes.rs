//! Like-count summaries over lists of posts.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Read-only view of one post as consumed by the summaries below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "likes_or_zero")]
    pub likes: u64,
}

impl PostRecord {
    pub fn new(title: impl Into<String>, author: Option<&str>, likes: u64) -> Self {
        Self {
            title: title.into(),
            author: author.map(str::to_string),
            likes,
        }
    }
}

/// Rejection for untyped input that cannot be read as post records.
#[derive(Error, Debug)]
pub enum InvalidRecord {
    #[error("expected an array of post records")]
    NotASequence,

    #[error("post record {index} is malformed: {source}")]
    Malformed {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("post record {index} has an empty title")]
    EmptyTitle { index: usize },
}

/// Read post records from a JSON array.
///
/// A missing or `null` `likes` counts as 0 and whole floats such as `3.0`
/// are read as integers. Negative or fractional likes, missing or empty
/// titles, and non-object elements are rejected.
pub fn records_from_json(value: Value) -> Result<Vec<PostRecord>, InvalidRecord> {
    let Value::Array(items) = value else {
        return Err(InvalidRecord::NotASequence);
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let record: PostRecord = serde_json::from_value(item)
                .map_err(|source| InvalidRecord::Malformed { index, source })?;
            if record.title.trim().is_empty() {
                return Err(InvalidRecord::EmptyTitle { index });
            }
            Ok(record)
        })
        .collect()
}

/// Sum of likes across `records`; 0 for an empty list.
pub fn total_likes(records: &[PostRecord]) -> u64 {
    records
        .iter()
        .fold(0u64, |total, record| total.saturating_add(record.likes))
}

/// The most-liked record. Ties go to the earliest record; `None` when empty.
pub fn favorite_post(records: &[PostRecord]) -> Option<&PostRecord> {
    records
        .iter()
        .reduce(|best, record| if record.likes > best.likes { record } else { best })
}

fn likes_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<serde_json::Number>::deserialize(deserializer)? else {
        return Ok(0);
    };
    if let Some(likes) = number.as_u64() {
        return Ok(likes);
    }
    match number.as_f64() {
        // Whole floats such as `3.0` are accepted
        Some(likes) if likes >= 0.0 && likes.fract() == 0.0 && likes <= u64::MAX as f64 => {
            Ok(likes as u64)
        }
        _ => Err(serde::de::Error::custom(format!(
            "likes must be a non-negative whole number, got {}",
            number
        ))),
    }
}
