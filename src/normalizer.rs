use serde_json::{Map, Value};

use crate::error::ScrapeError;
use crate::models::NormalizedReview;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Empty string when absent.
    Text,
    /// Non-negative integer, 0 when absent.
    Count,
    /// Unix seconds, 0 when absent.
    Timestamp,
    /// false when absent.
    Flag,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMapping {
    pub target: &'static str,
    pub path: &'static [&'static str],
    pub coercion: Coercion,
}

const fn field(target: &'static str, path: &'static [&'static str], coercion: Coercion) -> FieldMapping {
    FieldMapping { target, path, coercion }
}

/// Where each output field lives in a raw review and how it is coerced.
pub const REVIEW_FIELDS: &[FieldMapping] = &[
    field("recommendationid", &["recommendationid"], Coercion::Text),
    field("steamid", &["author", "steamid"], Coercion::Text),
    field("language", &["language"], Coercion::Text),
    field("review", &["review"], Coercion::Text),
    field("voted_up", &["voted_up"], Coercion::Flag),
    field("timestamp_created", &["timestamp_created"], Coercion::Timestamp),
    field("timestamp_updated", &["timestamp_updated"], Coercion::Timestamp),
    field("author_num_games_owned", &["author", "num_games_owned"], Coercion::Count),
    field("author_num_reviews", &["author", "num_reviews"], Coercion::Count),
    field("author_playtime_forever", &["author", "playtime_forever"], Coercion::Count),
    field("author_playtime_last_two_weeks", &["author", "playtime_last_two_weeks"], Coercion::Count),
    field("author_playtime_at_review", &["author", "playtime_at_review"], Coercion::Count),
    field("votes_up", &["votes_up"], Coercion::Count),
    field("votes_funny", &["votes_funny"], Coercion::Count),
    field("weighted_vote_score", &["weighted_vote_score"], Coercion::Text),
    field("comment_count", &["comment_count"], Coercion::Count),
    field("steam_purchase", &["steam_purchase"], Coercion::Flag),
    field("received_for_free", &["received_for_free"], Coercion::Flag),
    field("written_during_early_access", &["written_during_early_access"], Coercion::Flag),
];

/// Flattens one raw review into the fixed output shape.
///
/// Missing or unusable fields fall back to their default; only an entry that
/// is not a JSON object at all is rejected. `index` is the entry's position in
/// its page and only feeds the error.
pub fn normalize_review(index: usize, raw: &Value) -> Result<NormalizedReview, ScrapeError> {
    let record = raw.as_object().ok_or(ScrapeError::MalformedRecord {
        index,
        found: json_kind(raw),
    })?;

    let flat: Map<String, Value> = REVIEW_FIELDS
        .iter()
        .map(|mapping| {
            let value = lookup(record, mapping.path);
            (mapping.target.to_string(), coerce(value, mapping.coercion))
        })
        .collect();

    Ok(serde_json::from_value(Value::Object(flat))?)
}

fn lookup<'a>(record: &'a Map<String, Value>, path: &[&str]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(record.get(*first)?, |value, key| value.as_object()?.get(*key))
}

fn coerce(value: Option<&Value>, coercion: Coercion) -> Value {
    match coercion {
        Coercion::Text => Value::from(value.and_then(as_text).unwrap_or_default()),
        Coercion::Count => Value::from(
            value
                .and_then(as_integer)
                .and_then(|n| u64::try_from(n).ok())
                .unwrap_or(0),
        ),
        Coercion::Timestamp => Value::from(
            value
                .and_then(as_integer)
                .and_then(|n| i64::try_from(n).ok())
                .unwrap_or(0),
        ),
        Coercion::Flag => Value::from(value.and_then(as_flag).unwrap_or(false)),
    }
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Widened to i128 so both i64 and u64 inputs survive; callers narrow.
fn as_integer(value: &Value) -> Option<i128> {
    let n = match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from))
            .or_else(|| n.as_f64().and_then(truncate)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i128>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(truncate))
        }
        Value::Bool(b) => Some(i128::from(*b)),
        _ => None,
    };
    n.filter(|n| i64::try_from(*n).is_ok() || u64::try_from(*n).is_ok())
}

fn truncate(f: f64) -> Option<i128> {
    f.is_finite().then(|| f.trunc() as i128)
}

fn as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
