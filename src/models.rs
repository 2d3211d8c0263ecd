use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RequestParams;

/// Opaque pagination token handed back by the review endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub const INITIAL: &'static str = "*";

    pub fn new(token: impl Into<String>) -> Self {
        Cursor(token.into())
    }

    pub fn initial() -> Self {
        Cursor::new(Self::INITIAL)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One batch of reviews as returned by a single request.
#[derive(Debug, Clone, Default)]
pub struct RawReviewPage {
    pub reviews: Vec<Value>,
    /// `None` when the endpoint gave no cursor to continue from.
    pub next_cursor: Option<Cursor>,
}

impl RawReviewPage {
    pub fn is_terminal(&self) -> bool {
        self.reviews.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedReview {
    pub recommendationid: String,
    pub steamid: String,
    pub language: String,
    pub review: String,
    pub voted_up: bool,
    pub timestamp_created: i64,
    pub timestamp_updated: i64,
    pub author_num_games_owned: u64,
    pub author_num_reviews: u64,
    pub author_playtime_forever: u64,
    pub author_playtime_last_two_weeks: u64,
    pub author_playtime_at_review: u64,
    pub votes_up: u64,
    pub votes_funny: u64,
    pub weighted_vote_score: String,
    pub comment_count: u64,
    pub steam_purchase: bool,
    pub received_for_free: bool,
    pub written_during_early_access: bool,
}

/// Reviews accumulated across pages, in fetch order, never longer than `cap`.
#[derive(Debug, Clone)]
pub struct ReviewCollection {
    cap: usize,
    reviews: Vec<NormalizedReview>,
    raw: Option<Vec<Value>>,
    last_cursor: Cursor,
}

impl ReviewCollection {
    pub fn new(cap: usize, keep_raw: bool) -> Self {
        Self {
            cap,
            reviews: Vec::new(),
            raw: keep_raw.then(Vec::new),
            last_cursor: Cursor::initial(),
        }
    }

    pub fn is_full(&self) -> bool {
        self.reviews.len() >= self.cap
    }

    /// Returns false and drops the review once the cap is reached.
    pub fn push(&mut self, review: NormalizedReview, raw: &Value) -> bool {
        if self.is_full() {
            return false;
        }
        self.reviews.push(review);
        if let Some(raw_reviews) = self.raw.as_mut() {
            raw_reviews.push(raw.clone());
        }
        true
    }

    pub fn set_last_cursor(&mut self, cursor: Cursor) {
        self.last_cursor = cursor;
    }

    pub fn last_cursor(&self) -> &Cursor {
        &self.last_cursor
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }

    pub fn reviews(&self) -> &[NormalizedReview] {
        &self.reviews
    }

    pub fn raw_reviews(&self) -> Option<&[Value]> {
        self.raw.as_deref()
    }
}

/// Metadata envelope written by `--with-metadata`.
#[derive(Debug, Serialize)]
pub struct ReviewDataset<'a> {
    pub appid: u32,
    pub fetched_at_utc: String,
    pub request_params: &'a RequestParams,
    pub count: usize,
    pub last_cursor: &'a Cursor,
    pub reviews: &'a [NormalizedReview],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_reviews: Option<&'a [Value]>,
}

impl<'a> ReviewDataset<'a> {
    pub fn new(appid: u32, request_params: &'a RequestParams, collection: &'a ReviewCollection) -> Self {
        Self {
            appid,
            fetched_at_utc: chrono::Utc::now().to_rfc3339(),
            request_params,
            count: collection.len(),
            last_cursor: collection.last_cursor(),
            reviews: collection.reviews(),
            raw_reviews: collection.raw_reviews(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn review(id: &str) -> NormalizedReview {
        crate::normalizer::normalize_review(0, &json!({ "recommendationid": id })).unwrap()
    }

    #[test]
    fn collection_refuses_to_grow_past_cap() {
        let mut collection = ReviewCollection::new(2, true);
        assert!(collection.push(review("1"), &json!({})));
        assert!(collection.push(review("2"), &json!({})));
        assert!(!collection.push(review("3"), &json!({})));
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.raw_reviews().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn zero_cap_collection_is_full_immediately() {
        let collection = ReviewCollection::new(0, false);
        assert!(collection.is_full());
        assert!(collection.raw_reviews().is_none());
    }

    #[test]
    fn page_without_reviews_is_terminal() {
        let page = RawReviewPage {
            reviews: Vec::new(),
            next_cursor: Some(Cursor::new("abc")),
        };
        assert!(page.is_terminal());
    }
}
