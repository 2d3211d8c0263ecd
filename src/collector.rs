use std::collections::HashSet;
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::ScrapeError;
use crate::fetcher::PageSource;
use crate::models::{Cursor, ReviewCollection};
use crate::normalizer::normalize_review;

#[derive(Debug, Clone, Copy)]
pub struct CollectOptions {
    pub max_reviews: usize,
    pub page_delay: Duration,
    pub include_raw: bool,
}

/// Pages through `source` until `max_reviews` are collected or the source
/// runs dry.
///
/// Entries that are not JSON objects are skipped. Any fetch error aborts the
/// whole run, as does a cursor that has already been requested.
pub fn collect_reviews<S: PageSource>(
    source: &mut S,
    options: CollectOptions,
) -> Result<ReviewCollection, ScrapeError> {
    let mut collection = ReviewCollection::new(options.max_reviews, options.include_raw);
    let mut cursor = Cursor::initial();
    let mut requested: HashSet<Cursor> = HashSet::new();
    let mut pages = 0usize;
    let mut skipped = 0usize;

    while !collection.is_full() {
        if pages > 0 && !options.page_delay.is_zero() {
            thread::sleep(options.page_delay);
        }

        requested.insert(cursor.clone());
        let page = source.fetch_page(&cursor)?;
        pages += 1;
        debug!(page = pages, %cursor, records = page.reviews.len(), "fetched page");

        if page.is_terminal() {
            if let Some(next) = page.next_cursor {
                collection.set_last_cursor(next);
            }
            break;
        }

        for (index, raw) in page.reviews.iter().enumerate() {
            match normalize_review(index, raw) {
                Ok(review) => {
                    if !collection.push(review, raw) {
                        break;
                    }
                }
                Err(err) => {
                    skipped += 1;
                    warn!(page = pages, error = %err, "skipping review entry");
                }
            }
        }

        let Some(next) = page.next_cursor else {
            debug!(page = pages, "no cursor returned, stopping");
            break;
        };
        collection.set_last_cursor(next.clone());

        if collection.is_full() {
            break;
        }
        if requested.contains(&next) {
            return Err(ScrapeError::PaginationStalled {
                cursor: next.to_string(),
                pages,
            });
        }
        cursor = next;
    }

    if collection.is_empty() && options.max_reviews > 0 {
        warn!(pages, "source returned no reviews");
    }
    info!(
        collected = collection.len(),
        pages,
        skipped,
        "finished collecting reviews"
    );
    Ok(collection)
}
