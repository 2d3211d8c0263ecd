mod archiver;
mod collector;
mod config;
mod error;
mod fetcher;
mod logging;
mod models;
mod normalizer;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use crate::collector::{collect_reviews, CollectOptions};
use crate::config::{AppConfig, Args, OutputMode};
use crate::fetcher::{PageSource, SteamReviewClient};
use crate::models::ReviewDataset;

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose, args.quiet)?;

    let config = args.resolve().context("invalid arguments")?;
    let mut client =
        SteamReviewClient::new(config.scrape.clone()).context("failed to build HTTP client")?;

    let count = archive(&mut client, &config)?;
    println!("Saved {} reviews to {}", count, config.out.display());
    Ok(())
}

/// Collects reviews from `source` and writes them to the configured output.
/// Nothing is written unless collection succeeds.
fn archive<S: PageSource>(source: &mut S, config: &AppConfig) -> Result<usize> {
    let scrape = &config.scrape;
    info!(
        appid = scrape.appid,
        max_reviews = scrape.max_reviews,
        language = ?scrape.params.language,
        "collecting reviews"
    );

    let collection = collect_reviews(
        source,
        CollectOptions {
            max_reviews: scrape.max_reviews,
            page_delay: scrape.page_delay,
            include_raw: scrape.include_raw,
        },
    )
    .with_context(|| format!("failed to collect reviews for app {}", scrape.appid))?;

    let written = match config.output_mode {
        OutputMode::Reviews => archiver::write_reviews(&config.out, collection.reviews()),
        OutputMode::Dataset => archiver::write_dataset(
            &config.out,
            &ReviewDataset::new(scrape.appid, &scrape.params, &collection),
        ),
    };
    written.with_context(|| format!("failed to write {}", config.out.display()))?;

    Ok(collection.len())
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use serde_json::json;

    use super::*;
    use crate::error::ScrapeError;
    use crate::models::{Cursor, RawReviewPage};

    /// Serves a fixed list of pages keyed by the cursor that leads to them.
    struct CannedApi {
        pages: Vec<(&'static str, RawReviewPage)>,
        calls: usize,
    }

    impl PageSource for CannedApi {
        fn fetch_page(&mut self, cursor: &Cursor) -> Result<RawReviewPage, ScrapeError> {
            self.calls += 1;
            Ok(self
                .pages
                .iter()
                .find(|(key, _)| *key == cursor.as_str())
                .map(|(_, page)| page.clone())
                .unwrap_or_default())
        }
    }

    fn canned_api() -> CannedApi {
        let page = |from: u32, to: u32, next: &str| RawReviewPage {
            reviews: (from..to)
                .map(|id| {
                    json!({
                        "recommendationid": id.to_string(),
                        "review": format!("review #{id}"),
                        "voted_up": id % 2 == 0,
                        "author": { "steamid": "7656119", "playtime_forever": id * 10 }
                    })
                })
                .collect(),
            next_cursor: Some(Cursor::new(next)),
        };
        CannedApi {
            pages: vec![("*", page(0, 4, "p2")), ("p2", page(4, 6, "p3"))],
            calls: 0,
        }
    }

    fn config_for(out: &Path, max_reviews: usize) -> AppConfig {
        let args = Args::try_parse_from([
            "steam_review_archiver",
            "--appid",
            "413150",
            "--sleep-seconds",
            "0",
            "--max-reviews",
            max_reviews.to_string().as_str(),
            "--out",
            out.to_str().unwrap(),
        ])
        .unwrap();
        args.resolve().unwrap()
    }

    #[test]
    fn repeated_runs_write_identical_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");

        assert_eq!(archive(&mut canned_api(), &config_for(&first, 5)).unwrap(), 5);
        assert_eq!(archive(&mut canned_api(), &config_for(&second, 5)).unwrap(), 5);
        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn exhausted_source_writes_everything_available() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("all.json");
        let mut api = canned_api();

        assert_eq!(archive(&mut api, &config_for(&out, 1000)).unwrap(), 6);
        assert_eq!(api.calls, 3);

        let written: serde_json::Value = serde_json::from_slice(&fs::read(&out).unwrap()).unwrap();
        assert_eq!(written[5]["author_playtime_forever"], 50);
        assert_eq!(written[5]["steamid"], "7656119");
    }

    #[test]
    fn failed_run_leaves_existing_output_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("existing.json");
        fs::write(&out, "previous run").unwrap();

        let mut stalled = CannedApi {
            pages: vec![(
                "*",
                RawReviewPage {
                    reviews: vec![json!({})],
                    next_cursor: Some(Cursor::initial()),
                },
            )],
            calls: 0,
        };

        let err = archive(&mut stalled, &config_for(&out, 10)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrapeError>(),
            Some(ScrapeError::PaginationStalled { .. })
        ));
        assert_eq!(fs::read_to_string(&out).unwrap(), "previous run");
    }

    #[test]
    fn failed_run_creates_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("never.json");

        struct Unreachable;
        impl PageSource for Unreachable {
            fn fetch_page(&mut self, _: &Cursor) -> Result<RawReviewPage, ScrapeError> {
                Err(ScrapeError::Transport("connection refused".into()))
            }
        }

        assert!(archive(&mut Unreachable, &config_for(&out, 10)).is_err());
        assert!(!out.exists());
    }
}
