use reqwest::blocking::Client;
use reqwest::redirect;
use serde_json::Value;
use tracing::debug;

use crate::config::ScrapeConfig;
use crate::error::ScrapeError;
use crate::models::{Cursor, RawReviewPage};

const USER_AGENT: &str = concat!("steam_review_archiver/", env!("CARGO_PKG_VERSION"));
const MAX_REDIRECTS: usize = 10;
const ERROR_BODY_PREVIEW: usize = 300;

/// Anything that can hand out review pages for a cursor.
pub trait PageSource {
    fn fetch_page(&mut self, cursor: &Cursor) -> Result<RawReviewPage, ScrapeError>;
}

pub struct SteamReviewClient {
    client: Client,
    url: String,
    config: ScrapeConfig,
}

impl SteamReviewClient {
    pub fn new(config: ScrapeConfig) -> Result<Self, ScrapeError> {
        let url = format!("{}/{}", config.base_url, config.appid);
        let api_host = reqwest::Url::parse(&url)
            .map_err(|e| ScrapeError::Config(format!("invalid review endpoint {url}: {e}")))?
            .host_str()
            .map(str::to_owned);

        let redirect_policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > MAX_REDIRECTS {
                attempt.error(format!("Too many redirects (>{MAX_REDIRECTS})"))
            } else if attempt.url().host_str().map(str::to_owned) != api_host {
                // never leave the review API host
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .redirect(redirect_policy)
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { client, url, config })
    }
}

impl PageSource for SteamReviewClient {
    fn fetch_page(&mut self, cursor: &Cursor) -> Result<RawReviewPage, ScrapeError> {
        debug!(url = %self.url, %cursor, "requesting review page");

        let resp = self
            .client
            .get(&self.url)
            .query(&[("json", "1"), ("cursor", cursor.as_str())])
            .query(&self.config.params)
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            let preview: String = body.chars().take(ERROR_BODY_PREVIEW).collect();
            return Err(ScrapeError::Transport(format!("HTTP {status}: {preview}")));
        }

        parse_page(&body)
    }
}

/// Parses one response body from the review endpoint.
pub fn parse_page(body: &str) -> Result<RawReviewPage, ScrapeError> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| ScrapeError::MalformedResponse(format!("body is not JSON: {e}")))?;
    let payload = payload
        .as_object()
        .ok_or_else(|| ScrapeError::MalformedResponse("body is not a JSON object".into()))?;

    match payload.get("success") {
        Some(success) if success.as_i64() == Some(1) => {}
        other => {
            return Err(ScrapeError::Transport(format!(
                "Steam rejected the request (success={})",
                other.map_or_else(|| "missing".to_string(), Value::to_string)
            )));
        }
    }

    let reviews = match payload.get("reviews") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(reviews)) => reviews.clone(),
        Some(_) => {
            return Err(ScrapeError::MalformedResponse(
                "\"reviews\" is not an array".into(),
            ));
        }
    };

    let next_cursor = match payload.get("cursor") {
        None | Some(Value::Null) => None,
        Some(Value::String(token)) if !token.is_empty() => Some(Cursor::new(token.as_str())),
        Some(_) => {
            return Err(ScrapeError::MalformedResponse(
                "\"cursor\" is not a non-empty string".into(),
            ));
        }
    };

    Ok(RawReviewPage { reviews, next_cursor })
}
