use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser, ValueEnum};
use serde::Serialize;

use crate::error::ScrapeError;

pub const STEAM_REVIEWS_BASE_URL: &str = "https://store.steampowered.com/appreviews";

/// Pixelate TD.
pub const DEFAULT_APPID: u32 = 4134990;

pub const MAX_PER_PAGE: u8 = 100;

#[derive(Debug, Parser, Clone)]
#[command(version, about = "Download Steam Store reviews for a single AppID and save to JSON")]
pub struct Args {
    /// Steam AppID (e.g. 413150).
    #[arg(long, default_value_t = DEFAULT_APPID, value_parser = clap::value_parser!(u32).range(1..))]
    pub appid: u32,

    /// Review language, or "all".
    #[arg(long, value_enum, default_value_t = Language::All)]
    pub language: Language,

    /// Filter by review sentiment.
    #[arg(long, value_enum, default_value_t = ReviewType::All)]
    pub review_type: ReviewType,

    /// Filter by purchase type.
    #[arg(long, value_enum, default_value_t = PurchaseType::All)]
    pub purchase_type: PurchaseType,

    /// Paging mode (recent/updated paginate predictably).
    #[arg(long, value_enum, default_value_t = FilterMode::Recent)]
    pub filter_mode: FilterMode,

    /// Lookback window in days.
    #[arg(long, default_value_t = i64::MAX as u64)]
    pub day_range: u64,

    /// Reviews per page (1-100).
    #[arg(long, default_value_t = MAX_PER_PAGE, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub num_per_page: u8,

    /// 1 filters off-topic/review-bomb activity, 0 includes it.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    pub filter_offtopic_activity: u8,

    /// Stop after collecting this many reviews.
    #[arg(long, default_value_t = 1000)]
    pub max_reviews: usize,

    /// Delay between page requests.
    #[arg(long, default_value_t = 0.25)]
    pub sleep_seconds: f64,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30.0)]
    pub timeout_seconds: f64,

    /// Keep the raw review objects alongside the normalized ones (metadata output only).
    #[arg(long)]
    pub include_raw: bool,

    /// Wrap the reviews in a document carrying the request parameters and last cursor.
    #[arg(long)]
    pub with_metadata: bool,

    /// Output JSON path. Defaults to steam_reviews_<appid>.json.
    #[arg(long, value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Review endpoint; the AppID is appended as a path segment.
    #[arg(long, env = "STEAM_REVIEWS_BASE_URL", default_value = STEAM_REVIEWS_BASE_URL, hide = true)]
    pub base_url: String,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors.
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Query parameters sent with every page request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestParams {
    pub language: Language,
    pub review_type: ReviewType,
    pub purchase_type: PurchaseType,
    pub filter: FilterMode,
    pub day_range: u64,
    pub num_per_page: u8,
    pub filter_offtopic_activity: u8,
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            language: Language::All,
            review_type: ReviewType::All,
            purchase_type: PurchaseType::All,
            filter: FilterMode::Recent,
            day_range: i64::MAX as u64,
            num_per_page: MAX_PER_PAGE,
            filter_offtopic_activity: 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub appid: u32,
    pub base_url: String,
    pub params: RequestParams,
    pub max_reviews: usize,
    pub page_delay: Duration,
    pub timeout: Duration,
    pub include_raw: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Reviews,
    Dataset,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scrape: ScrapeConfig,
    pub out: PathBuf,
    pub output_mode: OutputMode,
}

impl Args {
    pub fn resolve(self) -> Result<AppConfig, ScrapeError> {
        let page_delay = seconds("--sleep-seconds", self.sleep_seconds)?;
        let timeout = seconds("--timeout-seconds", self.timeout_seconds)?;
        if timeout.is_zero() {
            return Err(ScrapeError::Config("--timeout-seconds must be positive".into()));
        }

        let out = self.out.unwrap_or_else(|| default_output_path(self.appid));
        let output_mode = if self.with_metadata {
            OutputMode::Dataset
        } else {
            OutputMode::Reviews
        };

        Ok(AppConfig {
            scrape: ScrapeConfig {
                appid: self.appid,
                base_url: self.base_url.trim_end_matches('/').to_string(),
                params: RequestParams {
                    language: self.language,
                    review_type: self.review_type,
                    purchase_type: self.purchase_type,
                    filter: self.filter_mode,
                    day_range: self.day_range,
                    num_per_page: self.num_per_page,
                    filter_offtopic_activity: self.filter_offtopic_activity,
                },
                max_reviews: self.max_reviews,
                page_delay,
                timeout,
                include_raw: self.include_raw,
            },
            out,
            output_mode,
        })
    }
}

pub fn default_output_path(appid: u32) -> PathBuf {
    PathBuf::from(format!("steam_reviews_{appid}.json"))
}

fn seconds(flag: &str, value: f64) -> Result<Duration, ScrapeError> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| ScrapeError::Config(format!("{flag} must be a non-negative number, got {value}")))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewType {
    All,
    Positive,
    Negative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseType {
    All,
    Steam,
    #[value(name = "non_steam_purchase")]
    NonSteamPurchase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterMode {
    Recent,
    Updated,
    All,
}

/// Steam's language API codes; `All` disables the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    All,
    Arabic,
    Bulgarian,
    Schinese,
    Tchinese,
    Czech,
    Danish,
    Dutch,
    English,
    Finnish,
    French,
    German,
    Greek,
    Hungarian,
    Indonesian,
    Italian,
    Japanese,
    Koreana,
    Norwegian,
    Polish,
    Portuguese,
    Brazilian,
    Romanian,
    Russian,
    Spanish,
    Latam,
    Swedish,
    Thai,
    Turkish,
    Ukrainian,
    Vietnamese,
}
