//! Run configuration. Everything the client, collector and batch runner need
//! is read once into a [`Config`] and handed down at construction.
use crate::id::validate_set_id;
use crate::rate_limiter::DelayPolicy;
use crate::schema::ListingType;
use crate::{Error, ProductId, Result};
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const SALES_BASE_URL: &str = "https://mpapi.tcgplayer.com";
pub const CATALOG_BASE_URL: &str = "https://infinite-api.tcgplayer.com";
const DEFAULT_MPFEV: &str = "2399";
const DEFAULT_OUTPUT_DIR: &str = "sets";

/// What a run collects: every product of a set, or an explicit id list.
#[derive(Clone, Debug, PartialEq)]
pub enum Target {
    Set(String),
    Products(Vec<ProductId>),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub sales_base_url: String,
    pub catalog_base_url: String,
    /// Frontend version query parameter the marketplace API expects.
    pub mpfev: String,
    pub user_agent: Option<String>,
    pub timeout: Duration,
    pub listing_type: ListingType,
    /// Page the collector starts from. The historical scripts start at 1 and
    /// therefore never fetch the 25 most recent sales.
    pub first_page: u32,
    pub page_cap: Option<u32>,
    pub delay: DelayPolicy,
    pub max_retries: u32,
    pub retry_backoff: Duration,
    pub concurrency: usize,
    pub output_dir: PathBuf,
    pub target: Option<Target>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sales_base_url: SALES_BASE_URL.to_string(),
            catalog_base_url: CATALOG_BASE_URL.to_string(),
            mpfev: DEFAULT_MPFEV.to_string(),
            user_agent: None,
            timeout: Duration::from_secs(30),
            listing_type: ListingType::All,
            first_page: 1,
            page_cap: None,
            delay: DelayPolicy::default(),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
            concurrency: 4,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            target: None,
        }
    }
}

impl Config {
    /// Reads `TCGP_*` variables from the process environment (after `.env`
    /// has been loaded by `common::setup_env`).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(common::env_var)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key);

        let delay = match (
            parse::<u64>(&get, "TCGP_DELAY_MIN_MS")?,
            parse::<u64>(&get, "TCGP_DELAY_MAX_MS")?,
        ) {
            (None, None) => defaults.delay,
            (Some(min), None) => DelayPolicy::fixed(Duration::from_millis(min))?,
            (None, Some(max)) => DelayPolicy::fixed(Duration::from_millis(max))?,
            (Some(min), Some(max)) => {
                DelayPolicy::random(Duration::from_millis(min), Duration::from_millis(max))?
            }
        };

        let concurrency =
            parse::<usize>(&get, "TCGP_CONCURRENCY")?.unwrap_or(defaults.concurrency);
        if concurrency == 0 {
            return Err(Error::Config("TCGP_CONCURRENCY must be at least 1".into()));
        }

        let first_page = parse::<u32>(&get, "TCGP_FIRST_PAGE")?.unwrap_or(defaults.first_page);

        let target = match (get("TCGP_SET_ID"), get("TCGP_PRODUCT_IDS")) {
            (Some(_), Some(_)) => {
                return Err(Error::Config(
                    "set either TCGP_SET_ID or TCGP_PRODUCT_IDS, not both".into(),
                ))
            }
            (Some(set_id), None) => Some(Target::Set(validate_set_id(&set_id)?.to_string())),
            (None, Some(ids)) => Some(Target::Products(parse_id_list(&ids)?)),
            (None, None) => None,
        };

        Ok(Self {
            sales_base_url: get("TCGP_SALES_BASE_URL").unwrap_or(defaults.sales_base_url),
            catalog_base_url: get("TCGP_CATALOG_BASE_URL").unwrap_or(defaults.catalog_base_url),
            mpfev: get("TCGP_MPFEV").unwrap_or(defaults.mpfev),
            user_agent: get("TCGP_USER_AGENT"),
            timeout: parse::<u64>(&get, "TCGP_TIMEOUT_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            listing_type: parse::<ListingType>(&get, "TCGP_LISTING_TYPE")?
                .unwrap_or(defaults.listing_type),
            first_page,
            page_cap: parse::<u32>(&get, "TCGP_PAGE_CAP")?,
            delay,
            max_retries: parse::<u32>(&get, "TCGP_MAX_RETRIES")?
                .unwrap_or(defaults.max_retries),
            retry_backoff: parse::<u64>(&get, "TCGP_RETRY_BACKOFF_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.retry_backoff),
            concurrency,
            output_dir: get("TCGP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            target,
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: Display,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("{key}={raw:?}: {e}")))
        })
        .transpose()
}

fn parse_id_list(raw: &str) -> Result<Vec<ProductId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ProductId::parse)
        .collect()
}
