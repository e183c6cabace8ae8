//! Configuration handling for the pipeline.
//!
//! Every endpoint, credential and path the pipeline touches lives here and is
//! handed to components at construction time. `Config::from_env` reads
//! overrides from environment variables and falls back to development
//! defaults for anything unset; `with_*` methods let tests point components
//! at substitute endpoints.

use std::env;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable names.
pub const ENV_LISTING_URL: &str = "OPENCALLS_LISTING_URL";
pub const ENV_DATA_DIR: &str = "OPENCALLS_DATA_DIR";
pub const ENV_OUTPUT_FILE: &str = "OPENCALLS_OUTPUT_FILE";
pub const ENV_UPLOAD_FILE: &str = "OPENCALLS_UPLOAD_FILE";
pub const ENV_UPLOAD_ENDPOINT: &str = "OPENCALLS_UPLOAD_ENDPOINT";
pub const ENV_UPLOAD_TOKEN: &str = "OPENCALLS_UPLOAD_TOKEN";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const ENV_MODEL: &str = "OPENCALLS_MODEL";
pub const ENV_MAX_TOKENS: &str = "OPENCALLS_MAX_TOKENS";
pub const ENV_TEMPERATURE: &str = "OPENCALLS_TEMPERATURE";
pub const ENV_HTTP_TIMEOUT_SECS: &str = "OPENCALLS_HTTP_TIMEOUT_SECS";
pub const ENV_EXTRACTION_CONCURRENCY: &str = "OPENCALLS_EXTRACTION_CONCURRENCY";
pub const ENV_RECORD_CONCURRENCY: &str = "OPENCALLS_RECORD_CONCURRENCY";
pub const ENV_UPLOAD_CONCURRENCY: &str = "OPENCALLS_UPLOAD_CONCURRENCY";
pub const ENV_EXTRACTION_RETRIES: &str = "OPENCALLS_EXTRACTION_RETRIES";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "OPENCALLS_RETRY_BASE_DELAY_MS";

const DEFAULT_LISTING_URL: &str = "https://www.artrabbit.com/artist-opportunities/";
const DEFAULT_DATA_DIR: &str = "data/open_calls";
const OUTPUT_FILE_NAME: &str = "results.csv";
const UPLOAD_FILE_NAME: &str = "open_calls_upload.csv";
const DEFAULT_UPLOAD_ENDPOINT: &str = "https://beta.mirr.art/api/open_calls/";
const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 4000;
const DEFAULT_TEMPERATURE: f32 = 1.0;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;
const DEFAULT_EXTRACTION_CONCURRENCY: usize = 4;
const DEFAULT_RECORD_CONCURRENCY: usize = 1;
const DEFAULT_UPLOAD_CONCURRENCY: usize = 4;
const DEFAULT_EXTRACTION_RETRIES: u32 = 0;
const DEFAULT_RETRY_BASE_DELAY_MS: u64 = 500;

/// Pipeline runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    listing_url: String,
    data_dir: PathBuf,
    output_file: PathBuf,
    upload_file: PathBuf,
    upload_endpoint: String,
    upload_token: String,
    openai_api_key: String,
    openai_base_url: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    http_timeout_secs: u64,
    extraction_concurrency: usize,
    record_concurrency: usize,
    upload_concurrency: usize,
    extraction_retries: u32,
    retry_base_delay_ms: u64,
}

impl Config {
    /// Load from environment variables, falling back to development defaults.
    ///
    /// Only malformed numeric values (or a zero concurrency) are rejected.
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(string_var(ENV_DATA_DIR, DEFAULT_DATA_DIR));
        let output_file = env::var(ENV_OUTPUT_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join(OUTPUT_FILE_NAME));
        let upload_file = env::var(ENV_UPLOAD_FILE)
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join(UPLOAD_FILE_NAME));

        Ok(Self {
            listing_url: string_var(ENV_LISTING_URL, DEFAULT_LISTING_URL),
            data_dir,
            output_file,
            upload_file,
            upload_endpoint: string_var(ENV_UPLOAD_ENDPOINT, DEFAULT_UPLOAD_ENDPOINT),
            upload_token: string_var(ENV_UPLOAD_TOKEN, ""),
            openai_api_key: string_var(ENV_OPENAI_API_KEY, ""),
            openai_base_url: string_var(ENV_OPENAI_BASE_URL, DEFAULT_OPENAI_BASE_URL),
            model: string_var(ENV_MODEL, DEFAULT_MODEL),
            max_tokens: parse_var(ENV_MAX_TOKENS, "max_tokens", DEFAULT_MAX_TOKENS)?,
            temperature: parse_var(ENV_TEMPERATURE, "temperature", DEFAULT_TEMPERATURE)?,
            http_timeout_secs: parse_var(
                ENV_HTTP_TIMEOUT_SECS,
                "http_timeout_secs",
                DEFAULT_HTTP_TIMEOUT_SECS,
            )?,
            extraction_concurrency: concurrency_var(
                ENV_EXTRACTION_CONCURRENCY,
                "extraction_concurrency",
                DEFAULT_EXTRACTION_CONCURRENCY,
            )?,
            record_concurrency: concurrency_var(
                ENV_RECORD_CONCURRENCY,
                "record_concurrency",
                DEFAULT_RECORD_CONCURRENCY,
            )?,
            upload_concurrency: concurrency_var(
                ENV_UPLOAD_CONCURRENCY,
                "upload_concurrency",
                DEFAULT_UPLOAD_CONCURRENCY,
            )?,
            extraction_retries: parse_var(
                ENV_EXTRACTION_RETRIES,
                "extraction_retries",
                DEFAULT_EXTRACTION_RETRIES,
            )?,
            retry_base_delay_ms: parse_var(
                ENV_RETRY_BASE_DELAY_MS,
                "retry_base_delay_ms",
                DEFAULT_RETRY_BASE_DELAY_MS,
            )?,
        })
    }

    /// Development defaults (mirrors `from_env` with no env overrides).
    pub fn default() -> Self {
        let data_dir = PathBuf::from(DEFAULT_DATA_DIR);
        Self {
            listing_url: DEFAULT_LISTING_URL.to_string(),
            output_file: data_dir.join(OUTPUT_FILE_NAME),
            upload_file: data_dir.join(UPLOAD_FILE_NAME),
            data_dir,
            upload_endpoint: DEFAULT_UPLOAD_ENDPOINT.to_string(),
            upload_token: String::new(),
            openai_api_key: String::new(),
            openai_base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            extraction_concurrency: DEFAULT_EXTRACTION_CONCURRENCY,
            record_concurrency: DEFAULT_RECORD_CONCURRENCY,
            upload_concurrency: DEFAULT_UPLOAD_CONCURRENCY,
            extraction_retries: DEFAULT_EXTRACTION_RETRIES,
            retry_base_delay_ms: DEFAULT_RETRY_BASE_DELAY_MS,
        }
    }

    /// Listing page the scraper fetches.
    pub fn listing_url(&self) -> &str {
        &self.listing_url
    }
    /// Directory scanned for input tables.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
    /// Table written by the scrape and process phases.
    pub fn output_file(&self) -> &Path {
        &self.output_file
    }
    /// Table read by the upload phase.
    pub fn upload_file(&self) -> &Path {
        &self.upload_file
    }
    pub fn upload_endpoint(&self) -> &str {
        &self.upload_endpoint
    }
    pub fn upload_token(&self) -> &str {
        &self.upload_token
    }
    pub fn openai_api_key(&self) -> &str {
        &self.openai_api_key
    }
    pub fn openai_base_url(&self) -> &str {
        &self.openai_base_url
    }
    pub fn model(&self) -> &str {
        &self.model
    }
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }
    pub fn temperature(&self) -> f32 {
        self.temperature
    }
    /// Per-request timeout shared by every HTTP client.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
    /// Backend calls allowed in flight at once.
    pub fn extraction_concurrency(&self) -> usize {
        self.extraction_concurrency
    }
    /// Rows transformed at once by the batch processor.
    pub fn record_concurrency(&self) -> usize {
        self.record_concurrency
    }
    pub fn upload_concurrency(&self) -> usize {
        self.upload_concurrency
    }
    pub fn extraction_retries(&self) -> u32 {
        self.extraction_retries
    }
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn with_listing_url(mut self, url: impl Into<String>) -> Self {
        self.listing_url = url.into();
        self
    }

    /// Point the pipeline at another data directory. Output and upload paths
    /// move along with it.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self.output_file = self.data_dir.join(OUTPUT_FILE_NAME);
        self.upload_file = self.data_dir.join(UPLOAD_FILE_NAME);
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = path.into();
        self
    }

    pub fn with_upload_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.upload_file = path.into();
        self
    }

    pub fn with_upload_endpoint(
        mut self,
        endpoint: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        self.upload_endpoint = endpoint.into();
        self.upload_token = token.into();
        self
    }

    pub fn with_openai(mut self, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        self.openai_base_url = base_url.into();
        self.openai_api_key = api_key.into();
        self
    }

    pub fn with_concurrency(mut self, extraction: usize, records: usize, uploads: usize) -> Self {
        self.extraction_concurrency = extraction.max(1);
        self.record_concurrency = records.max(1);
        self.upload_concurrency = uploads.max(1);
        self
    }

    pub fn with_extraction_retries(mut self, retries: u32, base_delay: Duration) -> Self {
        self.extraction_retries = retries;
        self.retry_base_delay_ms = base_delay.as_millis() as u64;
        self
    }
}

fn string_var(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, field: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                field,
                reason: format!("{raw:?}: {e}"),
            }),
        Err(_) => Ok(default),
    }
}

fn concurrency_var(key: &str, field: &'static str, default: usize) -> Result<usize, ConfigError> {
    let value = parse_var(key, field, default)?;
    if value == 0 {
        return Err(ConfigError::InvalidValue {
            field,
            reason: "must be at least 1".to_string(),
        });
    }
    Ok(value)
}

/// Errors that can occur while building a configuration.
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl Error for ConfigError {}
