//! Configuration module
//!
//! Environment-driven configuration for the ingestion client: API endpoint,
//! polling behavior, upload mode, and the file allow-list.

use std::env;
use std::str::FromStr;

use crate::validation::AllowList;

const POLL_INTERVAL_MS: u64 = 2000;
const POLL_RETRY_BUDGET: u32 = 0;
const JOB_TIMEOUT_SECS: u64 = 900;
const REQUEST_TIMEOUT_SECS: u64 = 60;

const DEFAULT_EXTENSIONS: &str =
    "pdf,doc,docx,html,xml,xlsx,xls,json,png,jpeg,ppt,pptx,mp3,txt,md,csv,zip";
const DEFAULT_MIME_TYPES: &str = "application/pdf,\
application/msword,\
application/vnd.openxmlformats-officedocument.wordprocessingml.document,\
text/html,\
application/xml,\
application/vnd.ms-excel,\
application/vnd.openxmlformats-officedocument.spreadsheetml.sheet,\
application/json,\
image/png,\
image/jpeg,\
application/vnd.ms-powerpoint,\
application/vnd.openxmlformats-officedocument.presentationml.presentation,\
audio/mpeg,\
text/plain,\
text/markdown,\
text/csv,\
application/zip,\
application/x-zip-compressed";

/// How the backend reports ingestion completion.
///
/// `Polled` submits one request per batch and then polls a job-status endpoint
/// until the server reports completion. `Sync` submits to an endpoint that only
/// responds once ingestion is accepted, so no polling happens at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    Polled,
    Sync,
}

impl FromStr for UploadMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "polled" | "poll" => Ok(UploadMode::Polled),
            "sync" | "synchronous" => Ok(UploadMode::Sync),
            _ => Err(anyhow::anyhow!("Invalid upload mode: {}", s)),
        }
    }
}

/// Client configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: String,
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Delay between consecutive job-status polls.
    pub poll_interval_ms: u64,
    /// Poll errors tolerated before the job fails. 0 = fail on the first error.
    pub poll_retry_budget: u32,
    /// Overall limit for one upload job, both phases included.
    pub job_timeout_secs: u64,
    pub upload_mode: UploadMode,
    pub allowed_extensions: Vec<String>,
    pub allowed_mime_types: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let api_base_url = env::var("CORPORA_API_URL")
            .or_else(|_| env::var("API_URL"))
            .map_err(|_| anyhow::anyhow!("CORPORA_API_URL or API_URL must be set"))?;

        let upload_mode = env::var("CORPORA_UPLOAD_MODE")
            .unwrap_or_else(|_| "polled".to_string())
            .parse()?;

        let config = Config {
            api_base_url,
            api_token: env::var("CORPORA_API_TOKEN").ok().filter(|s| !s.is_empty()),
            request_timeout_secs: env::var("CORPORA_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            poll_interval_ms: env::var("CORPORA_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| POLL_INTERVAL_MS.to_string())
                .parse()
                .unwrap_or(POLL_INTERVAL_MS),
            poll_retry_budget: env::var("CORPORA_POLL_RETRY_BUDGET")
                .unwrap_or_else(|_| POLL_RETRY_BUDGET.to_string())
                .parse()
                .unwrap_or(POLL_RETRY_BUDGET),
            job_timeout_secs: env::var("CORPORA_JOB_TIMEOUT_SECS")
                .unwrap_or_else(|_| JOB_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(JOB_TIMEOUT_SECS),
            upload_mode,
            allowed_extensions: env::var("CORPORA_ALLOWED_EXTENSIONS")
                .unwrap_or_else(|_| DEFAULT_EXTENSIONS.to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            allowed_mime_types: env::var("CORPORA_ALLOWED_MIME_TYPES")
                .unwrap_or_else(|_| DEFAULT_MIME_TYPES.to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.api_base_url.trim().is_empty() {
            return Err(anyhow::anyhow!("API base URL must not be empty"));
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(anyhow::anyhow!(
                "API base URL must start with http:// or https://"
            ));
        }
        if self.poll_interval_ms == 0 {
            return Err(anyhow::anyhow!("CORPORA_POLL_INTERVAL_MS must be > 0"));
        }
        if self.job_timeout_secs == 0 {
            return Err(anyhow::anyhow!("CORPORA_JOB_TIMEOUT_SECS must be > 0"));
        }
        if self.allowed_extensions.is_empty() && self.allowed_mime_types.is_empty() {
            return Err(anyhow::anyhow!(
                "At least one allowed extension or MIME type must be configured"
            ));
        }
        Ok(())
    }

    /// Allow-list built from the configured extension and MIME type sets.
    pub fn allow_list(&self) -> AllowList {
        AllowList::new(
            self.allowed_extensions.iter().cloned(),
            self.allowed_mime_types.iter().cloned(),
        )
    }
}
