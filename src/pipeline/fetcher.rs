use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::debug;

use crate::model::FetchedVerse;

const USER_AGENT: &str = concat!("scripture-sync/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} returned malformed data: {reason}")]
    Malformed { url: String, reason: String },

    #[error("{url} returned no verses")]
    NoData { url: String },
}

/// Courtesy pacing between provider calls.
pub trait RateLimiter {
    fn pause(&self);
}

/// Sleeps for a fixed interval after every call. Not adaptive.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl RateLimiter for FixedDelay {
    fn pause(&self) {
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetcherSettings {
    pub base_url: String,
    pub provider_code: String,
    pub timeout: Duration,
}

pub struct TranslationFetcher {
    client: reqwest::blocking::Client,
    settings: FetcherSettings,
    limiter: Box<dyn RateLimiter>,
}

impl TranslationFetcher {
    pub fn new(settings: FetcherSettings, limiter: Box<dyn RateLimiter>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .context("failed to build provider HTTP client")?;

        Ok(Self {
            client,
            settings,
            limiter,
        })
    }

    pub fn chapter_url(&self, ordinal: u32, chapter: u32) -> String {
        format!(
            "{}/get-text/{}/{}/{}/",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.provider_code,
            ordinal,
            chapter
        )
    }

    /// One request per chapter. The limiter pauses after every attempt,
    /// successful or not.
    pub fn fetch_chapter(&self, ordinal: u32, chapter: u32) -> Result<Vec<FetchedVerse>, FetchError> {
        let url = self.chapter_url(ordinal, chapter);
        let result = self.request(&url);
        self.limiter.pause();
        result
    }

    fn request(&self, url: &str) -> Result<Vec<FetchedVerse>, FetchError> {
        debug!(url, "fetching chapter");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| transport_error(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        // The client timeout also covers a body that stalls after the headers.
        let body = response
            .text()
            .map_err(|source| transport_error(url, source))?;

        normalize_chapter(&body).map_err(|err| match err {
            ChapterShape::Empty => FetchError::NoData {
                url: url.to_string(),
            },
            ChapterShape::Invalid(reason) => FetchError::Malformed {
                url: url.to_string(),
                reason,
            },
        })
    }
}

fn transport_error(url: &str, source: reqwest::Error) -> FetchError {
    if source.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            source,
        }
    }
}

enum ChapterShape {
    Empty,
    Invalid(String),
}

/// Parses `[{verse, text, ...}]`, trimming text and dropping verse 0.
fn normalize_chapter(body: &str) -> Result<Vec<FetchedVerse>, ChapterShape> {
    let verses: Vec<FetchedVerse> =
        serde_json::from_str(body).map_err(|err| ChapterShape::Invalid(err.to_string()))?;

    let verses: Vec<FetchedVerse> = verses
        .into_iter()
        .filter(|item| item.verse > 0)
        .map(|item| FetchedVerse {
            verse: item.verse,
            text: item.text.trim().to_string(),
        })
        .collect();

    if verses.is_empty() {
        return Err(ChapterShape::Empty);
    }
    Ok(verses)
}
