use std::num::NonZeroU32;
use std::time::Duration;

use backon::{ExponentialBuilder, Retryable};
use color_eyre::eyre::{OptionExt, Result, WrapErr};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::InMemoryState, state::direct::NotKeyed};
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{Client, StatusCode};
use url::Url;

use super::{MusicBrainzError, Recording, RecordingSearchResponse};
use crate::ports::musicbrainz::RecordingSearch;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

const SEARCH_LIMIT: &str = "100";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How transient failures are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    /// Delay before the first retry, doubled for each further one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_factor(2.0)
            .with_max_times(self.max_attempts.saturating_sub(1))
    }
}

#[derive(Debug, Clone)]
pub struct MusicBrainzSettings {
    pub base_url: Url,
    pub user_agent: String,
    /// Minimum spacing between two requests.
    pub request_interval: Duration,
    pub retry: RetryPolicy,
}

/// MusicBrainz recording search over HTTP.
///
/// Owns its rate limiter: every request, retries included, waits for a
/// permit, so the configured interval holds across the whole process as long
/// as a single adapter is used.
pub struct MusicBrainzHttpAdapter {
    client: Client,
    base_url: Url,
    user_agent: String,
    limiter: DirectRateLimiter,
    retry: RetryPolicy,
}

impl MusicBrainzHttpAdapter {
    pub fn new(settings: MusicBrainzSettings) -> Result<Self> {
        let quota = Quota::with_period(settings.request_interval)
            .ok_or_eyre("MusicBrainz request interval must be greater than zero")?
            .allow_burst(NonZeroU32::MIN);
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .wrap_err("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: settings.base_url,
            user_agent: settings.user_agent,
            limiter: RateLimiter::direct(quota),
            retry: settings.retry,
        })
    }

    async fn search_once(&self, query: &str) -> Result<Vec<Recording>, MusicBrainzError> {
        self.limiter.until_ready().await;

        let mut url = self.base_url.join("recording")?;
        url.query_pairs_mut()
            .append_pair("query", query)
            .append_pair("fmt", "json")
            .append_pair("limit", SEARCH_LIMIT);

        log::debug!("MusicBrainz search: {}", query);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(MusicBrainzError::ServiceUnavailable);
        }
        if !status.is_success() {
            return Err(MusicBrainzError::Status(status));
        }

        let body = response
            .json::<RecordingSearchResponse>()
            .await
            .map_err(MusicBrainzError::Decode)?;

        Ok(body.recordings.into_iter().map(Recording::from).collect())
    }
}

#[async_trait::async_trait]
impl RecordingSearch for MusicBrainzHttpAdapter {
    async fn search_recordings(&self, query: &str) -> Result<Vec<Recording>, MusicBrainzError> {
        (|| self.search_once(query))
            .retry(self.retry.backoff())
            .when(MusicBrainzError::is_transient)
            .notify(|err, delay| {
                log::warn!("MusicBrainz request failed ({}), retrying in {:?}", err, delay);
            })
            .await
    }
}
