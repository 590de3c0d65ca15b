//! Air quality provider client
//!
//! The provider answers with a loosely formatted `key: value` text blob. The
//! rating is the second whitespace-delimited token of that body; a literal
//! `false,` in that position means the provider has no data for the
//! location.

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, redirect::Policy};
use tracing::{debug, info, instrument, warn};

use crate::config::ProviderConfig;
use crate::error::QueryError;

/// Token the provider uses in place of a rating when it has no data
const NO_DATA_TOKEN: &str = "false,";

/// Largest provider body accepted; a rating response is a few dozen bytes
pub const MAX_PROVIDER_BODY_BYTES: usize = 16 * 1024;

/// A zip code the user asked about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirQualityQuery {
    zip: String,
}

impl AirQualityQuery {
    /// Builds a query from a raw slot value. Only presence is checked.
    pub fn from_slot(value: Option<&str>) -> Option<Self> {
        let zip = value?.trim();
        if zip.is_empty() {
            None
        } else {
            Some(Self {
                zip: zip.to_string(),
            })
        }
    }

    pub fn zip(&self) -> &str {
        &self.zip
    }
}

/// The rating description extracted from a provider response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rating(String);

impl Rating {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Extracts the rating from a complete provider body
pub fn parse_rating(body: &str) -> Result<Rating, QueryError> {
    match body.split_whitespace().nth(1) {
        Some(NO_DATA_TOKEN) | None => Err(QueryError::LocationNotFound),
        Some(token) => Ok(Rating(token.to_string())),
    }
}

/// Accumulates a response body chunk by chunk.
///
/// Parsing happens only in [`RatingBody::finish`], which consumes the
/// buffer, so a response can be turned into at most one outcome no matter
/// how the transport split it.
#[derive(Debug, Default)]
pub struct RatingBody {
    buffer: Vec<u8>,
    chunks: usize,
}

impl RatingBody {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk, failing once the body grows past
    /// [`MAX_PROVIDER_BODY_BYTES`].
    pub fn push(&mut self, chunk: &[u8]) -> Result<(), QueryError> {
        if self.buffer.len() + chunk.len() > MAX_PROVIDER_BODY_BYTES {
            return Err(QueryError::transport(format!(
                "provider body exceeds {MAX_PROVIDER_BODY_BYTES} bytes"
            )));
        }
        self.buffer.extend_from_slice(chunk);
        self.chunks += 1;
        Ok(())
    }

    pub fn finish(self) -> Result<Rating, QueryError> {
        let body = String::from_utf8_lossy(&self.buffer);
        debug!(chunks = self.chunks, bytes = self.buffer.len(), body = %body, "Provider body received");
        parse_rating(&body)
    }
}

/// Anything that can answer "what is the rating for this zip code"
#[async_trait]
pub trait RatingSource: Send + Sync {
    async fn fetch_rating(&self, query: &AirQualityQuery) -> Result<Rating, QueryError>;
}

/// HTTP client for the air quality provider
pub struct AirQualityClient {
    client: Client,
    config: ProviderConfig,
}

impl AirQualityClient {
    /// Create a new provider client
    pub fn new(config: ProviderConfig) -> anyhow::Result<Self> {
        // A redirect is a non-200 answer and must surface as such.
        let mut builder = Client::builder()
            .user_agent(concat!("AirQualityMeter/", env!("CARGO_PKG_VERSION")))
            .redirect(Policy::none());
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds.into()));
        }
        let client = builder
            .build()
            .with_context(|| "Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Full request URL including the credential
    pub fn request_url(&self, query: &AirQualityQuery) -> String {
        format!(
            "{}?location={}&fields={}&key={}",
            self.config.endpoint,
            urlencoding::encode(query.zip()),
            urlencoding::encode(&self.config.field),
            urlencoding::encode(&self.config.api_key),
        )
    }

    /// Request URL with the credential masked, for logs
    fn loggable_url(&self, query: &AirQualityQuery) -> String {
        format!(
            "{}?location={}&fields={}&key=***",
            self.config.endpoint,
            urlencoding::encode(query.zip()),
            urlencoding::encode(&self.config.field),
        )
    }
}

#[async_trait]
impl RatingSource for AirQualityClient {
    #[instrument(skip(self, query), fields(zip = %query.zip()))]
    async fn fetch_rating(&self, query: &AirQualityQuery) -> Result<Rating, QueryError> {
        debug!("Provider request URL: {}", self.loggable_url(query));
        let start_time = Instant::now();

        let mut response = self
            .client
            .get(self.request_url(query))
            .send()
            .await
            .map_err(|e| {
                let err = QueryError::from(e);
                warn!("Communications error: {}", err);
                err
            })?;

        let status = response.status();
        info!("Provider status: {}", status);
        if status != StatusCode::OK {
            return Err(QueryError::UnsupportedLocation {
                status: status.as_u16(),
            });
        }

        let mut body = RatingBody::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if let Err(err) = body.push(&chunk) {
                        warn!("Discarding provider body: {}", err);
                        return Err(err);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let err = QueryError::from(e);
                    warn!("Communications error while reading body: {}", err);
                    return Err(err);
                }
            }
        }

        let outcome = body.finish();
        match &outcome {
            Ok(rating) => info!(
                "The air quality is rated {} ({:.3}s)",
                rating,
                start_time.elapsed().as_secs_f64()
            ),
            Err(err) => info!("No rating available: {}", err),
        }
        outcome
    }
}
