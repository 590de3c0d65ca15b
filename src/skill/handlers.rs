//! Intent handlers and the mapping from lookup outcome to spoken reply

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::air_quality::{AirQualityQuery, Rating, RatingSource};
use crate::error::QueryError;
use crate::models::Intent;
use crate::speech::{Reply, phrases};

/// Slot carrying the zip code in `AirQualityIntent`
pub const ZIP_SLOT: &str = "zip";

/// Turns one recognized intent into one reply
#[async_trait]
pub trait IntentHandler: Send + Sync {
    async fn handle(&self, intent: &Intent) -> Reply;
}

/// Handler whose reply does not depend on the intent's slots
pub struct StaticReply(pub fn() -> Reply);

#[async_trait]
impl IntentHandler for StaticReply {
    async fn handle(&self, _intent: &Intent) -> Reply {
        (self.0)()
    }
}

/// Looks up the rating for the `zip` slot and speaks the outcome
pub struct AirQualityHandler {
    source: Arc<dyn RatingSource>,
}

impl AirQualityHandler {
    pub fn new(source: Arc<dyn RatingSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl IntentHandler for AirQualityHandler {
    async fn handle(&self, intent: &Intent) -> Reply {
        let Some(query) = AirQualityQuery::from_slot(intent.slot_value(ZIP_SLOT)) else {
            return phrases::missing_zip();
        };
        let outcome = self.source.fetch_rating(&query).await;
        reply_for(&query, outcome)
    }
}

/// Maps a lookup outcome to what the user hears
pub fn reply_for(query: &AirQualityQuery, outcome: Result<Rating, QueryError>) -> Reply {
    match outcome {
        Ok(rating) => phrases::rating(query.zip(), rating.as_str()),
        Err(QueryError::UnsupportedLocation { .. }) => Reply::tell(phrases::UNSUPPORTED_LOCATION),
        Err(QueryError::LocationNotFound) => Reply::tell(phrases::LOCATION_NOT_FOUND),
        Err(QueryError::Transport { message }) => {
            warn!(zip = query.zip(), "Air quality lookup failed: {}", message);
            Reply::tell(phrases::SERVICE_UNAVAILABLE)
        }
    }
}
