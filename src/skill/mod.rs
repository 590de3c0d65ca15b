//! Skill entry point
//!
//! Verifies the inbound envelope, hands the request to the dispatcher and
//! wraps the resulting reply in the platform's response envelope.

pub mod dispatcher;
pub mod handlers;

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, instrument};

use crate::SkillError;
use crate::air_quality::{AirQualityClient, RatingSource};
use crate::config::SkillConfig;
use crate::models::{RequestEnvelope, ResponseEnvelope};

pub use dispatcher::{DispatchState, IntentDispatcher, Turn};
pub use handlers::{AirQualityHandler, IntentHandler, StaticReply};

pub struct AirQualitySkill {
    dispatcher: IntentDispatcher,
    application_id: Option<String>,
}

impl AirQualitySkill {
    /// Build the skill with an HTTP client for the configured provider
    pub fn new(config: &SkillConfig) -> Result<Self> {
        let client = AirQualityClient::new(config.provider.clone())?;
        Ok(Self::with_source(
            Arc::new(client),
            config.skill.application_id.clone(),
        ))
    }

    pub fn with_source(source: Arc<dyn RatingSource>, application_id: Option<String>) -> Self {
        Self {
            dispatcher: IntentDispatcher::new(source),
            application_id,
        }
    }

    #[instrument(
        name = "skill_request",
        skip_all,
        fields(request_id = envelope.request.request_id())
    )]
    pub async fn execute(
        &self,
        envelope: RequestEnvelope,
    ) -> std::result::Result<ResponseEnvelope, SkillError> {
        self.verify_application(&envelope)?;

        if envelope.is_new_session() {
            info!(
                "Session started: {}",
                envelope.session_id().unwrap_or("unknown")
            );
        }

        let reply = self.dispatcher.dispatch(&envelope.request).await;
        let attributes = envelope.session.and_then(|session| session.attributes);
        Ok(ResponseEnvelope::new(reply, attributes))
    }

    fn verify_application(&self, envelope: &RequestEnvelope) -> std::result::Result<(), SkillError> {
        let Some(expected) = self.application_id.as_deref() else {
            return Ok(());
        };
        match envelope.application_id() {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(SkillError::invalid_application(format!(
                "request issued for '{actual}'"
            ))),
            None => Err(SkillError::invalid_application(
                "request carries no application id",
            )),
        }
    }
}
