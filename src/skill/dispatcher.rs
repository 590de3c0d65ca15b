//! Intent dispatch table and the per-request turn lifecycle

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, info};

use super::handlers::{AirQualityHandler, IntentHandler, StaticReply};
use crate::air_quality::RatingSource;
use crate::models::SkillRequest;
use crate::speech::{Reply, phrases};

pub const AIR_QUALITY_INTENT: &str = "AirQualityIntent";
pub const HELP_INTENT: &str = "AMAZON.HelpIntent";
pub const STOP_INTENT: &str = "AMAZON.StopIntent";
pub const CANCEL_INTENT: &str = "AMAZON.CancelIntent";

/// Where a single turn is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchState {
    AwaitingIntent,
    Launching,
    Querying,
    Helping,
    Stopping,
    Cancelling,
    Fallback,
    Closing,
    Responded,
}

impl fmt::Display for DispatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One request's pass through the dispatcher.
///
/// `respond` consumes the turn, so a turn yields exactly one reply.
#[derive(Debug)]
pub struct Turn {
    state: DispatchState,
}

impl Turn {
    pub fn new() -> Self {
        Self {
            state: DispatchState::AwaitingIntent,
        }
    }

    fn enter(&mut self, state: DispatchState) {
        debug_assert_eq!(self.state, DispatchState::AwaitingIntent);
        debug!("Turn {} -> {}", self.state, state);
        self.state = state;
    }

    fn respond(mut self, reply: Reply) -> Reply {
        debug!("Turn {} -> {}", self.state, DispatchState::Responded);
        self.state = DispatchState::Responded;
        reply
    }
}

impl Default for Turn {
    fn default() -> Self {
        Self::new()
    }
}

struct Route {
    state: DispatchState,
    handler: Arc<dyn IntentHandler>,
}

/// Dispatch table from intent name to handler
pub struct IntentDispatcher {
    routes: HashMap<String, Route>,
    fallback: Arc<dyn IntentHandler>,
}

impl IntentDispatcher {
    /// Dispatcher with no routes; unknown intents go to `fallback`
    fn empty(fallback: Arc<dyn IntentHandler>) -> Self {
        Self {
            routes: HashMap::new(),
            fallback,
        }
    }

    /// Dispatcher wired with the skill's four intents
    pub fn new(source: Arc<dyn RatingSource>) -> Self {
        let farewell: Arc<dyn IntentHandler> = Arc::new(StaticReply(phrases::farewell));
        let mut dispatcher = Self::empty(Arc::new(StaticReply(phrases::help)));
        dispatcher.register(
            AIR_QUALITY_INTENT,
            DispatchState::Querying,
            Arc::new(AirQualityHandler::new(source)),
        );
        dispatcher.register(
            HELP_INTENT,
            DispatchState::Helping,
            Arc::new(StaticReply(phrases::help)),
        );
        dispatcher.register(STOP_INTENT, DispatchState::Stopping, farewell.clone());
        dispatcher.register(CANCEL_INTENT, DispatchState::Cancelling, farewell);
        dispatcher
    }

    pub fn register<S: Into<String>>(
        &mut self,
        name: S,
        state: DispatchState,
        handler: Arc<dyn IntentHandler>,
    ) {
        self.routes.insert(name.into(), Route { state, handler });
    }

    /// State a request moves the turn into
    pub fn state_for(&self, request: &SkillRequest) -> DispatchState {
        match request {
            SkillRequest::LaunchRequest { .. } => DispatchState::Launching,
            SkillRequest::SessionEndedRequest { .. } => DispatchState::Closing,
            SkillRequest::IntentRequest { intent, .. } => self
                .routes
                .get(intent.name.as_str())
                .map_or(DispatchState::Fallback, |route| route.state),
        }
    }

    pub async fn dispatch(&self, request: &SkillRequest) -> Reply {
        let mut turn = Turn::new();
        turn.enter(self.state_for(request));

        let reply = match request {
            SkillRequest::LaunchRequest { .. } => phrases::welcome(),
            SkillRequest::SessionEndedRequest { reason, .. } => {
                info!(
                    "Session ended: {}",
                    reason.as_deref().unwrap_or("unspecified")
                );
                Reply::Silent
            }
            SkillRequest::IntentRequest { intent, .. } => {
                match self.routes.get(intent.name.as_str()) {
                    Some(route) => route.handler.handle(intent).await,
                    None => {
                        info!("Unrecognized intent '{}', replying with help", intent.name);
                        self.fallback.handle(intent).await
                    }
                }
            }
        };

        turn.respond(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::air_quality::{AirQualityQuery, Rating};
    use crate::error::QueryError;
    use crate::models::Intent;
    use async_trait::async_trait;
    use rstest::rstest;

    struct NoData;

    #[async_trait]
    impl RatingSource for NoData {
        async fn fetch_rating(&self, _query: &AirQualityQuery) -> Result<Rating, QueryError> {
            Err(QueryError::LocationNotFound)
        }
    }

    fn dispatcher() -> IntentDispatcher {
        IntentDispatcher::new(Arc::new(NoData))
    }

    fn intent_request(name: &str) -> SkillRequest {
        SkillRequest::IntentRequest {
            request_id: "req-1".to_string(),
            timestamp: None,
            intent: Intent::new(name),
        }
    }

    fn launch_request() -> SkillRequest {
        SkillRequest::LaunchRequest {
            request_id: "req-1".to_string(),
            timestamp: None,
        }
    }

    #[rstest]
    #[case(AIR_QUALITY_INTENT, DispatchState::Querying)]
    #[case(HELP_INTENT, DispatchState::Helping)]
    #[case(STOP_INTENT, DispatchState::Stopping)]
    #[case(CANCEL_INTENT, DispatchState::Cancelling)]
    #[case("AMAZON.YesIntent", DispatchState::Fallback)]
    #[case("airqualityintent", DispatchState::Fallback)]
    fn test_state_selection(#[case] name: &str, #[case] expected: DispatchState) {
        assert_eq!(dispatcher().state_for(&intent_request(name)), expected);
    }

    #[test]
    fn test_launch_and_session_end_states() {
        let dispatcher = dispatcher();
        assert_eq!(dispatcher.state_for(&launch_request()), DispatchState::Launching);
        let ended = SkillRequest::SessionEndedRequest {
            request_id: "req-1".to_string(),
            timestamp: None,
            reason: Some("USER_INITIATED".to_string()),
        };
        assert_eq!(dispatcher.state_for(&ended), DispatchState::Closing);
    }

    #[tokio::test]
    async fn test_stop_and_cancel_reply_identically() {
        let dispatcher = dispatcher();
        let stop = dispatcher.dispatch(&intent_request(STOP_INTENT)).await;
        let cancel = dispatcher.dispatch(&intent_request(CANCEL_INTENT)).await;
        assert_eq!(stop, cancel);
        assert!(stop.ends_session());
        assert_eq!(stop, phrases::farewell());
    }

    #[rstest]
    #[tokio::test]
    async fn test_prompts_ask_with_reprompt(
        #[values(launch_request(), intent_request(HELP_INTENT))] request: SkillRequest,
    ) {
        let reply = dispatcher().dispatch(&request).await;
        assert!(matches!(reply, Reply::Ask { .. }));
        assert!(reply.reprompt().is_some_and(|r| !r.is_empty()));
    }

    #[tokio::test]
    async fn test_unknown_intent_falls_back_to_help() {
        let reply = dispatcher().dispatch(&intent_request("AMAZON.YesIntent")).await;
        assert_eq!(reply, phrases::help());
    }

    #[tokio::test]
    async fn test_registered_route_overrides_default() {
        let mut dispatcher = dispatcher();
        dispatcher.register(
            STOP_INTENT,
            DispatchState::Stopping,
            Arc::new(StaticReply(|| Reply::tell("Bye"))),
        );
        let reply = dispatcher.dispatch(&intent_request(STOP_INTENT)).await;
        assert_eq!(reply, Reply::tell("Bye"));
    }

    #[tokio::test]
    async fn test_empty_dispatcher_uses_fallback() {
        let dispatcher = IntentDispatcher::empty(Arc::new(StaticReply(phrases::farewell)));
        let reply = dispatcher.dispatch(&intent_request(HELP_INTENT)).await;
        assert_eq!(reply, phrases::farewell());
    }

    #[test]
    fn test_turn_starts_awaiting() {
        let turn = Turn::new();
        assert_eq!(turn.state, DispatchState::AwaitingIntent);
        let reply = turn.respond(Reply::Silent);
        assert_eq!(reply, Reply::Silent);
    }
}
