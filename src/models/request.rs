use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Inbound event as delivered by the voice platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestEnvelope {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub session: Option<Session>,
    pub request: SkillRequest,
}

impl RequestEnvelope {
    pub fn application_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.application.as_ref())
            .map(|a| a.application_id.as_str())
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.session_id.as_str())
    }

    pub fn is_new_session(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.new)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub application: Option<Application>,
    #[serde(default)]
    pub attributes: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub application_id: String,
}

/// The three request kinds a skill receives
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SkillRequest {
    #[serde(rename_all = "camelCase")]
    LaunchRequest {
        request_id: String,
        #[serde(default)]
        timestamp: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    IntentRequest {
        request_id: String,
        #[serde(default)]
        timestamp: Option<String>,
        intent: Intent,
    },
    #[serde(rename_all = "camelCase")]
    SessionEndedRequest {
        request_id: String,
        #[serde(default)]
        timestamp: Option<String>,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl SkillRequest {
    pub fn request_id(&self) -> &str {
        match self {
            SkillRequest::LaunchRequest { request_id, .. }
            | SkillRequest::IntentRequest { request_id, .. }
            | SkillRequest::SessionEndedRequest { request_id, .. } => request_id,
        }
    }
}

/// A named, slot-parameterized user request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Intent {
    pub name: String,
    #[serde(default)]
    pub slots: HashMap<String, Slot>,
}

impl Intent {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            slots: HashMap::new(),
        }
    }

    pub fn with_slot<K: Into<String>, V: Into<String>>(mut self, name: K, value: V) -> Self {
        let name = name.into();
        self.slots.insert(
            name.clone(),
            Slot {
                name,
                value: Some(value.into()),
            },
        );
        self
    }

    /// Value of a slot, `None` when the slot is absent or was not filled
    pub fn slot_value(&self, name: &str) -> Option<&str> {
        self.slots.get(name).and_then(|slot| slot.value.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Slot {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value: Option<String>,
}
