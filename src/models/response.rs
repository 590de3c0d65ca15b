use serde::{Deserialize, Serialize};

use crate::speech::{Reply, SpeechFormat, SpeechResponse};

pub const RESPONSE_VERSION: &str = "1.0";

/// Outbound reply envelope understood by the voice platform
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseEnvelope {
    pub version: String,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub session_attributes: serde_json::Map<String, serde_json::Value>,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_speech: Option<OutputSpeech>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    pub should_end_session: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

/// Speech payload; plain text goes in `text`, markup in `ssml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub format: SpeechFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssml: Option<String>,
}

impl OutputSpeech {
    /// Spoken content regardless of format
    pub fn content(&self) -> &str {
        self.text
            .as_deref()
            .or(self.ssml.as_deref())
            .unwrap_or_default()
    }
}

impl From<SpeechResponse> for OutputSpeech {
    fn from(speech: SpeechResponse) -> Self {
        match speech.format {
            SpeechFormat::PlainText => Self {
                format: SpeechFormat::PlainText,
                text: Some(speech.text),
                ssml: None,
            },
            SpeechFormat::Ssml => Self {
                format: SpeechFormat::Ssml,
                text: None,
                ssml: Some(speech.text),
            },
        }
    }
}

impl From<Reply> for ResponseBody {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Ask { speech, reprompt } => Self {
                output_speech: Some(speech.into()),
                reprompt: Some(Reprompt {
                    output_speech: reprompt.into(),
                }),
                should_end_session: false,
            },
            Reply::Tell { speech } => Self {
                output_speech: Some(speech.into()),
                reprompt: None,
                should_end_session: true,
            },
            Reply::Silent => Self {
                output_speech: None,
                reprompt: None,
                should_end_session: true,
            },
        }
    }
}

impl ResponseEnvelope {
    /// Builds the envelope, echoing session attributes back unchanged.
    pub fn new(
        reply: Reply,
        session_attributes: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Self {
        Self {
            version: RESPONSE_VERSION.to_string(),
            session_attributes: session_attributes.unwrap_or_default(),
            response: reply.into(),
        }
    }
}
