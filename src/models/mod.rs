//! Wire models for the voice platform's request and response envelopes

pub mod request;
pub mod response;

pub use request::{Application, Intent, RequestEnvelope, Session, SkillRequest, Slot};
pub use response::{OutputSpeech, Reprompt, ResponseBody, ResponseEnvelope};
