//! Speech output construction
//!
//! Every handler answers with a [`Reply`]: either an `ask`, which keeps the
//! session open and carries a reprompt, or a `tell`, which ends the turn.

use serde::{Deserialize, Serialize};

/// How the platform should interpret speech text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechFormat {
    #[serde(rename = "PlainText")]
    PlainText,
    #[serde(rename = "SSML")]
    Ssml,
}

/// A single piece of speech tagged with its format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeechResponse {
    pub text: String,
    pub format: SpeechFormat,
}

impl SpeechResponse {
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            format: SpeechFormat::PlainText,
        }
    }

    /// Wraps markup in a `<speak>` root unless it already has one.
    pub fn ssml<S: Into<String>>(markup: S) -> Self {
        let markup = markup.into();
        let text = if markup.trim_start().starts_with("<speak>") {
            markup
        } else {
            format!("<speak>{markup}</speak>")
        };
        Self {
            text,
            format: SpeechFormat::Ssml,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

impl From<&str> for SpeechResponse {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl From<String> for SpeechResponse {
    fn from(text: String) -> Self {
        Self::plain(text)
    }
}

/// What a handler hands back to the platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Speak and wait for more input
    Ask {
        speech: SpeechResponse,
        reprompt: SpeechResponse,
    },
    /// Speak and end the session
    Tell { speech: SpeechResponse },
    /// End the session without speaking
    Silent,
}

impl Reply {
    pub fn ask(speech: impl Into<SpeechResponse>, reprompt: impl Into<SpeechResponse>) -> Self {
        Reply::Ask {
            speech: speech.into(),
            reprompt: reprompt.into(),
        }
    }

    pub fn tell(speech: impl Into<SpeechResponse>) -> Self {
        Reply::Tell {
            speech: speech.into(),
        }
    }

    pub fn speech(&self) -> Option<&SpeechResponse> {
        match self {
            Reply::Ask { speech, .. } | Reply::Tell { speech } => Some(speech),
            Reply::Silent => None,
        }
    }

    pub fn reprompt(&self) -> Option<&SpeechResponse> {
        match self {
            Reply::Ask { reprompt, .. } => Some(reprompt),
            _ => None,
        }
    }

    pub fn ends_session(&self) -> bool {
        !matches!(self, Reply::Ask { .. })
    }
}

/// Fixed phrases spoken by the skill
pub mod phrases {
    use super::{Reply, SpeechResponse};

    pub const SKILL_NAME: &str = "Air Quality Meter";

    pub const FAREWELL: &str = "Thanks for using Air Quality Meter, Goodbye";

    pub const UNSUPPORTED_LOCATION: &str =
        "Sorry, the zip code provided is not currently supported. Please try another zip code.";

    pub const LOCATION_NOT_FOUND: &str = "Sorry, that zip code could not be found, or data is not available for the zip code provided. Please try a different zip code.";

    pub const SERVICE_UNAVAILABLE: &str = "Sorry, I couldn't reach the air quality service right now. Please try again in a little while.";

    pub const HELP_REPROMPT: &str = "For instructions on what you can say, please say help me.";

    pub const ZIP_REPROMPT: &str = "Which five digit zip code would you like air quality information for?";

    const WELCOME: &str = "Welcome to Air Quality Meter. You can ask a question like, \
        What is the air quality rating in zip code <say-as interpret-as='digits'> 98105 </say-as> \
        or simply say the 5 digit zip code. \
        Which zip code would you like air quality information for?";

    const HELP: &str = "I can provide you the air quality rating for a location simply by providing a 5 digit zip code. \
        You may ask something like, \
        What is the air quality in zip code <say-as interpret-as='digits'> 98105 </say-as> \
        or simply say the 5 digit zip code... \
        Which zip code would you like air quality information for?";

    pub fn welcome() -> Reply {
        Reply::ask(SpeechResponse::ssml(WELCOME), HELP_REPROMPT)
    }

    pub fn help() -> Reply {
        Reply::ask(SpeechResponse::ssml(HELP), HELP_REPROMPT)
    }

    pub fn farewell() -> Reply {
        Reply::tell(FAREWELL)
    }

    pub fn missing_zip() -> Reply {
        Reply::ask(
            "I didn't catch a zip code. Which five digit zip code would you like air quality information for?",
            ZIP_REPROMPT,
        )
    }

    pub fn rating(zip: &str, rating: &str) -> Reply {
        Reply::tell(format!(
            "The air quality in zip code {zip} is rated {rating}."
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssml_is_wrapped_once() {
        let wrapped = SpeechResponse::ssml("hello");
        assert_eq!(wrapped.text, "<speak>hello</speak>");
        assert_eq!(wrapped.format, SpeechFormat::Ssml);

        let already = SpeechResponse::ssml("<speak>hi</speak>");
        assert_eq!(already.text, "<speak>hi</speak>");
    }

    #[test]
    fn test_plain_from_str() {
        let speech: SpeechResponse = "Goodbye".into();
        assert_eq!(speech.format, SpeechFormat::PlainText);
        assert!(!speech.is_empty());
    }

    #[test]
    fn test_ask_keeps_session_open() {
        let reply = phrases::welcome();
        assert!(!reply.ends_session());
        assert!(reply.reprompt().is_some_and(|r| !r.is_empty()));
        assert_eq!(reply.speech().map(|s| s.format), Some(SpeechFormat::Ssml));
    }

    #[test]
    fn test_tell_ends_session() {
        let reply = phrases::farewell();
        assert!(reply.ends_session());
        assert!(reply.reprompt().is_none());
        assert_eq!(reply.speech().map(|s| s.text.as_str()), Some(phrases::FAREWELL));
    }

    #[test]
    fn test_rating_sentence() {
        let reply = phrases::rating("98105", "good");
        assert_eq!(
            reply.speech().map(|s| s.text.as_str()),
            Some("The air quality in zip code 98105 is rated good.")
        );
    }

    #[test]
    fn test_silent_has_no_speech() {
        assert!(Reply::Silent.speech().is_none());
        assert!(Reply::Silent.ends_session());
    }
}
