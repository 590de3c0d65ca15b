//! Air Quality Meter - voice skill backend
//!
//! Receives voice platform requests, looks up the air quality rating for a
//! spoken zip code and answers with speech.

pub mod air_quality;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod skill;
pub mod speech;
pub mod web;

// Re-export core types for public API
pub use air_quality::{AirQualityClient, AirQualityQuery, Rating, RatingSource};
pub use config::SkillConfig;
pub use error::{QueryError, SkillError};
pub use models::{RequestEnvelope, ResponseEnvelope};
pub use skill::AirQualitySkill;
pub use speech::{Reply, SpeechFormat, SpeechResponse};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, SkillError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
