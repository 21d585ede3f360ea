//! Popup configuration record.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SurveyrError};

/// Title shown on the rating step when the record carries none.
pub const DEFAULT_RATING_TITLE: &str = "Rate Us";

/// Title shown on the review step when the record carries none.
pub const DEFAULT_COMMENT_TITLE: &str = "Tell Us More";

/// Placeholder for the review text area when the record carries none.
pub const DEFAULT_PLACEHOLDER: &str = "Tell us more";

/// One tenant's popup configuration.
///
/// Owned by the configuration store; the scheduler holds an immutable
/// snapshot, replaced wholesale on every change event. Every field is
/// required on the wire; a record missing any field is malformed and is
/// treated as absent configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopupConfiguration {
    /// Title for the rating step
    pub rating_title: String,
    /// Title for the review step
    pub comment_title: String,
    /// Placeholder text for the review text area
    pub placeholder: String,
    /// Delay before the first display, in seconds
    pub wait_time: u64,
    /// Display quota for one session
    pub max_display: u32,
    /// Delay between displays, in minutes
    pub display_frequency: u64,
}

impl PopupConfiguration {
    /// Delay before the first display.
    pub fn wait_delay(&self) -> Duration {
        Duration::from_secs(self.wait_time)
    }

    /// Delay between displays.
    pub fn frequency_delay(&self) -> Duration {
        Duration::from_secs(self.display_frequency * 60)
    }

    /// Check the record's range constraints.
    ///
    /// Missing fields are already rejected at deserialization time; this
    /// covers the numeric floors a well-formed record must satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.max_display < 1 {
            return Err(SurveyrError::InvalidConfig(
                "max_display must be at least 1".to_string(),
            ));
        }
        if self.display_frequency < 1 {
            return Err(SurveyrError::InvalidConfig(
                "display_frequency must be at least 1 minute".to_string(),
            ));
        }
        Ok(())
    }

    /// Rating step title, defaulted when empty.
    pub fn rating_title(&self) -> &str {
        if self.rating_title.is_empty() {
            DEFAULT_RATING_TITLE
        } else {
            &self.rating_title
        }
    }

    /// Review step title, defaulted when empty.
    pub fn comment_title(&self) -> &str {
        if self.comment_title.is_empty() {
            DEFAULT_COMMENT_TITLE
        } else {
            &self.comment_title
        }
    }

    /// Review placeholder, defaulted when empty.
    pub fn placeholder(&self) -> &str {
        if self.placeholder.is_empty() {
            DEFAULT_PLACEHOLDER
        } else {
            &self.placeholder
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> PopupConfiguration {
        PopupConfiguration {
            rating_title: "How likely are you to recommend us?".to_string(),
            comment_title: "What could we do better?".to_string(),
            placeholder: "Your feedback".to_string(),
            wait_time: 5,
            max_display: 2,
            display_frequency: 1,
        }
    }

    #[test]
    fn test_wait_delay_seconds() {
        let config = sample_config();
        assert_eq!(config.wait_delay(), Duration::from_secs(5));
    }

    #[test]
    fn test_frequency_delay_minutes() {
        let config = sample_config();
        assert_eq!(config.frequency_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_max_display() {
        let mut config = sample_config();
        config.max_display = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_display"));
    }

    #[test]
    fn test_validate_rejects_zero_display_frequency() {
        let mut config = sample_config();
        config.display_frequency = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("display_frequency"));
    }

    #[test]
    fn test_wait_time_zero_is_valid() {
        let mut config = sample_config();
        config.wait_time = 0;
        assert!(config.validate().is_ok());
        assert_eq!(config.wait_delay(), Duration::ZERO);
    }

    #[test]
    fn test_titles_defaulted_when_empty() {
        let mut config = sample_config();
        config.rating_title = String::new();
        config.comment_title = String::new();
        config.placeholder = String::new();
        assert_eq!(config.rating_title(), DEFAULT_RATING_TITLE);
        assert_eq!(config.comment_title(), DEFAULT_COMMENT_TITLE);
        assert_eq!(config.placeholder(), DEFAULT_PLACEHOLDER);
    }

    #[test]
    fn test_serialization_uses_snake_case_fields() {
        let json = serde_json::to_value(sample_config()).unwrap();
        assert!(json.get("rating_title").is_some());
        assert!(json.get("comment_title").is_some());
        assert!(json.get("wait_time").is_some());
        assert!(json.get("max_display").is_some());
        assert!(json.get("display_frequency").is_some());
    }

    #[test]
    fn test_deserialization_rejects_missing_field() {
        // No partial updates: every field is required in a valid record.
        let partial = serde_json::json!({
            "rating_title": "Rate",
            "comment_title": "Comment",
            "placeholder": "",
            "wait_time": 5
        });
        let parsed: std::result::Result<PopupConfiguration, _> = serde_json::from_value(partial);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = sample_config();
        let json = serde_json::to_string(&config).unwrap();
        let restored: PopupConfiguration = serde_json::from_str(&json).unwrap();
        assert_eq!(config, restored);
    }
}
