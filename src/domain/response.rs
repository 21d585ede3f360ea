//! Submitted survey responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One submitted rating/review pair.
///
/// Appended to the response sink on submission, never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseRecord {
    /// Rating on the 1-10 scale
    pub rating: u8,
    /// Free-form review text, may be empty
    pub review: String,
    /// Tenant identifier the response belongs to
    pub tenant: String,
    /// Submission timestamp
    pub submitted_at: DateTime<Utc>,
}

impl ResponseRecord {
    /// Create a record stamped with the current time.
    pub fn new(tenant: impl Into<String>, rating: u8, review: impl Into<String>) -> Self {
        Self {
            rating,
            review: review.into(),
            tenant: tenant.into(),
            submitted_at: Utc::now(),
        }
    }
}
