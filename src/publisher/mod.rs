//! Configuration publisher - the operator side.
//!
//! Validates operator input and persists the popup configuration record
//! wholesale for one tenant. Validation failures are collected so the
//! operator sees every problem at once.

pub mod snippet;

use std::sync::Arc;

use crate::domain::PopupConfiguration;
use crate::error::{Result, SurveyrError};
use crate::store::ConfigStore;

/// Minimum length for the step titles.
const MIN_TITLE_LEN: usize = 3;

/// Minimum length for a non-empty placeholder.
const MIN_PLACEHOLDER_LEN: usize = 7;

/// Raw operator input for one configuration record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublishForm {
    /// Title for the rating step
    pub rating_title: String,
    /// Title for the review step
    pub comment_title: String,
    /// Placeholder for the review text area; may be empty
    pub placeholder: String,
    /// Delay before the first display, in seconds
    pub wait_time: u64,
    /// Display quota for one session
    pub max_display: u32,
    /// Delay between displays, in minutes
    pub display_frequency: u64,
}

impl PublishForm {
    /// Validate the form, collecting every problem.
    pub fn validate(&self) -> std::result::Result<PopupConfiguration, Vec<String>> {
        let mut errors = Vec::new();

        if self.rating_title.trim().len() < MIN_TITLE_LEN {
            errors.push(format!(
                "rating title must be at least {} characters long",
                MIN_TITLE_LEN
            ));
        }
        if self.comment_title.trim().len() < MIN_TITLE_LEN {
            errors.push(format!(
                "comment title must be at least {} characters long",
                MIN_TITLE_LEN
            ));
        }
        let placeholder = self.placeholder.trim();
        if !placeholder.is_empty() && placeholder.len() < MIN_PLACEHOLDER_LEN {
            errors.push(format!(
                "placeholder must be at least {} characters long",
                MIN_PLACEHOLDER_LEN
            ));
        }
        if self.max_display < 1 {
            errors.push("max display must be at least 1".to_string());
        }
        if self.display_frequency < 1 {
            errors.push("display frequency must be at least 1 minute".to_string());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        Ok(PopupConfiguration {
            rating_title: self.rating_title.trim().to_string(),
            comment_title: self.comment_title.trim().to_string(),
            placeholder: placeholder.to_string(),
            wait_time: self.wait_time,
            max_display: self.max_display,
            display_frequency: self.display_frequency,
        })
    }
}

/// Writes validated configuration records to the store.
pub struct Publisher<C: ConfigStore> {
    store: Arc<C>,
}

impl<C: ConfigStore> Publisher<C> {
    /// Create a publisher over the given store.
    pub fn new(store: Arc<C>) -> Self {
        Self { store }
    }

    /// Load the existing record for prefill/inspection.
    pub async fn load(&self, tenant: &str) -> Result<Option<PopupConfiguration>> {
        self.store.get(tenant).await
    }

    /// Validate and persist the form for one tenant.
    pub async fn publish(&self, tenant: &str, form: &PublishForm) -> Result<PopupConfiguration> {
        let record = form
            .validate()
            .map_err(|errors| SurveyrError::InvalidForm(errors.join("; ")))?;
        self.store.set(tenant, record.clone()).await?;
        log::info!("Published configuration for tenant {}", tenant);
        Ok(record)
    }
}
