use crate::error::{PersistenceError, ServiceError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::utils::{is_blank, trimmed_or_empty};
use std::future::Future;

/// Raw lead form input; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub company: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn from_submission(
        submission: &LeadSubmission,
        id: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: trimmed_or_empty(submission.name.as_deref()),
            email: trimmed_or_empty(submission.email.as_deref()),
            phone: trimmed_or_empty(submission.phone.as_deref()),
            company: trimmed_or_empty(submission.company.as_deref()),
            message: trimmed_or_empty(submission.message.as_deref()),
            created_at,
        }
    }
}

const CONTACT_REQUIRED: &str = "Provide at least an email or phone.";

/// Acceptance rules for a lead submission.
#[derive(Debug, Clone, Default)]
pub struct LeadPolicy;

impl LeadPolicy {
    pub fn new() -> Self {
        Self
    }

    pub fn validate(&self, submission: &LeadSubmission) -> Result<(), ServiceError> {
        let has_email = submission.email.as_deref().is_some_and(|e| !is_blank(e));
        let has_phone = submission.phone.as_deref().is_some_and(|p| !is_blank(p));
        if !has_email && !has_phone {
            return Err(ServiceError::validation(CONTACT_REQUIRED));
        }
        Ok(())
    }
}

/// Durable, ordered collection of captured leads.
pub trait LeadStore: Send + Sync {
    fn append(&self, lead: Lead) -> impl Future<Output = Result<Lead, PersistenceError>> + Send;

    /// All stored leads in insertion order.
    fn list(&self) -> impl Future<Output = Result<Vec<Lead>, PersistenceError>> + Send;
}
