use chrono::Utc;
use domain::error::ServiceError;
use domain::lead::{Lead, LeadPolicy, LeadStore, LeadSubmission};
use std::sync::Arc;
use uuid::Uuid;

pub struct LeadService<S> {
    store: Arc<S>,
    policy: LeadPolicy,
}

impl<S: LeadStore> LeadService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            policy: LeadPolicy::new(),
        }
    }

    /// Validate before touching the store; invalid submissions have no side effects.
    pub async fn submit(&self, submission: &LeadSubmission) -> Result<Lead, ServiceError> {
        self.policy.validate(submission)?;
        let lead = Lead::from_submission(submission, Uuid::new_v4().to_string(), Utc::now());
        Ok(self.store.append(lead).await?)
    }

    pub async fn list(&self) -> Result<Vec<Lead>, ServiceError> {
        Ok(self.store.list().await?)
    }
}
