use std::sync::Arc;

use tracing::debug;

use super::domain::OpportunityId;
use super::repository::RecordStore;
use super::service::AccountingError;

/// Maintains the cached `applicant_count` of an opportunity.
///
/// There is no locking here: two concurrent increments can read the same value and
/// both write `n + 1`. The reconciler repairs whatever drift that leaves behind.
pub struct ApplicantCounter<S> {
    store: Arc<S>,
}

impl<S> Clone for ApplicantCounter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> ApplicantCounter<S>
where
    S: RecordStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Add one to the cached value without counting records. Returns the new value.
    pub fn increment(&self, opportunity_id: &OpportunityId) -> Result<u32, AccountingError> {
        let opportunity = self
            .store
            .fetch_opportunity(opportunity_id)?
            .ok_or_else(|| AccountingError::NotFound(opportunity_id.clone()))?;

        let next = opportunity.applicant_count.saturating_add(1);
        self.store.set_applicant_count(opportunity_id, next)?;
        debug!(opportunity_id = %opportunity_id, applicant_count = next, "applicant count incremented");
        Ok(next)
    }

    /// Count the application records and write the result to the cache.
    pub fn recount(&self, opportunity_id: &OpportunityId) -> Result<u32, AccountingError> {
        if self.store.fetch_opportunity(opportunity_id)?.is_none() {
            return Err(AccountingError::NotFound(opportunity_id.clone()));
        }

        let actual = self.store.count_applications(opportunity_id)?;
        self.store.set_applicant_count(opportunity_id, actual)?;
        debug!(opportunity_id = %opportunity_id, applicant_count = actual, "applicant count recomputed");
        Ok(actual)
    }
}
