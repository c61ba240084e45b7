use super::domain::{Application, Opportunity, OpportunityId};

/// Storage seam shared by the recorder, counter, and reconciler.
///
/// Every method is a single round trip. Nothing here spans more than one call, so an
/// application insert and the count update that follows it are never atomic.
pub trait RecordStore: Send + Sync {
    fn insert_opportunity(&self, opportunity: Opportunity) -> Result<Opportunity, StoreError>;
    fn fetch_opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, StoreError>;
    fn active_opportunities(&self) -> Result<Vec<Opportunity>, StoreError>;
    /// Overwrite the cached applicant count of one opportunity.
    fn set_applicant_count(&self, id: &OpportunityId, count: u32) -> Result<(), StoreError>;
    fn set_active(&self, id: &OpportunityId, active: bool) -> Result<(), StoreError>;

    /// Fails with `MissingOpportunity` when the referenced opportunity does not exist.
    fn insert_application(&self, application: Application) -> Result<Application, StoreError>;
    fn count_applications(&self, opportunity_id: &OpportunityId) -> Result<u32, StoreError>;
    fn applications_for(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<Application>, StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists: {0}")]
    Conflict(String),
    #[error("opportunity {0} does not exist")]
    MissingOpportunity(OpportunityId),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
