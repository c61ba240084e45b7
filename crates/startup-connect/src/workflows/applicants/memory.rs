use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use super::domain::{Application, Opportunity, OpportunityId};
use super::repository::{RecordStore, StoreError};

#[derive(Debug, Default)]
struct Tables {
    opportunities: BTreeMap<OpportunityId, Opportunity>,
    applications: Vec<Application>,
}

/// Process-local store for the demo server and tests.
///
/// Each call takes the lock once, so individual operations are consistent while
/// sequences of calls interleave freely.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRecordStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("record store lock poisoned".to_string()))
    }

    /// Every stored opportunity, inactive ones included.
    pub fn opportunities(&self) -> Result<Vec<Opportunity>, StoreError> {
        Ok(self.lock()?.opportunities.values().cloned().collect())
    }
}

impl RecordStore for InMemoryRecordStore {
    fn insert_opportunity(&self, opportunity: Opportunity) -> Result<Opportunity, StoreError> {
        let mut tables = self.lock()?;
        if tables.opportunities.contains_key(&opportunity.id) {
            return Err(StoreError::Conflict(opportunity.id.0));
        }
        tables
            .opportunities
            .insert(opportunity.id.clone(), opportunity.clone());
        Ok(opportunity)
    }

    fn fetch_opportunity(&self, id: &OpportunityId) -> Result<Option<Opportunity>, StoreError> {
        Ok(self.lock()?.opportunities.get(id).cloned())
    }

    fn active_opportunities(&self) -> Result<Vec<Opportunity>, StoreError> {
        Ok(self
            .lock()?
            .opportunities
            .values()
            .filter(|opportunity| opportunity.active)
            .cloned()
            .collect())
    }

    fn set_applicant_count(&self, id: &OpportunityId, count: u32) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let opportunity = tables
            .opportunities
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingOpportunity(id.clone()))?;
        opportunity.applicant_count = count;
        opportunity.updated_at = Utc::now();
        Ok(())
    }

    fn set_active(&self, id: &OpportunityId, active: bool) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let opportunity = tables
            .opportunities
            .get_mut(id)
            .ok_or_else(|| StoreError::MissingOpportunity(id.clone()))?;
        opportunity.active = active;
        opportunity.updated_at = Utc::now();
        Ok(())
    }

    fn insert_application(&self, application: Application) -> Result<Application, StoreError> {
        let mut tables = self.lock()?;
        if !tables
            .opportunities
            .contains_key(&application.opportunity_id)
        {
            return Err(StoreError::MissingOpportunity(
                application.opportunity_id.clone(),
            ));
        }
        if tables
            .applications
            .iter()
            .any(|existing| existing.id == application.id)
        {
            return Err(StoreError::Conflict(application.id.0));
        }
        tables.applications.push(application.clone());
        Ok(application)
    }

    fn count_applications(&self, opportunity_id: &OpportunityId) -> Result<u32, StoreError> {
        let count = self
            .lock()?
            .applications
            .iter()
            .filter(|application| &application.opportunity_id == opportunity_id)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    fn applications_for(
        &self,
        opportunity_id: &OpportunityId,
    ) -> Result<Vec<Application>, StoreError> {
        Ok(self
            .lock()?
            .applications
            .iter()
            .filter(|application| &application.opportunity_id == opportunity_id)
            .cloned()
            .collect())
    }
}
