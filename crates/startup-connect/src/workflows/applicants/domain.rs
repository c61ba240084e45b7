use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier wrapper for posted opportunities.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OpportunityId(pub String);

/// Identifier wrapper for submitted applications.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

/// Opaque id of an authenticated user, as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

impl fmt::Display for OpportunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpportunityKind {
    Internship,
    Research,
    LabAssistant,
    FullTime,
    PartTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompensationKind {
    Paid,
    Unpaid,
    Stipend,
    Credit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compensation {
    pub kind: CompensationKind,
    #[serde(default)]
    pub amount: Option<f64>,
}

/// Poster-supplied fields for a new opportunity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityDraft {
    pub title: String,
    pub description: String,
    pub kind: OpportunityKind,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub remote_friendly: bool,
    #[serde(default)]
    pub compensation: Option<Compensation>,
}

/// A posted listing. `applicant_count` is a cache over the application records
/// and is only written by the counter and the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opportunity {
    pub id: OpportunityId,
    pub title: String,
    pub description: String,
    pub kind: OpportunityKind,
    pub location: Option<String>,
    pub remote_friendly: bool,
    pub compensation: Option<Compensation>,
    pub applicant_count: u32,
    pub created_by: UserId,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inbound application payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationSubmission {
    pub motivation: String,
    /// `data:<mime>;base64,<payload>` as produced by a browser file reader.
    #[serde(default)]
    pub resume: Option<String>,
}

/// Resume carried through untouched apart from the type and size checks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeAttachment {
    pub mime_type: String,
    pub size_bytes: usize,
    pub data_url: String,
}

/// A single submission against one opportunity. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub opportunity_id: OpportunityId,
    pub applicant_id: UserId,
    pub motivation: String,
    pub resume: Option<ResumeAttachment>,
    pub submitted_at: DateTime<Utc>,
}

impl Application {
    pub fn summary(&self) -> ApplicationSummary {
        ApplicationSummary {
            id: self.id.clone(),
            opportunity_id: self.opportunity_id.clone(),
            applicant_id: self.applicant_id.clone(),
            motivation: self.motivation.clone(),
            resume: self.resume.as_ref().map(|resume| ResumeSummary {
                mime_type: resume.mime_type.clone(),
                size_bytes: resume.size_bytes,
            }),
            submitted_at: self.submitted_at,
        }
    }
}

/// Application as exposed to reviewers, without the encoded resume body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationSummary {
    pub id: ApplicationId,
    pub opportunity_id: OpportunityId,
    pub applicant_id: UserId,
    pub motivation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume: Option<ResumeSummary>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResumeSummary {
    pub mime_type: String,
    pub size_bytes: usize,
}

/// Per-opportunity figures for the poster's dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationStats {
    pub opportunity_id: OpportunityId,
    pub cached_count: u32,
    pub live_count: u32,
    pub with_resume: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_submission_at: Option<DateTime<Utc>>,
}

impl ApplicationStats {
    pub fn in_sync(&self) -> bool {
        self.cached_count == self.live_count
    }
}
