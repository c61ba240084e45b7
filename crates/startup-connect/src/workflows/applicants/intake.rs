use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use super::domain::{
    ApplicationSubmission, OpportunityDraft, OpportunityId, ResumeAttachment,
};

pub const DEFAULT_MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

pub const DEFAULT_RESUME_TYPES: [&str; 3] = [
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// Input rejected before anything is written.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("motivation must not be empty")]
    EmptyMotivation,
    #[error("resume must be a base64 encoded data URL")]
    MalformedResume,
    #[error("resume type '{mime_type}' is not accepted; upload a PDF or Word document")]
    UnsupportedResumeType { mime_type: String },
    #[error("resume is {size} bytes, above the {max} byte limit")]
    ResumeTooLarge { size: usize, max: usize },
    #[error("opportunity {0} is no longer accepting applications")]
    OpportunityClosed(OpportunityId),
    #[error("title must not be empty")]
    EmptyTitle,
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("compensation amount must be a non-negative number")]
    InvalidCompensation,
}

impl ValidationError {
    /// Name of the offending input field.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyMotivation => "motivation",
            ValidationError::MalformedResume
            | ValidationError::UnsupportedResumeType { .. }
            | ValidationError::ResumeTooLarge { .. } => "resume",
            ValidationError::OpportunityClosed(_) => "opportunity_id",
            ValidationError::EmptyTitle => "title",
            ValidationError::EmptyDescription => "description",
            ValidationError::InvalidCompensation => "compensation",
        }
    }
}

/// Size ceiling and accepted mime types for resume uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakePolicy {
    max_resume_bytes: usize,
    allowed_resume_types: Vec<String>,
}

impl IntakePolicy {
    pub fn new(max_resume_bytes: usize, allowed_resume_types: Vec<String>) -> Self {
        let max_resume_bytes = if max_resume_bytes == 0 {
            DEFAULT_MAX_RESUME_BYTES
        } else {
            max_resume_bytes
        };

        let allowed_resume_types: Vec<String> = allowed_resume_types
            .into_iter()
            .map(|mime| mime.trim().to_ascii_lowercase())
            .filter(|mime| !mime.is_empty())
            .collect();
        let allowed_resume_types = if allowed_resume_types.is_empty() {
            default_resume_types()
        } else {
            allowed_resume_types
        };

        Self {
            max_resume_bytes,
            allowed_resume_types,
        }
    }

    pub fn max_resume_bytes(&self) -> usize {
        self.max_resume_bytes
    }

    pub fn allowed_resume_types(&self) -> &[String] {
        &self.allowed_resume_types
    }

    pub fn accepts(&self, mime_type: &str) -> bool {
        self.allowed_resume_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(mime_type))
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RESUME_BYTES, default_resume_types())
    }
}

fn default_resume_types() -> Vec<String> {
    DEFAULT_RESUME_TYPES
        .iter()
        .map(|mime| mime.to_string())
        .collect()
}

/// Validated application fields, ready to be stamped with ids and persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDraft {
    pub motivation: String,
    pub resume: Option<ResumeAttachment>,
}

/// Turns raw payloads into drafts, or names the field that is wrong.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    policy: IntakePolicy,
}

impl IntakeGuard {
    pub fn with_policy(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    pub fn application_from_submission(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationDraft, ValidationError> {
        let motivation = submission.motivation.trim();
        if motivation.is_empty() {
            return Err(ValidationError::EmptyMotivation);
        }

        let resume = match submission.resume {
            Some(data_url) if !data_url.trim().is_empty() => Some(self.resume(data_url)?),
            _ => None,
        };

        Ok(ApplicationDraft {
            motivation: motivation.to_string(),
            resume,
        })
    }

    pub fn opportunity_from_draft(
        &self,
        draft: OpportunityDraft,
    ) -> Result<OpportunityDraft, ValidationError> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }

        let description = draft.description.trim().to_string();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }

        if let Some(amount) = draft.compensation.as_ref().and_then(|comp| comp.amount) {
            if !amount.is_finite() || amount < 0.0 {
                return Err(ValidationError::InvalidCompensation);
            }
        }

        let location = draft
            .location
            .map(|location| location.trim().to_string())
            .filter(|location| !location.is_empty());

        Ok(OpportunityDraft {
            title,
            description,
            location,
            ..draft
        })
    }

    fn resume(&self, data_url: String) -> Result<ResumeAttachment, ValidationError> {
        let (mime_type, payload) = split_data_url(&data_url)?;

        if !self.policy.accepts(&mime_type) {
            return Err(ValidationError::UnsupportedResumeType { mime_type });
        }

        let max = self.policy.max_resume_bytes();
        let padding = payload.bytes().rev().take_while(|byte| *byte == b'=').count();
        let claimed = base64::decoded_len_estimate(payload.len()).saturating_sub(padding);
        if claimed > max {
            return Err(ValidationError::ResumeTooLarge { size: claimed, max });
        }

        let size = STANDARD
            .decode(payload)
            .map_err(|_| ValidationError::MalformedResume)?
            .len();
        if size > max {
            return Err(ValidationError::ResumeTooLarge { size, max });
        }

        Ok(ResumeAttachment {
            mime_type,
            size_bytes: size,
            data_url,
        })
    }
}

/// Split `data:<mime>[;param]*;base64,<payload>` into a lowercased mime type and payload.
fn split_data_url(data_url: &str) -> Result<(String, &str), ValidationError> {
    let rest = data_url
        .trim()
        .strip_prefix("data:")
        .ok_or(ValidationError::MalformedResume)?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or(ValidationError::MalformedResume)?;

    let mut parts = header.split(';');
    let mime_type = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
    if mime_type.is_empty() || !parts.any(|part| part.trim().eq_ignore_ascii_case("base64")) {
        return Err(ValidationError::MalformedResume);
    }

    Ok((mime_type, payload))
}
