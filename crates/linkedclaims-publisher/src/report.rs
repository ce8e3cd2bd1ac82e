//! Outcome of publishing a batch of claims

use linkedclaims_domain::ClaimId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Result of submitting one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PublishStatus {
    /// Registry accepted the claim
    Published {
        /// Registry response body
        response: Value,
    },
    /// Submission failed; the batch carried on
    Failed {
        /// Error description
        error: String,
    },
    /// Claim was filtered out before submission
    Skipped {
        /// Why the claim was not sent
        reason: String,
    },
}

/// Per-claim entry in a [`PublishReport`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishOutcome {
    /// Local claim id
    pub claim_id: ClaimId,

    /// Claim subject, for display
    pub subject: String,

    /// What happened
    #[serde(flatten)]
    pub status: PublishStatus,
}

impl PublishOutcome {
    /// Whether the registry accepted the claim
    pub fn is_published(&self) -> bool {
        matches!(self.status, PublishStatus::Published { .. })
    }
}

/// Summary of a batch submission
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishReport {
    /// One entry per input claim, in input order
    pub outcomes: Vec<PublishOutcome>,
}

impl PublishReport {
    /// Number of claims handled
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of claims the registry accepted
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_published()).count()
    }

    /// Number of claims whose submission failed
    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PublishStatus::Failed { .. }))
            .count()
    }

    /// Number of claims filtered out
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, PublishStatus::Skipped { .. }))
            .count()
    }

    /// Whether every submitted claim was accepted
    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    pub(crate) fn push(&mut self, claim_id: ClaimId, subject: &str, status: PublishStatus) {
        self.outcomes.push(PublishOutcome {
            claim_id,
            subject: subject.to_string(),
            status,
        });
    }
}
