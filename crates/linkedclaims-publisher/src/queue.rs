//! Pending-claims store for human review before publishing

use crate::error::PublishError;
use linkedclaims_domain::{Claim, ClaimId};
use linkedclaims_extractor::ExtractionResult;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Review state of a queued claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ReviewStatus {
    /// Awaiting a decision
    Pending,
    /// Cleared for publishing
    Approved,
    /// Will not be published
    Rejected {
        /// Reviewer's note
        reason: String,
    },
}

/// A claim waiting in the queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewEntry {
    /// The claim under review
    pub claim: Claim,

    /// Current decision
    pub status: ReviewStatus,
}

/// Explicit review queue
///
/// The queue is a plain value owned by the caller; nothing in the pipeline
/// holds one implicitly. Entries keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewQueue {
    entries: Vec<ReviewEntry>,
}

impl ReviewQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every claim of an extraction result as pending
    ///
    /// Claims already in the queue are left untouched. Returns the number of
    /// claims added.
    pub fn enqueue(&mut self, result: &ExtractionResult) -> usize {
        self.enqueue_claims(result.claims.iter().cloned())
    }

    /// Queue claims as pending, skipping ids already present
    pub fn enqueue_claims(&mut self, claims: impl IntoIterator<Item = Claim>) -> usize {
        let mut added = 0;
        for claim in claims {
            if self.get(claim.id).is_some() {
                continue;
            }
            self.entries.push(ReviewEntry {
                claim,
                status: ReviewStatus::Pending,
            });
            added += 1;
        }
        info!(added, queued = self.entries.len(), "Claims queued for review");
        added
    }

    /// Look up an entry
    pub fn get(&self, id: ClaimId) -> Option<&ReviewEntry> {
        self.entries.iter().find(|e| e.claim.id == id)
    }

    fn entry_mut(&mut self, id: ClaimId) -> Result<&mut ReviewEntry, PublishError> {
        self.entries
            .iter_mut()
            .find(|e| e.claim.id == id)
            .ok_or(PublishError::NotQueued(id))
    }

    /// Mark a claim approved
    pub fn approve(&mut self, id: ClaimId) -> Result<(), PublishError> {
        self.entry_mut(id)?.status = ReviewStatus::Approved;
        debug!(%id, "Claim approved");
        Ok(())
    }

    /// Mark a claim rejected
    pub fn reject(&mut self, id: ClaimId, reason: impl Into<String>) -> Result<(), PublishError> {
        self.entry_mut(id)?.status = ReviewStatus::Rejected {
            reason: reason.into(),
        };
        debug!(%id, "Claim rejected");
        Ok(())
    }

    /// Approve every pending claim at or above `min_confidence`
    pub fn approve_above(&mut self, min_confidence: f64) -> usize {
        let mut approved = 0;
        for entry in &mut self.entries {
            if entry.status == ReviewStatus::Pending && entry.claim.confidence >= min_confidence {
                entry.status = ReviewStatus::Approved;
                approved += 1;
            }
        }
        approved
    }

    /// Claims still awaiting a decision
    pub fn pending(&self) -> impl Iterator<Item = &Claim> {
        self.entries
            .iter()
            .filter(|e| e.status == ReviewStatus::Pending)
            .map(|e| &e.claim)
    }

    /// Remove and return approved claims, in queue order
    ///
    /// Pending and rejected entries stay in the queue.
    pub fn drain_approved(&mut self) -> Vec<Claim> {
        let (approved, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.status == ReviewStatus::Approved);
        self.entries = rest;
        approved.into_iter().map(|e| e.claim).collect()
    }

    /// Number of queued entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Read a queue saved with [`ReviewQueue::save`]
    pub fn load(path: &Path) -> Result<Self, PublishError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the queue as JSON
    pub fn save(&self, path: &Path) -> Result<(), PublishError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
