use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::db::{Database, StoredDecision};
use crate::error::{ReviewError, ReviewResult};
use crate::fusion::{FusedCandidate, PresentationSlot};

/// Review state of one target, derived from decision + focus, never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TargetStatus {
    Pending,
    Selected,
    Completed,
}

/// The reviewer's binding choice for one target.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub character: char,
    pub reliability: f64,
    pub decided_at: DateTime<Utc>,
}

struct StoreState {
    /// Fused candidates per target, registered before any decision is
    /// possible; acceptance is validated against these identities.
    candidates: HashMap<u32, Vec<FusedCandidate>>,
    decisions: HashMap<u32, Decision>,
    /// The single target the reviewer is currently looking at.
    focused: Option<u32>,
}

/// Per-target acceptance tracking for one document under review.
///
/// One mutex guards the whole state, so accept's clear-previous-then-set-new
/// step is a single atomic unit even when UI events interleave. When built
/// with a database handle, decisions are written through after the in-memory
/// change; persistence failures are logged and never fail the review action.
pub struct InspectionStore {
    inner: Arc<Mutex<StoreState>>,
    db: Option<Database>,
    document_id: String,
}

impl InspectionStore {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StoreState {
                candidates: HashMap::new(),
                decisions: HashMap::new(),
                focused: None,
            })),
            db: None,
            document_id: document_id.into(),
        }
    }

    pub fn with_database(document_id: impl Into<String>, db: Database) -> Self {
        let mut store = Self::new(document_id);
        store.db = Some(db);
        store
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Register a target's presentation list. Placeholder rows carry no
    /// candidate identity and are skipped.
    pub async fn register_candidates(&self, target_id: u32, slots: &[PresentationSlot]) {
        let candidates: Vec<FusedCandidate> =
            slots.iter().filter_map(|s| s.candidate().cloned()).collect();
        let mut state = self.inner.lock().await;
        state.candidates.insert(target_id, candidates);
    }

    /// Mark `character` as the sole accepted candidate for the target,
    /// replacing any previous acceptance in the same step.
    pub async fn accept(&self, target_id: u32, character: char) -> ReviewResult<()> {
        let decision = {
            let mut state = self.inner.lock().await;
            let reliability = {
                let candidates = state
                    .candidates
                    .get(&target_id)
                    .ok_or(ReviewError::UnknownTarget { target_id })?;
                candidates
                    .iter()
                    .find(|c| c.character == character)
                    .ok_or_else(|| ReviewError::unknown_candidate(target_id, character))?
                    .reliability
            };

            let decision = Decision {
                character,
                reliability,
                decided_at: Utc::now(),
            };
            state.decisions.insert(target_id, decision.clone());
            decision
        };

        self.persist_upsert(target_id, &decision).await;
        Ok(())
    }

    /// Clear the acceptance for a target. Idempotent; unknown targets and
    /// already-pending targets are a no-op.
    pub async fn unaccept(&self, target_id: u32) {
        let removed = {
            let mut state = self.inner.lock().await;
            state.decisions.remove(&target_id).is_some()
        };

        if removed {
            self.persist_delete(target_id).await;
        }
    }

    /// Unaccept if `character` is the current acceptance, else accept it.
    pub async fn toggle(&self, target_id: u32, character: char) -> ReviewResult<()> {
        let currently_accepted = {
            let state = self.inner.lock().await;
            state
                .decisions
                .get(&target_id)
                .map(|d| d.character == character)
                .unwrap_or(false)
        };

        if currently_accepted {
            self.unaccept(target_id).await;
            Ok(())
        } else {
            self.accept(target_id, character).await
        }
    }

    /// Move the reviewer's focus to a target. Only one target is focused at
    /// a time; the previous focus falls back to pending or completed.
    pub async fn focus(&self, target_id: u32) -> ReviewResult<()> {
        let mut state = self.inner.lock().await;
        if !state.candidates.contains_key(&target_id) {
            return Err(ReviewError::UnknownTarget { target_id });
        }
        state.focused = Some(target_id);
        Ok(())
    }

    pub async fn clear_focus(&self) {
        let mut state = self.inner.lock().await;
        state.focused = None;
    }

    pub async fn status(&self, target_id: u32) -> TargetStatus {
        let state = self.inner.lock().await;
        if state.decisions.contains_key(&target_id) {
            TargetStatus::Completed
        } else if state.focused == Some(target_id) {
            TargetStatus::Selected
        } else {
            TargetStatus::Pending
        }
    }

    pub async fn accepted_character(&self, target_id: u32) -> Option<char> {
        let state = self.inner.lock().await;
        state.decisions.get(&target_id).map(|d| d.character)
    }

    pub async fn is_accepted(&self, target_id: u32, character: char) -> bool {
        self.accepted_character(target_id).await == Some(character)
    }

    pub async fn completed_count(&self) -> usize {
        let state = self.inner.lock().await;
        state.decisions.len()
    }

    /// Snapshot of all decisions, for the statistics aggregator.
    pub async fn decisions(&self) -> HashMap<u32, Decision> {
        let state = self.inner.lock().await;
        state.decisions.clone()
    }

    /// Restore decisions persisted in an earlier session. Rows referencing
    /// candidates no longer in the fused lists are skipped with a warning
    /// rather than failing startup.
    pub async fn rehydrate(&self, stored: Vec<StoredDecision>) {
        let mut state = self.inner.lock().await;
        for row in stored {
            let valid = state
                .candidates
                .get(&row.target_id)
                .map(|cs| cs.iter().any(|c| c.character == row.character))
                .unwrap_or(false);
            if !valid {
                warn!(
                    "skipping stale decision for target {} ('{}') in document {}",
                    row.target_id, row.character, self.document_id
                );
                continue;
            }
            state.decisions.insert(
                row.target_id,
                Decision {
                    character: row.character,
                    reliability: row.reliability,
                    decided_at: row.decided_at,
                },
            );
        }
    }

    async fn persist_upsert(&self, target_id: u32, decision: &Decision) {
        if let Some(db) = &self.db {
            let row = StoredDecision {
                document_id: self.document_id.clone(),
                target_id,
                character: decision.character,
                reliability: decision.reliability,
                decided_at: decision.decided_at,
            };
            if let Err(err) = db.upsert_decision(row).await {
                error!("failed to persist decision for target {target_id}: {err:#}");
            }
        }
    }

    async fn persist_delete(&self, target_id: u32) {
        if let Some(db) = &self.db {
            if let Err(err) = db.delete_decision(&self.document_id, target_id).await {
                error!("failed to delete persisted decision for target {target_id}: {err:#}");
            }
        }
    }
}

impl Clone for InspectionStore {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            db: self.db.clone(),
            document_id: self.document_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fusion::{fuse, FusionConfig, ModelScore};

    async fn store_with_target(target_id: u32) -> InspectionStore {
        let store = InspectionStore::new("rubbing-1");
        let vision = vec![
            ModelScore::new('麗', 85.4),
            ModelScore::new('郁', 80.8),
            ModelScore::new('都', 75.5),
        ];
        let nlp = vec![
            ModelScore::new('麗', 70.3),
            ModelScore::new('郡', 68.5),
            ModelScore::new('都', 52.3),
        ];
        let slots = fuse(target_id, &vision, &nlp, &FusionConfig::default()).unwrap();
        store.register_candidates(target_id, &slots).await;
        store
    }

    #[tokio::test]
    async fn accept_replaces_previous_acceptance() {
        let store = store_with_target(4).await;

        store.accept(4, '麗').await.unwrap();
        store.accept(4, '都').await.unwrap();

        assert_eq!(store.accepted_character(4).await, Some('都'));
        assert!(!store.is_accepted(4, '麗').await);
        assert_eq!(store.completed_count().await, 1);
    }

    #[tokio::test]
    async fn unaccept_is_idempotent() {
        let store = store_with_target(4).await;
        store.accept(4, '麗').await.unwrap();

        store.unaccept(4).await;
        let after_first = store.decisions().await;
        store.unaccept(4).await;
        let after_second = store.decisions().await;

        assert!(after_first.is_empty());
        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn toggle_flips_acceptance() {
        let store = store_with_target(4).await;

        store.toggle(4, '麗').await.unwrap();
        assert!(store.is_accepted(4, '麗').await);

        store.toggle(4, '麗').await.unwrap();
        assert_eq!(store.accepted_character(4).await, None);

        store.toggle(4, '麗').await.unwrap();
        store.toggle(4, '郡').await.unwrap();
        assert_eq!(store.accepted_character(4).await, Some('郡'));
    }

    #[tokio::test]
    async fn status_follows_focus_and_decisions() {
        let store = store_with_target(4).await;
        assert_eq!(store.status(4).await, TargetStatus::Pending);

        store.focus(4).await.unwrap();
        assert_eq!(store.status(4).await, TargetStatus::Selected);

        store.accept(4, '麗').await.unwrap();
        assert_eq!(store.status(4).await, TargetStatus::Completed);

        // Completed targets keep their character while unfocused.
        store.clear_focus().await;
        assert_eq!(store.status(4).await, TargetStatus::Completed);
        assert_eq!(store.accepted_character(4).await, Some('麗'));

        // Reopening for re-review, then walking away without a decision.
        store.unaccept(4).await;
        store.focus(4).await.unwrap();
        assert_eq!(store.status(4).await, TargetStatus::Selected);
        store.clear_focus().await;
        assert_eq!(store.status(4).await, TargetStatus::Pending);
    }

    #[tokio::test]
    async fn accept_validates_candidate_identity() {
        let store = store_with_target(4).await;

        let err = store.accept(4, '日').await.unwrap_err();
        assert_eq!(
            err,
            ReviewError::UnknownCandidate {
                target_id: 4,
                character: '日'
            }
        );
        assert_eq!(store.completed_count().await, 0);

        let err = store.accept(9, '麗').await.unwrap_err();
        assert_eq!(err, ReviewError::UnknownTarget { target_id: 9 });
    }

    #[tokio::test]
    async fn focus_requires_known_target() {
        let store = store_with_target(4).await;
        let err = store.focus(99).await.unwrap_err();
        assert_eq!(err, ReviewError::UnknownTarget { target_id: 99 });
    }

    #[tokio::test]
    async fn rehydrate_skips_stale_rows() {
        let store = store_with_target(4).await;
        let stored = vec![
            StoredDecision {
                document_id: "rubbing-1".into(),
                target_id: 4,
                character: '麗',
                reliability: 77.1,
                decided_at: Utc::now(),
            },
            StoredDecision {
                document_id: "rubbing-1".into(),
                target_id: 17,
                character: '日',
                reliability: 40.0,
                decided_at: Utc::now(),
            },
        ];

        store.rehydrate(stored).await;

        assert_eq!(store.completed_count().await, 1);
        assert_eq!(store.accepted_character(4).await, Some('麗'));
    }
}
