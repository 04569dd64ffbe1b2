use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::document::{Document, Target};
use crate::fusion::scoring::round_one_decimal;
use crate::fusion::PresentationSlot;
use crate::inspection::Decision;

/// Completion counts and reliability summary over one document's review.
/// The reliability fields are `None` until at least one target is accepted;
/// zero would read as a real low-confidence result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSummary {
    pub completed_count: usize,
    pub total_targets: usize,
    pub average_reliability: Option<f64>,
    pub max_reliability: Option<f64>,
    pub min_reliability: Option<f64>,
}

/// Recompute the summary from the full current decision set. Target counts
/// stay small (a few hundred at most), so there is no incremental upkeep.
pub fn summarize(decisions: &HashMap<u32, Decision>, total_targets: usize) -> ReviewSummary {
    let accepted: Vec<f64> = decisions.values().map(|d| d.reliability).collect();

    if accepted.is_empty() {
        return ReviewSummary {
            completed_count: 0,
            total_targets,
            average_reliability: None,
            max_reliability: None,
            min_reliability: None,
        };
    }

    let sum: f64 = accepted.iter().sum();
    let max = accepted.iter().cloned().fold(f64::MIN, f64::max);
    let min = accepted.iter().cloned().fold(f64::MAX, f64::min);

    ReviewSummary {
        completed_count: accepted.len(),
        total_targets,
        average_reliability: Some(round_one_decimal(sum / accepted.len() as f64)),
        max_reliability: Some(max),
        min_reliability: Some(min),
    }
}

/// Breakdown of a rubbing's damage, shown on the distribution card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamageProfile {
    pub total_characters: usize,
    pub restoration_targets: usize,
    pub partial_damage: usize,
    pub complete_damage: usize,
    pub restoration_percentage: f64,
}

/// A target counts as completely destroyed when its fused pool carries no
/// stroke score at all (the vision model had nothing to match against).
pub fn damage_profile(
    document: &Document,
    targets: &[Target],
    fusion_results: &HashMap<u32, Vec<PresentationSlot>>,
) -> DamageProfile {
    let partial_damage = targets
        .iter()
        .filter(|t| {
            fusion_results
                .get(&t.id)
                .map(|slots| {
                    slots
                        .iter()
                        .filter_map(|s| s.candidate())
                        .any(|c| c.stroke_match.is_some())
                })
                .unwrap_or(false)
        })
        .count();

    DamageProfile {
        total_characters: document.total_characters(),
        restoration_targets: targets.len(),
        partial_damage,
        complete_damage: targets.len() - partial_damage,
        restoration_percentage: round_one_decimal(document.damage_ratio()),
    }
}
