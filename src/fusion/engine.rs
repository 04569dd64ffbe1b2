use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, ReviewResult};
use crate::fusion::config::{FusionConfig, PresentationPolicy};
use crate::fusion::scoring::{fused_reliability, score_in_bounds};

/// One ranked guess as delivered by a scoring model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelScore {
    pub character: char,
    pub score: f64,
}

impl ModelScore {
    pub fn new(character: char, score: f64) -> Self {
        Self { character, score }
    }
}

/// A candidate after merging both models' proposals for one target.
/// `stroke_match` is absent when the vision model had no opinion, which
/// happens when the character is completely destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCandidate {
    pub character: char,
    pub stroke_match: Option<f64>,
    pub context_match: Option<f64>,
}

/// A raw candidate plus its fused reliability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FusedCandidate {
    pub character: char,
    pub stroke_match: Option<f64>,
    pub context_match: Option<f64>,
    pub reliability: f64,
}

/// One row of the presentation table. Placeholder rows keep the table at
/// its fixed height when the intersection policy yields too few candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PresentationSlot {
    Candidate(FusedCandidate),
    Placeholder,
}

impl PresentationSlot {
    pub fn candidate(&self) -> Option<&FusedCandidate> {
        match self {
            PresentationSlot::Candidate(candidate) => Some(candidate),
            PresentationSlot::Placeholder => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, PresentationSlot::Placeholder)
    }
}

/// Merge the two ranked lists and produce the presentation list for one
/// target. Deterministic for identical inputs; always exactly
/// `config.list_len` rows.
pub fn fuse(
    target_id: u32,
    vision: &[ModelScore],
    nlp: &[ModelScore],
    config: &FusionConfig,
) -> ReviewResult<Vec<PresentationSlot>> {
    let pool = merge_by_character(vision, nlp)?;
    fuse_pool(target_id, pool, config)
}

/// Rank an already-merged candidate pool. Split out from [`fuse`] so a
/// caller holding pre-merged `RawCandidate` records (the persisted shape)
/// can run the same ranking.
pub fn fuse_pool(
    target_id: u32,
    pool: Vec<RawCandidate>,
    config: &FusionConfig,
) -> ReviewResult<Vec<PresentationSlot>> {
    let mut fused = Vec::with_capacity(pool.len());
    for raw in pool {
        for score in [raw.stroke_match, raw.context_match].into_iter().flatten() {
            if !score_in_bounds(score) {
                return Err(ReviewError::invalid_score(raw.character, score));
            }
        }

        let reliability = fused_reliability(raw.stroke_match, raw.context_match)
            .ok_or(ReviewError::MissingScores {
                character: raw.character,
            })?;

        fused.push(FusedCandidate {
            character: raw.character,
            stroke_match: raw.stroke_match,
            context_match: raw.context_match,
            reliability,
        });
    }

    if let PresentationPolicy::Intersection = config.policy {
        fused.retain(|c| c.stroke_match.is_some() && c.context_match.is_some());
    }

    // Stable sort: equal reliability keeps discovery order (vision entries
    // before language-model-only entries).
    fused.sort_by(|a, b| {
        b.reliability
            .partial_cmp(&a.reliability)
            .unwrap_or(Ordering::Equal)
    });
    fused.truncate(config.list_len);

    log::debug!(
        "target {target_id}: {} fused candidates under {:?} policy",
        fused.len(),
        config.policy
    );

    let mut slots: Vec<PresentationSlot> =
        fused.into_iter().map(PresentationSlot::Candidate).collect();
    while slots.len() < config.list_len {
        slots.push(PresentationSlot::Placeholder);
    }

    Ok(slots)
}

/// Union the two lists by character identity. The first occurrence of a
/// character within one list wins; later duplicates are ignored.
fn merge_by_character(
    vision: &[ModelScore],
    nlp: &[ModelScore],
) -> ReviewResult<Vec<RawCandidate>> {
    let mut pool: Vec<RawCandidate> = Vec::with_capacity(vision.len() + nlp.len());
    let mut index_by_char: HashMap<char, usize> = HashMap::new();

    for entry in vision {
        if !score_in_bounds(entry.score) {
            return Err(ReviewError::invalid_score(entry.character, entry.score));
        }
        if index_by_char.contains_key(&entry.character) {
            continue;
        }
        index_by_char.insert(entry.character, pool.len());
        pool.push(RawCandidate {
            character: entry.character,
            stroke_match: Some(entry.score),
            context_match: None,
        });
    }

    for entry in nlp {
        if !score_in_bounds(entry.score) {
            return Err(ReviewError::invalid_score(entry.character, entry.score));
        }
        match index_by_char.get(&entry.character) {
            Some(&idx) => {
                let raw = &mut pool[idx];
                if raw.context_match.is_none() {
                    raw.context_match = Some(entry.score);
                }
            }
            None => {
                index_by_char.insert(entry.character, pool.len());
                pool.push(RawCandidate {
                    character: entry.character,
                    stroke_match: None,
                    context_match: Some(entry.score),
                });
            }
        }
    }

    Ok(pool)
}
