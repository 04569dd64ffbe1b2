use serde::{Deserialize, Serialize};

/// How the ranked presentation list is built from the fused pool.
///
/// * `AllCandidates`: rank the whole pool and keep the top rows.
/// * `Intersection`: only candidates both models proposed qualify; short
///   lists are padded with placeholder rows so the table keeps its shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PresentationPolicy {
    AllCandidates,
    Intersection,
}

/// Tunables for candidate fusion.
#[derive(Debug, Clone)]
pub struct FusionConfig {
    pub policy: PresentationPolicy,

    /// Rows in the presentation list, placeholders included.
    pub list_len: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            policy: PresentationPolicy::AllCandidates,
            list_len: 5,
        }
    }
}

impl FusionConfig {
    pub fn with_policy(policy: PresentationPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }
}
