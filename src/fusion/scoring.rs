/// Fused reliability of a candidate, rounded to one decimal.
///
/// A candidate with only one score passes that score through unchanged:
/// complete damage leaves no strokes to match, so context plausibility *is*
/// the reliability. With both scores present the harmonic mean combines
/// them, which penalizes disagreement between the two models. Returns
/// `None` when neither score exists; the engine rejects that case earlier.
pub fn fused_reliability(stroke_match: Option<f64>, context_match: Option<f64>) -> Option<f64> {
    match (stroke_match, context_match) {
        (None, None) => None,
        (None, Some(context)) => Some(round_one_decimal(context)),
        (Some(stroke), None) => Some(round_one_decimal(stroke)),
        (Some(stroke), Some(context)) => {
            if stroke == 0.0 && context == 0.0 {
                return Some(0.0);
            }
            Some(round_one_decimal(
                2.0 * stroke * context / (stroke + context),
            ))
        }
    }
}

pub(crate) fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn score_in_bounds(value: f64) -> bool {
    (0.0..=100.0).contains(&value)
}
