use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Processing/quality state of one rubbing record, derived from its
/// analysis results rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordStatus {
    /// Model analysis still running; no processing time reported yet.
    Processing,
    /// Under 10% of the rubbing needs restoration.
    Excellent,
    /// 10% to 30%.
    Fair,
    /// 30% or more.
    Poor,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Processing => "processing",
            RecordStatus::Excellent => "excellent",
            RecordStatus::Fair => "fair",
            RecordStatus::Poor => "poor",
        }
    }

    pub fn derive(processing_time_secs: Option<u64>, damage_level: Option<f64>) -> Self {
        if processing_time_secs.is_none() {
            return RecordStatus::Processing;
        }
        match damage_level {
            Some(level) if level < 10.0 => RecordStatus::Excellent,
            Some(level) if level < 30.0 => RecordStatus::Fair,
            Some(_) => RecordStatus::Poor,
            None => RecordStatus::Processing,
        }
    }
}

/// One uploaded rubbing as shown in the record list. The upstream source
/// delivers these sorted newest-first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RubbingRecord {
    pub id: Uuid,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub processing_time_secs: Option<u64>,
    /// Share of characters needing restoration, as a percentage.
    pub damage_level: Option<f64>,
    pub average_reliability: Option<f64>,
    pub is_completed: bool,
}

impl RubbingRecord {
    pub fn status(&self) -> RecordStatus {
        RecordStatus::derive(self.processing_time_secs, self.damage_level)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatusFilter {
    All,
    Completed,
    InProgress,
}

/// Keep the records matching the filter, preserving their relative order.
/// Anything not completed counts as in progress, the processing ones
/// included.
pub fn filter_records(records: &[RubbingRecord], filter: StatusFilter) -> Vec<RubbingRecord> {
    records
        .iter()
        .filter(|record| match filter {
            StatusFilter::All => true,
            StatusFilter::Completed => record.is_completed,
            StatusFilter::InProgress => !record.is_completed,
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(filename: &str, completed: bool) -> RubbingRecord {
        RubbingRecord {
            id: Uuid::new_v4(),
            filename: filename.to_string(),
            created_at: Utc::now(),
            processing_time_secs: Some(222),
            damage_level: Some(6.5),
            average_reliability: Some(92.0),
            is_completed: completed,
        }
    }

    #[test]
    fn filter_partitions_by_completion_flag() {
        let records = vec![
            record("rubbing_8.jpg", false),
            record("rubbing_7.jpg", true),
            record("rubbing_6.jpg", false),
            record("rubbing_5.jpg", true),
        ];

        let completed = filter_records(&records, StatusFilter::Completed);
        assert_eq!(completed.len(), 2);
        assert_eq!(completed[0].filename, "rubbing_7.jpg");
        assert_eq!(completed[1].filename, "rubbing_5.jpg");

        let in_progress = filter_records(&records, StatusFilter::InProgress);
        assert_eq!(in_progress.len(), 2);
        assert_eq!(in_progress[0].filename, "rubbing_8.jpg");
    }

    #[test]
    fn filtering_all_is_a_no_op_on_a_filtered_set() {
        let records = vec![
            record("a.jpg", true),
            record("b.jpg", false),
            record("c.jpg", true),
        ];
        let completed = filter_records(&records, StatusFilter::Completed);
        let round_trip = filter_records(&completed, StatusFilter::All);
        assert_eq!(round_trip, completed);
    }

    #[test]
    fn status_thresholds() {
        assert_eq!(RecordStatus::derive(None, None), RecordStatus::Processing);
        assert_eq!(
            RecordStatus::derive(Some(222), Some(6.5)),
            RecordStatus::Excellent
        );
        assert_eq!(
            RecordStatus::derive(Some(201), Some(10.0)),
            RecordStatus::Fair
        );
        assert_eq!(
            RecordStatus::derive(Some(201), Some(17.6)),
            RecordStatus::Fair
        );
        assert_eq!(
            RecordStatus::derive(Some(302), Some(30.0)),
            RecordStatus::Poor
        );
        assert_eq!(
            RecordStatus::derive(Some(273), Some(61.7)),
            RecordStatus::Poor
        );
    }
}
