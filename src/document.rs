use serde::{Deserialize, Serialize};

use crate::error::{ReviewError, ReviewResult};

/// Glyph the transcription pipeline emits for an illegible character.
pub const DAMAGE_SENTINEL: char = '□';

/// A transcribed rubbing: ordered rows of characters, some of them damaged.
/// Immutable once loaded; every derived structure (targets, fusion results,
/// decisions) keys off this one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub rows: Vec<String>,
    #[serde(default = "default_sentinel")]
    pub damage_sentinel: char,
}

fn default_sentinel() -> char {
    DAMAGE_SENTINEL
}

impl Document {
    pub fn new(id: impl Into<String>, rows: Vec<String>) -> Self {
        Self {
            id: id.into(),
            rows,
            damage_sentinel: DAMAGE_SENTINEL,
        }
    }

    pub fn total_characters(&self) -> usize {
        self.rows.iter().map(|row| row.chars().count()).sum()
    }

    pub fn damaged_characters(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.chars().filter(|c| *c == self.damage_sentinel).count())
            .sum()
    }

    /// Share of damaged glyphs over the whole rubbing, as a percentage.
    pub fn damage_ratio(&self) -> f64 {
        let total = self.total_characters();
        if total == 0 {
            return 0.0;
        }
        self.damaged_characters() as f64 / total as f64 * 100.0
    }
}

/// One damaged character position awaiting restoration. Ids are assigned
/// once per document in row-major scan order and never reused; accepted
/// decisions are keyed by them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub id: u32,
    pub row: usize,
    pub column: usize,
}

impl Target {
    /// 1-based position label shown in the target navigation list.
    pub fn position_label(&self) -> String {
        format!("row {} char {}", self.row + 1, self.column + 1)
    }
}

/// Scan rows top-to-bottom, characters left-to-right, assigning contiguous
/// 1-based ids to every damage sentinel encountered.
pub fn build_targets(document: &Document) -> ReviewResult<Vec<Target>> {
    if document.rows.is_empty() {
        return Err(ReviewError::EmptyDocument);
    }

    let mut targets = Vec::new();
    let mut next_id = 1u32;

    for (row, text) in document.rows.iter().enumerate() {
        for (column, ch) in text.chars().enumerate() {
            if ch == document.damage_sentinel {
                targets.push(Target {
                    id: next_id,
                    row,
                    column,
                });
                next_id += 1;
            }
        }
    }

    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Document {
        Document::new(
            "rubbing-1",
            vec![
                "高□洛□歸".to_string(),
                "見性寂炤首".to_string(),
                "□日甲子□".to_string(),
            ],
        )
    }

    #[test]
    fn targets_are_numbered_in_row_major_order() {
        let targets = build_targets(&sample()).unwrap();
        assert_eq!(targets.len(), 4);
        assert_eq!(targets[0], Target { id: 1, row: 0, column: 1 });
        assert_eq!(targets[1], Target { id: 2, row: 0, column: 3 });
        assert_eq!(targets[2], Target { id: 3, row: 2, column: 0 });
        assert_eq!(targets[3], Target { id: 4, row: 2, column: 4 });
    }

    #[test]
    fn rescan_assigns_identical_ids() {
        let doc = sample();
        assert_eq!(build_targets(&doc).unwrap(), build_targets(&doc).unwrap());
    }

    #[test]
    fn empty_document_is_rejected() {
        let doc = Document::new("empty", Vec::new());
        assert_eq!(build_targets(&doc), Err(ReviewError::EmptyDocument));
    }

    #[test]
    fn document_with_no_damage_yields_no_targets() {
        let doc = Document::new("clean", vec!["見性寂炤首".to_string()]);
        assert!(build_targets(&doc).unwrap().is_empty());
    }

    #[test]
    fn damage_ratio_counts_sentinels() {
        let doc = sample();
        assert_eq!(doc.total_characters(), 15);
        assert_eq!(doc.damaged_characters(), 4);
        assert!((doc.damage_ratio() - 26.666_666).abs() < 0.001);
    }

    #[test]
    fn position_label_is_one_based() {
        let target = Target { id: 1, row: 3, column: 0 };
        assert_eq!(target.position_label(), "row 4 char 1");
    }
}
