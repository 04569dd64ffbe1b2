//! Review core for Epitext, a tool for restoring damaged characters in
//! scanned epigraphic rubbings. A vision model and a language model each
//! propose ranked guesses per damaged position; this crate fuses the two
//! lists into one ranked recommendation, tracks the reviewer's accept
//! decisions, and derives completion statistics. Rendering, model
//! inference, and transport live in the surrounding application.

pub mod db;
pub mod document;
pub mod error;
pub mod fusion;
pub mod inspection;
pub mod records;
pub mod stats;

pub use db::{Database, StoredDecision};
pub use document::{build_targets, Document, Target, DAMAGE_SENTINEL};
pub use error::{ReviewError, ReviewResult};
pub use fusion::{
    fuse, FusedCandidate, FusionConfig, ModelScore, PresentationPolicy, PresentationSlot,
    RawCandidate,
};
pub use inspection::{Decision, InspectionStore, TargetStatus};
pub use records::{filter_records, RecordStatus, RubbingRecord, StatusFilter};
pub use stats::{damage_profile, summarize, DamageProfile, ReviewSummary};
