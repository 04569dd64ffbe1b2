pub mod store;

pub use store::{Decision, InspectionStore, TargetStatus};
