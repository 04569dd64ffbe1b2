pub mod config;
pub mod engine;
pub mod scoring;


pub use config::{FusionConfig, PresentationPolicy};
pub use engine::{fuse, fuse_pool, FusedCandidate, ModelScore, PresentationSlot, RawCandidate};
