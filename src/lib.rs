//! Default-rate simulator - what-if projections of credit default rates
//!
//! This library provides:
//! - A multi-step recursive scenario projector driven by macroeconomic trends
//! - Predictor / feature scaler contracts with linear and tree-ensemble models
//! - Per-segment artifact loading with a modification-time aware cache
//! - Scenario, baseline, algorithm-arena and sensitivity runs across segments

pub mod error;
pub mod model;
pub mod projection;
pub mod artifacts;
pub mod scenario;

// Re-export commonly used types
pub use error::{ModelError, Result, SimulationError};
pub use model::{FeatureScaler, Predictor, PredictionOutput};
pub use projection::{
    project, FeatureSchema, FeatureSnapshot, ProjectionConfig, ProjectionEngine, ProjectionResult,
    ScaleMode, TrendParams,
};
pub use artifacts::{Algorithm, ArtifactCache, Segment, SegmentArtifacts};
pub use scenario::{ScenarioOutcome, ScenarioParams, ScenarioRunner};
