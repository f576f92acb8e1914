//! Per-attempt signal derivation: behavioral confidence and recall quality.

pub mod confidence;
pub mod quality;
