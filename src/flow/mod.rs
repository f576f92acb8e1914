//! Flow-state engine: challenge/skill classification, behavioral zone
//! detection, difficulty adjustment and break suggestions.

pub mod behavior;
pub mod zone;
