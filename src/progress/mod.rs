//! Per-topic progression: Bloom-level mastery tracking and the enhanced
//! SM-2 review scheduler.

pub mod bloom;
pub mod scheduler;
