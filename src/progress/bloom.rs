//! Bloom-level mastery tracking.
//!
//! Each level keeps a converging average of attempt quality mapped to a
//! 0-100 scale: `mastery' = mastery*(1-w) + (q/5*100)*w` with
//! `w = min(attempts, 10)/10`. Reaching 80 at a level above the current one
//! advances the learner; the current level never regresses afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{BloomLevel, BloomProgress};

/// Mastery required at a level before it counts as reached.
const ADVANCE_THRESHOLD: f64 = 80.0;
/// Attempts after which new evidence carries full weight.
const EVIDENCE_WINDOW: u32 = 10;

/// Result of folding one attempt into the per-level progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloomUpdate {
    pub level: BloomLevel,
    /// Mastery at `level` after the update.
    pub mastery: f64,
    /// True when this attempt newly advanced the current level.
    pub advanced: bool,
}

/// Applies one attempt at `level` with the given quality score.
pub fn apply_attempt(
    progress: &mut BloomProgress,
    level: BloomLevel,
    quality: u8,
    now: DateTime<Utc>,
) -> BloomUpdate {
    let entry = progress.level_mut(level);
    entry.attempts = entry.attempts.saturating_add(1);

    let weight = f64::from(entry.attempts.min(EVIDENCE_WINDOW)) / f64::from(EVIDENCE_WINDOW);
    let evidence = f64::from(quality.min(5)) / 5.0 * 100.0;
    entry.mastery = (entry.mastery * (1.0 - weight) + evidence * weight).clamp(0.0, 100.0);
    entry.last_attempt = Some(now);
    let mastery = entry.mastery;

    let mut advanced = false;
    if mastery >= ADVANCE_THRESHOLD && level > progress.current_level {
        progress.current_level = level;
        progress.next_target_level = level.next();
        advanced = true;
    }

    BloomUpdate {
        level,
        mastery,
        advanced,
    }
}
