//! Collapses one attempt into the 0-5 recall-quality bucket that drives
//! scheduling. Magnitude beyond the six buckets is discarded on purpose.

use crate::types::AttemptSignal;

/// Help usage beyond this many hints or chat turns counts as a blackout.
const BLACKOUT_HELP: u32 = 5;
/// Hints beyond this still leave some recognition credit.
const HEAVY_HINTS: u32 = 2;

/// Maps correctness + inferred confidence + help usage to SM-2 quality.
pub fn score(signal: &AttemptSignal, confidence: u8) -> u8 {
    if !signal.is_correct {
        return if signal.hints_used > BLACKOUT_HELP || signal.chat_interactions > BLACKOUT_HELP {
            0
        } else if signal.hints_used > HEAVY_HINTS {
            1
        } else {
            2
        };
    }
    if confidence >= 5 {
        5
    } else if confidence >= 4 {
        4
    } else {
        3
    }
}
