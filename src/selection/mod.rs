//! Cross-topic reasoning: merging practice contexts into unified mastery
//! rows, ranking candidate topics, and summarizing the learner.

pub mod aggregate;
pub mod profile;
pub mod selector;
