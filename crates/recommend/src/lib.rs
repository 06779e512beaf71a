//! Recommendation serving — matches mined rules against live baskets
//! and manages the atomically swapped rule-set snapshot.

pub mod published;
pub mod selector;

pub use published::{PublishedRules, RuleSetSnapshot};
pub use selector::{recommend_for_user, RecommendationSelector};
