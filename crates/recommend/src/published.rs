//! Process-wide handle for the rule set currently used for serving.
//!
//! Each successful mining run publishes a whole new snapshot; readers
//! take an `Arc` to one version and keep it for the full duration of
//! their computation, so a concurrent publish can never expose a mix of
//! old and new rules mid-query.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shoprec_core::types::RuleSet;
use tracing::info;

/// One immutable published version of the mined rules.
#[derive(Debug)]
pub struct RuleSetSnapshot {
    pub version: u64,
    pub published_at: DateTime<Utc>,
    pub rules: Arc<RuleSet>,
}

/// Versioned, atomically swapped rule-set handle.
pub struct PublishedRules {
    current: RwLock<Arc<RuleSetSnapshot>>,
}

impl PublishedRules {
    /// Start with version 0 and no rules; recommendations against it
    /// are empty until the first publish.
    pub fn empty() -> Self {
        Self {
            current: RwLock::new(Arc::new(RuleSetSnapshot {
                version: 0,
                published_at: Utc::now(),
                rules: Arc::new(RuleSet::empty()),
            })),
        }
    }

    /// Swap in a freshly mined rule set, returning the new version.
    /// Readers holding the previous snapshot are unaffected.
    pub fn publish(&self, rules: RuleSet) -> u64 {
        let mut guard = self.current.write();
        let version = guard.version + 1;
        let snapshot = Arc::new(RuleSetSnapshot {
            version,
            published_at: Utc::now(),
            rules: Arc::new(rules),
        });
        info!(version, rules = snapshot.rules.len(), "published rule set");
        *guard = snapshot;
        version
    }

    /// The snapshot to serve from right now.
    pub fn current(&self) -> Arc<RuleSetSnapshot> {
        self.current.read().clone()
    }

    pub fn version(&self) -> u64 {
        self.current.read().version
    }
}

impl Default for PublishedRules {
    fn default() -> Self {
        Self::empty()
    }
}
