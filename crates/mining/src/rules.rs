//! Association-rule generation from mined frequent itemsets.

use std::collections::HashMap;

use shoprec_core::error::{ShoprecError, ShoprecResult};
use shoprec_core::types::{AssociationRule, Itemset, ProductId, RuleSet};
use tracing::{debug, info};

use crate::apriori::SUPPORT_EPSILON;

/// Derives `antecedent → consequent` rules from frequent itemsets and
/// filters them by confidence and lift.
pub struct RuleGenerator {
    min_confidence: f64,
    min_lift: f64,
}

impl RuleGenerator {
    pub fn new(min_confidence: f64, min_lift: f64) -> ShoprecResult<Self> {
        if !(0.0..=1.0).contains(&min_confidence) {
            return Err(ShoprecError::InvalidThreshold(format!(
                "min_confidence must be in [0, 1], got {min_confidence}"
            )));
        }
        if min_lift < 0.0 || !min_lift.is_finite() {
            return Err(ShoprecError::InvalidThreshold(format!(
                "min_lift must be ≥ 0, got {min_lift}"
            )));
        }
        Ok(Self {
            min_confidence,
            min_lift,
        })
    }

    /// Enumerate every non-empty proper subset of each frequent itemset
    /// of size ≥ 2 as an antecedent (the complement is the consequent),
    /// compute support/confidence/lift, and keep rules meeting both
    /// thresholds. The result is indexed by antecedent.
    pub fn generate(&self, frequent: &[Itemset]) -> ShoprecResult<RuleSet> {
        let total_weight = match frequent.first() {
            Some(itemset) => itemset.total_weight(),
            None => return Ok(RuleSet::empty()),
        };
        if total_weight == 0 {
            return Ok(RuleSet::empty());
        }
        let total = total_weight as f64;

        // Every subset of a frequent itemset is itself frequent, so this
        // map answers all antecedent/consequent support lookups.
        let supports: HashMap<&[ProductId], u64> = frequent
            .iter()
            .map(|i| (i.items(), i.support_count()))
            .collect();

        let mut rules: Vec<AssociationRule> = Vec::new();
        for itemset in frequent.iter().filter(|i| i.len() >= 2) {
            let items = itemset.items();
            let joint_support = itemset.support_count() as f64 / total;

            // Bitmask over member positions; skip 0 (empty antecedent)
            // and the full mask (empty consequent). The u64 mask caps
            // itemset size at 63; mining never approaches that.
            debug_assert!(
                items.len() < 64,
                "antecedent enumeration supports itemsets of up to 63 items"
            );
            let full: u64 = (1u64 << items.len()) - 1;
            for mask in 1..full {
                let mut antecedent = Vec::new();
                let mut consequent = Vec::new();
                for (pos, item) in items.iter().enumerate() {
                    if mask & (1 << pos) != 0 {
                        antecedent.push(item.clone());
                    } else {
                        consequent.push(item.clone());
                    }
                }

                let antecedent_count = supports.get(antecedent.as_slice()).copied().unwrap_or(0);
                if antecedent_count == 0 {
                    // Guarded even though unreachable for itemsets mined
                    // level-wise; never divide by zero.
                    debug!(?antecedent, "skipping rule with zero-support antecedent");
                    continue;
                }
                let consequent_count = supports.get(consequent.as_slice()).copied().unwrap_or(0);
                if consequent_count == 0 {
                    continue;
                }

                let confidence = itemset.support_count() as f64 / antecedent_count as f64;
                let consequent_support = consequent_count as f64 / total;
                let lift = confidence / consequent_support;

                if confidence + SUPPORT_EPSILON >= self.min_confidence
                    && lift + SUPPORT_EPSILON >= self.min_lift
                {
                    rules.push(AssociationRule {
                        antecedent,
                        consequent,
                        support: joint_support,
                        confidence,
                        lift,
                    });
                }
            }
        }

        info!(
            rules = rules.len(),
            itemsets = frequent.len(),
            min_confidence = self.min_confidence,
            min_lift = self.min_lift,
            "generated association rules"
        );
        Ok(RuleSet::from_rules(rules, total_weight))
    }
}
