//! Selects and ranks candidate products for a live user basket.

use std::collections::HashMap;

use shoprec_core::config::ScoreAggregation;
use shoprec_core::types::{ProductId, Recommendation, RuleSet, ScoredProduct, UserBasket};
use tracing::debug;

/// Per-request selector over an immutable rule-set snapshot. Lookups are
/// read-only and embarrassingly parallel across users.
pub struct RecommendationSelector {
    aggregation: ScoreAggregation,
}

struct Candidate {
    score: f64,
    confidence: f64,
    antecedent_len: usize,
    reason: String,
}

impl RecommendationSelector {
    pub fn new(aggregation: ScoreAggregation) -> Self {
        Self { aggregation }
    }

    /// Fire every rule whose antecedent is contained in the basket and
    /// rank the proposed products. Products already in the basket are
    /// never suggested. An empty result is a normal outcome; the caller
    /// falls back to a non-personalized strategy.
    pub fn recommend(
        &self,
        basket: &UserBasket,
        rule_set: &RuleSet,
        top_n: usize,
    ) -> Recommendation {
        if basket.is_empty() || rule_set.is_empty() || top_n == 0 {
            return Recommendation::default();
        }

        let mut candidates: HashMap<ProductId, Candidate> = HashMap::new();
        let mut fired = 0usize;

        for (antecedent, rules) in rule_set.buckets() {
            if antecedent.len() > basket.len() || !basket.contains_all(antecedent) {
                continue;
            }
            for rule in rules {
                // Lift ≤ 1 is independence or negative association —
                // never a recommendation signal, even if a caller-built
                // rule set still contains such a rule.
                if rule.lift <= 1.0 {
                    continue;
                }
                fired += 1;
                for product in &rule.consequent {
                    if basket.contains(product) {
                        continue;
                    }
                    let reason = || format_reason(antecedent);
                    match self.aggregation {
                        ScoreAggregation::MaxLift => {
                            let incoming = (rule.lift, rule.confidence, antecedent.len());
                            match candidates.get_mut(product) {
                                Some(existing)
                                    if (existing.score, existing.confidence, existing.antecedent_len)
                                        >= incoming => {}
                                Some(existing) => {
                                    existing.score = rule.lift;
                                    existing.confidence = rule.confidence;
                                    existing.antecedent_len = antecedent.len();
                                    existing.reason = reason();
                                }
                                None => {
                                    candidates.insert(
                                        product.clone(),
                                        Candidate {
                                            score: rule.lift,
                                            confidence: rule.confidence,
                                            antecedent_len: antecedent.len(),
                                            reason: reason(),
                                        },
                                    );
                                }
                            }
                        }
                        ScoreAggregation::SumConfidenceWeightedLift => {
                            let entry =
                                candidates.entry(product.clone()).or_insert_with(|| Candidate {
                                    score: 0.0,
                                    confidence: 0.0,
                                    antecedent_len: antecedent.len(),
                                    reason: reason(),
                                });
                            entry.score += rule.confidence * rule.lift;
                            if rule.confidence > entry.confidence {
                                entry.confidence = rule.confidence;
                                entry.antecedent_len = antecedent.len();
                                entry.reason = reason();
                            }
                        }
                    }
                }
            }
        }

        debug!(
            basket_size = basket.len(),
            fired,
            candidates = candidates.len(),
            "selected recommendation candidates"
        );

        let mut items: Vec<ScoredProduct> = candidates
            .into_iter()
            .map(|(product_id, c)| ScoredProduct {
                product_id,
                score: c.score,
                confidence: c.confidence,
                reason: c.reason,
            })
            .collect();

        // Descending score, ties by higher confidence, then by lower
        // product id for determinism.
        items.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    b.confidence
                        .partial_cmp(&a.confidence)
                        .unwrap_or(std::cmp::Ordering::Equal)
                })
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        items.truncate(top_n);

        Recommendation { items }
    }
}

impl Default for RecommendationSelector {
    fn default() -> Self {
        Self::new(ScoreAggregation::default())
    }
}

/// Synchronous per-request entry point with the default scoring policy.
pub fn recommend_for_user(
    basket: &UserBasket,
    rule_set: &RuleSet,
    top_n: usize,
) -> Recommendation {
    RecommendationSelector::default().recommend(basket, rule_set, top_n)
}

fn format_reason(antecedent: &[ProductId]) -> String {
    let names: Vec<&str> = antecedent.iter().map(ProductId::as_str).collect();
    format!("Frequently bought together with {}", names.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shoprec_core::types::AssociationRule;

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    fn rule(
        antecedent: &[&str],
        consequent: &[&str],
        confidence: f64,
        lift: f64,
    ) -> AssociationRule {
        AssociationRule {
            antecedent: antecedent.iter().map(|s| pid(s)).collect(),
            consequent: consequent.iter().map(|s| pid(s)).collect(),
            support: 0.4,
            confidence,
            lift,
        }
    }

    #[test]
    fn test_low_lift_rules_never_fire() {
        // {A}→{C} should have been filtered during generation; the
        // selector must still refuse it.
        let rules = RuleSet::from_rules(
            vec![rule(&["A"], &["B"], 0.6, 1.2), rule(&["A"], &["C"], 0.9, 0.9)],
            10,
        );
        let basket = UserBasket::new(vec![pid("A")]);
        let rec = recommend_for_user(&basket, &rules, 5);
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.items[0].product_id, pid("B"));
    }

    #[test]
    fn test_basket_items_never_recommended() {
        let rules = RuleSet::from_rules(vec![rule(&["A"], &["A", "B"], 0.6, 1.2)], 10);
        let basket = UserBasket::new(vec![pid("A")]);
        let rec = recommend_for_user(&basket, &rules, 5);
        assert_eq!(rec.len(), 1);
        assert_eq!(rec.items[0].product_id, pid("B"));
    }

    #[test]
    fn test_cold_basket_returns_empty() {
        let rules = RuleSet::from_rules(vec![rule(&["A"], &["B"], 0.6, 1.2)], 10);
        let rec = recommend_for_user(&UserBasket::new(vec![pid("Z")]), &rules, 5);
        assert!(rec.is_empty());
        let rec = recommend_for_user(&UserBasket::default(), &rules, 5);
        assert!(rec.is_empty());
    }

    #[test]
    fn test_max_lift_keeps_best_rule_per_product() {
        let rules = RuleSet::from_rules(
            vec![
                rule(&["A"], &["C"], 0.5, 1.2),
                rule(&["B"], &["C"], 0.7, 1.6),
            ],
            10,
        );
        let basket = UserBasket::new(vec![pid("A"), pid("B")]);
        let rec = recommend_for_user(&basket, &rules, 5);
        assert_eq!(rec.len(), 1);
        assert!((rec.items[0].score - 1.6).abs() < 1e-12);
        assert_eq!(
            rec.items[0].reason,
            "Frequently bought together with B"
        );
    }

    #[test]
    fn test_more_specific_antecedent_wins_ties() {
        let rules = RuleSet::from_rules(
            vec![
                rule(&["A"], &["C"], 0.7, 1.5),
                rule(&["A", "B"], &["C"], 0.7, 1.5),
            ],
            10,
        );
        let basket = UserBasket::new(vec![pid("A"), pid("B")]);
        let rec = recommend_for_user(&basket, &rules, 5);
        assert_eq!(rec.len(), 1);
        assert_eq!(
            rec.items[0].reason,
            "Frequently bought together with A, B"
        );
    }

    #[test]
    fn test_sum_aggregation_accumulates() {
        let rules = RuleSet::from_rules(
            vec![
                rule(&["A"], &["C"], 0.5, 1.2),
                rule(&["B"], &["C"], 0.6, 1.5),
            ],
            10,
        );
        let basket = UserBasket::new(vec![pid("A"), pid("B")]);
        let selector = RecommendationSelector::new(ScoreAggregation::SumConfidenceWeightedLift);
        let rec = selector.recommend(&basket, &rules, 5);
        assert_eq!(rec.len(), 1);
        assert!((rec.items[0].score - (0.5 * 1.2 + 0.6 * 1.5)).abs() < 1e-12);
    }

    #[test]
    fn test_ranking_and_truncation() {
        let rules = RuleSet::from_rules(
            vec![
                rule(&["A"], &["B"], 0.5, 1.1),
                rule(&["A"], &["C"], 0.5, 1.9),
                rule(&["A"], &["D"], 0.5, 1.5),
            ],
            10,
        );
        let basket = UserBasket::new(vec![pid("A")]);
        let rec = recommend_for_user(&basket, &rules, 2);
        assert_eq!(rec.len(), 2);
        assert_eq!(rec.items[0].product_id, pid("C"));
        assert_eq!(rec.items[1].product_id, pid("D"));
    }

    #[test]
    fn test_equal_scores_tie_break_on_product_id() {
        let rules = RuleSet::from_rules(
            vec![
                rule(&["A"], &["Z"], 0.5, 1.4),
                rule(&["A"], &["M"], 0.5, 1.4),
            ],
            10,
        );
        let basket = UserBasket::new(vec![pid("A")]);
        let rec = recommend_for_user(&basket, &rules, 5);
        assert_eq!(rec.items[0].product_id, pid("M"));
        assert_eq!(rec.items[1].product_id, pid("Z"));
    }
}
