//! Shared data model for the market-basket pipeline: transactions in,
//! frequent itemsets and association rules out, recommendations served.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Opaque catalog product identifier. The engine assumes no internal
/// structure; lexicographic ordering is used only for determinism.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// One co-occurrence event: the distinct products of a single completed
/// order, wishlist snapshot, or cart snapshot. Immutable once built.
///
/// The weight multiplies the transaction's contribution to every support
/// count and to the dataset total, which is arithmetically identical to
/// duplicating the transaction `weight` times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    items: Vec<ProductId>,
    weight: u32,
}

impl Transaction {
    /// Build a transaction from raw items: duplicates are collapsed and
    /// the result is kept in ascending `ProductId` order.
    pub fn new(items: Vec<ProductId>, weight: u32) -> Self {
        let mut items = items;
        items.sort();
        items.dedup();
        Self { items, weight }
    }

    pub fn items(&self) -> &[ProductId] {
        &self.items
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, product: &ProductId) -> bool {
        self.items.binary_search(product).is_ok()
    }
}

/// Ordered sequence of transactions for one mining run. Built fresh by
/// the transaction builder and handed read-only to the miner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDataset {
    transactions: Vec<Transaction>,
    total_weight: u64,
}

impl TransactionDataset {
    pub fn new(transactions: Vec<Transaction>) -> Self {
        let total_weight = transactions.iter().map(|t| u64::from(t.weight())).sum();
        Self {
            transactions,
            total_weight,
        }
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Support denominator: the weighted number of transactions.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Size of the largest transaction; no frequent itemset can exceed it.
    pub fn max_transaction_len(&self) -> usize {
        self.transactions.iter().map(Transaction::len).max().unwrap_or(0)
    }
}

/// A product set annotated with its observed support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itemset {
    items: Vec<ProductId>,
    support_count: u64,
    total_weight: u64,
}

impl Itemset {
    /// `items` must already be sorted ascending and duplicate-free; the
    /// miner's interned representation guarantees this.
    pub fn new(items: Vec<ProductId>, support_count: u64, total_weight: u64) -> Self {
        debug_assert!(items.windows(2).all(|w| w[0] < w[1]));
        Self {
            items,
            support_count,
            total_weight,
        }
    }

    pub fn items(&self) -> &[ProductId] {
        &self.items
    }

    /// Weighted number of transactions containing this itemset.
    pub fn support_count(&self) -> u64 {
        self.support_count
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Support ratio: count / total transactions.
    pub fn support(&self) -> f64 {
        if self.total_weight == 0 {
            0.0
        } else {
            self.support_count as f64 / self.total_weight as f64
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// An association rule `antecedent → consequent` with its three metrics.
///
/// Invariants: antecedent and consequent are disjoint, both sorted
/// ascending, and their union was a frequent itemset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssociationRule {
    pub antecedent: Vec<ProductId>,
    pub consequent: Vec<ProductId>,
    /// P(antecedent ∪ consequent).
    pub support: f64,
    /// P(consequent | antecedent).
    pub confidence: f64,
    /// confidence / P(consequent); > 1 means positive association.
    pub lift: f64,
}

/// All rules surviving the threshold filters, indexed by antecedent for
/// lookup against a live basket. Rebuilt wholesale on each mining run.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuleSet {
    rules: BTreeMap<Vec<ProductId>, Vec<AssociationRule>>,
    rule_count: usize,
    total_weight: u64,
}

impl RuleSet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Index rules by antecedent. Within each bucket, rules are kept
    /// sorted by descending lift, then descending confidence, then
    /// ascending consequent, so identical inputs always assemble the
    /// identical structure.
    pub fn from_rules(rules: Vec<AssociationRule>, total_weight: u64) -> Self {
        let rule_count = rules.len();
        let mut index: BTreeMap<Vec<ProductId>, Vec<AssociationRule>> = BTreeMap::new();
        for rule in rules {
            index.entry(rule.antecedent.clone()).or_default().push(rule);
        }
        for bucket in index.values_mut() {
            bucket.sort_by(|a, b| {
                b.lift
                    .partial_cmp(&a.lift)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| {
                        b.confidence
                            .partial_cmp(&a.confidence)
                            .unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| a.consequent.cmp(&b.consequent))
            });
        }
        Self {
            rules: index,
            rule_count,
            total_weight,
        }
    }

    /// Rules whose antecedent is exactly `antecedent`, best lift first.
    pub fn rules_for(&self, antecedent: &[ProductId]) -> Option<&[AssociationRule]> {
        self.rules.get(antecedent).map(Vec::as_slice)
    }

    /// Iterate `(antecedent, rules)` buckets in ascending antecedent order.
    pub fn buckets(&self) -> impl Iterator<Item = (&Vec<ProductId>, &[AssociationRule])> {
        self.rules.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// Iterate every rule in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &AssociationRule> {
        self.rules.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.rule_count
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }

    /// Support denominator of the mining run that produced this set.
    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }
}

/// Products currently associated with a user (cart + wishlist, typically).
/// Read-only input supplied by the application layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserBasket {
    items: BTreeSet<ProductId>,
}

impl UserBasket {
    pub fn new(items: impl IntoIterator<Item = ProductId>) -> Self {
        Self {
            items: items.into_iter().collect(),
        }
    }

    pub fn contains(&self, product: &ProductId) -> bool {
        self.items.contains(product)
    }

    /// True when every product of `items` is in the basket.
    pub fn contains_all(&self, items: &[ProductId]) -> bool {
        items.iter().all(|p| self.items.contains(p))
    }

    pub fn items(&self) -> impl Iterator<Item = &ProductId> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<ProductId> for UserBasket {
    fn from_iter<I: IntoIterator<Item = ProductId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// One suggested product with the score of the best rule that fired.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredProduct {
    pub product_id: ProductId,
    pub score: f64,
    /// Confidence of the rule backing the score, kept for tie-breaks
    /// and for display alongside the reason.
    pub confidence: f64,
    pub reason: String,
}

/// Ranked recommendation list, best score first. An empty list is a
/// normal outcome (cold basket, no matching rules), never an error.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Recommendation {
    pub items: Vec<ScoredProduct>,
}

impl Recommendation {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
