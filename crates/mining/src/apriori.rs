//! Level-wise Apriori frequent-itemset mining.
//!
//! Product identifiers are interned to dense `u32` indices in ascending
//! identifier order, so every internal itemset is a sorted index vector
//! and the canonical iteration order falls out of the representation
//! instead of relying on hashed set machinery.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use shoprec_core::error::{ShoprecError, ShoprecResult};
use shoprec_core::types::{Itemset, ProductId, TransactionDataset};
use tracing::{debug, info};

/// Tolerance applied when a floating threshold is compared against
/// integer counts, so exact fractions (0.4 × 5) are not pushed over a
/// ceiling by f64 representation error.
pub const SUPPORT_EPSILON: f64 = 1e-9;

/// Cooperative cancellation token, checked between Apriori levels so an
/// operator can abort an oversized mining job without killing the
/// process.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Frequent-itemset miner. Pure computation over an immutable dataset;
/// safe to re-run repeatedly or concurrently with itself.
pub struct AprioriMiner {
    min_support_ratio: f64,
    max_itemset_size: Option<usize>,
}

impl AprioriMiner {
    pub fn new(min_support_ratio: f64, max_itemset_size: Option<usize>) -> ShoprecResult<Self> {
        if !(min_support_ratio > 0.0 && min_support_ratio <= 1.0) {
            return Err(ShoprecError::InvalidThreshold(format!(
                "min_support_ratio must be in (0, 1], got {min_support_ratio}"
            )));
        }
        if max_itemset_size == Some(0) {
            return Err(ShoprecError::InvalidThreshold(
                "max_itemset_size must be ≥ 1 when set".to_string(),
            ));
        }
        Ok(Self {
            min_support_ratio,
            max_itemset_size,
        })
    }

    /// Mine all itemsets with support ratio ≥ the configured minimum,
    /// in level order and ascending identifier order within each level.
    pub fn mine(&self, dataset: &TransactionDataset) -> ShoprecResult<Vec<Itemset>> {
        self.mine_with_cancel(dataset, &CancelToken::new())
    }

    /// Same as [`mine`](Self::mine), aborting with `Cancelled` if the
    /// token fires between levels.
    pub fn mine_with_cancel(
        &self,
        dataset: &TransactionDataset,
        cancel: &CancelToken,
    ) -> ShoprecResult<Vec<Itemset>> {
        if dataset.is_empty() {
            return Err(ShoprecError::EmptyDataset(
                "cannot mine an empty transaction dataset".to_string(),
            ));
        }

        let total = dataset.total_weight();
        let min_count = min_support_count(self.min_support_ratio, total);
        let interner = Interner::from_dataset(dataset);
        let transactions = encode_transactions(dataset, &interner);

        debug!(
            products = interner.len(),
            transactions = transactions.len(),
            min_count,
            total,
            "starting Apriori mining"
        );

        let mut frequent: Vec<Itemset> = Vec::new();

        // Level 1: count every distinct product once per transaction.
        let mut singles = vec![0u64; interner.len()];
        for (items, weight) in &transactions {
            for &idx in items {
                singles[idx as usize] += *weight;
            }
        }
        let mut prev_level: Vec<Vec<u32>> = Vec::new();
        for (idx, &count) in singles.iter().enumerate() {
            if count >= min_count {
                let items = vec![idx as u32];
                frequent.push(interner.to_itemset(&items, count, total));
                prev_level.push(items);
            }
        }
        info!(frequent = prev_level.len(), level = 1, "mined level");

        let max_len = dataset.max_transaction_len();
        let size_cap = self.max_itemset_size.unwrap_or(usize::MAX).min(max_len);

        let mut k = 2usize;
        while !prev_level.is_empty() && k <= size_cap {
            if cancel.is_cancelled() {
                return Err(ShoprecError::Cancelled(k));
            }

            // Join + prune before any counting: this is what keeps the
            // candidate space bounded by observed co-occurrence.
            let candidates = generate_candidates(&prev_level, k);
            debug!(candidates = candidates.len(), level = k, "generated candidates");
            if candidates.is_empty() {
                break;
            }

            // One dataset scan per level.
            let mut counts = vec![0u64; candidates.len()];
            for (items, weight) in &transactions {
                if items.len() < k {
                    continue;
                }
                for (ci, candidate) in candidates.iter().enumerate() {
                    if is_subset(candidate, items) {
                        counts[ci] += *weight;
                    }
                }
            }

            let mut level: Vec<Vec<u32>> = Vec::new();
            for (candidate, count) in candidates.into_iter().zip(counts) {
                if count >= min_count {
                    frequent.push(interner.to_itemset(&candidate, count, total));
                    level.push(candidate);
                }
            }
            info!(frequent = level.len(), level = k, "mined level");

            prev_level = level;
            k += 1;
        }

        Ok(frequent)
    }
}

/// Minimum weighted count a candidate must reach:
/// `ceil(ratio × total − ε)`, never below 1.
fn min_support_count(ratio: f64, total: u64) -> u64 {
    let scaled = ratio * total as f64;
    (scaled - SUPPORT_EPSILON).ceil().max(1.0) as u64
}

/// Dense interning table. Index order equals ascending `ProductId`
/// order, so sorted index vectors resolve to sorted identifier vectors.
struct Interner {
    products: Vec<ProductId>,
}

impl Interner {
    fn from_dataset(dataset: &TransactionDataset) -> Self {
        let mut products: Vec<ProductId> = dataset
            .transactions()
            .iter()
            .flat_map(|t| t.items().iter().cloned())
            .collect();
        products.sort();
        products.dedup();
        Self { products }
    }

    fn len(&self) -> usize {
        self.products.len()
    }

    fn index_of(&self, product: &ProductId) -> u32 {
        // Every product interned came out of the same dataset, so the
        // lookup cannot miss.
        self.products.binary_search(product).expect("interned product") as u32
    }

    fn to_itemset(&self, indices: &[u32], support_count: u64, total_weight: u64) -> Itemset {
        let items = indices
            .iter()
            .map(|&i| self.products[i as usize].clone())
            .collect();
        Itemset::new(items, support_count, total_weight)
    }
}

fn encode_transactions(dataset: &TransactionDataset, interner: &Interner) -> Vec<(Vec<u32>, u64)> {
    dataset
        .transactions()
        .iter()
        .map(|t| {
            // Transaction items are already sorted and distinct; the
            // interner preserves that order.
            let items: Vec<u32> = t.items().iter().map(|p| interner.index_of(p)).collect();
            (items, u64::from(t.weight()))
        })
        .collect()
}

/// Apriori-gen: join frequent (k−1)-itemsets sharing their first k−2
/// items, then drop any candidate with an infrequent (k−1)-subset.
/// `prev_level` must be sorted lexicographically (it is, by construction).
fn generate_candidates(prev_level: &[Vec<u32>], k: usize) -> Vec<Vec<u32>> {
    let prev_set: HashSet<&[u32]> = prev_level.iter().map(Vec::as_slice).collect();
    let mut candidates = Vec::new();

    for i in 0..prev_level.len() {
        for j in (i + 1)..prev_level.len() {
            let (a, b) = (&prev_level[i], &prev_level[j]);
            if a[..k - 2] != b[..k - 2] {
                // Sorted input: once the prefix diverges, no later j joins.
                break;
            }
            let mut candidate = a.clone();
            candidate.push(b[k - 2]);
            if has_frequent_subsets(&candidate, &prev_set) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// True when every (k−1)-subset of `candidate` is frequent — the Apriori
/// monotonicity prune.
fn has_frequent_subsets(candidate: &[u32], prev_set: &HashSet<&[u32]>) -> bool {
    let mut subset = Vec::with_capacity(candidate.len() - 1);
    for omit in 0..candidate.len() {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != omit)
                .map(|(_, &v)| v),
        );
        if !prev_set.contains(subset.as_slice()) {
            return false;
        }
    }
    true
}

/// Two-pointer subset test over sorted index vectors.
fn is_subset(candidate: &[u32], transaction: &[u32]) -> bool {
    let mut ti = 0;
    'outer: for &c in candidate {
        while ti < transaction.len() {
            match transaction[ti].cmp(&c) {
                std::cmp::Ordering::Less => ti += 1,
                std::cmp::Ordering::Equal => {
                    ti += 1;
                    continue 'outer;
                }
                std::cmp::Ordering::Greater => return false,
            }
        }
        return false;
    }
    true
}
