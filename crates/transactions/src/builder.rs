//! Builds the canonical transaction dataset for one mining run.

use shoprec_core::error::{ShoprecError, ShoprecResult};
use shoprec_core::types::{ProductId, Transaction, TransactionDataset};
use tracing::{debug, info};

use crate::records::{BehavioralRecord, RecordSource};

/// Normalizes behavioral records into a [`TransactionDataset`]. Source
/// records are never mutated; the dataset is built fresh on every run.
pub struct TransactionBuilder {
    snapshot_weight: u32,
}

impl TransactionBuilder {
    pub fn new(snapshot_weight: u32) -> ShoprecResult<Self> {
        if snapshot_weight == 0 {
            return Err(ShoprecError::InvalidThreshold(
                "snapshot_weight must be ≥ 1".to_string(),
            ));
        }
        Ok(Self { snapshot_weight })
    }

    /// Build a dataset from an already-unified record stream. Records
    /// with no items are dropped; single-item orders are kept so item
    /// supports stay accurate. Fails with `EmptyDataset` when nothing
    /// survives — mining cannot proceed on zero transactions.
    pub fn build(
        &self,
        records: impl IntoIterator<Item = BehavioralRecord>,
    ) -> ShoprecResult<TransactionDataset> {
        let mut transactions: Vec<Transaction> = Vec::new();
        let mut per_source = [0usize; 3];

        for record in records {
            let source = record.source();
            if let Some(tx) = record.into_transaction(self.snapshot_weight) {
                per_source[source as usize] += 1;
                transactions.push(tx);
            } else {
                debug!(source = source.as_str(), "skipping record with no items");
            }
        }

        if transactions.is_empty() {
            return Err(ShoprecError::EmptyDataset(
                "no behavioral records produced a transaction".to_string(),
            ));
        }

        let dataset = TransactionDataset::new(transactions);
        info!(
            orders = per_source[RecordSource::Order as usize],
            wishlists = per_source[RecordSource::Wishlist as usize],
            carts = per_source[RecordSource::Cart as usize],
            transactions = dataset.len(),
            total_weight = dataset.total_weight(),
            "built transaction dataset"
        );
        Ok(dataset)
    }

    /// Convenience entry taking the three sources separately, as the
    /// application layer extracts them.
    pub fn build_from_sources(
        &self,
        orders: Vec<Vec<ProductId>>,
        wishlists: Vec<Vec<ProductId>>,
        carts: Vec<Vec<ProductId>>,
    ) -> ShoprecResult<TransactionDataset> {
        let records = orders
            .into_iter()
            .map(BehavioralRecord::Order)
            .chain(wishlists.into_iter().map(BehavioralRecord::Wishlist))
            .chain(carts.into_iter().map(BehavioralRecord::Cart));
        self.build(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pids(ids: &[&str]) -> Vec<ProductId> {
        ids.iter().map(|s| ProductId::new(*s)).collect()
    }

    #[test]
    fn test_builds_one_transaction_per_record() {
        let builder = TransactionBuilder::new(1).unwrap();
        let dataset = builder
            .build_from_sources(
                vec![pids(&["a", "b"]), pids(&["a"])],
                vec![pids(&["c", "d"])],
                vec![pids(&["e"])],
            )
            .unwrap();
        assert_eq!(dataset.len(), 4);
        assert_eq!(dataset.total_weight(), 4);
    }

    #[test]
    fn test_single_item_order_is_kept() {
        let builder = TransactionBuilder::new(1).unwrap();
        let dataset = builder
            .build(vec![BehavioralRecord::Order(pids(&["only"]))])
            .unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.transactions()[0].len(), 1);
    }

    #[test]
    fn test_empty_snapshots_are_skipped() {
        let builder = TransactionBuilder::new(1).unwrap();
        let dataset = builder
            .build(vec![
                BehavioralRecord::Wishlist(vec![]),
                BehavioralRecord::Cart(pids(&["a"])),
            ])
            .unwrap();
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_snapshot_weight_inflates_denominator() {
        let builder = TransactionBuilder::new(3).unwrap();
        let dataset = builder
            .build_from_sources(vec![pids(&["a", "b"])], vec![pids(&["a", "c"])], vec![])
            .unwrap();
        // One order at weight 1 plus one wishlist at weight 3.
        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.total_weight(), 4);
    }

    #[test]
    fn test_zero_transactions_is_an_error() {
        let builder = TransactionBuilder::new(1).unwrap();
        let err = builder.build(Vec::new()).unwrap_err();
        assert!(matches!(err, ShoprecError::EmptyDataset(_)));

        let err = builder
            .build(vec![BehavioralRecord::Order(vec![])])
            .unwrap_err();
        assert!(matches!(err, ShoprecError::EmptyDataset(_)));
    }

    #[test]
    fn test_zero_snapshot_weight_rejected() {
        assert!(matches!(
            TransactionBuilder::new(0),
            Err(ShoprecError::InvalidThreshold(_))
        ));
    }
}
