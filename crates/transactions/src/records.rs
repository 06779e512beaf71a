//! Behavioral record sources feeding the transaction builder.

use serde::{Deserialize, Serialize};
use shoprec_core::types::{ProductId, Transaction};

/// One raw behavioral unit from the application layer. All three sources
/// reduce to "a set of products seen together", differing only in signal
/// strength: a completed purchase is stronger evidence than a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BehavioralRecord {
    /// Line items of one completed order, in original line order.
    Order(Vec<ProductId>),
    /// One user's wishlist contents at snapshot time.
    Wishlist(Vec<ProductId>),
    /// One user's cart contents at snapshot time.
    Cart(Vec<ProductId>),
}

/// Source discriminant, used for logging and weighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Order,
    Wishlist,
    Cart,
}

impl RecordSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordSource::Order => "order",
            RecordSource::Wishlist => "wishlist",
            RecordSource::Cart => "cart",
        }
    }
}

impl BehavioralRecord {
    pub fn source(&self) -> RecordSource {
        match self {
            BehavioralRecord::Order(_) => RecordSource::Order,
            BehavioralRecord::Wishlist(_) => RecordSource::Wishlist,
            BehavioralRecord::Cart(_) => RecordSource::Cart,
        }
    }

    pub fn products(&self) -> &[ProductId] {
        match self {
            BehavioralRecord::Order(items)
            | BehavioralRecord::Wishlist(items)
            | BehavioralRecord::Cart(items) => items,
        }
    }

    /// Transaction weight for this record. Orders always weigh 1;
    /// snapshots carry the configured multiplier.
    pub fn weight(&self, snapshot_weight: u32) -> u32 {
        match self {
            BehavioralRecord::Order(_) => 1,
            BehavioralRecord::Wishlist(_) | BehavioralRecord::Cart(_) => snapshot_weight,
        }
    }

    /// Convert into a transaction, or `None` for a record with no items.
    /// Single-item orders are kept: they never produce multi-item rules
    /// but are needed for accurate item-support denominators.
    pub fn into_transaction(self, snapshot_weight: u32) -> Option<Transaction> {
        let weight = self.weight(snapshot_weight);
        let items = match self {
            BehavioralRecord::Order(items)
            | BehavioralRecord::Wishlist(items)
            | BehavioralRecord::Cart(items) => items,
        };
        let tx = Transaction::new(items, weight);
        if tx.is_empty() {
            None
        } else {
            Some(tx)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(s: &str) -> ProductId {
        ProductId::new(s)
    }

    #[test]
    fn test_order_always_weighs_one() {
        let record = BehavioralRecord::Order(vec![pid("a"), pid("b")]);
        assert_eq!(record.weight(5), 1);
        let tx = record.into_transaction(5).unwrap();
        assert_eq!(tx.weight(), 1);
    }

    #[test]
    fn test_snapshots_carry_configured_weight() {
        let wishlist = BehavioralRecord::Wishlist(vec![pid("a")]);
        let cart = BehavioralRecord::Cart(vec![pid("b")]);
        assert_eq!(wishlist.weight(3), 3);
        assert_eq!(cart.weight(3), 3);
    }

    #[test]
    fn test_empty_record_yields_no_transaction() {
        let record = BehavioralRecord::Order(vec![]);
        assert!(record.into_transaction(1).is_none());
    }

    #[test]
    fn test_duplicate_line_items_collapse() {
        let record = BehavioralRecord::Order(vec![pid("a"), pid("a"), pid("b")]);
        let tx = record.into_transaction(1).unwrap();
        assert_eq!(tx.items(), &[pid("a"), pid("b")]);
    }
}
