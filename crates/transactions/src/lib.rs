//! Transaction builder — normalizes raw behavioral records (orders,
//! wishlist snapshots, cart snapshots) into a canonical dataset of
//! co-occurrence transactions for mining.

pub mod builder;
pub mod records;

pub use builder::TransactionBuilder;
pub use records::{BehavioralRecord, RecordSource};
