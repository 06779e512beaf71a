//! Itemset mining and rule generation — the batch half of the engine.
//! Runs offline as a pure pipeline: build transactions, mine frequent
//! itemsets level-wise, derive filtered association rules.

pub mod apriori;
pub mod rules;

pub use apriori::{AprioriMiner, CancelToken, SUPPORT_EPSILON};
pub use rules::RuleGenerator;

use shoprec_core::config::MiningConfig;
use shoprec_core::error::ShoprecResult;
use shoprec_core::types::{ProductId, RuleSet};
use shoprec_transactions::TransactionBuilder;

/// Batch entry point: normalize the three behavioral sources, mine
/// frequent itemsets, and return the filtered rule set.
pub fn build_and_mine(
    orders: Vec<Vec<ProductId>>,
    wishlists: Vec<Vec<ProductId>>,
    carts: Vec<Vec<ProductId>>,
    config: &MiningConfig,
) -> ShoprecResult<RuleSet> {
    build_and_mine_with_cancel(orders, wishlists, carts, config, &CancelToken::new())
}

/// Same as [`build_and_mine`], honoring a cancellation token between
/// Apriori levels.
pub fn build_and_mine_with_cancel(
    orders: Vec<Vec<ProductId>>,
    wishlists: Vec<Vec<ProductId>>,
    carts: Vec<Vec<ProductId>>,
    config: &MiningConfig,
    cancel: &CancelToken,
) -> ShoprecResult<RuleSet> {
    let config = config.normalized();
    config.validate()?;

    let builder = TransactionBuilder::new(config.snapshot_weight)?;
    let dataset = builder.build_from_sources(orders, wishlists, carts)?;

    let miner = AprioriMiner::new(config.min_support_ratio, config.max_itemset_size)?;
    let frequent = miner.mine_with_cancel(&dataset, cancel)?;

    let generator = RuleGenerator::new(config.min_confidence, config.min_lift)?;
    generator.generate(&frequent)
}
