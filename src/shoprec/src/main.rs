//! ShopRec — batch association-rule mining for product recommendations.
//!
//! Reads behavioral records (orders, wishlists, carts) from a JSON file,
//! mines the rule set, persists it for the serving layer, and can score
//! an ad-hoc basket against the freshly mined rules.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use serde::Deserialize;
use shoprec_core::config::AppConfig;
use shoprec_core::error::{ShoprecError, ShoprecResult};
use shoprec_core::types::{ProductId, UserBasket};
use shoprec_mining::build_and_mine;
use shoprec_recommend::recommend_for_user;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "shoprec")]
#[command(about = "Batch association-rule mining for product recommendations")]
#[command(version)]
struct Cli {
    /// JSON file with behavioral records: {"orders": [...], "wishlists": [...], "carts": [...]}
    #[arg(long)]
    input: PathBuf,

    /// Where to write the serialized rule set
    #[arg(long)]
    output: Option<PathBuf>,

    /// Comma-separated basket to score against the mined rules
    #[arg(long)]
    basket: Option<String>,

    /// Number of recommendations to print for --basket (overrides config)
    #[arg(long, env = "SHOPREC__RECOMMEND__TOP_N")]
    top_n: Option<usize>,

    /// Minimum support ratio (overrides config)
    #[arg(long, env = "SHOPREC__MINING__MIN_SUPPORT_RATIO")]
    min_support: Option<f64>,

    /// Minimum rule confidence (overrides config)
    #[arg(long, env = "SHOPREC__MINING__MIN_CONFIDENCE")]
    min_confidence: Option<f64>,

    /// Minimum rule lift (overrides config)
    #[arg(long, env = "SHOPREC__MINING__MIN_LIFT")]
    min_lift: Option<f64>,

    /// Cap on mined itemset size (overrides config)
    #[arg(long, env = "SHOPREC__MINING__MAX_ITEMSET_SIZE")]
    max_itemset_size: Option<usize>,

    /// Weight for wishlist/cart snapshot transactions (overrides config)
    #[arg(long, env = "SHOPREC__MINING__SNAPSHOT_WEIGHT")]
    snapshot_weight: Option<u32>,
}

/// Input file shape. Each entry is one behavioral unit: one order's line
/// items, or one user's wishlist/cart snapshot.
#[derive(Debug, Default, Deserialize)]
struct RecordFile {
    #[serde(default)]
    orders: Vec<Vec<String>>,
    #[serde(default)]
    wishlists: Vec<Vec<String>>,
    #[serde(default)]
    carts: Vec<Vec<String>>,
}

fn to_products(raw: Vec<Vec<String>>) -> Vec<Vec<ProductId>> {
    raw.into_iter()
        .map(|items| items.into_iter().map(ProductId::from).collect())
        .collect()
}

/// Load and parse the record file. Read failures surface as `Io`,
/// malformed JSON as `Serialization`.
fn read_records(path: &Path) -> ShoprecResult<RecordFile> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|e| ShoprecError::Serialization(e.to_string()))
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shoprec=info".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    info!("ShopRec mining run starting");

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(v) = cli.min_support {
        config.mining.min_support_ratio = v;
    }
    if let Some(v) = cli.min_confidence {
        config.mining.min_confidence = v;
    }
    if let Some(v) = cli.min_lift {
        config.mining.min_lift = v;
    }
    if let Some(v) = cli.max_itemset_size {
        config.mining.max_itemset_size = Some(v);
    }
    if let Some(v) = cli.snapshot_weight {
        config.mining.snapshot_weight = v;
    }
    if let Some(v) = cli.top_n {
        config.recommend.top_n = v;
    }

    let records = read_records(&cli.input)
        .with_context(|| format!("reading records from {}", cli.input.display()))?;

    info!(
        orders = records.orders.len(),
        wishlists = records.wishlists.len(),
        carts = records.carts.len(),
        "loaded behavioral records"
    );

    let rule_set = build_and_mine(
        to_products(records.orders),
        to_products(records.wishlists),
        to_products(records.carts),
        &config.mining,
    )?;

    info!(rules = rule_set.len(), "mining complete");

    if let Some(output) = &cli.output {
        let bytes = rule_set.to_bytes()?;
        std::fs::write(output, &bytes)
            .map_err(ShoprecError::Io)
            .with_context(|| format!("writing rule set to {}", output.display()))?;
        info!(path = %output.display(), bytes = bytes.len(), "rule set persisted");
    }

    if let Some(raw_basket) = &cli.basket {
        let basket: UserBasket = raw_basket
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ProductId::from)
            .collect();
        let recommendation = recommend_for_user(&basket, &rule_set, config.recommend.top_n);
        println!("{}", serde_json::to_string_pretty(&recommendation)?);
    }

    Ok(())
}
