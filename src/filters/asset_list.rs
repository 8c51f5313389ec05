//! Static asset whitelist/blacklist
//!
//! Validates orders against a configured asset list before they enter graph
//! construction. Assets not in the whitelist are rejected (strict mode) or
//! allowed (advisory mode). Blacklisted assets and pairs are always
//! rejected.
//!
//! Author: AI-Generated
//! Created: 2026-07-29

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::error::Result;
use crate::filters::OrderFilter;
use crate::money::Currency;
use crate::order::Order;

/// Enforcement mode for the whitelist side of the config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    /// Only whitelisted assets participate.
    Strict,
    /// Anything not blacklisted participates.
    Advisory,
}

/// Declarative filter config, deserializable from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetListConfig {
    pub enforcement: Enforcement,
    #[serde(default)]
    pub allowed_assets: Vec<String>,
    #[serde(default)]
    pub blacklisted_assets: Vec<String>,
    /// Pairs as `"BASE/QUOTE"`; direction-insensitive.
    #[serde(default)]
    pub blacklisted_pairs: Vec<String>,
}

/// Fast-lookup filter built from the config. All codes are uppercased at
/// load time.
pub struct AssetListFilter {
    enforcement: Enforcement,
    allowed: HashSet<Currency>,
    blacklisted: HashSet<Currency>,
    blacklisted_pairs: HashSet<(Currency, Currency)>,
}

impl AssetListFilter {
    pub fn from_config(config: &AssetListConfig) -> Result<Self> {
        let allowed = config
            .allowed_assets
            .iter()
            .map(|code| Currency::new(code))
            .collect::<Result<HashSet<_>>>()?;
        let blacklisted = config
            .blacklisted_assets
            .iter()
            .map(|code| Currency::new(code))
            .collect::<Result<HashSet<_>>>()?;

        let mut blacklisted_pairs = HashSet::new();
        for pair in &config.blacklisted_pairs {
            if let Some((base, quote)) = pair.split_once('/') {
                let base = Currency::new(base)?;
                let quote = Currency::new(quote)?;
                // Store both directions so lookup is symmetric.
                blacklisted_pairs.insert((base.clone(), quote.clone()));
                blacklisted_pairs.insert((quote, base));
            }
        }

        Ok(Self {
            enforcement: config.enforcement,
            allowed,
            blacklisted,
            blacklisted_pairs,
        })
    }

    pub fn is_strict(&self) -> bool {
        self.enforcement == Enforcement::Strict
    }

    pub fn allowed_asset_count(&self) -> usize {
        self.allowed.len()
    }
}

impl OrderFilter for AssetListFilter {
    fn accepts(&self, order: &Order) -> bool {
        let base = order.pair().base();
        let quote = order.pair().quote();

        // 1. Asset blacklist (fastest check)
        if self.blacklisted.contains(base) || self.blacklisted.contains(quote) {
            debug!("asset-list: {} rejected, asset blacklisted", order.pair());
            return false;
        }

        // 2. Pair blacklist
        if self.blacklisted_pairs.contains(&(base.clone(), quote.clone())) {
            debug!("asset-list: {} rejected, pair blacklisted", order.pair());
            return false;
        }

        // 3. Whitelist enforcement
        if self.enforcement == Enforcement::Strict {
            let allowed = self.allowed.contains(base) && self.allowed.contains(quote);
            if !allowed {
                debug!("asset-list: {} rejected, not whitelisted (strict mode)", order.pair());
            }
            return allowed;
        }

        true
    }

    fn name(&self) -> &str {
        "asset-list"
    }
}

impl Default for AssetListFilter {
    fn default() -> Self {
        warn!("asset-list: no config loaded, using permissive defaults (advisory mode, no blacklists)");
        Self {
            enforcement: Enforcement::Advisory,
            allowed: HashSet::new(),
            blacklisted: HashSet::new(),
            blacklisted_pairs: HashSet::new(),
        }
    }
}
