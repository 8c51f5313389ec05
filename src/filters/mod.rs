//! Order filtering system
//!
//! Filters run before graph construction; orders a filter rejects never
//! become edges. Strict mode admits only listed assets, advisory mode only
//! rejects what is explicitly blacklisted.

pub mod asset_list;

pub use asset_list::{AssetListConfig, AssetListFilter, Enforcement};

use crate::money::Money;
use crate::order::Order;
use std::cmp::Ordering;

/// Capability interface: decide whether an order participates in a search.
pub trait OrderFilter: Send + Sync {
    fn accepts(&self, order: &Order) -> bool;

    /// Short name for logging.
    fn name(&self) -> &str;
}

/// Rejects orders whose maximum fill is below a floor in the same currency.
/// Orders denominated in other currencies pass through untouched.
pub struct MinCapacityFilter {
    floor: Money,
}

impl MinCapacityFilter {
    pub fn new(floor: Money) -> Self {
        Self { floor }
    }
}

impl OrderFilter for MinCapacityFilter {
    fn accepts(&self, order: &Order) -> bool {
        if order.bounds().currency() != self.floor.currency() {
            return true;
        }
        match order.bounds().max().compare(&self.floor) {
            Ok(Ordering::Less) => false,
            _ => true,
        }
    }

    fn name(&self) -> &str {
        "min-capacity"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::{AssetPair, ExchangeRate, OrderBounds};
    use crate::order::OrderSide;

    fn order(base: &str, quote: &str, max: &str) -> Order {
        Order::new(
            OrderSide::Buy,
            AssetPair::parse(base, quote).unwrap(),
            OrderBounds::parse(base, "0", max, 2).unwrap(),
            ExchangeRate::parse(base, quote, "1.5", 1).unwrap(),
            None,
        )
        .unwrap()
    }

    #[test]
    fn test_min_capacity_filter() {
        let filter = MinCapacityFilter::new(Money::parse("USD", "100.00", 2).unwrap());
        assert!(filter.accepts(&order("USD", "EUR", "100.00")));
        assert!(!filter.accepts(&order("USD", "EUR", "99.99")));
        // Foreign-currency bounds are not the filter's business.
        assert!(filter.accepts(&order("GBP", "EUR", "1.00")));
    }
}
