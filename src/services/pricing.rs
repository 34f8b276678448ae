//! pricing.rs
//!
//! Расчёт цены места по его категории. Цены в целых единицах валюты:
//! производные цены округляются вниз, явные переопределения берутся как есть.

use crate::models::{PriceTable, SeatTier};

/// Price of one seat of `tier` under `prices`.
pub fn price_for(tier: SeatTier, prices: &PriceTable) -> i64 {
    match tier {
        SeatTier::Regular => prices.regular,
        SeatTier::Premium => explicit(prices.premium)
            .unwrap_or_else(|| prices.regular.saturating_mul(3).div_euclid(2)),
        SeatTier::Recliner => explicit(prices.recliner).unwrap_or_else(|| prices.regular.saturating_mul(2)),
    }
}

// Ноль считается отсутствием переопределения
fn explicit(value: Option<i64>) -> Option<i64> {
    value.filter(|v| *v != 0)
}

/// Resolved price for every tier, as shown next to the seat map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PriceBreakdown {
    pub regular: i64,
    pub premium: i64,
    pub recliner: i64,
}

impl PriceBreakdown {
    pub fn resolve(prices: &PriceTable) -> Self {
        Self {
            regular: price_for(SeatTier::Regular, prices),
            premium: price_for(SeatTier::Premium, prices),
            recliner: price_for(SeatTier::Recliner, prices),
        }
    }
}
