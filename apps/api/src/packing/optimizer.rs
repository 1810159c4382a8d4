//! Pack optimizer — exact search for the cheapest way to cover an order with whole packs.
//!
//! Candidate shipped totals are ranked by:
//! 1. An exact match beats any overshoot, whatever its pack count.
//! 2. Among equal totals, fewer packs wins.
//! 3. Otherwise the smallest total (least overshoot) wins.
//!
//! The search runs an unbounded change-making DP over every amount in
//! `0..=order + max_size`. Some multiple of the largest pack always lands in
//! `[order, order + max_size]`, so the range always holds a candidate and no
//! amount above it could outrank one inside it.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptimizeError {
    #[error("order amount cannot be negative")]
    InvalidOrderAmount,

    #[error("no pack sizes provided")]
    NoPackSizes,

    #[error("pack sizes insufficient to fulfill order")]
    InsufficientPackSizes,

    /// `order + max_size` does not fit the table's `u32` cells. This guards
    /// index width only; it does not cap memory, which is the caller's job.
    #[error("order amount {order} with largest pack {max_size} exceeds the searchable range")]
    SearchSpaceTooLarge { order: i64, max_size: i64 },
}

/// Packs chosen for one order: size → count, plus the number of items shipped.
///
/// Only sizes actually used appear in `packs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackPlan {
    pub packs: BTreeMap<u64, u64>,
    pub shipped_total: u64,
}

impl PackPlan {
    pub fn total_packs(&self) -> u64 {
        self.packs.values().sum()
    }

    pub fn overshoot(&self, order_quantity: u64) -> u64 {
        self.shipped_total.saturating_sub(order_quantity)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Core function
// ────────────────────────────────────────────────────────────────────────────

/// Computes the pack plan for `order_quantity` items using `pack_sizes`.
///
/// Non-positive and duplicate sizes are ignored; the caller's slice is only read.
/// Memory grows with `order_quantity + max(pack_sizes)`, so callers serving
/// untrusted input should cap the order quantity first.
pub fn optimize(pack_sizes: &[i64], order_quantity: i64) -> Result<PackPlan, OptimizeError> {
    if order_quantity < 0 {
        return Err(OptimizeError::InvalidOrderAmount);
    }

    let mut sizes: Vec<i64> = pack_sizes.iter().copied().filter(|&s| s > 0).collect();
    if sizes.is_empty() {
        return Err(OptimizeError::NoPackSizes);
    }
    // Largest first: on equal pack counts the DP keeps the larger pack.
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    sizes.dedup();

    let max_size = sizes[0];
    let too_large = OptimizeError::SearchSpaceTooLarge {
        order: order_quantity,
        max_size,
    };
    // Pack counts never exceed the amount they cover, so a u32 bound keeps
    // every table cell in u32.
    let upper_bound = order_quantity
        .checked_add(max_size)
        .and_then(|bound| u32::try_from(bound).ok())
        .ok_or(too_large)? as usize;

    let sizes: Vec<u32> = sizes.into_iter().map(|s| s as u32).collect();
    let order = order_quantity as usize;
    let table = PackTable::build(&sizes, upper_bound);

    let (amount, _packs) = (order..=upper_bound)
        .filter_map(|amount| table.min_packs[amount].map(|packs| (amount, packs)))
        .min_by_key(|&(amount, packs)| (amount != order, amount, packs))
        .ok_or(OptimizeError::InsufficientPackSizes)?;

    Ok(PackPlan {
        packs: table.reconstruct(amount),
        shipped_total: amount as u64,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// DP table
// ────────────────────────────────────────────────────────────────────────────

struct PackTable {
    /// Fewest packs summing exactly to each amount; `None` when unreachable.
    min_packs: Vec<Option<u32>>,
    /// A pack size achieving `min_packs` for each reachable non-zero amount.
    last_pack: Vec<u32>,
}

impl PackTable {
    fn build(sizes: &[u32], upper_bound: usize) -> Self {
        let mut min_packs = vec![None; upper_bound + 1];
        let mut last_pack = vec![0u32; upper_bound + 1];
        min_packs[0] = Some(0);

        for amount in 1..=upper_bound {
            for &size in sizes {
                let size_idx = size as usize;
                if size_idx > amount {
                    continue;
                }
                let Some(prev) = min_packs[amount - size_idx] else {
                    continue;
                };
                let candidate = prev + 1;
                if min_packs[amount].map_or(true, |best| candidate < best) {
                    min_packs[amount] = Some(candidate);
                    last_pack[amount] = size;
                }
            }
        }

        PackTable {
            min_packs,
            last_pack,
        }
    }

    /// Walks `last_pack` back from a reachable `amount` to zero.
    fn reconstruct(&self, amount: usize) -> BTreeMap<u64, u64> {
        let mut packs = BTreeMap::new();
        let mut remaining = amount;
        while remaining > 0 {
            let size = self.last_pack[remaining];
            *packs.entry(u64::from(size)).or_insert(0) += 1;
            remaining -= size as usize;
        }
        packs
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
