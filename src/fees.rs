//! Percentage fee schedules.
//!
//! Every fee is taken off the *base* amount; fees never compound on each
//! other.

use crate::models::{FeeEntry, TxKind};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

pub const BANK_FEE_PERCENT: Decimal = dec!(3.0);
pub const WALLET_FEE_PERCENT: Decimal = dec!(1.0);
pub const YUSSOR_SERVICE_PERCENT: Decimal = dec!(5.0);

/// Result of [`apply_fees`]: one amount per schedule entry, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeBreakdown {
    pub fees: Vec<Decimal>,
    pub total: Decimal,
}

impl FeeBreakdown {
    pub fn fee_sum(&self) -> Decimal {
        self.fees.iter().copied().sum()
    }

    /// Fee at `idx`, zero when the schedule is shorter.
    pub fn fee(&self, idx: usize) -> Decimal {
        self.fees.get(idx).copied().unwrap_or(Decimal::ZERO)
    }
}

/// `total = base + Σ base × pᵢ / 100`.
///
/// A non-positive base, or one too large to represent with its fees, yields
/// all-zero fees and a zero total.
pub fn apply_fees(base: Decimal, schedule: &[FeeEntry]) -> FeeBreakdown {
    let zero = || FeeBreakdown {
        fees: vec![Decimal::ZERO; schedule.len()],
        total: Decimal::ZERO,
    };
    if base <= Decimal::ZERO {
        return zero();
    }
    let fees: Option<Vec<Decimal>> = schedule
        .iter()
        .map(|e| base.checked_mul(e.percent)?.checked_div(Decimal::ONE_HUNDRED))
        .collect();
    let Some(fees) = fees else {
        warn!(%base, "fee computation overflowed");
        return zero();
    };
    let Some(total) = fees.iter().try_fold(base, |acc, f| acc.checked_add(*f)) else {
        warn!(%base, "fee total overflowed");
        return zero();
    };
    FeeBreakdown { fees, total }
}

/// Ordered fee list owned by one transaction kind.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeeSchedule {
    entries: Vec<FeeEntry>,
}

impl FeeSchedule {
    pub fn new(entries: Vec<FeeEntry>) -> Self {
        Self { entries }
    }

    /// The shop's fixed tables.
    pub fn for_kind(kind: TxKind) -> Self {
        match kind {
            TxKind::Wallet => Self::new(vec![
                FeeEntry::new("bank", BANK_FEE_PERCENT),
                FeeEntry::new("wallet", WALLET_FEE_PERCENT),
            ]),
            TxKind::YussorPay => Self::new(vec![FeeEntry::new("service", YUSSOR_SERVICE_PERCENT)]),
            TxKind::Exchange | TxKind::Pos | TxKind::Profit => Self::default(),
        }
    }

    pub fn entries(&self) -> &[FeeEntry] {
        &self.entries
    }

    /// Sum of all percentages, e.g. `4` for the wallet counter.
    pub fn total_percent(&self) -> Decimal {
        self.entries.iter().map(|e| e.percent).sum()
    }

    pub fn apply(&self, base: Decimal) -> FeeBreakdown {
        apply_fees(base, &self.entries)
    }
}
