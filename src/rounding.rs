//! Rounding strategies applied to a computed total, keyed by transaction
//! kind.

use crate::models::TxKind;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Post-processes a raw total. Implementations must never round down.
pub trait RoundingPolicy {
    fn round_total(&self, raw_total: Decimal) -> Decimal;
}

/// Built-in rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundingRule {
    /// Identity.
    None,
    /// Up to the next `.5` or whole unit, for cash-friendly totals.
    HalfOrWhole,
}

impl RoundingRule {
    pub fn for_kind(kind: TxKind) -> Self {
        match kind {
            TxKind::YussorPay => RoundingRule::HalfOrWhole,
            TxKind::Wallet | TxKind::Exchange | TxKind::Pos | TxKind::Profit => RoundingRule::None,
        }
    }
}

impl RoundingPolicy for RoundingRule {
    fn round_total(&self, raw_total: Decimal) -> Decimal {
        match self {
            RoundingRule::None => raw_total,
            RoundingRule::HalfOrWhole => {
                let int_part = raw_total.floor();
                let frac = raw_total - int_part;
                if frac.is_zero() {
                    raw_total
                } else if frac <= dec!(0.5) {
                    int_part + dec!(0.5)
                } else {
                    int_part + Decimal::ONE
                }
            }
        }
    }
}

/// A rounded total together with what the rounding absorbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rounded {
    pub raw_total: Decimal,
    pub rounded_total: Decimal,
    /// `rounded_total − net`: the fee actually charged.
    pub final_fee: Decimal,
    /// `rounded_total − raw_total`, never negative.
    pub rounding_diff: Decimal,
}

/// Round `raw_total` and derive the charged fee relative to `net`.
pub fn reconcile<P: RoundingPolicy + ?Sized>(policy: &P, net: Decimal, raw_total: Decimal) -> Rounded {
    let rounded_total = policy.round_total(raw_total);
    Rounded {
        raw_total,
        rounded_total,
        final_fee: rounded_total - net,
        rounding_diff: rounded_total - raw_total,
    }
}
