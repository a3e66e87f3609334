//! Margin analysis: profit, status tier and the smart sell-rate tip.

use crate::models::{Quantity, Rate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use tracing::{debug, warn};

/// Profit at or above this is "excellent".
pub const EXCELLENT_PROFIT: Decimal = dec!(50);
/// Band around zero treated as float noise.
pub const NEUTRAL_BAND: Decimal = dec!(0.001);
/// Target margin of the smart tip (2 % over the buy rate).
pub const TARGET_MARGIN: Decimal = dec!(0.02);
/// Bump added to the sell rate when it already meets the target.
pub const TIP_BUMP: Decimal = dec!(0.015);
/// Tips land on multiples of `1 / TIP_STEPS` (0.005).
pub const TIP_STEPS: Decimal = dec!(200);
/// A tip closer than this to the current sell rate is not worth showing.
pub const TIP_MIN_CHANGE: Decimal = dec!(0.0001);

/// `(sell − buy) × qty`; may be negative. `None` when it overflows.
pub fn checked_profit(buy_rate: Rate, sell_rate: Rate, qty: Quantity) -> Option<Decimal> {
    sell_rate.checked_sub(buy_rate)?.checked_mul(qty)
}

/// Like [`checked_profit`], reading an overflow as zero.
pub fn profit(buy_rate: Rate, sell_rate: Rate, qty: Quantity) -> Decimal {
    checked_profit(buy_rate, sell_rate, qty).unwrap_or_else(|| {
        warn!(%buy_rate, %sell_rate, %qty, "profit overflowed");
        Decimal::ZERO
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfitStatus {
    Excellent,
    Good,
    Neutral,
    Loss,
}

impl ProfitStatus {
    /// First matching tier wins.
    pub fn classify(profit: Decimal) -> Self {
        if profit >= EXCELLENT_PROFIT {
            ProfitStatus::Excellent
        } else if profit > NEUTRAL_BAND {
            ProfitStatus::Good
        } else if profit < -NEUTRAL_BAND {
            ProfitStatus::Loss
        } else {
            ProfitStatus::Neutral
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ProfitStatus::Excellent => "Excellent profit",
            ProfitStatus::Good => "Good profit",
            ProfitStatus::Neutral => "No profit",
            ProfitStatus::Loss => "Loss",
        }
    }
}

/// A proposed sell rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmartTip {
    pub rate: Rate,
    pub profit: Decimal,
    /// `rate − current sell rate`.
    pub increase: Decimal,
}

impl SmartTip {
    /// Worth showing only when it actually moves the sell rate.
    pub fn is_meaningful(&self) -> bool {
        self.increase.abs() > TIP_MIN_CHANGE
    }
}

/// Propose a sell rate reaching the target margin, always above the current
/// one, rounded up to the next 0.005.
///
/// `None` for a non-positive buy rate or quantity, or figures too large to
/// represent.
pub fn smart_tip(buy_rate: Rate, sell_rate: Rate, qty: Quantity) -> Option<SmartTip> {
    if buy_rate <= Decimal::ZERO || qty <= Decimal::ZERO {
        return None;
    }
    let mut candidate = buy_rate.checked_mul(Decimal::ONE + TARGET_MARGIN)?;
    if sell_rate >= candidate - NEUTRAL_BAND {
        candidate = sell_rate.checked_add(TIP_BUMP)?;
    }
    let rate = candidate.checked_mul(TIP_STEPS)?.ceil() / TIP_STEPS;
    let tip = SmartTip {
        rate,
        profit: checked_profit(buy_rate, rate, qty)?,
        increase: rate.checked_sub(sell_rate)?,
    };
    debug!(%buy_rate, %sell_rate, %qty, tip_rate = %tip.rate, "smart tip");
    Some(tip)
}

/// Interactive analysis state behind the profit screen.
///
/// Any edit clears the "tip applied" flag; applying twice is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfitSession {
    buy_rate: Rate,
    sell_rate: Rate,
    qty: Quantity,
    tip_applied: bool,
}

impl ProfitSession {
    pub fn new(buy_rate: Rate, sell_rate: Rate, qty: Quantity) -> Self {
        Self {
            buy_rate,
            sell_rate,
            qty,
            tip_applied: false,
        }
    }

    pub fn buy_rate(&self) -> Rate {
        self.buy_rate
    }

    pub fn sell_rate(&self) -> Rate {
        self.sell_rate
    }

    pub fn qty(&self) -> Quantity {
        self.qty
    }

    pub fn tip_applied(&self) -> bool {
        self.tip_applied
    }

    pub fn set_buy_rate(&mut self, rate: Rate) {
        self.buy_rate = rate;
        self.tip_applied = false;
    }

    pub fn set_sell_rate(&mut self, rate: Rate) {
        self.sell_rate = rate;
        self.tip_applied = false;
    }

    pub fn set_qty(&mut self, qty: Quantity) {
        self.qty = qty;
        self.tip_applied = false;
    }

    pub fn profit(&self) -> Decimal {
        profit(self.buy_rate, self.sell_rate, self.qty)
    }

    pub fn status(&self) -> ProfitStatus {
        ProfitStatus::classify(self.profit())
    }

    pub fn smart_tip(&self) -> Option<SmartTip> {
        smart_tip(self.buy_rate, self.sell_rate, self.qty)
    }

    /// The tip to display, if any.
    ///
    /// After [`apply_tip`](Self::apply_tip) the recomputed tip is still
    /// returned; callers show it as applied while [`tip_applied`](Self::tip_applied)
    /// holds.
    pub fn visible_tip(&self) -> Option<SmartTip> {
        self.smart_tip().filter(SmartTip::is_meaningful)
    }

    /// Move the sell rate to the tip. Returns the tip when something changed.
    pub fn apply_tip(&mut self) -> Option<SmartTip> {
        if self.tip_applied {
            return None;
        }
        let tip = self.smart_tip()?;
        self.sell_rate = tip.rate;
        self.tip_applied = true;
        Some(tip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_tiers() {
        let cases = [
            (dec!(1.06), dec!(6), ProfitStatus::Good),
            (dec!(1.6), dec!(60), ProfitStatus::Excellent),
            (dec!(0.9), dec!(-10), ProfitStatus::Loss),
            (dec!(1.0), dec!(0), ProfitStatus::Neutral),
        ];
        for (sell, expected_profit, tier) in cases {
            let p = profit(dec!(1.0), sell, dec!(100));
            assert_eq!(p, expected_profit);
            assert_eq!(ProfitStatus::classify(p), tier);
        }
    }

    #[test]
    fn noise_band_is_neutral() {
        assert_eq!(ProfitStatus::classify(dec!(0.0009)), ProfitStatus::Neutral);
        assert_eq!(ProfitStatus::classify(dec!(-0.001)), ProfitStatus::Neutral);
        assert_eq!(ProfitStatus::classify(dec!(50)), ProfitStatus::Excellent);
    }

    #[test]
    fn tip_targets_two_percent() {
        let tip = smart_tip(dec!(1.000), dec!(1.000), dec!(1000)).unwrap();
        assert_eq!(tip.rate, dec!(1.02));
        assert_eq!(tip.profit, dec!(20));
    }

    #[test]
    fn tip_rounds_up_to_half_cent() {
        // 7.1 × 1.02 = 7.242 → 7.245
        let tip = smart_tip(dec!(7.1), dec!(7.15), dec!(10)).unwrap();
        assert_eq!(tip.rate, dec!(7.245));
    }

    #[test]
    fn tip_bumps_when_sell_already_high() {
        // target 7.242 already met by 7.3 → 7.315 → 7.315
        let tip = smart_tip(dec!(7.1), dec!(7.3), dec!(10)).unwrap();
        assert_eq!(tip.rate, dec!(7.315));
        assert!(tip.increase > Decimal::ZERO);
    }

    #[test]
    fn huge_inputs_do_not_panic() {
        assert!(smart_tip(dec!(1000000000000000000000000000), dec!(1), dec!(1)).is_none());
        assert!(smart_tip(dec!(1), Decimal::MAX, dec!(1)).is_none());
        assert_eq!(profit(dec!(1), Decimal::MAX, dec!(10)), Decimal::ZERO);
        assert_eq!(profit(Decimal::MAX, Decimal::MIN, dec!(1)), Decimal::ZERO);
        assert_eq!(checked_profit(dec!(1), dec!(2), Decimal::MAX), Some(Decimal::MAX));

        let s = ProfitSession::new(dec!(1), Decimal::MAX, Decimal::MAX);
        assert_eq!(s.status(), ProfitStatus::Neutral);
        assert!(s.visible_tip().is_none());
    }

    #[test]
    fn tip_needs_buy_rate_and_qty() {
        assert!(smart_tip(Decimal::ZERO, dec!(7), dec!(10)).is_none());
        assert!(smart_tip(dec!(7), dec!(7), Decimal::ZERO).is_none());
    }

    #[test]
    fn apply_tip_is_idempotent_until_edit() {
        let mut s = ProfitSession::new(dec!(1), dec!(1), dec!(1000));
        assert!(s.visible_tip().is_some());
        assert_eq!(s.apply_tip().map(|t| t.rate), Some(dec!(1.02)));
        assert!(s.tip_applied());
        assert_eq!(s.apply_tip(), None);
        assert_eq!(s.sell_rate(), dec!(1.02));
        // still displayed, flagged as applied
        assert_eq!(s.visible_tip().map(|t| t.rate), Some(dec!(1.035)));
        assert!(s.tip_applied());

        s.set_qty(dec!(500));
        assert!(!s.tip_applied());
        // 1.02 already meets target → 1.035
        assert_eq!(s.apply_tip().map(|t| t.rate), Some(dec!(1.035)));
    }
}
