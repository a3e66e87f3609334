//! Bidirectional rate ↔ total derivation for a fixed quantity.

use crate::models::{Provenance, Quantity, Rate};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Keeps `total = rate × quantity` consistent while either side is edited.
///
/// The rate is the durable value: changing the quantity recomputes the total,
/// never the rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateDerivation {
    quantity: Quantity,
    rate: Rate,
    total: Decimal,
    provenance: Provenance,
}

impl RateDerivation {
    pub fn new(quantity: Quantity) -> Self {
        Self {
            quantity,
            ..Self::default()
        }
    }

    /// Start from a known rate (e.g. the remembered one).
    pub fn with_rate(quantity: Quantity, rate: Rate) -> Self {
        let mut d = Self::new(quantity);
        d.set_rate(rate);
        d
    }

    pub fn rate(&self) -> Rate {
        self.rate
    }

    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn provenance(&self) -> Provenance {
        self.provenance
    }

    /// Typed-in rate; the total follows.
    ///
    /// Ignored when `rate × quantity` does not fit in a `Decimal`.
    pub fn set_rate(&mut self, rate: Rate) {
        let Some(total) = rate.checked_mul(self.quantity) else {
            warn!(%rate, quantity = %self.quantity, "set_rate ignored: total overflows");
            return;
        };
        self.rate = rate;
        self.total = total;
        self.provenance = Provenance::Manual;
    }

    /// Typed-in total; the rate is back-computed.
    ///
    /// With a zero (or negative) quantity there is nothing to divide by, so
    /// the call is ignored and the previous rate stays.
    pub fn set_total(&mut self, total: Decimal) {
        if self.quantity <= Decimal::ZERO {
            debug!(%total, "set_total ignored: no quantity");
            return;
        }
        let Some(rate) = total.checked_div(self.quantity) else {
            warn!(%total, quantity = %self.quantity, "set_total ignored: rate overflows");
            return;
        };
        self.rate = rate;
        self.total = total;
        self.provenance = Provenance::Auto;
    }

    /// Quantity changed outside; keep the rate, recompute the total.
    ///
    /// Ignored when the new total would overflow.
    pub fn set_quantity(&mut self, quantity: Quantity) {
        let Some(total) = self.rate.checked_mul(quantity) else {
            warn!(%quantity, rate = %self.rate, "set_quantity ignored: total overflows");
            return;
        };
        self.quantity = quantity;
        self.total = total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rate_drives_total() {
        let mut d = RateDerivation::new(dec!(100));
        d.set_rate(dec!(7.25));
        assert_eq!(d.total(), dec!(725));
        assert_eq!(d.provenance(), Provenance::Manual);
    }

    #[test]
    fn total_back_computes_rate() {
        let mut d = RateDerivation::new(dec!(200));
        d.set_total(dec!(1450));
        assert_eq!(d.rate(), dec!(7.25));
        assert_eq!(d.total(), dec!(1450));
        assert_eq!(d.provenance(), Provenance::Auto);
    }

    #[test]
    fn set_total_after_set_rate_keeps_rate() {
        let mut d = RateDerivation::new(dec!(37));
        d.set_rate(dec!(6.915));
        let total = d.rate() * d.quantity();
        d.set_total(total);
        assert_eq!(d.rate(), dec!(6.915));
    }

    #[test]
    fn zero_quantity_total_is_ignored() {
        let mut d = RateDerivation::with_rate(Decimal::ZERO, dec!(7.1));
        d.set_total(dec!(500));
        assert_eq!(d.rate(), dec!(7.1));
        assert_eq!(d.total(), Decimal::ZERO);
        assert_eq!(d.provenance(), Provenance::Manual);
    }

    #[test]
    fn quantity_change_keeps_rate() {
        let mut d = RateDerivation::new(dec!(10));
        d.set_total(dec!(71));
        d.set_quantity(dec!(20));
        assert_eq!(d.rate(), dec!(7.1));
        assert_eq!(d.total(), dec!(142));
    }

    #[test]
    fn overflowing_edits_are_ignored() {
        let mut d = RateDerivation::with_rate(dec!(0.5), dec!(7));
        d.set_total(dec!(60000000000000000000000000000));
        assert_eq!(d.rate(), dec!(7));
        assert_eq!(d.total(), dec!(3.5));
        assert_eq!(d.provenance(), Provenance::Manual);

        let mut d = RateDerivation::with_rate(dec!(10), dec!(7));
        d.set_rate(Decimal::MAX);
        assert_eq!(d.rate(), dec!(7));
        assert_eq!(d.total(), dec!(70));

        d.set_quantity(Decimal::MAX);
        assert_eq!(d.quantity(), dec!(10));
        assert_eq!(d.total(), dec!(70));
    }
}
