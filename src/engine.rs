//! The counters: each one turns operator input into figures and, when the
//! input allows it, a receipt.
//!
//! Nothing here fails or panics on degenerate input; zero, negative or
//! unrepresentably large amounts give zero figures and no receipt.

use crate::fees::{FeeBreakdown, FeeSchedule};
use crate::models::{Quantity, Rate, TransactionRecord, TxKind};
use crate::profit::{checked_profit, profit};
use crate::rate::RateDerivation;
use crate::receipt::{DailyRateReceipt, MISSING_REF, PosReceipt, Receipt, TransactionReceipt};
use crate::rounding::{Rounded, RoundingPolicy, RoundingRule, reconcile};
use rust_decimal::Decimal;
use tracing::{debug, warn};

/// Local time as printed on receipts and stored on sales.
pub fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Fresh sale id: 32 lowercase hex chars.
pub fn new_sale_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Fees plus rounding for any fee-bearing counter.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub net_amount: Decimal,
    pub fees: FeeBreakdown,
    pub rounded: Rounded,
}

impl Quote {
    pub fn total_charge(&self) -> Decimal {
        self.rounded.rounded_total
    }

    pub fn can_print(&self) -> bool {
        self.net_amount > Decimal::ZERO
    }
}

/// An amount the fee schedule zeroes out (non-positive, or too large to
/// price) quotes as nothing at all.
pub fn quote<P: RoundingPolicy + ?Sized>(amount: Decimal, schedule: &FeeSchedule, policy: &P) -> Quote {
    let fees = schedule.apply(amount);
    let net_amount = if fees.total.is_zero() { Decimal::ZERO } else { amount };
    let rounded = reconcile(policy, net_amount, fees.total);
    debug!(%amount, raw = %fees.total, total = %rounded.rounded_total, "quote");
    Quote {
        net_amount,
        fees,
        rounded,
    }
}

// ------------------------------------------------------------------ wallet

#[derive(Debug, Clone, PartialEq)]
pub struct WalletQuote {
    pub net_amount: Decimal,
    pub bank_fee: Decimal,
    pub wallet_fee: Decimal,
    pub total_charge: Decimal,
}

impl WalletQuote {
    pub fn compute(amount: Decimal, schedule: &FeeSchedule) -> Self {
        let q = quote(amount, schedule, &RoundingRule::for_kind(TxKind::Wallet));
        Self {
            net_amount: q.net_amount,
            bank_fee: q.fees.fee(0),
            wallet_fee: q.fees.fee(1),
            total_charge: q.total_charge(),
        }
    }

    pub fn receipt(&self, date: &str) -> Option<Receipt> {
        (self.net_amount > Decimal::ZERO).then(|| {
            Receipt::Transaction(TransactionReceipt {
                net_amount: self.net_amount,
                total_charge: self.total_charge,
                bank_fee: self.bank_fee,
                wallet_fee: self.wallet_fee,
                usdt: None,
                sell_rate: None,
                date: date.to_string(),
            })
        })
    }
}

// -------------------------------------------------------------- yussor pay

#[derive(Debug, Clone, PartialEq)]
pub struct YussorQuote {
    pub net_amount: Decimal,
    pub raw_fee: Decimal,
    pub raw_total: Decimal,
    pub rounded_total: Decimal,
    pub final_fee: Decimal,
    /// Surplus absorbed by rounding up, shown to the customer.
    pub rounding_diff: Decimal,
}

impl YussorQuote {
    pub fn compute(amount: Decimal, schedule: &FeeSchedule) -> Self {
        let q = quote(amount, schedule, &RoundingRule::for_kind(TxKind::YussorPay));
        Self {
            net_amount: q.net_amount,
            raw_fee: q.fees.fee_sum(),
            raw_total: q.rounded.raw_total,
            rounded_total: q.rounded.rounded_total,
            final_fee: q.rounded.final_fee,
            rounding_diff: q.rounded.rounding_diff,
        }
    }

    pub fn receipt(&self, date: &str) -> Option<Receipt> {
        (self.net_amount > Decimal::ZERO).then(|| {
            Receipt::Transaction(TransactionReceipt {
                net_amount: self.net_amount,
                total_charge: self.rounded_total,
                bank_fee: self.final_fee,
                wallet_fee: Decimal::ZERO,
                usdt: None,
                sell_rate: None,
                date: date.to_string(),
            })
        })
    }
}

// ---------------------------------------------------------------- exchange

/// Buy and sell sides sharing one USDT quantity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExchangeDesk {
    pub buy: RateDerivation,
    pub sell: RateDerivation,
}

impl ExchangeDesk {
    pub fn new(qty: Quantity, buy_rate: Rate, sell_rate: Rate) -> Self {
        Self {
            buy: RateDerivation::with_rate(qty, buy_rate),
            sell: RateDerivation::with_rate(qty, sell_rate),
        }
    }

    pub fn qty(&self) -> Quantity {
        self.sell.quantity()
    }

    /// Both sides move together; if either total would overflow, neither does.
    pub fn set_qty(&mut self, qty: Quantity) {
        if self.buy.rate().checked_mul(qty).is_none() || self.sell.rate().checked_mul(qty).is_none() {
            warn!(%qty, "quantity ignored: totals overflow");
            return;
        }
        self.buy.set_quantity(qty);
        self.sell.set_quantity(qty);
    }

    pub fn profit(&self) -> Decimal {
        profit(self.buy.rate(), self.sell.rate(), self.qty())
    }

    /// Today's sell rate card; needs a positive sell rate.
    pub fn daily_rate_receipt(&self, date: &str) -> Option<Receipt> {
        (self.sell.rate() > Decimal::ZERO).then(|| {
            Receipt::DailyRate(DailyRateReceipt {
                sell_rate: self.sell.rate(),
                date: date.to_string(),
            })
        })
    }

    /// Customer copy: the sell total, no fees. Buy side stays off paper.
    pub fn customer_receipt(&self, date: &str) -> Option<Receipt> {
        if self.qty() <= Decimal::ZERO || self.sell.rate() <= Decimal::ZERO {
            return None;
        }
        let total = self.sell.total();
        Some(Receipt::Transaction(TransactionReceipt {
            net_amount: total,
            total_charge: total,
            bank_fee: Decimal::ZERO,
            wallet_fee: Decimal::ZERO,
            usdt: Some(self.qty()),
            sell_rate: Some(self.sell.rate()),
            date: date.to_string(),
        }))
    }
}

// --------------------------------------------------------------------- pos

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PosSale {
    pub usdt: Quantity,
    pub sell_rate: Rate,
    pub buy_rate: Rate,
    pub counterparty_ref: String,
}

impl PosSale {
    fn checked_total(&self) -> Option<Decimal> {
        self.usdt.checked_mul(self.sell_rate)
    }

    /// `usdt × sell_rate`, zero when it overflows.
    pub fn total_lyd(&self) -> Decimal {
        self.checked_total().unwrap_or(Decimal::ZERO)
    }

    pub fn profit(&self) -> Decimal {
        profit(self.buy_rate, self.sell_rate, self.usdt)
    }

    /// Positive amount and rate, and figures that fit in a `Decimal`.
    pub fn can_complete(&self) -> bool {
        self.usdt > Decimal::ZERO
            && self.sell_rate > Decimal::ZERO
            && self.checked_total().is_some()
            && checked_profit(self.buy_rate, self.sell_rate, self.usdt).is_some()
    }

    /// Build the sale record and the customer receipt.
    pub fn complete(&self, id: String, timestamp: String) -> Option<(TransactionRecord, Receipt)> {
        if !self.can_complete() {
            return None;
        }
        let counterparty = self.counterparty_ref.trim();
        let receipt = Receipt::UsdtPos(PosReceipt {
            usdt: self.usdt,
            sell_rate: self.sell_rate,
            counterparty_ref: if counterparty.is_empty() {
                MISSING_REF.to_string()
            } else {
                counterparty.to_string()
            },
            total_sell: self.total_lyd(),
            date: timestamp.clone(),
        });
        let record = TransactionRecord {
            id,
            usdt_amount: self.usdt,
            sell_rate: self.sell_rate,
            buy_rate: self.buy_rate,
            total_lyd: self.total_lyd(),
            profit: self.profit(),
            counterparty_ref: counterparty.to_string(),
            timestamp,
        };
        Some((record, receipt))
    }
}
