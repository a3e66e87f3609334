//! Common domain types: transaction kinds, fee entries and sale records.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Price of one asset unit (USDT) in local currency (LYD).
pub type Rate = Decimal;

/// Amount of the traded asset.
pub type Quantity = Decimal;

/// The five counters the shop runs.
///
/// Each kind owns its fee schedule and rounding rule, see
/// [`crate::fees::FeeSchedule::for_kind`] and
/// [`crate::rounding::RoundingRule::for_kind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxKind {
    Wallet,
    YussorPay,
    Exchange,
    Pos,
    Profit,
}

/// One named percentage fee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEntry {
    pub name: String,
    /// Percent of the base amount (`3.0` means 3 %). Never negative.
    pub percent: Decimal,
}

impl FeeEntry {
    pub fn new(name: impl Into<String>, percent: Decimal) -> Self {
        Self {
            name: name.into(),
            percent: percent.max(Decimal::ZERO),
        }
    }
}

/// Whether a rate was typed in or back-computed from a total.
///
/// Only used for UI feedback; nothing downstream branches on it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    #[default]
    Manual,
    Auto,
}

/// A completed point-of-sale sale.
///
/// Immutable once built; only [`crate::store::TransactionLog`] stores them.
/// Field names follow the persisted `pos_history` JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub usdt_amount: Quantity,
    pub sell_rate: Rate,
    pub buy_rate: Rate,
    pub total_lyd: Decimal,
    pub profit: Decimal,
    /// External account tag of the buyer (e.g. a Binance id).
    #[serde(alias = "binanceId")]
    pub counterparty_ref: String,
    #[serde(alias = "date")]
    pub timestamp: String,
}

/// Flattened row used for the CSV history export.
#[derive(Serialize)]
pub struct RecordRow<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub usdt: String,
    pub sell_rate: String,
    pub buy_rate: String,
    pub total_lyd: String,
    pub profit: String,
    pub counterparty: &'a str,
}

impl<'a> From<&'a TransactionRecord> for RecordRow<'a> {
    fn from(rec: &'a TransactionRecord) -> Self {
        let money = |d: Decimal| format!("{:.2}", d.round_dp(2));
        let rate = |d: Decimal| format!("{:.3}", d.round_dp(3));
        Self {
            id: &rec.id,
            timestamp: &rec.timestamp,
            usdt: money(rec.usdt_amount),
            sell_rate: rate(rec.sell_rate),
            buy_rate: rate(rec.buy_rate),
            total_lyd: money(rec.total_lyd),
            profit: money(rec.profit),
            counterparty: &rec.counterparty_ref,
        }
    }
}
