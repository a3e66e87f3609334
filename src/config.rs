//! Counter configuration.

use crate::errors::Result;
use crate::fees::{BANK_FEE_PERCENT, FeeSchedule, WALLET_FEE_PERCENT, YUSSOR_SERVICE_PERCENT};
use crate::models::{FeeEntry, TxKind};
use crate::printer::{DEFAULT_PRINT_DELAY, EXCHANGE_PRINT_DELAY};
use crate::receipt::DEFAULT_WIDTH;
use anyhow::Context;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Everything the shop may want to tune. Missing fields keep their defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bank_fee_percent: Decimal,
    pub wallet_fee_percent: Decimal,
    pub yussor_fee_percent: Decimal,
    pub exchange_print_delay_ms: u64,
    pub print_delay_ms: u64,
    /// JSON file backing rates and sales history.
    pub data_file: PathBuf,
    pub receipt_width: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bank_fee_percent: BANK_FEE_PERCENT,
            wallet_fee_percent: WALLET_FEE_PERCENT,
            yussor_fee_percent: YUSSOR_SERVICE_PERCENT,
            exchange_print_delay_ms: EXCHANGE_PRINT_DELAY.as_millis() as u64,
            print_delay_ms: DEFAULT_PRINT_DELAY.as_millis() as u64,
            data_file: PathBuf::from("exchange-pos.json"),
            receipt_width: DEFAULT_WIDTH,
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config '{}'", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing config '{}'", path.display()))
    }

    /// Fee schedule for `kind`, honouring configured percentages.
    pub fn schedule(&self, kind: TxKind) -> FeeSchedule {
        match kind {
            TxKind::Wallet => FeeSchedule::new(vec![
                FeeEntry::new("bank", self.bank_fee_percent),
                FeeEntry::new("wallet", self.wallet_fee_percent),
            ]),
            TxKind::YussorPay => FeeSchedule::new(vec![FeeEntry::new("service", self.yussor_fee_percent)]),
            other => FeeSchedule::for_kind(other),
        }
    }

    pub fn print_delay(&self, kind: TxKind) -> Duration {
        match kind {
            TxKind::Exchange => Duration::from_millis(self.exchange_print_delay_ms),
            _ => Duration::from_millis(self.print_delay_ms),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn defaults_match_fixed_tables() {
        let cfg = Config::default();
        for kind in [TxKind::Wallet, TxKind::YussorPay, TxKind::Pos] {
            assert_eq!(cfg.schedule(kind), FeeSchedule::for_kind(kind));
        }
        assert_eq!(cfg.print_delay(TxKind::Exchange), Duration::from_millis(600));
        assert_eq!(cfg.print_delay(TxKind::Wallet), Duration::from_millis(800));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{"bank_fee_percent": "2.5", "receipt_width": 48}"#).unwrap();
        let cfg = Config::from_file(&path).unwrap();
        assert_eq!(cfg.bank_fee_percent, dec!(2.5));
        assert_eq!(cfg.receipt_width, 48);
        assert_eq!(cfg.yussor_fee_percent, dec!(5));
    }
}
