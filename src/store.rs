//! Persistence: a string key-value store, the remembered rates and the
//! append-only sales log kept on top of it.

use crate::errors::Result;
use crate::models::{Quantity, Rate, RecordRow, TransactionRecord};
use anyhow::Context;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const KEY_BUY_RATE: &str = "buyRate";
pub const KEY_SELL_RATE: &str = "sellRate";
pub const KEY_USDT_QTY: &str = "usdtQty";
pub const KEY_POS_HISTORY: &str = "pos_history";

/// String-keyed, string-valued storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Ephemeral store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    map: BTreeMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.map.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.map.remove(key);
        Ok(())
    }
}

/// Whole store as one JSON object on disk.
///
/// A missing or unreadable file starts empty. Every write replaces the file
/// through a temp file + rename so a crash never leaves half a document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    map: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let map = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), %e, "store file unparsable, starting empty");
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e).with_context(|| format!("reading store '{}'", path.display()));
            }
        };
        debug!(path = %path.display(), keys = map.len(), "store opened");
        Ok(Self { path, map })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating data dir '{}'", dir.display()))?;
        }
        let tmp = self.path.with_extension("tmp");
        let mut file = fs::File::create(&tmp)
            .with_context(|| format!("creating '{}'", tmp.display()))?;
        serde_json::to_writer_pretty(&mut file, &self.map)?;
        file.write_all(b"\n")?;
        file.sync_all()?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("replacing '{}'", self.path.display()))?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.map.insert(key.to_string(), value);
        self.flush()
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        if self.map.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }
}

fn read_decimal<S: KeyValueStore + ?Sized>(store: &S, key: &str) -> Decimal {
    store
        .get(key)
        .and_then(|raw| raw.trim().parse::<Decimal>().ok())
        .unwrap_or(Decimal::ZERO)
}

/// Last rates and quantity typed at the exchange counter.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RateMemory {
    pub buy_rate: Rate,
    pub sell_rate: Rate,
    pub usdt_qty: Quantity,
}

impl RateMemory {
    /// Missing or garbled values read as zero.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Self {
        Self {
            buy_rate: read_decimal(store, KEY_BUY_RATE),
            sell_rate: read_decimal(store, KEY_SELL_RATE),
            usdt_qty: read_decimal(store, KEY_USDT_QTY),
        }
    }

    /// Remember the positive values; zeros never overwrite what is stored.
    pub fn update<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        buy_rate: Rate,
        sell_rate: Rate,
        usdt_qty: Quantity,
    ) -> Result<()> {
        if buy_rate > Decimal::ZERO {
            self.buy_rate = buy_rate;
            store.set(KEY_BUY_RATE, buy_rate.to_string())?;
        }
        if sell_rate > Decimal::ZERO {
            self.sell_rate = sell_rate;
            store.set(KEY_SELL_RATE, sell_rate.to_string())?;
        }
        if usdt_qty > Decimal::ZERO {
            self.usdt_qty = usdt_qty;
            store.set(KEY_USDT_QTY, usdt_qty.to_string())?;
        }
        Ok(())
    }
}

/// Proof that the operator confirmed a destructive action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Declined,
}

impl From<bool> for Confirmation {
    fn from(yes: bool) -> Self {
        if yes { Confirmation::Confirmed } else { Confirmation::Declined }
    }
}

/// Most-recent-first log of POS sales.
///
/// Records are only ever prepended, or all dropped at once.
#[derive(Debug)]
pub struct TransactionLog<S: KeyValueStore> {
    store: S,
    records: Vec<TransactionRecord>,
}

impl<S: KeyValueStore> TransactionLog<S> {
    /// Load the history; anything unparsable is treated as empty.
    pub fn load(store: S) -> Self {
        let records = match store.get(KEY_POS_HISTORY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(%e, "pos history unparsable, starting empty");
                Vec::new()
            }),
            None => Vec::new(),
        };
        Self { store, records }
    }

    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn append(&mut self, record: TransactionRecord) -> Result<()> {
        info!(id = %record.id, profit = %record.profit, "sale recorded");
        self.records.insert(0, record);
        self.persist()
    }

    /// Drop every record. Returns whether anything was cleared.
    pub fn clear_all(&mut self, confirmation: Confirmation) -> Result<bool> {
        if confirmation != Confirmation::Confirmed {
            debug!("clear_all declined");
            return Ok(false);
        }
        warn!(count = self.records.len(), "clearing pos history");
        self.records.clear();
        self.store.remove(KEY_POS_HISTORY)?;
        Ok(true)
    }

    pub fn aggregate_profit(&self) -> Decimal {
        self.records.iter().map(|r| r.profit).sum()
    }

    /// Write the log as CSV, newest first.
    pub fn export_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        for rec in &self.records {
            wtr.serialize(RecordRow::from(rec))?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.records)?;
        self.store.set(KEY_POS_HISTORY, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn rec(id: &str, profit: Decimal) -> TransactionRecord {
        TransactionRecord {
            id: id.into(),
            usdt_amount: dec!(10),
            sell_rate: dec!(7.2),
            buy_rate: dec!(7.1),
            total_lyd: dec!(72),
            profit,
            counterparty_ref: String::new(),
            timestamp: "t".into(),
        }
    }

    #[test]
    fn rate_memory_defaults_and_skips_zero() {
        let mut store = MemoryStore::default();
        store.set(KEY_SELL_RATE, "garbage".into()).unwrap();
        let mut mem = RateMemory::load(&store);
        assert_eq!(mem, RateMemory::default());

        mem.update(&mut store, dec!(7.1), dec!(7.2), dec!(50)).unwrap();
        mem.update(&mut store, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO).unwrap();
        let reloaded = RateMemory::load(&store);
        assert_eq!(reloaded.buy_rate, dec!(7.1));
        assert_eq!(reloaded.sell_rate, dec!(7.2));
        assert_eq!(reloaded.usdt_qty, dec!(50));
    }

    #[test]
    fn append_prepends_and_sums() {
        let mut log = TransactionLog::load(MemoryStore::default());
        log.append(rec("a", dec!(1.5))).unwrap();
        log.append(rec("b", dec!(-0.5))).unwrap();
        assert_eq!(log.records()[0].id, "b");
        assert_eq!(log.aggregate_profit(), dec!(1.0));

        let reloaded = TransactionLog::load(log.store().clone());
        assert_eq!(reloaded.records(), log.records());
    }

    #[test]
    fn clear_needs_confirmation() {
        let mut log = TransactionLog::load(MemoryStore::default());
        log.append(rec("a", dec!(3))).unwrap();
        assert!(!log.clear_all(Confirmation::Declined).unwrap());
        assert_eq!(log.len(), 1);
        assert!(log.clear_all(true.into()).unwrap());
        assert!(log.is_empty());
        assert_eq!(log.aggregate_profit(), Decimal::ZERO);
        assert!(log.store().get(KEY_POS_HISTORY).is_none());
    }

    #[test]
    fn corrupt_history_loads_empty() {
        let mut store = MemoryStore::default();
        store.set(KEY_POS_HISTORY, "{not json".into()).unwrap();
        assert!(TransactionLog::load(store).is_empty());
    }

    #[test]
    fn csv_export_has_header_and_rows() {
        let mut log = TransactionLog::load(MemoryStore::default());
        log.append(rec("a", dec!(1))).unwrap();
        let mut buf = Vec::new();
        log.export_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("id,timestamp,usdt,sell_rate,buy_rate,total_lyd,profit,counterparty")
        );
        assert_eq!(lines.next(), Some("a,t,10.00,7.200,7.100,72.00,1.00,"));
    }
}
