//! Calculation core for an exchange counter: wallet top-ups, Yussor Pay,
//! USDT exchange and point-of-sale, and profit analysis, plus receipts and
//! the small persistence layer behind them.

pub mod config;
pub mod engine;
pub mod errors;
pub mod fees;
pub mod models;
pub mod notify;
pub mod printer;
pub mod profit;
pub mod rate;
pub mod receipt;
pub mod rounding;
pub mod store;

pub use config::Config;
pub use engine::{ExchangeDesk, PosSale, WalletQuote, YussorQuote};
pub use fees::{FeeSchedule, apply_fees};
pub use models::{FeeEntry, Provenance, TransactionRecord, TxKind};
pub use profit::{ProfitSession, ProfitStatus, SmartTip};
pub use rate::RateDerivation;
pub use receipt::Receipt;
pub use rounding::{RoundingPolicy, RoundingRule};
pub use store::{Confirmation, JsonFileStore, RateMemory, TransactionLog};
