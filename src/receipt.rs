//! Receipt payloads and a plain-text renderer for 58 mm thermal paper.

use crate::errors::Result;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::Write;

pub const SHOP_NAME: &str = "Al-Masdaqiya Electronics";
/// Characters per line on 58 mm paper.
pub const DEFAULT_WIDTH: usize = 32;
/// Printed when a POS sale has no counterparty reference.
pub const MISSING_REF: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub net_amount: Decimal,
    pub total_charge: Decimal,
    pub bank_fee: Decimal,
    pub wallet_fee: Decimal,
    /// Carried for exchange receipts but never printed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usdt: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_rate: Option<Decimal>,
    pub date: String,
}

impl TransactionReceipt {
    /// Yussor Pay receipts carry a single service fee and no USDT.
    fn is_service_only(&self) -> bool {
        self.wallet_fee.is_zero() && self.usdt.is_none_or(|u| u.is_zero())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRateReceipt {
    pub sell_rate: Decimal,
    pub date: String,
}

/// Customer copy of a USDT sale. Buy rate and profit are intentionally
/// absent from this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosReceipt {
    pub usdt: Decimal,
    pub sell_rate: Decimal,
    pub counterparty_ref: String,
    pub total_sell: Decimal,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Receipt {
    Transaction(TransactionReceipt),
    DailyRate(DailyRateReceipt),
    UsdtPos(PosReceipt),
}

/// Consumer of finished receipts (printer, file, test buffer…).
pub trait ReceiptSink {
    fn emit(&mut self, receipt: &Receipt) -> Result<()>;
}

/// Two decimals with thousands separators: `12,345.60`.
pub fn format_money(d: Decimal) -> String {
    let s = format!("{:.2}", d.round_dp(2));
    let (sign, digits) = s.strip_prefix('-').map_or(("", s.as_str()), |r| ("-", r));
    let (int, frac) = digits.split_once('.').unwrap_or((digits, "00"));
    let mut grouped = String::with_capacity(int.len() + int.len() / 3);
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{sign}{grouped}.{frac}")
}

pub fn format_rate(d: Decimal) -> String {
    format!("{:.3}", d.round_dp(3))
}

/// Renders receipts as fixed-width text.
#[derive(Debug, Clone)]
pub struct TextRenderer {
    width: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_WIDTH)
    }
}

impl TextRenderer {
    pub fn new(width: usize) -> Self {
        Self { width: width.max(16) }
    }

    pub fn render(&self, receipt: &Receipt) -> String {
        let mut out = Vec::new();
        match receipt {
            Receipt::Transaction(t) => {
                self.header(&mut out, "Certified payment receipt", &t.date);
                out.push(self.pair("Amount received:", &format!("{} LYD", format_money(t.net_amount))));
                out.push(self.rule('-'));
                out.push(self.center("TOTAL TO PAY"));
                out.push(self.center(&format!("{} LYD", format_money(t.total_charge))));
                out.push(self.rule('-'));
                let fee_title = if t.is_service_only() { "Service fee:" } else { "Bank fee:" };
                out.push(self.pair(fee_title, &format!("{} LYD", format_money(t.bank_fee))));
                if t.wallet_fee > Decimal::ZERO {
                    out.push(self.pair("Wallet fee:", &format!("{} LYD", format_money(t.wallet_fee))));
                }
                self.footer(&mut out, "Thank you for your business");
            }
            Receipt::UsdtPos(p) => {
                self.header(&mut out, "USDT sale receipt", &p.date);
                out.push(self.pair("USDT amount:", &format_money(p.usdt)));
                out.push(self.pair("Exchange rate:", &format_rate(p.sell_rate)));
                out.push(self.pair("Recipient:", &p.counterparty_ref));
                out.push(self.rule('-'));
                out.push(self.center("TOTAL PAID (LYD)"));
                out.push(self.center(&format_money(p.total_sell)));
                self.footer(&mut out, "Documented sale");
            }
            Receipt::DailyRate(d) => {
                self.header(&mut out, "Today's rate", &d.date);
                out.push(self.center("Current sell rate:"));
                out.push(self.center(&format_rate(d.sell_rate)));
                out.push(self.center("Libyan dinar"));
                out.push(self.rule('-'));
            }
        }
        let mut text = out.join("\n");
        text.push('\n');
        text
    }

    fn header(&self, out: &mut Vec<String>, title: &str, date: &str) {
        out.push(self.center(SHOP_NAME));
        out.push(self.center(title));
        out.push(self.rule('='));
        out.push(self.center(&format!("Date: {date}")));
        out.push(self.rule('='));
    }

    fn footer(&self, out: &mut Vec<String>, text: &str) {
        out.push(self.rule('='));
        out.push(self.center(text));
    }

    fn rule(&self, ch: char) -> String {
        std::iter::repeat_n(ch, self.width).collect()
    }

    fn center(&self, s: &str) -> String {
        let len = s.chars().count();
        if len >= self.width {
            return s.to_string();
        }
        let pad = (self.width - len) / 2;
        format!("{}{}", " ".repeat(pad), s)
    }

    fn pair(&self, left: &str, right: &str) -> String {
        let used = left.chars().count() + right.chars().count();
        let gap = self.width.saturating_sub(used).max(1);
        format!("{left}{}{right}", " ".repeat(gap))
    }
}

/// Renders into any writer (stdout, a file, a buffer).
pub struct WriterSink<W: Write> {
    renderer: TextRenderer,
    out: W,
}

impl<W: Write> WriterSink<W> {
    pub fn new(renderer: TextRenderer, out: W) -> Self {
        Self { renderer, out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ReceiptSink for WriterSink<W> {
    fn emit(&mut self, receipt: &Receipt) -> Result<()> {
        self.out.write_all(self.renderer.render(receipt).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn money_grouping() {
        assert_eq!(format_money(dec!(0)), "0.00");
        assert_eq!(format_money(dec!(1234567.891)), "1,234,567.89");
        assert_eq!(format_money(dec!(-1500)), "-1,500.00");
        assert_eq!(format_money(dec!(999.5)), "999.50");
    }

    #[test]
    fn pos_receipt_hides_cost_side() {
        let r = Receipt::UsdtPos(PosReceipt {
            usdt: dec!(100),
            sell_rate: dec!(7.25),
            counterparty_ref: "BN-1".into(),
            total_sell: dec!(725),
            date: "2026-10-19 12:00".into(),
        });
        let text = TextRenderer::default().render(&r);
        assert!(text.contains("7.250"));
        assert!(text.contains("725.00"));
        assert!(text.contains("BN-1"));
        assert!(!text.to_lowercase().contains("profit"));
        assert!(!text.to_lowercase().contains("buy"));
    }

    #[test]
    fn service_fee_label_for_yussor() {
        let mut t = TransactionReceipt {
            net_amount: dec!(23),
            total_charge: dec!(24.5),
            bank_fee: dec!(1.5),
            wallet_fee: Decimal::ZERO,
            usdt: None,
            sell_rate: None,
            date: "d".into(),
        };
        let text = TextRenderer::default().render(&Receipt::Transaction(t.clone()));
        assert!(text.contains("Service fee:"));
        assert!(!text.contains("Wallet fee:"));

        t.wallet_fee = dec!(0.23);
        let text = TextRenderer::default().render(&Receipt::Transaction(t));
        assert!(text.contains("Bank fee:"));
        assert!(text.contains("Wallet fee:"));
    }

    #[test]
    fn tagged_json_shape() {
        let r = Receipt::DailyRate(DailyRateReceipt {
            sell_rate: dec!(7.1),
            date: "d".into(),
        });
        let v = serde_json::to_value(&r).unwrap();
        assert_eq!(v["type"], "DAILY_RATE");
        assert_eq!(v["data"]["date"], "d");
    }

    #[test]
    fn writer_sink_writes_rendered_text() {
        let mut sink = WriterSink::new(TextRenderer::new(32), Vec::new());
        let r = Receipt::DailyRate(DailyRateReceipt {
            sell_rate: dec!(7.1),
            date: "today".into(),
        });
        sink.emit(&r).unwrap();
        let out = String::from_utf8(sink.into_inner()).unwrap();
        assert!(out.contains("7.100"));
        assert!(out.lines().all(|l| l.chars().count() <= 32));
    }
}
