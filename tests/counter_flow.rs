use exchange_pos::engine::PosSale;
use exchange_pos::notify::{CollectingBus, Severity};
use exchange_pos::printer::{PrintOutcome, PrintSpooler};
use exchange_pos::receipt::{TextRenderer, WriterSink};
use exchange_pos::store::{KEY_POS_HISTORY, KeyValueStore};
use exchange_pos::{Confirmation, JsonFileStore, RateMemory, TransactionLog};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::{Duration, Instant};

fn sale(usdt: Decimal, sell: Decimal, buy: Decimal) -> PosSale {
    PosSale {
        usdt,
        sell_rate: sell,
        buy_rate: buy,
        counterparty_ref: "BN-77".into(),
    }
}

#[test]
fn sales_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    {
        let mut log = TransactionLog::load(JsonFileStore::open(&path).unwrap());
        let mut memory = RateMemory::load(log.store());
        memory
            .update(log.store_mut(), dec!(7.1), dec!(7.25), dec!(100))
            .unwrap();

        for (i, usdt) in [dec!(10), dec!(40)].into_iter().enumerate() {
            let (rec, _) = sale(usdt, dec!(7.25), dec!(7.1))
                .complete(format!("s{i}"), "2026-10-19 10:00:00".into())
                .unwrap();
            log.append(rec).unwrap();
        }
    }

    let log = TransactionLog::load(JsonFileStore::open(&path).unwrap());
    assert_eq!(log.len(), 2);
    assert_eq!(log.records()[0].id, "s1");
    // (7.25 − 7.1) × 50
    assert_eq!(log.aggregate_profit(), dec!(7.5));

    let memory = RateMemory::load(log.store());
    assert_eq!(memory.sell_rate, dec!(7.25));
    assert_eq!(memory.usdt_qty, dec!(100));
}

#[test]
fn clear_all_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");

    let mut log = TransactionLog::load(JsonFileStore::open(&path).unwrap());
    let (rec, _) = sale(dec!(5), dec!(7.3), dec!(7.2))
        .complete("only".into(), "t".into())
        .unwrap();
    log.append(rec).unwrap();
    assert!(log.clear_all(Confirmation::Confirmed).unwrap());

    let reopened = JsonFileStore::open(&path).unwrap();
    assert!(reopened.get(KEY_POS_HISTORY).is_none());
    assert_eq!(TransactionLog::load(reopened).aggregate_profit(), Decimal::ZERO);
}

#[test]
fn garbage_data_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data.json");
    std::fs::write(&path, "not json at all").unwrap();

    let log = TransactionLog::load(JsonFileStore::open(&path).unwrap());
    assert!(log.is_empty());
    assert_eq!(RateMemory::load(log.store()), RateMemory::default());
}

#[test]
fn pos_receipt_goes_through_spooler() {
    let (_, receipt) = sale(dec!(100), dec!(7.25), dec!(7.1))
        .complete("r".into(), "2026-10-19 12:30:00".into())
        .unwrap();

    let sink = WriterSink::new(TextRenderer::default(), Vec::new());
    let mut spooler = PrintSpooler::new(sink);
    let mut bus = CollectingBus::default();
    let t0 = Instant::now();
    let delay = Duration::from_millis(800);

    let outcome = spooler.submit(receipt.clone(), delay, "Sale recorded", t0, &mut bus);
    assert_eq!(outcome, PrintOutcome::Queued);
    // a double-click before the first print lands is turned away
    let again = spooler.submit(receipt, delay, "Sale recorded", t0 + Duration::from_millis(50), &mut bus);
    assert_eq!(again, PrintOutcome::Busy);
    assert_eq!(bus.notes[0].severity, Severity::Info);

    assert!(spooler.poll(t0 + delay, &mut bus).unwrap());
    assert_eq!(bus.notes[1].severity, Severity::Success);
    assert_eq!(bus.notes.len(), 2);

    let text = String::from_utf8(spooler.into_sink().into_inner()).unwrap();
    assert!(text.contains("725.00"));
    assert!(text.contains("BN-77"));
    assert!(!text.contains("7.100"));
    assert!(!text.contains("15.00"));
}
