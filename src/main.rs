//! Counter CLI. Figures and receipts go to STDOUT, logs to STDERR.
//!
//!   exchange-pos wallet 250 --print
//!   exchange-pos exchange --qty 100 --sell-total 725 --print receipt
//!   exchange-pos pos --usdt 50 --sell-rate 7.25 --ref BN-1

use anyhow::{Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use exchange_pos::engine::{PosSale, new_sale_id, now_stamp};
use exchange_pos::notify::LogBus;
use exchange_pos::printer::{PrintOutcome, PrintSpooler};
use exchange_pos::receipt::{TextRenderer, WriterSink, format_money, format_rate};
use exchange_pos::store::JsonFileStore;
use exchange_pos::{
    Config, ExchangeDesk, ProfitSession, RateMemory, Receipt, TransactionLog, TxKind, WalletQuote,
    YussorQuote,
};
use rust_decimal::Decimal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::FmtSubscriber;

type Spooler = PrintSpooler<WriterSink<Stdout>>;

fn decimal_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("N")
        .value_parser(value_parser!(Decimal))
        .help(help)
}

fn cli() -> Command {
    Command::new("exchange-pos")
        .about("Fee, rate and profit calculator with receipts")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("JSON config file"),
        )
        .arg(
            Arg::new("data")
                .long("data")
                .global(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Data file for rates and sales history"),
        )
        .arg(
            Arg::new("no-delay")
                .long("no-delay")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print receipts without the pacing delay"),
        )
        .subcommand(
            Command::new("wallet")
                .about("Wallet top-up: bank + wallet fees")
                .arg(Arg::new("amount").required(true).value_parser(value_parser!(Decimal)))
                .arg(Arg::new("print").long("print").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("yussor")
                .about("Yussor Pay: service fee, total rounded to .5 / 1")
                .arg(Arg::new("amount").required(true).value_parser(value_parser!(Decimal)))
                .arg(Arg::new("print").long("print").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("exchange")
                .about("USDT exchange: derive rates and totals")
                .arg(decimal_arg("qty", "USDT quantity (defaults to the last one)"))
                .arg(decimal_arg("buy-rate", "Buy rate").conflicts_with("buy-total"))
                .arg(decimal_arg("buy-total", "Total buy amount; back-computes the rate"))
                .arg(decimal_arg("sell-rate", "Sell rate").conflicts_with("sell-total"))
                .arg(decimal_arg("sell-total", "Total sell amount; back-computes the rate"))
                .arg(
                    Arg::new("print")
                        .long("print")
                        .value_parser(["daily", "receipt"])
                        .help("Print today's rate card or the customer receipt"),
                ),
        )
        .subcommand(
            Command::new("pos")
                .about("Complete a USDT sale, record it and print the receipt")
                .arg(decimal_arg("usdt", "USDT sold").required(true))
                .arg(decimal_arg("sell-rate", "Sell rate (defaults to the last one)"))
                .arg(decimal_arg("buy-rate", "Buy rate (defaults to the last one)"))
                .arg(Arg::new("ref").long("ref").value_name("ID").help("Buyer's account reference")),
        )
        .subcommand(
            Command::new("profit")
                .about("Profit analysis with a suggested sell rate")
                .arg(decimal_arg("buy-rate", "Buy rate (defaults to the last one)"))
                .arg(decimal_arg("sell-rate", "Sell rate (defaults to the last one)"))
                .arg(decimal_arg("qty", "USDT quantity (defaults to the last one)"))
                .arg(
                    Arg::new("apply-tip")
                        .long("apply-tip")
                        .action(ArgAction::SetTrue)
                        .help("Adopt the suggested sell rate"),
                ),
        )
        .subcommand(
            Command::new("history")
                .about("Show recorded POS sales")
                .arg(Arg::new("csv").long("csv").action(ArgAction::SetTrue)),
        )
        .subcommand(
            Command::new("clear-history")
                .about("Delete every recorded sale (irreversible)")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Confirm the deletion"),
                ),
        )
}

fn main() -> Result<()> {
    // ---------------------------------------------------------------- logging
    // logs → stderr, receipts and figures → stdout
    let subscriber = FmtSubscriber::builder()
        .with_target(false)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let matches = cli().get_matches();

    // ---------------------------------------------------------------- config
    let mut cfg = match matches.get_one::<PathBuf>("config") {
        Some(p) => Config::from_file(p)?,
        None => Config::default(),
    };
    if let Some(p) = matches.get_one::<PathBuf>("data") {
        cfg.data_file = p.clone();
    }
    debug!(?cfg, "config loaded");

    let mut log = TransactionLog::load(JsonFileStore::open(&cfg.data_file)?);
    let mut memory = RateMemory::load(log.store());

    let sink = WriterSink::new(TextRenderer::new(cfg.receipt_width), io::stdout());
    let mut spooler = PrintSpooler::new(sink);
    if matches.get_flag("no-delay") {
        cfg.print_delay_ms = 0;
        cfg.exchange_print_delay_ms = 0;
    }

    match matches.subcommand() {
        Some(("wallet", sub)) => wallet(sub, &cfg, &mut spooler),
        Some(("yussor", sub)) => yussor(sub, &cfg, &mut spooler),
        Some(("exchange", sub)) => exchange(sub, &cfg, &mut log, &mut memory, &mut spooler),
        Some(("pos", sub)) => pos(sub, &cfg, &mut log, &memory, &mut spooler),
        Some(("profit", sub)) => profit(sub, &log, &memory),
        Some(("history", sub)) => history(sub, &log),
        Some(("clear-history", sub)) => {
            if !sub.get_flag("yes") {
                eprintln!("Refusing to clear {} sales without --yes", log.len());
            }
            if log.clear_all(sub.get_flag("yes").into())? {
                println!("Sales history cleared");
            }
            Ok(())
        }
        _ => unreachable!("subcommand_required"),
    }
}

fn print_receipt(
    spooler: &mut Spooler,
    receipt: Option<Receipt>,
    delay: Duration,
    done: &str,
) -> Result<()> {
    let Some(receipt) = receipt else {
        bail!("nothing to print: amount and rate must be positive");
    };
    if spooler.submit(receipt, delay, done, Instant::now(), &mut LogBus) == PrintOutcome::Busy {
        bail!("printer busy");
    }
    // the CLI is its own event loop: wait out the pacing delay, then fire
    loop {
        let now = Instant::now();
        if spooler.poll(now, &mut LogBus)? {
            return Ok(());
        }
        match spooler.time_left(now) {
            Some(left) => thread::sleep(left),
            None => return Ok(()),
        }
    }
}

fn wallet(m: &ArgMatches, cfg: &Config, spooler: &mut Spooler) -> Result<()> {
    let amount = *m.get_one::<Decimal>("amount").unwrap_or(&Decimal::ZERO);
    let q = WalletQuote::compute(amount, &cfg.schedule(TxKind::Wallet));
    println!("Bank fee:     {}", format_money(q.bank_fee));
    println!("Wallet fee:   {}", format_money(q.wallet_fee));
    println!("Total charge: {}", format_money(q.total_charge));
    if m.get_flag("print") {
        print_receipt(spooler, q.receipt(&now_stamp()), cfg.print_delay(TxKind::Wallet), "Wallet receipt printed")?;
    }
    Ok(())
}

fn yussor(m: &ArgMatches, cfg: &Config, spooler: &mut Spooler) -> Result<()> {
    let amount = *m.get_one::<Decimal>("amount").unwrap_or(&Decimal::ZERO);
    let q = YussorQuote::compute(amount, &cfg.schedule(TxKind::YussorPay));
    println!("Total fee:      {}", format_money(q.final_fee));
    println!("Rounding diff: +{}", format_money(q.rounding_diff));
    println!("Total due:      {}", format_money(q.rounded_total));
    if m.get_flag("print") {
        print_receipt(spooler, q.receipt(&now_stamp()), cfg.print_delay(TxKind::YussorPay), "Yussor Pay receipt printed")?;
    }
    Ok(())
}

fn exchange(
    m: &ArgMatches,
    cfg: &Config,
    log: &mut TransactionLog<JsonFileStore>,
    memory: &mut RateMemory,
    spooler: &mut Spooler,
) -> Result<()> {
    let qty = m.get_one::<Decimal>("qty").copied().unwrap_or(memory.usdt_qty);
    let mut desk = ExchangeDesk::new(qty, memory.buy_rate, memory.sell_rate);
    if let Some(r) = m.get_one::<Decimal>("buy-rate") {
        desk.buy.set_rate(*r);
    }
    if let Some(t) = m.get_one::<Decimal>("buy-total") {
        desk.buy.set_total(*t);
    }
    if let Some(r) = m.get_one::<Decimal>("sell-rate") {
        desk.sell.set_rate(*r);
    }
    if let Some(t) = m.get_one::<Decimal>("sell-total") {
        desk.sell.set_total(*t);
    }
    memory.update(log.store_mut(), desk.buy.rate(), desk.sell.rate(), desk.qty())?;

    println!("Quantity:   {}", format_money(desk.qty()));
    println!("Buy rate:   {} ({:?})", format_rate(desk.buy.rate()), desk.buy.provenance());
    println!("Sell rate:  {} ({:?})", format_rate(desk.sell.rate()), desk.sell.provenance());
    println!("Total buy:  {}", format_money(desk.buy.total()));
    println!("Total sell: {}", format_money(desk.sell.total()));

    let delay = cfg.print_delay(TxKind::Exchange);
    match m.get_one::<String>("print").map(String::as_str) {
        Some("daily") => print_receipt(spooler, desk.daily_rate_receipt(&now_stamp()), delay, "Daily rate printed"),
        Some("receipt") => print_receipt(spooler, desk.customer_receipt(&now_stamp()), delay, "Customer receipt printed"),
        _ => Ok(()),
    }
}

fn pos(
    m: &ArgMatches,
    cfg: &Config,
    log: &mut TransactionLog<JsonFileStore>,
    memory: &RateMemory,
    spooler: &mut Spooler,
) -> Result<()> {
    let sale = PosSale {
        usdt: m.get_one::<Decimal>("usdt").copied().unwrap_or_default(),
        sell_rate: m.get_one::<Decimal>("sell-rate").copied().unwrap_or(memory.sell_rate),
        buy_rate: m.get_one::<Decimal>("buy-rate").copied().unwrap_or(memory.buy_rate),
        counterparty_ref: m.get_one::<String>("ref").cloned().unwrap_or_default(),
    };
    let Some((record, receipt)) = sale.complete(new_sale_id(), now_stamp()) else {
        bail!("sale needs a positive USDT amount and sell rate");
    };
    log.append(record)?;
    info!(total = %sale.total_lyd(), "sale completed");
    print_receipt(spooler, Some(receipt), cfg.print_delay(TxKind::Pos), "Sale recorded and receipt printed")
}

fn profit(m: &ArgMatches, log: &TransactionLog<JsonFileStore>, memory: &RateMemory) -> Result<()> {
    let mut session = ProfitSession::new(
        m.get_one::<Decimal>("buy-rate").copied().unwrap_or(memory.buy_rate),
        m.get_one::<Decimal>("sell-rate").copied().unwrap_or(memory.sell_rate),
        m.get_one::<Decimal>("qty").copied().unwrap_or(memory.usdt_qty),
    );
    if m.get_flag("apply-tip") {
        if let Some(tip) = session.apply_tip() {
            println!("Applied suggested sell rate {}", format_rate(tip.rate));
        }
    }
    println!("Profit: {} ({})", format_money(session.profit()), session.status().label());
    if let Some(tip) = session.visible_tip() {
        println!(
            "Tip: sell at {} (+{}) for a profit of {}{}",
            format_rate(tip.rate),
            format_rate(tip.increase),
            format_money(tip.profit),
            if session.tip_applied() { " [applied]" } else { "" }
        );
    }
    println!("Recorded sales: {}, total profit {}", log.len(), format_money(log.aggregate_profit()));
    Ok(())
}

fn history(m: &ArgMatches, log: &TransactionLog<JsonFileStore>) -> Result<()> {
    if m.get_flag("csv") {
        return log.export_csv(io::stdout());
    }
    for rec in log.records() {
        println!(
            "{}  {} USDT @ {}  = {} LYD  profit {}  {}",
            rec.timestamp,
            format_money(rec.usdt_amount),
            format_rate(rec.sell_rate),
            format_money(rec.total_lyd),
            format_money(rec.profit),
            rec.counterparty_ref
        );
    }
    println!("Total profit: {}", format_money(log.aggregate_profit()));
    Ok(())
}
