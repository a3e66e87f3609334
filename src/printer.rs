//! Paced printing with a busy guard.
//!
//! A submitted receipt waits a short, fixed delay before it reaches the
//! sink; completion is announced as a success notification. The spooler
//! never sleeps itself: the caller's loop drives it with [`PrintSpooler::poll`].
//! While one print is pending further submissions are rejected, not queued.

use crate::errors::Result;
use crate::notify::{Notification, NotificationBus};
use crate::receipt::{Receipt, ReceiptSink};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Delay used by the exchange counter prints.
pub const EXCHANGE_PRINT_DELAY: Duration = Duration::from_millis(600);
/// Delay used by wallet, Yussor Pay and POS prints.
pub const DEFAULT_PRINT_DELAY: Duration = Duration::from_millis(800);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrintOutcome {
    /// Accepted; it will print once due.
    Queued,
    /// Another print is still pending; this one was dropped.
    Busy,
}

#[derive(Debug)]
struct PendingPrint {
    receipt: Receipt,
    due: Instant,
    done: String,
}

pub struct PrintSpooler<K: ReceiptSink> {
    sink: K,
    pending: Option<PendingPrint>,
}

impl<K: ReceiptSink> PrintSpooler<K> {
    pub fn new(sink: K) -> Self {
        Self { sink, pending: None }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Schedule `receipt` to print `delay` after `now`, announcing `done`
    /// when it has.
    pub fn submit<B: NotificationBus + ?Sized>(
        &mut self,
        receipt: Receipt,
        delay: Duration,
        done: &str,
        now: Instant,
        bus: &mut B,
    ) -> PrintOutcome {
        if self.pending.is_some() {
            warn!("print rejected: printer busy");
            bus.notify(Notification::info("Printer is busy, please wait"));
            return PrintOutcome::Busy;
        }
        debug!(delay_ms = delay.as_millis() as u64, "print queued");
        self.pending = Some(PendingPrint {
            receipt,
            due: now + delay,
            done: done.to_string(),
        });
        PrintOutcome::Queued
    }

    /// Time until the pending print is due; `None` when idle.
    pub fn time_left(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|p| p.due.saturating_duration_since(now))
    }

    /// Print the pending receipt if it is due. Returns whether it printed.
    pub fn poll<B: NotificationBus + ?Sized>(&mut self, now: Instant, bus: &mut B) -> Result<bool> {
        let due = self.pending.as_ref().is_some_and(|p| p.due <= now);
        if due { self.fire(bus) } else { Ok(false) }
    }

    /// Print the pending receipt right away, ignoring its delay.
    pub fn flush<B: NotificationBus + ?Sized>(&mut self, bus: &mut B) -> Result<bool> {
        self.fire(bus)
    }

    fn fire<B: NotificationBus + ?Sized>(&mut self, bus: &mut B) -> Result<bool> {
        let Some(job) = self.pending.take() else {
            return Ok(false);
        };
        if let Err(e) = self.sink.emit(&job.receipt) {
            bus.notify(Notification::error("Printing failed"));
            return Err(e);
        }
        info!("receipt printed");
        bus.notify(Notification::success(job.done));
        Ok(true)
    }
}
