use std::collections::HashMap;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::{Instant, sleep_until};
use tracing::trace;

use crate::core::tts::ProviderKind;

/// Minimum spacing between calls to the same provider.
///
/// A fixed interval, not a token bucket: each caller reserves the next free
/// slot, so concurrent callers queue up `interval` apart.
#[derive(Debug, Default)]
pub struct RateLimiter {
    intervals: HashMap<ProviderKind, Duration>,
    next_slot: Mutex<HashMap<ProviderKind, Instant>>,
}

impl RateLimiter {
    pub fn new(intervals: HashMap<ProviderKind, Duration>) -> Self {
        Self {
            intervals,
            next_slot: Mutex::new(HashMap::new()),
        }
    }

    pub fn interval(&self, kind: ProviderKind) -> Duration {
        self.intervals.get(&kind).copied().unwrap_or_default()
    }

    /// Reserve a call slot for `kind`, returning when it arrives.
    ///
    /// Dropping the future before the slot arrives hands the slot back, unless
    /// a later caller has already queued behind it.
    pub async fn acquire(&self, kind: ProviderKind) {
        let interval = self.interval(kind);
        if interval.is_zero() {
            return;
        }

        let now = Instant::now();
        let (slot, reservation) = {
            let mut slots = self.next_slot.lock();
            let previous = slots.get(&kind).copied();
            let slot = previous.map_or(now, |next| next.max(now));
            slots.insert(kind, slot + interval);
            (
                slot,
                SlotReservation {
                    limiter: self,
                    kind,
                    previous,
                    reserved_next: slot + interval,
                },
            )
        };

        if slot > now {
            trace!(provider = %kind, wait_ms = (slot - now).as_millis() as u64, "Rate limit wait");
            sleep_until(slot).await;
        }
        reservation.commit();
    }
}

/// Rolls a reservation back if the waiting caller goes away.
struct SlotReservation<'a> {
    limiter: &'a RateLimiter,
    kind: ProviderKind,
    previous: Option<Instant>,
    reserved_next: Instant,
}

impl SlotReservation<'_> {
    fn commit(self) {
        std::mem::forget(self);
    }
}

impl Drop for SlotReservation<'_> {
    fn drop(&mut self) {
        let mut slots = self.limiter.next_slot.lock();
        if slots.get(&self.kind) != Some(&self.reserved_next) {
            return;
        }
        match self.previous {
            Some(previous) => slots.insert(self.kind, previous),
            None => slots.remove(&self.kind),
        };
        trace!(provider = %self.kind, "Released unused rate limit slot");
    }
}
