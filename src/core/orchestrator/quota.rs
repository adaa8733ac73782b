use std::time::Duration;

use dashmap::DashMap;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::core::tts::ProviderKind;

/// Default quota window before an exhausted provider is tried again.
pub const DEFAULT_QUOTA_RESET: Duration = Duration::from_secs(60);

/// Quota flag for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderQuotaState {
    pub exhausted: bool,
    pub exhausted_at: Instant,
    pub reset_after: Duration,
}

impl ProviderQuotaState {
    /// Instant the provider becomes eligible again.
    pub fn available_at(&self) -> Instant {
        self.exhausted_at + self.reset_after
    }

    pub fn blocks_at(&self, now: Instant) -> bool {
        self.exhausted && now < self.available_at()
    }
}

/// Process-wide quota flags, created lazily on the first quota error.
///
/// Writes are idempotent; concurrent marks for the same provider keep the
/// last write.
#[derive(Debug)]
pub struct QuotaTracker {
    states: DashMap<ProviderKind, ProviderQuotaState>,
    reset_after: Duration,
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new(DEFAULT_QUOTA_RESET)
    }
}

impl QuotaTracker {
    pub fn new(reset_after: Duration) -> Self {
        Self {
            states: DashMap::new(),
            reset_after,
        }
    }

    pub fn reset_after(&self) -> Duration {
        self.reset_after
    }

    pub fn mark_exhausted(&self, kind: ProviderKind) {
        self.mark_exhausted_at(kind, Instant::now());
    }

    pub fn mark_exhausted_at(&self, kind: ProviderKind, at: Instant) {
        info!(
            provider = %kind,
            reset_after_secs = self.reset_after.as_secs(),
            "Provider quota exhausted"
        );
        self.states.insert(
            kind,
            ProviderQuotaState {
                exhausted: true,
                exhausted_at: at,
                reset_after: self.reset_after,
            },
        );
    }

    pub fn is_available(&self, kind: ProviderKind) -> bool {
        self.is_available_at(kind, Instant::now())
    }

    /// False while `now` falls inside the provider's quota window. An expired
    /// window clears the flag.
    pub fn is_available_at(&self, kind: ProviderKind, now: Instant) -> bool {
        let Some(state) = self.snapshot(kind) else {
            return true;
        };
        if state.blocks_at(now) {
            return false;
        }
        if self
            .states
            .remove_if(&kind, |_, s| s.exhausted_at == state.exhausted_at)
            .is_some()
        {
            debug!(provider = %kind, "Quota window elapsed");
        }
        true
    }

    pub fn snapshot(&self, kind: ProviderKind) -> Option<ProviderQuotaState> {
        self.states.get(&kind).map(|s| *s)
    }

    pub fn reset(&self, kind: ProviderKind) {
        self.states.remove(&kind);
    }
}
