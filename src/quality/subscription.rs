//! Token-keyed registry of quality-change callbacks
//!
//! Callbacks run synchronously, in subscription order. A callback that
//! panics is logged and skipped; the remaining subscribers still run.

use super::QualityTier;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Handle returned by `subscribe`, used to cancel the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionToken(u64);

type Callback = Box<dyn FnMut(QualityTier) + Send>;

/// Observer registry for tier transitions
#[derive(Default)]
pub struct SubscriptionHub {
    /// Tokens increase monotonically, so map order is subscription order
    subscribers: BTreeMap<SubscriptionToken, Callback>,
    next_token: u64,
}

impl SubscriptionHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionToken
    where
        F: FnMut(QualityTier) + Send + 'static,
    {
        let token = SubscriptionToken(self.next_token);
        self.next_token += 1;
        self.subscribers.insert(token, Box::new(callback));
        token
    }

    /// Remove exactly this registration. Unknown or already-removed tokens
    /// are a no-op; returns whether something was removed.
    pub fn unsubscribe(&mut self, token: SubscriptionToken) -> bool {
        self.subscribers.remove(&token).is_some()
    }

    /// Deliver `tier` to every subscriber
    pub fn notify(&mut self, tier: QualityTier) {
        for (token, callback) in self.subscribers.iter_mut() {
            if catch_unwind(AssertUnwindSafe(|| callback(tier))).is_err() {
                tracing::warn!(?token, %tier, "Quality subscriber panicked; continuing");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

impl std::fmt::Debug for SubscriptionHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("subscribers", &self.subscribers.len())
            .field("next_token", &self.next_token)
            .finish()
    }
}
