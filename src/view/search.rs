//! Search input throttling.
//!
//! Searches run at most once per interval. Keystrokes arriving sooner are
//! coalesced: only the latest text is kept and it runs when the interval
//! has elapsed. Time is passed in explicitly so callers and tests control
//! the clock.

use crate::utils::config::SEARCH_INTERVAL;
use std::time::{Duration, Instant};

/// Latest-wins search throttle
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    interval: Duration,
    last_run: Option<Instant>,
    pending: Option<(String, Instant)>,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(SEARCH_INTERVAL)
    }
}

impl SearchDebouncer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_run: None,
            pending: None,
        }
    }

    /// Offer new search text at `now`
    ///
    /// Returns the text when it may run immediately; otherwise it replaces
    /// whatever was pending and waits for [`poll`](Self::poll).
    pub fn submit(&mut self, text: impl Into<String>, now: Instant) -> Option<String> {
        let text = text.into();
        match self.last_run {
            Some(last) if now.duration_since(last) < self.interval => {
                let due = last + self.interval;
                self.pending = Some((text, due));
                None
            }
            _ => {
                self.pending = None;
                self.last_run = Some(now);
                Some(text)
            }
        }
    }

    /// Release the pending text once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, due)) if now >= *due => {
                let (text, _) = self.pending.take()?;
                self.last_run = Some(now);
                Some(text)
            }
            _ => None,
        }
    }

    /// When the pending search becomes due
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop any pending search
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
