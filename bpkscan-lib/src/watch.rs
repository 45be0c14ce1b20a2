use crate::dom::dom_tree::Mutation;
use std::time::{Duration, Instant};

/// Coalesces "something changed" signals into at most one pending re-scan.
///
/// The first signal arms a timer for `settle_delay`. Signals arriving while it
/// is armed are absorbed without moving the deadline. The caller supplies the
/// current time, which keeps the watcher deterministic under test.
#[derive(Debug, Clone)]
pub struct ChangeWatcher {
    settle_delay: Duration,
    armed_at: Option<Instant>,
    coalesced: u32,
}

impl ChangeWatcher {
    pub fn new(settle_delay: Duration) -> Self {
        ChangeWatcher {
            settle_delay,
            armed_at: None,
            coalesced: 0,
        }
    }

    /// Records a change. Returns true if this signal armed the timer.
    pub fn signal(&mut self, now: Instant) -> bool {
        self.coalesced += 1;
        if self.armed_at.is_some() {
            return false;
        }
        self.armed_at = Some(now);
        true
    }

    /// Signals once if `mutations` contains a child-list change.
    ///
    /// Attribute changes, including inline styles written by remediation, are ignored.
    pub fn observe(&mut self, mutations: &[Mutation], now: Instant) -> bool {
        let structural = mutations
            .iter()
            .any(|mutation| matches!(mutation, Mutation::ChildList { .. }));
        structural && self.signal(now)
    }

    /// Returns true exactly once per armed timer, when its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline() {
            Some(deadline) if now >= deadline => {
                log::debug!("change watcher fired after {} signal(s)", self.coalesced);
                self.armed_at = None;
                self.coalesced = 0;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.armed_at.map(|armed_at| armed_at + self.settle_delay)
    }

    pub fn is_pending(&self) -> bool {
        self.armed_at.is_some()
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }
}
