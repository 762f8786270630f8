//! Bounded retention of emitted opportunities

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use crate::types::Opportunity;

/// Opportunities in arrival order. Pruned by age on every sweep.
pub struct OpportunityStore {
    retention: Duration,
    entries: VecDeque<Opportunity>,
}

impl OpportunityStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            retention,
            entries: VecDeque::new(),
        }
    }

    pub fn record(&mut self, opportunity: Opportunity) {
        self.entries.push_back(opportunity);
    }

    /// Removes opportunities observed more than `retention` before `now`.
    pub fn prune(&mut self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        let retention = self.retention;
        self.entries
            .retain(|opp| now.signed_duration_since(opp.observed_at) <= retention);
        before - self.entries.len()
    }

    /// Most recent first.
    pub fn recent(&self, n: usize) -> Vec<&Opportunity> {
        self.entries.iter().rev().take(n).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
