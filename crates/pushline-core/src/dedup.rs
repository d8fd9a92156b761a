//! Message-id deduplication
//!
//! A given message id may reach the pipeline twice (foreground listener and
//! background handler, or a transport redelivery). The ledger remembers recently
//! handled ids so at most one presentation happens per id within this process.
//! Nothing here survives a restart.

use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

use crate::types::MessageId;

/// Default number of remembered ids
pub const DEFAULT_LEDGER_CAPACITY: usize = 512;

// ----------------------------------------------------------------------------
// Statistics
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStats {
    /// Ids offered to the ledger
    pub messages_seen: u64,
    /// Ids rejected as already handled
    pub duplicates_detected: u64,
    /// Ids forgotten to make room
    pub evictions: u64,
}

impl LedgerStats {
    pub fn duplicate_rate(&self) -> f64 {
        if self.messages_seen == 0 {
            0.0
        } else {
            (self.duplicates_detected as f64) / (self.messages_seen as f64)
        }
    }
}

// ----------------------------------------------------------------------------
// Delivery Ledger
// ----------------------------------------------------------------------------

/// Bounded set of handled message ids with FIFO eviction
#[derive(Debug, Clone)]
pub struct DeliveryLedger {
    seen: HashSet<MessageId>,
    order: VecDeque<MessageId>,
    capacity: usize,
    stats: LedgerStats,
}

impl DeliveryLedger {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            seen: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity,
            stats: LedgerStats::default(),
        }
    }

    /// Record `id`. Returns `true` if it was not handled before.
    pub fn check_and_add(&mut self, id: &MessageId) -> bool {
        self.stats.messages_seen += 1;

        if self.seen.contains(id) {
            self.stats.duplicates_detected += 1;
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
                self.stats.evictions += 1;
            }
        }

        self.seen.insert(id.clone());
        self.order.push_back(id.clone());
        true
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn stats(&self) -> &LedgerStats {
        &self.stats
    }
}

impl Default for DeliveryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_CAPACITY)
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_detection() {
        let mut ledger = DeliveryLedger::new(8);
        let id = MessageId::new("m-1");

        assert!(ledger.check_and_add(&id));
        assert!(!ledger.check_and_add(&id));
        assert!(ledger.contains(&id));
        assert_eq!(ledger.stats().duplicates_detected, 1);
        assert_eq!(ledger.stats().duplicate_rate(), 0.5);
    }

    #[test]
    fn test_eviction_is_fifo() {
        let mut ledger = DeliveryLedger::new(2);
        let a = MessageId::new("a");
        let b = MessageId::new("b");
        let c = MessageId::new("c");

        assert!(ledger.check_and_add(&a));
        assert!(ledger.check_and_add(&b));
        assert!(ledger.check_and_add(&c));

        assert_eq!(ledger.len(), 2);
        assert!(!ledger.contains(&a));
        assert!(ledger.contains(&b));
        assert_eq!(ledger.stats().evictions, 1);

        // An evicted id counts as new again
        assert!(ledger.check_and_add(&a));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut ledger = DeliveryLedger::new(0);
        assert!(ledger.check_and_add(&MessageId::new("x")));
        assert_eq!(ledger.len(), 1);
    }
}
