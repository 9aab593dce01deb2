//! Stale search response fencing.
//!
//! Each client tags its searches with an increasing sequence number (or
//! lets the fence assign one). A response may only be delivered while no
//! newer search from the same client has started.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use uuid::Uuid;

/// Entries untouched for this long are dropped when the map grows large
const IDLE_TTL: Duration = Duration::from_secs(15 * 60);
const PRUNE_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    pub client: Uuid,
    pub seq: u64,
}

#[derive(Debug, Clone, Copy)]
struct Latest {
    seq: u64,
    touched: Instant,
}

#[derive(Clone, Default)]
pub struct SearchFence {
    latest: Arc<Mutex<HashMap<Uuid, Latest>>>,
}

impl SearchFence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the start of a search.
    ///
    /// Without an explicit sequence the next one for this client is used.
    pub fn begin(&self, client: Uuid, seq: Option<u64>) -> SearchTicket {
        let mut latest = self.latest.lock();

        if latest.len() > PRUNE_THRESHOLD {
            latest.retain(|_, entry| entry.touched.elapsed() < IDLE_TTL);
        }

        let now = Instant::now();
        let entry = latest.entry(client).or_insert(Latest { seq: 0, touched: now });
        let seq = seq.unwrap_or(entry.seq.saturating_add(1));
        if seq > entry.seq {
            entry.seq = seq;
        }
        entry.touched = now;

        SearchTicket { client, seq }
    }

    /// True while no search newer than `ticket` has begun for its client
    pub fn is_current(&self, ticket: &SearchTicket) -> bool {
        self.latest
            .lock()
            .get(&ticket.client)
            .map_or(true, |entry| ticket.seq >= entry.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newer_search_supersedes_older() {
        let fence = SearchFence::new();
        let client = Uuid::new_v4();

        let slow = fence.begin(client, Some(1));
        let fast = fence.begin(client, Some(2));

        assert!(fence.is_current(&fast));
        assert!(!fence.is_current(&slow));
    }

    #[test]
    fn late_arriving_old_sequence_stays_stale() {
        let fence = SearchFence::new();
        let client = Uuid::new_v4();

        let newer = fence.begin(client, Some(5));
        let older = fence.begin(client, Some(3));

        assert!(fence.is_current(&newer));
        assert!(!fence.is_current(&older));
    }

    #[test]
    fn assigned_sequences_increase() {
        let fence = SearchFence::new();
        let client = Uuid::new_v4();

        let a = fence.begin(client, None);
        let b = fence.begin(client, None);
        assert!(b.seq > a.seq);
        assert!(!fence.is_current(&a));
        assert!(fence.is_current(&b));
    }

    #[test]
    fn clients_are_independent() {
        let fence = SearchFence::new();
        let a = fence.begin(Uuid::new_v4(), Some(1));
        let _b = fence.begin(Uuid::new_v4(), Some(9));
        assert!(fence.is_current(&a));
    }

    #[test]
    fn assigned_sequence_saturates_at_max() {
        let fence = SearchFence::new();
        let client = Uuid::new_v4();

        let max = fence.begin(client, Some(u64::MAX));
        let next = fence.begin(client, None);

        assert_eq!(next.seq, u64::MAX);
        assert!(fence.is_current(&max));
        assert!(fence.is_current(&next));
    }
}
