//! Suppresses re-publication of opportunities that persist across scans.

use common::Opportunity;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Remembers opportunity fingerprints for a TTL. An opportunity whose
/// route and prices match one seen within the TTL is a duplicate; once
/// the entry ages out the same opportunity may be reported again.
pub struct OpportunityDeduplicator {
    seen: HashMap<[u8; 32], Instant>,
    ttl: Duration,
}

impl OpportunityDeduplicator {
    pub fn new(ttl: Duration) -> Self {
        Self {
            seen: HashMap::new(),
            ttl,
        }
    }

    /// Checks and records in one step: the first sighting returns false
    /// and refreshes the entry, later sightings within the TTL return true.
    pub fn is_duplicate(&mut self, opportunity: &Opportunity) -> bool {
        let now = Instant::now();
        self.seen
            .retain(|_, first_seen| now.duration_since(*first_seen) < self.ttl);

        let fingerprint = opportunity.fingerprint();
        if self.seen.contains_key(&fingerprint) {
            return true;
        }
        self.seen.insert(fingerprint, now);
        false
    }

    /// Keeps only opportunities not seen within the TTL, in input order.
    pub fn dedup(&mut self, opportunities: Vec<Opportunity>) -> Vec<Opportunity> {
        opportunities
            .into_iter()
            .filter(|o| !self.is_duplicate(o))
            .collect()
    }

    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}
