use crate::utils::crypto::ring_mask;
use crate::utils::types::{Address, RingId};

/// Routing table with one finger per identifier bit.
///
/// Finger `i` (1-based, `i` in `[1, m]`) caches the owner of
/// `node_id + 2^(i-1) mod 2^m`. Entries start out unset and are filled in
/// round-robin by the finger fixer; a `None` entry is skipped during routing.
#[derive(Debug, Clone)]
pub struct FingerTable {
    node_id: RingId,
    m: u32,
    entries: Vec<Option<Address>>,
    next: usize,
}

impl FingerTable {
    pub fn new(node_id: RingId, m: u32) -> FingerTable {
        FingerTable {
            node_id,
            m,
            entries: vec![None; m as usize],
            // first advance wraps to finger 1
            next: m as usize,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ring position finger `i` is responsible for covering.
    pub fn start(&self, index: usize) -> RingId {
        self.node_id.wrapping_add(1u64 << (index - 1)) & ring_mask(self.m)
    }

    pub fn get(&self, index: usize) -> Option<&Address> {
        self.entries[index - 1].as_ref()
    }

    pub fn set(&mut self, index: usize, address: Address) {
        self.entries[index - 1] = Some(address);
    }

    /// Drops finger `i`, but only if it still points at `address`; the
    /// fixer may have replaced it since the caller sampled the table.
    pub fn clear_if(&mut self, index: usize, address: &Address) {
        if self.entries[index - 1].as_deref() == Some(address.as_str()) {
            self.entries[index - 1] = None;
        }
    }

    /// Advances the round-robin refresh pointer, wrapping from `m` to 1,
    /// and returns the finger index to refresh next.
    pub fn advance_next(&mut self) -> usize {
        self.next = if self.next >= self.entries.len() {
            1
        } else {
            self.next + 1
        };
        self.next
    }

    /// Set entries paired with their 1-based index, highest finger first.
    pub fn snapshot_rev(&self) -> Vec<(usize, Address)> {
        self.entries
            .iter()
            .enumerate()
            .rev()
            .filter_map(|(i, entry)| entry.clone().map(|address| (i + 1, address)))
            .collect()
    }

    /// Distinct finger addresses in ascending finger order.
    pub fn distinct_addresses(&self) -> Vec<Address> {
        let mut seen = Vec::new();
        for entry in self.entries.iter().flatten() {
            if !seen.contains(entry) {
                seen.push(entry.clone());
            }
        }
        seen
    }
}
