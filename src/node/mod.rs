use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use log::{error, info};
use serde::{Deserialize, Serialize};

use crate::client::RpcClient;
use crate::node::finger_table::FingerTable;
use crate::node::successor_list::SuccessorList;
use crate::threads::Maintenance;
use crate::utils::crypto::{hash, in_open_open};
use crate::utils::types::{Address, KvStore, RingId};

pub mod finger_table;
pub mod lookup;
pub mod successor_list;

/// Ring membership state: everything the maintenance protocols repair.
#[derive(Debug)]
pub(crate) struct RingState {
    pub successor: Address,
    pub successor_list: SuccessorList,
    pub predecessor: Option<Address>,
    pub finger_table: FingerTable,
}

/// Answer to `GET /node-info`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NodeInfo {
    pub node_hash: String,
    pub successor: Address,
    pub others: Vec<Address>,
}

/// A chord node: one position on the ring, its routing state and its share
/// of the key value store.
///
/// Cloning is cheap and shares all state; the HTTP surface, the three
/// maintenance loops and the lookup path all hold clones. Membership state
/// sits behind one mutex and guards are never held across network I/O:
/// callers snapshot what they need, release the lock, then await.
#[derive(Clone)]
pub struct Node {
    address: Address,
    id: RingId,
    m: u32,
    ring: Arc<Mutex<RingState>>,
    storage: Arc<Mutex<KvStore>>,
    sim_crashed: Arc<AtomicBool>,
    maintenance: Arc<Mutex<Option<Maintenance>>>,
    pub(crate) client: RpcClient,
}

impl Node {
    /// Builds a standalone node: a solo ring with no predecessor.
    pub fn new(address: Address, m: u32, r: usize) -> Node {
        let id = hash(&address, m);
        let ring = RingState {
            successor: address.clone(),
            successor_list: SuccessorList::new(r, &address),
            predecessor: None,
            finger_table: FingerTable::new(id, m),
        };
        Node {
            id,
            m,
            ring: Arc::new(Mutex::new(ring)),
            storage: Arc::new(Mutex::new(KvStore::new())),
            sim_crashed: Arc::new(AtomicBool::new(false)),
            maintenance: Arc::new(Mutex::new(None)),
            client: RpcClient::new(),
            address,
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn id(&self) -> RingId {
        self.id
    }

    pub fn m(&self) -> u32 {
        self.m
    }

    pub fn successor(&self) -> Address {
        self.ring.lock().unwrap().successor.clone()
    }

    pub fn set_successor(&self, successor: Address) {
        let successor_id = hash(&successor, self.m);
        info!("updating successor: {} -> {}", self.id, successor_id);
        self.ring.lock().unwrap().successor = successor;
    }

    pub fn predecessor(&self) -> Option<Address> {
        self.ring.lock().unwrap().predecessor.clone()
    }

    pub fn set_predecessor(&self, predecessor: Address) {
        info!("updating predecessor: {} <- {}", predecessor, self.id);
        self.ring.lock().unwrap().predecessor = Some(predecessor);
    }

    /// Clears the predecessor, but only if it still is the probed address.
    pub fn clear_predecessor_if(&self, probed: &Address) {
        let mut ring = self.ring.lock().unwrap();
        if ring.predecessor.as_ref() == Some(probed) {
            info!("predecessor {} has failed", probed);
            ring.predecessor = None;
        }
    }

    pub fn successor_list(&self) -> Vec<Address> {
        self.ring.lock().unwrap().successor_list.addresses().to_vec()
    }

    /// Drops the failed head of the successor list and promotes the next
    /// entry. Returns the new successor, or `None` after collapsing back to
    /// a solo ring because the list ran out.
    pub fn advance_successor(&self) -> Option<Address> {
        let mut ring = self.ring.lock().unwrap();
        ring.successor_list.pop_front();
        let next = ring.successor_list.first().cloned();
        match next {
            Some(next) => {
                ring.successor = next.clone();
                Some(next)
            }
            None => {
                error!("successor list exhausted, collapsing to a solo ring");
                ring.successor = self.address.clone();
                ring.successor_list.reset(&self.address);
                None
            }
        }
    }

    pub fn adopt_successor_list(&self, successor: &Address, tail: Vec<Address>) {
        let mut ring = self.ring.lock().unwrap();
        ring.successor_list.adopt(successor, tail);
        info!("updated successor list: {:?}", ring.successor_list.addresses());
    }

    /// Handler for `PUT /notify`: a peer claims to be our predecessor.
    /// Accepted iff no predecessor is known or the candidate falls strictly
    /// between the current predecessor and this node.
    pub fn handle_notify(&self, candidate: &Address) {
        let candidate_id = hash(candidate, self.m);
        let mut ring = self.ring.lock().unwrap();
        let accept = match ring.predecessor {
            None => true,
            Some(ref current) => {
                in_open_open(candidate_id, hash(current, self.m), self.id)
            }
        };
        if accept {
            info!("updating predecessor: {} <- {}", candidate_id, self.id);
            ring.predecessor = Some(candidate.clone());
        }
    }

    pub(crate) fn finger_snapshot_rev(&self) -> Vec<(usize, Address)> {
        self.ring.lock().unwrap().finger_table.snapshot_rev()
    }

    pub fn set_finger(&self, index: usize, address: Address) {
        self.ring.lock().unwrap().finger_table.set(index, address);
    }

    pub(crate) fn clear_finger_if(&self, index: usize, address: &Address) {
        self.ring.lock().unwrap().finger_table.clear_if(index, address);
    }

    /// Advances the finger refresh pointer and returns the finger index to
    /// fix together with the ring position it must cover.
    pub fn advance_next_finger(&self) -> (usize, RingId) {
        let mut ring = self.ring.lock().unwrap();
        let index = ring.finger_table.advance_next();
        (index, ring.finger_table.start(index))
    }

    /// Distinct finger addresses, the node's view of the network.
    pub fn known_network(&self) -> Vec<Address> {
        self.ring.lock().unwrap().finger_table.distinct_addresses()
    }

    pub fn node_info(&self) -> NodeInfo {
        let ring = self.ring.lock().unwrap();
        NodeInfo {
            node_hash: format!("{:x}", self.id),
            successor: ring.successor.clone(),
            others: ring.finger_table.distinct_addresses(),
        }
    }

    pub fn insert_value(&self, key: String, value: String) {
        info!("storing key '{}'", key);
        self.storage.lock().unwrap().insert(key, value);
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        self.storage.lock().unwrap().get(key).cloned()
    }

    /// Resets to a standalone ring; storage and fingers are left alone.
    pub fn create(&self) {
        let mut ring = self.ring.lock().unwrap();
        ring.predecessor = None;
        ring.successor = self.address.clone();
        ring.successor_list.reset(&self.address);
    }

    /// Joins the ring `bootstrap` belongs to by asking it who owns this
    /// node's id. Falls back to the bootstrap peer itself when the lookup
    /// fails; stabilization sorts the rest out.
    pub async fn join(&self, bootstrap: &Address) {
        {
            self.ring.lock().unwrap().predecessor = None;
        }
        let successor = match self.client.find_successor(bootstrap, self.id).await {
            Some(ref reply) if reply.is_ok() => reply.body.trim().to_string(),
            _ => bootstrap.clone(),
        };
        info!("joined ring via {}, successor is {}", bootstrap, successor);
        self.set_successor(successor);
    }

    /// Graceful departure: relink both neighbors around this node, hand all
    /// stored pairs to the successor, then reset to a solo ring. Every step
    /// is best-effort; peers that refuse are repaired by stabilization.
    pub async fn leave(&self) {
        let (predecessor, successor) = {
            let ring = self.ring.lock().unwrap();
            (ring.predecessor.clone(), ring.successor.clone())
        };

        if successor != self.address {
            if let Some(ref predecessor) = predecessor {
                let _ = self.client.set_successor(predecessor, &successor).await;
                let _ = self.client.set_predecessor(&successor, predecessor).await;
            }

            let pairs = std::mem::take(&mut *self.storage.lock().unwrap());
            info!("leaving, handing {} pairs to {}", pairs.len(), successor);
            for (key, value) in pairs {
                let _ = self.client.set_value(&successor, &key, value).await;
            }
        }

        self.create();
    }

    pub fn is_sim_crashed(&self) -> bool {
        self.sim_crashed.load(Ordering::SeqCst)
    }

    /// Simulates an abrupt crash: maintenance stops and the HTTP surface
    /// goes silent until `sim_recover`.
    pub fn sim_crash(&self) {
        info!("simulating crash of {}", self.address);
        self.stop_maintenance();
        self.sim_crashed.store(true, Ordering::SeqCst);
    }

    pub fn sim_recover(&self) {
        info!("recovering {}", self.address);
        self.sim_crashed.store(false, Ordering::SeqCst);
        self.start_maintenance();
    }

    pub fn start_maintenance(&self) {
        let mut maintenance = self.maintenance.lock().unwrap();
        if maintenance.is_none() {
            *maintenance = Some(Maintenance::start(self));
        }
    }

    pub fn stop_maintenance(&self) {
        if let Some(maintenance) = self.maintenance.lock().unwrap().take() {
            maintenance.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(address: &str) -> Node {
        Node::new(address.to_string(), 6, 4)
    }

    #[test]
    fn new_node_is_a_solo_ring() {
        // id("127.0.0.1:5000") = 29 at m = 6
        let n = node("127.0.0.1:5000");
        assert_eq!(n.id(), 29);
        assert_eq!(n.successor(), "127.0.0.1:5000");
        assert_eq!(n.successor_list(), vec!["127.0.0.1:5000".to_string()]);
        assert_eq!(n.predecessor(), None);
    }

    #[test]
    fn notify_fills_an_empty_predecessor() {
        let n = node("127.0.0.1:5000");
        n.handle_notify(&"127.0.0.1:5001".to_string());
        assert_eq!(n.predecessor(), Some("127.0.0.1:5001".to_string()));
    }

    #[test]
    fn notify_accepts_only_closer_candidates() {
        // ids at m = 6: 5000 -> 29, 5001 -> 24, 5004 -> 23
        let n = node("127.0.0.1:5000");
        n.set_predecessor("127.0.0.1:5004".to_string());
        // 24 lies in (23, 29): accepted
        n.handle_notify(&"127.0.0.1:5001".to_string());
        assert_eq!(n.predecessor(), Some("127.0.0.1:5001".to_string()));
        // 23 does not lie in (24, 29): rejected
        n.handle_notify(&"127.0.0.1:5004".to_string());
        assert_eq!(n.predecessor(), Some("127.0.0.1:5001".to_string()));
    }

    #[test]
    fn advance_successor_walks_the_list_then_collapses() {
        let n = node("127.0.0.1:5000");
        n.adopt_successor_list(
            &"127.0.0.1:5001".to_string(),
            vec!["127.0.0.1:5002".to_string()],
        );
        n.set_successor("127.0.0.1:5001".to_string());

        assert_eq!(n.advance_successor(), Some("127.0.0.1:5002".to_string()));
        assert_eq!(n.successor(), "127.0.0.1:5002");

        assert_eq!(n.advance_successor(), None);
        assert_eq!(n.successor(), "127.0.0.1:5000");
        assert_eq!(n.successor_list(), vec!["127.0.0.1:5000".to_string()]);
    }

    #[test]
    fn clear_predecessor_if_ignores_stale_probes() {
        let n = node("127.0.0.1:5000");
        n.set_predecessor("127.0.0.1:5001".to_string());
        n.clear_predecessor_if(&"127.0.0.1:5002".to_string());
        assert_eq!(n.predecessor(), Some("127.0.0.1:5001".to_string()));
        n.clear_predecessor_if(&"127.0.0.1:5001".to_string());
        assert_eq!(n.predecessor(), None);
    }

    #[test]
    fn storage_roundtrip() {
        let n = node("127.0.0.1:5000");
        assert_eq!(n.get_value("x"), None);
        n.insert_value("x".to_string(), "1".to_string());
        assert_eq!(n.get_value("x"), Some("1".to_string()));
        n.insert_value("x".to_string(), "2".to_string());
        assert_eq!(n.get_value("x"), Some("2".to_string()));
    }

    #[test]
    fn node_info_reports_hash_successor_and_fingers() {
        let n = node("127.0.0.1:5000");
        n.set_finger(2, "127.0.0.1:5001".to_string());
        n.set_finger(3, "127.0.0.1:5001".to_string());
        let info = n.node_info();
        assert_eq!(info.node_hash, "1d");
        assert_eq!(info.successor, "127.0.0.1:5000");
        assert_eq!(info.others, vec!["127.0.0.1:5001".to_string()]);
    }

    #[tokio::test]
    async fn sim_crash_flag_toggles() {
        let n = node("127.0.0.1:5000");
        assert!(!n.is_sim_crashed());
        n.sim_crash();
        assert!(n.is_sim_crashed());
        n.sim_recover();
        assert!(!n.is_sim_crashed());
        n.stop_maintenance();
    }
}
