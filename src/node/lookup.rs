use log::{debug, warn};

use crate::client::replied_ok;
use crate::node::Node;
use crate::utils::crypto::{hash, in_open_closed, in_open_open};
use crate::utils::types::{Address, RingId};

impl Node {
    /// Resolves the address owning `key_id`.
    ///
    /// On a connected, quiescent ring the result is the unique node whose
    /// arc contains `key_id`; under churn it is best-effort and may be
    /// `None` when every route fails.
    pub async fn find_successor(&self, key_id: RingId) -> Option<Address> {
        let successor = self.successor();
        let successor_id = hash(&successor, self.m());

        if in_open_closed(key_id, self.id(), successor_id) {
            // No probe for ourselves: a solo node is trivially alive.
            if successor == *self.address() {
                return Some(successor);
            }
            if replied_ok(&self.client.get_status(&successor).await) {
                debug!("found successor for {}: {}", key_id, successor_id);
                return Some(successor);
            }
        }

        if let Some(closest) = self.closest_preceding_node(key_id).await {
            debug!(
                "{} is the closest node to {}, passing the search on",
                hash(&closest, self.m()),
                key_id
            );
            return match self.client.find_successor(&closest, key_id).await {
                Some(ref reply) if reply.is_ok() => Some(reply.body.trim().to_string()),
                _ => {
                    warn!("closest preceding node {} failed the lookup", closest);
                    None
                }
            };
        }

        // Nothing precedes the key. Delegating to ourselves cannot make
        // progress, so a solo ring answers directly.
        if successor == *self.address() {
            return Some(successor);
        }
        match self.client.find_successor(&successor, key_id).await {
            Some(ref reply) if reply.is_ok() => Some(reply.body.trim().to_string()),
            _ => {
                warn!("successor {} failed the lookup for {}", successor_id, key_id);
                None
            }
        }
    }

    /// Scans the finger table from the highest finger down for a live node
    /// strictly between this node and `key_id`. Unreachable fingers are
    /// dropped from the table as they are discovered.
    async fn closest_preceding_node(&self, key_id: RingId) -> Option<Address> {
        for (index, finger) in self.finger_snapshot_rev() {
            let finger_id = hash(&finger, self.m());
            if !in_open_open(finger_id, self.id(), key_id) {
                continue;
            }
            if replied_ok(&self.client.get_status(&finger).await) {
                return Some(finger);
            }
            warn!("finger {} ({}) is unreachable, clearing it", index, finger_id);
            self.clear_finger_if(index, &finger);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Lookups that stay on the local node; everything that would touch the
    // network is exercised end to end in tests/ring.rs.

    #[tokio::test]
    async fn solo_node_owns_every_key() {
        // id("127.0.0.1:5000") = 29 at m = 6
        let node = Node::new("127.0.0.1:5000".to_string(), 6, 4);
        for key_id in [0, 28, 30, 63] {
            assert_eq!(
                node.find_successor(key_id).await,
                Some("127.0.0.1:5000".to_string())
            );
        }
    }

    #[tokio::test]
    async fn solo_node_owns_its_own_id() {
        let node = Node::new("127.0.0.1:5000".to_string(), 6, 4);
        assert_eq!(
            node.find_successor(29).await,
            Some("127.0.0.1:5000".to_string())
        );
    }

    #[tokio::test]
    async fn self_pointing_fingers_never_qualify() {
        let node = Node::new("127.0.0.1:5000".to_string(), 6, 4);
        for index in 1..=6 {
            node.set_finger(index, "127.0.0.1:5000".to_string());
        }
        assert_eq!(
            node.find_successor(29).await,
            Some("127.0.0.1:5000".to_string())
        );
    }
}
