use log::{info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::replied_ok;
use crate::node::Node;
use crate::threads::wait_or_stop;
use crate::utils::constants::{STABILIZE_MAX_MILLIS, STABILIZE_MIN_MILLIS};
use crate::utils::crypto::{hash, in_open_open};
use crate::utils::types::Address;

pub fn spawn(node: Node, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while wait_or_stop(&mut stop, STABILIZE_MIN_MILLIS, STABILIZE_MAX_MILLIS).await {
            run_once(&node).await;
        }
    })
}

/// One stabilization round: replace a dead successor from the successor
/// list, adopt the successor's predecessor when it sits between us and the
/// successor, refresh the successor list, and notify the successor of our
/// existence.
pub async fn run_once(node: &Node) {
    let mut successor = node.successor();

    // A node never has to probe itself.
    if successor != *node.address()
        && !replied_ok(&node.client.get_status(&successor).await)
    {
        info!("successor {} has failed", hash(&successor, node.m()));
        match node.advance_successor() {
            Some(next) => successor = next,
            // Collapsed to a solo ring; nothing left to reconcile.
            None => return,
        }
    }

    match node.client.get_predecessor(&successor).await {
        Some(ref reply) if reply.status == 200 => {
            let candidate: Address = reply.body.trim().to_string();
            if candidate != *node.address() {
                let candidate_id = hash(&candidate, node.m());
                let successor_id = hash(&successor, node.m());
                if in_open_open(candidate_id, node.id(), successor_id) {
                    info!("updating successor: {} -> {}", node.id(), candidate_id);
                    node.set_successor(candidate.clone());
                    successor = candidate;
                }
            }
            update_successor_list(node, &successor).await;
        }
        // 404: the successor knows no predecessor yet; our notify fixes that,
        // and the list refresh waits for the next round.
        Some(ref reply) if reply.status == 404 => {}
        _ => {
            warn!(
                "stabilize aborted, could not read predecessor of {}",
                successor
            );
            return;
        }
    }

    let _ = node.client.notify(&successor, node.address()).await;
}

async fn update_successor_list(node: &Node, successor: &Address) {
    match node.client.get_successor_list(successor).await {
        Some(ref reply) if reply.is_ok() => {
            match serde_json::from_str::<Vec<Address>>(&reply.body) {
                Ok(tail) => node.adopt_successor_list(successor, tail),
                Err(e) => warn!("malformed successor list from {}: {}", successor, e),
            }
        }
        _ => warn!("failed to get successor list from {}", successor),
    }
}
