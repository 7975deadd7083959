use log::debug;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::node::Node;
use crate::threads::wait_or_stop;
use crate::utils::constants::{FIX_FINGERS_MAX_MILLIS, FIX_FINGERS_MIN_MILLIS};

pub fn spawn(node: Node, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while wait_or_stop(&mut stop, FIX_FINGERS_MIN_MILLIS, FIX_FINGERS_MAX_MILLIS).await {
            run_once(&node).await;
        }
    })
}

/// Refreshes one finger per round, cycling through the table. A failed
/// lookup leaves the entry untouched; the next cycle retries it.
pub async fn run_once(node: &Node) {
    let (index, target) = node.advance_next_finger();
    debug!("fixing finger {} (target {})", index, target);
    if let Some(owner) = node.find_successor(target).await {
        node.set_finger(index, owner);
    }
}
