use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::replied_ok;
use crate::node::Node;
use crate::threads::wait_or_stop;
use crate::utils::constants::{CHECK_PREDECESSOR_MAX_MILLIS, CHECK_PREDECESSOR_MIN_MILLIS};

pub fn spawn(node: Node, mut stop: watch::Receiver<bool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while wait_or_stop(
            &mut stop,
            CHECK_PREDECESSOR_MIN_MILLIS,
            CHECK_PREDECESSOR_MAX_MILLIS,
        )
        .await
        {
            run_once(&node).await;
        }
    })
}

/// Pings the predecessor and forgets it when it stops answering, so a
/// later `notify` can install a live one.
pub async fn run_once(node: &Node) {
    let Some(predecessor) = node.predecessor() else {
        return;
    };
    if !replied_ok(&node.client.get_status(&predecessor).await) {
        node.clear_predecessor_if(&predecessor);
    }
}
