use std::time::Duration;

use log::debug;
use rand::Rng;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::sleep;

use crate::node::Node;

pub mod check_predecessor;
pub mod fix_fingers;
pub mod stabilize;
pub mod web;

/// Handle to the three periodic maintenance tasks of a node. Dropping the
/// handle alone does not stop them; `stop` flips the shared stop signal and
/// every loop exits on its next wake-up.
pub struct Maintenance {
    stop: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl Maintenance {
    pub fn start(node: &Node) -> Maintenance {
        let (stop, signal) = watch::channel(false);
        let handles = vec![
            stabilize::spawn(node.clone(), signal.clone()),
            fix_fingers::spawn(node.clone(), signal.clone()),
            check_predecessor::spawn(node.clone(), signal),
        ];
        Maintenance { stop, handles }
    }

    pub fn stop(self) {
        let _ = self.stop.send(true);
        for handle in &self.handles {
            handle.abort();
        }
    }
}

/// Sleeps a uniform-random delay in `[min_millis, max_millis]`, watching the
/// stop signal the whole time. Returns false once the loop must exit.
///
/// The jitter is deliberate: nodes ticking in lockstep stabilize poorly
/// under churn.
pub(crate) async fn wait_or_stop(
    stop: &mut watch::Receiver<bool>,
    min_millis: u64,
    max_millis: u64,
) -> bool {
    let delay = {
        let mut rng = rand::thread_rng();
        Duration::from_millis(rng.gen_range(min_millis..=max_millis))
    };
    tokio::select! {
        _ = stop.changed() => {
            debug!("maintenance task received stop signal");
            false
        }
        _ = sleep(delay) => !*stop.borrow(),
    }
}
