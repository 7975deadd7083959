use std::env;
use std::time::Duration;

use chord_dht::node::NodeInfo;
use chord_dht::utils::types::{Address, RingId};

/// Everything the checker needs to know about one node.
struct NodeSummary {
    address: Address,
    id: RingId,
    successor: Address,
    predecessor: Option<Address>,
    successor_list: Vec<Address>,
    fingers: Vec<Address>,
}

#[tokio::main]
async fn main() {
    let addresses: Vec<String> = env::args().skip(1).collect();
    if addresses.is_empty() {
        panic!("Provide at least one node address")
    }

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(3))
        .timeout(Duration::from_secs(10))
        .build()
        .expect("static reqwest client options");

    let mut summaries: Vec<NodeSummary> = Vec::new();
    for address in &addresses {
        summaries.push(fetch_summary(&http, address).await);
    }
    summaries.sort_by_key(|summary| summary.id);

    let mut is_valid = true;
    let count = summaries.len();

    // successor pointers must walk the sorted ring
    for i in 0..count {
        let expected = &summaries[(i + 1) % count].address;
        let current = &summaries[i];
        if current.successor.ne(expected) {
            eprintln!(
                "Node ({}, {}): wrong successor {} (expected {})",
                current.id, current.address, current.successor, expected
            );
            is_valid = false;
        }
    }

    // each node's predecessor must be the previous ring member
    for i in 0..count {
        let expected = &summaries[i].address;
        let next = &summaries[(i + 1) % count];
        if next.predecessor.as_ref() != Some(expected) {
            eprintln!(
                "Node ({}, {}): wrong predecessor {:?} (expected {})",
                next.id, next.address, next.predecessor, expected
            );
            is_valid = false;
        }
    }

    // successor lists must be prefixes of the ring order
    for (i, summary) in summaries.iter().enumerate() {
        for (j, listed) in summary.successor_list.iter().enumerate() {
            let expected = &summaries[(i + j + 1) % count].address;
            if listed.ne(expected) {
                eprintln!(
                    "Node ({}, {}): successor list entry {} is {} (expected {})",
                    summary.id, summary.address, j, listed, expected
                );
                is_valid = false;
            }
        }
    }

    // fingers may be stale but must at least point at ring members
    for summary in &summaries {
        for finger in &summary.fingers {
            if !summaries.iter().any(|other| other.address.eq(finger)) {
                eprintln!(
                    "Node ({}, {}): finger {} is not a ring member",
                    summary.id, summary.address, finger
                );
                is_valid = false;
            }
        }
    }

    if is_valid {
        eprintln!("Looks good!")
    } else {
        eprintln!("Ring is invalid!")
    }
}

async fn fetch_summary(http: &reqwest::Client, address: &str) -> NodeSummary {
    let info: NodeInfo = http
        .get(format!("http://{}/node-info", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = RingId::from_str_radix(&info.node_hash, 16).unwrap();

    let predecessor_response = http
        .get(format!("http://{}/predecessor", address))
        .send()
        .await
        .unwrap();
    let predecessor = if predecessor_response.status().is_success() {
        Some(predecessor_response.text().await.unwrap())
    } else {
        None
    };

    let successor_list: Vec<Address> = http
        .get(format!("http://{}/successor_list", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    NodeSummary {
        address: address.to_string(),
        id,
        successor: info.successor,
        predecessor,
        // drop the leading self entry reported by small rings
        successor_list: successor_list
            .into_iter()
            .filter(|entry| entry.ne(address))
            .collect(),
        fingers: info.others,
    }
}
