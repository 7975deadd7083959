use std::time::Duration;

use log::debug;

use crate::utils::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::utils::types::{Address, RingId};

/// A peer's answer to an RPC. Transport failures and timeouts never produce
/// a `Reply`; callers receive `None` and treat the peer as down.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Typed, timeout-bounded HTTP client for the chord RPC surface.
///
/// Connect and read timeouts bound every call, so a dead peer costs at most
/// `CONNECT_TIMEOUT_SECS + READ_TIMEOUT_SECS` seconds.
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
}

impl Default for RpcClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RpcClient {
    pub fn new() -> RpcClient {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .build()
            .expect("static reqwest client options");
        RpcClient { http }
    }

    async fn get(&self, node: &Address, path: &str) -> Option<Reply> {
        let url = format!("http://{}{}", node, path);
        self.dispatch(self.http.get(url)).await
    }

    async fn put(&self, node: &Address, path: &str, body: String) -> Option<Reply> {
        let url = format!("http://{}{}", node, path);
        self.dispatch(self.http.put(url).body(body)).await
    }

    async fn dispatch(&self, request: reqwest::RequestBuilder) -> Option<Reply> {
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                debug!("rpc transport failure: {}", e);
                return None;
            }
        };
        let status = response.status().as_u16();
        let body = response.text().await.ok()?;
        Some(Reply { status, body })
    }

    /// Liveness probe.
    pub async fn get_status(&self, node: &Address) -> Option<Reply> {
        self.get(node, "/status").await
    }

    pub async fn get_predecessor(&self, node: &Address) -> Option<Reply> {
        self.get(node, "/predecessor").await
    }

    pub async fn get_successor(&self, node: &Address) -> Option<Reply> {
        self.get(node, "/successor").await
    }

    /// Body is a JSON array of addresses on 200.
    pub async fn get_successor_list(&self, node: &Address) -> Option<Reply> {
        self.get(node, "/successor_list").await
    }

    /// Asks `node` to resolve the owner of `id`; body is the owner address on 200.
    pub async fn find_successor(&self, node: &Address, id: RingId) -> Option<Reply> {
        self.get(node, &format!("/find_successor/{}", id)).await
    }

    /// Announces `candidate` as a possible predecessor of `node`.
    pub async fn notify(&self, node: &Address, candidate: &Address) -> Option<Reply> {
        self.put(node, "/notify", candidate.clone()).await
    }

    pub async fn get_value(&self, node: &Address, key: &str) -> Option<Reply> {
        self.get(node, &format!("/value/{}", key)).await
    }

    pub async fn set_value(&self, node: &Address, key: &str, value: String) -> Option<Reply> {
        self.put(node, &format!("/value/{}", key), value).await
    }

    pub async fn set_successor(&self, node: &Address, successor: &Address) -> Option<Reply> {
        self.put(node, "/successor", successor.clone()).await
    }

    pub async fn set_predecessor(&self, node: &Address, predecessor: &Address) -> Option<Reply> {
        self.put(node, "/predecessor", predecessor.clone()).await
    }
}

/// True iff the call reached the peer and it answered 2xx.
pub fn replied_ok(reply: &Option<Reply>) -> bool {
    matches!(reply, Some(r) if r.is_ok())
}
