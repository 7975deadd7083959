use std::collections::HashMap;

use actix_web::body::MessageBody;
use actix_web::dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::{Method, StatusCode};
use actix_web::{get, post, put, web, Error, HttpResponse};
use futures_util::future::LocalBoxFuture;
use log::debug;
use std::future::{ready, Ready};

use crate::client::Reply;
use crate::node::Node;
use crate::threads::fix_fingers;
use crate::utils::crypto::{hash, ring_mask};

/// Middleware simulating a crashed process: while the flag is set, every
/// request except `POST /sim-recover` parks forever, so peers observe a
/// dead socket rather than an error reply.
pub struct CrashGuard;

impl<S, B> Transform<S, ServiceRequest> for CrashGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = CrashGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(CrashGuardService { service }))
    }
}

pub struct CrashGuardService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for CrashGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: MessageBody + 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let crashed = req
            .app_data::<web::Data<Node>>()
            .map(|node| node.is_sim_crashed())
            .unwrap_or(false);
        let recovering = req.method() == Method::POST && req.path() == "/sim-recover";

        if crashed && !recovering {
            debug!("crashed, dropping {} {}", req.method(), req.path());
            return Box::pin(async move {
                // Hold the request so the connection stays open unanswered.
                let _req = req;
                std::future::pending().await
            });
        }

        Box::pin(self.service.call(req))
    }
}

/// Registers the full HTTP surface on an actix app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(get_status)
        .service(get_node_info)
        .service(get_predecessor)
        .service(get_successor_list)
        .service(get_successor)
        .service(get_find_successor)
        .service(get_value)
        .service(get_storage)
        .service(get_network)
        .service(put_value)
        .service(put_storage)
        .service(put_notify)
        .service(put_successor)
        .service(put_predecessor)
        .service(put_fix_fingers)
        .service(post_join)
        .service(post_leave)
        .service(post_sim_crash)
        .service(post_sim_recover);
}

/// Extracts a trimmed, non-empty UTF-8 request body.
fn parse_body(body: &web::Bytes) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// Re-emits a peer's reply verbatim.
fn forward_reply(reply: Reply) -> HttpResponse {
    let status = StatusCode::from_u16(reply.status).unwrap_or(StatusCode::BAD_GATEWAY);
    HttpResponse::build(status).body(reply.body)
}

#[get("/status")]
async fn get_status() -> HttpResponse {
    HttpResponse::Ok().finish()
}

#[get("/node-info")]
async fn get_node_info(node: web::Data<Node>) -> HttpResponse {
    HttpResponse::Ok().json(node.node_info())
}

#[get("/predecessor")]
async fn get_predecessor(node: web::Data<Node>) -> HttpResponse {
    match node.predecessor() {
        Some(predecessor) => HttpResponse::Ok().body(predecessor),
        None => HttpResponse::NotFound()
            .body(format!("{} does not have a predecessor", node.id())),
    }
}

#[get("/successor")]
async fn get_successor(node: web::Data<Node>) -> HttpResponse {
    HttpResponse::Ok().body(node.successor())
}

#[get("/successor_list")]
async fn get_successor_list(node: web::Data<Node>) -> HttpResponse {
    HttpResponse::Ok().json(node.successor_list())
}

#[get("/find_successor/{id}")]
async fn get_find_successor(path: web::Path<String>, node: web::Data<Node>) -> HttpResponse {
    let raw = path.into_inner();
    let key_id = match raw.parse::<u64>() {
        Ok(id) if id <= ring_mask(node.m()) => id,
        _ => return HttpResponse::BadRequest().body(format!("invalid key id '{}'", raw)),
    };
    match node.find_successor(key_id).await {
        Some(owner) => HttpResponse::Ok().body(owner),
        None => HttpResponse::NotFound()
            .body(format!("couldn't find owner of key {}", key_id)),
    }
}

#[get("/value/{key}")]
async fn get_value(key: web::Path<String>, node: web::Data<Node>) -> HttpResponse {
    match node.get_value(&key) {
        Some(value) => HttpResponse::Ok().body(value),
        None => HttpResponse::NotFound()
            .body(format!("{} is not the owner of '{}'", node.id(), key)),
    }
}

/// Client-facing read: hashes the key, routes to the owner and relays its
/// answer.
#[get("/storage/{key}")]
async fn get_storage(key: web::Path<String>, node: web::Data<Node>) -> HttpResponse {
    let key = key.into_inner();
    let key_id = hash(&key, node.m());

    let owner = match node.find_successor(key_id).await {
        Some(owner) => owner,
        None => {
            return HttpResponse::NotFound()
                .body(format!("couldn't find owner of key '{}'", key))
        }
    };

    if owner == *node.address() {
        return match node.get_value(&key) {
            Some(value) => HttpResponse::Ok().body(value),
            None => HttpResponse::NotFound()
                .body(format!("{} is not the owner of '{}'", node.id(), key)),
        };
    }

    match node.client.get_value(&owner, &key).await {
        Some(reply) => forward_reply(reply),
        None => HttpResponse::InternalServerError()
            .body(format!("owner {} is unreachable", owner)),
    }
}

#[get("/network")]
async fn get_network(node: web::Data<Node>) -> HttpResponse {
    HttpResponse::Ok().json(node.known_network())
}

#[put("/value/{key}")]
async fn put_value(
    key: web::Path<String>,
    body: web::Bytes,
    node: web::Data<Node>,
) -> HttpResponse {
    let Some(value) = parse_body(&body) else {
        return HttpResponse::BadRequest().body("empty or invalid request body");
    };
    node.insert_value(key.into_inner(), value);
    HttpResponse::Ok().finish()
}

/// Client-facing write: hashes the key, routes to the owner and stores the
/// value there. A downstream failure status is relayed as-is.
#[put("/storage/{key}")]
async fn put_storage(
    key: web::Path<String>,
    body: web::Bytes,
    node: web::Data<Node>,
) -> HttpResponse {
    let key = key.into_inner();
    let Some(value) = parse_body(&body) else {
        return HttpResponse::BadRequest().body("empty or invalid request body");
    };
    let key_id = hash(&key, node.m());

    let owner = match node.find_successor(key_id).await {
        Some(owner) => owner,
        None => {
            return HttpResponse::BadRequest()
                .body(format!("couldn't find owner of key '{}'", key))
        }
    };

    if owner == *node.address() {
        node.insert_value(key, value);
        return HttpResponse::Ok().finish();
    }

    match node.client.set_value(&owner, &key, value).await {
        Some(ref reply) if reply.is_ok() => HttpResponse::Ok().finish(),
        Some(reply) => forward_reply(reply),
        None => HttpResponse::InternalServerError()
            .body(format!("owner {} is unreachable", owner)),
    }
}

#[put("/notify")]
async fn put_notify(body: web::Bytes, node: web::Data<Node>) -> HttpResponse {
    let Some(candidate) = parse_body(&body) else {
        return HttpResponse::BadRequest().body("empty or invalid request body");
    };
    node.handle_notify(&candidate);
    HttpResponse::Ok().finish()
}

#[put("/successor")]
async fn put_successor(body: web::Bytes, node: web::Data<Node>) -> HttpResponse {
    let Some(successor) = parse_body(&body) else {
        return HttpResponse::BadRequest().body("empty or invalid request body");
    };
    node.set_successor(successor);
    HttpResponse::Ok().finish()
}

#[put("/predecessor")]
async fn put_predecessor(body: web::Bytes, node: web::Data<Node>) -> HttpResponse {
    let Some(predecessor) = parse_body(&body) else {
        return HttpResponse::BadRequest().body("empty or invalid request body");
    };
    node.set_predecessor(predecessor);
    HttpResponse::Ok().finish()
}

#[put("/fix_fingers")]
async fn put_fix_fingers(node: web::Data<Node>) -> HttpResponse {
    fix_fingers::run_once(&node).await;
    HttpResponse::Ok().finish()
}

#[post("/join")]
async fn post_join(
    query: web::Query<HashMap<String, String>>,
    node: web::Data<Node>,
) -> HttpResponse {
    match query.get("nprime").map(|raw| raw.trim()) {
        Some(bootstrap) if !bootstrap.is_empty() => {
            node.join(&bootstrap.to_string()).await;
            HttpResponse::Ok().finish()
        }
        _ => HttpResponse::BadRequest().body("missing nprime parameter"),
    }
}

#[post("/leave")]
async fn post_leave(node: web::Data<Node>) -> HttpResponse {
    node.leave().await;
    HttpResponse::Ok().finish()
}

#[post("/sim-crash")]
async fn post_sim_crash(node: web::Data<Node>) -> HttpResponse {
    node.sim_crash();
    HttpResponse::Ok().finish()
}

#[post("/sim-recover")]
async fn post_sim_recover(node: web::Data<Node>) -> HttpResponse {
    node.sim_recover();
    HttpResponse::Ok().finish()
}
