use std::process::exit;

use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::{error, info, LevelFilter};

use chord_dht::node::Node;
use chord_dht::threads::web::{routes, CrashGuard};
use chord_dht::utils::cli::Cli;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Cli::parse();
    simple_logger::SimpleLogger::new()
        .env()
        .with_level(LevelFilter::Info)
        .init()
        .unwrap();

    let port: u16 = match args.endpoint.rsplit(':').next().and_then(|p| p.parse().ok()) {
        Some(port) => port,
        None => {
            error!("endpoint must be of the form ip:port, got '{}'", args.endpoint);
            exit(1)
        }
    };

    let node = Node::new(args.endpoint.clone(), args.m, args.successors);
    info!(
        "node initialized: id={} m={} endpoint={}",
        node.id(),
        args.m,
        args.endpoint
    );

    if let Some(ref peer) = args.peer {
        node.join(peer).await;
    }
    node.start_maintenance();

    let data = web::Data::new(node);
    info!("http server listening on 0.0.0.0:{}", port);
    HttpServer::new(move || {
        App::new()
            .app_data(data.clone())
            .wrap(CrashGuard)
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
