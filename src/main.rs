use std::sync::Arc;

use cupido::config::Config;
use cupido::http::request::{Method, Request};
use cupido::http::response::Response;
use cupido::server;

fn respond(req: &Request) -> Response {
    match (req.method, req.path()) {
        (Method::GET, b"/") => Response::ok("Hello from Cupido\n"),
        (Method::POST, _) => Response::ok(format!("Received {} bytes\n", req.body.len())),
        _ => Response::not_found(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    let cfg = Config::load()?;

    tokio::select! {
        res = server::listener::run(&cfg, Arc::new(respond)) => {
            res?;
        }

        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    Ok(())
}
