use crate::cache::{QueryCache, QueryClient};
use crate::config::AppConfig;
use crate::db::{init_db, Database};
use crate::router::handle;
use astra::Server;
use std::net::SocketAddr;
use std::sync::Arc;

mod cache;
mod config;
mod db;
mod domain;
mod errors;
mod logging;
mod responses;
mod router;

#[cfg(test)]
mod tests;

fn main() {
    // 1️⃣ Load configuration (file, then VIOLATIONS_ADMIN__* env)
    let cfg = match AppConfig::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("❌ Configuration failed: {e}");
            std::process::exit(1);
        }
    };
    logging::init_logging(&cfg.log_filter);

    // 2️⃣ Create the database handle and apply the document schema
    let db = Database::new(&cfg.database_path);
    if let Err(e) = init_db(&db) {
        tracing::error!(error = %e, "database initialization failed");
        std::process::exit(1);
    }

    // 3️⃣ One query cache for the whole process
    let client = QueryClient::new(db, Arc::new(QueryCache::new()), cfg.page_size);

    // 4️⃣ Start the server
    let addr: SocketAddr = match cfg.bind_addr.parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, bind_addr = %cfg.bind_addr, "invalid bind address");
            std::process::exit(1);
        }
    };
    tracing::info!(%addr, workers = cfg.max_workers, "starting server");

    let server = Server::bind(&addr).max_workers(cfg.max_workers);

    let result = server.serve(move |req, _info| match handle(req, &client) {
        Ok(resp) => resp,
        Err(err) => {
            if err.status_code() >= 500 {
                tracing::error!(error = %err, "request failed");
            } else {
                tracing::debug!(error = %err, "request rejected");
            }
            responses::error_to_response(&err)
        }
    });

    if let Err(e) = result {
        tracing::error!(error = %e, "server ended with error");
    }

    tracing::info!("server shut down cleanly");
}
