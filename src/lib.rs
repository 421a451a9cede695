//! Photo contest backend.
//!
//! Eligible participants (a registry of emails imported by the contest host)
//! may each submit at most one photo entry and cast at most one vote; anyone
//! can read a ranked leaderboard that is recomputed from the vote ledger on
//! every request.
//!
//! # Architecture
//!
//! - `identity` — one normalization step for every email ingress
//! - `contest` — eligibility gate, submissions, vote casting, ranking
//! - `store` — repository trait plus Redis and in-memory implementations;
//!   the one-entry-per-owner and one-vote-per-voter invariants are enforced
//!   here as atomic conditional inserts
//! - `routes` / `state` / `config` — axum transport around the core
//!
//! # Why the store enforces uniqueness
//!
//! "Has this voter already voted?" followed by a separate insert is a
//! check-then-act race: two retried or double-clicked requests can both pass
//! the check before either writes. Every mutation here is therefore a single
//! conditional insert that commits or reports the duplicate in one step, and
//! the handlers translate that outcome into the user-facing error.

use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod contest;
pub mod error;
pub mod identity;
pub mod model;
pub mod routes;
pub mod state;
pub mod store;

use routes::{
    cast_vote_handler, import_voters_handler, leaderboard_handler, list_entries_handler,
    submit_entry_handler, voter_status_handler,
};
use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/entries", post(submit_entry_handler).get(list_entries_handler))
        .route("/votes", post(cast_vote_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .route("/voters/{email}/status", get(voter_status_handler))
        .route("/admin/voters", post(import_voters_handler))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
