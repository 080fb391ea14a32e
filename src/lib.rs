//! Bókari is a personal-finance ledger service.
//!
//! This library provides a REST API for managing financial transactions
//! against accounts, categories and payment methods. Users authenticate with
//! bearer tokens, see their own data unless they hold the admin role, and can
//! upload profile images to external object storage.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

pub mod account;
pub mod auth;
pub mod budget;
pub mod category;
pub mod config;
pub mod db;
pub mod endpoints;
pub mod media;
pub mod pagination;
pub mod payment_method;
pub mod transaction;
pub mod user;

mod database_id;
mod error;
mod password;
mod routing;
mod state;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use database_id::{DatabaseId, UserId};
pub use error::{Error, FieldErrors};
pub use password::PasswordHash;
pub use routing::build_router;
pub use state::AppState;

/// An async task that waits for either the ctrl+c or terminate signal,
/// whichever comes first, and then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
