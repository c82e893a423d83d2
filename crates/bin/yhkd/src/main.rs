//! # yhkd — yhk bridge daemon
//!
//! Composition root that wires all adapters together and runs the
//! reconciliation controller.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Install the tracing subscriber
//! - Load credentials and run the console authorization when needed
//! - Construct the Yandex client, JSON stores and accessory host
//! - Restore the device snapshot and run the controller until Ctrl-C
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod auth;
mod config;

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;
use yhk_adapter_accessory_memory::{CharacteristicEvent, InMemoryAccessoryHost};
use yhk_adapter_storage_json::{JsonCredentialStore, JsonSnapshotStore};
use yhk_adapter_yandex::YandexClient;
use yhk_app::controller::ReconciliationController;

use crate::config::Config;

const REQUEST_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Credentials
    let data_dir = &config.storage.data_dir;
    let credential_store = Arc::new(JsonCredentialStore::in_dir(data_dir));
    let mut credentials = auth::stored_credentials(&credential_store, &config.yandex).await?;
    if !credentials.is_authorized() {
        credentials = auth::authorize(&config.yandex, credentials, &credential_store).await?;
    }

    // Adapters
    let remote = Arc::new(YandexClient::new(
        &config.yandex,
        credentials,
        Arc::clone(&credential_store),
    )?);
    let snapshot_store = JsonSnapshotStore::in_dir(data_dir);
    let (host, requests) = InMemoryAccessoryHost::with_channel(REQUEST_CAPACITY);
    let host = Arc::new(host);
    tokio::spawn(log_changes(host.subscribe()));

    // Controller
    let mut controller =
        ReconciliationController::new(remote, snapshot_store, Arc::clone(&host), config.controller());
    controller.load().await?;
    tracing::info!(data_dir = %data_dir.display(), "yhkd started");

    tokio::select! {
        () = controller.run(requests) => {}
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("shutting down");
        }
    }

    Ok(())
}

async fn log_changes(mut events: broadcast::Receiver<CharacteristicEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => tracing::debug!(
                accessory = %event.characteristic.accessory(),
                service = ?event.characteristic.service.kind,
                characteristic = ?event.characteristic.kind,
                value = ?event.value,
                "characteristic changed"
            ),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "characteristic log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
