//! `wimap` daemon: scan, reconcile and log the catalog until interrupted.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use wimap_app::WifiService;
use wimap_connect::NmcliConnector;
use wimap_core::AppConfig;
use wimap_scanner::{CatalogSnapshot, IwScanSource, NoLocation, ReplayScanSource, ScanSource};
use wimap_vault::{
    CredentialStore, CredentialVault, KdfParams, MemoryCredentialStore, VaultCredentialStore,
};

const VAULT_PASSWORD_ENV: &str = "WIMAP_VAULT_PASSWORD";
const REPLAY_FILE_ENV: &str = "WIMAP_REPLAY_FILE";

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load_with_env().context("failed to load configuration")?;
    wimap_app::init_tracing(&config.general.log_filter);

    info!("Starting WiMap v{}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&config).await?;
    let source = scan_source(&config).await?;
    let connector = NmcliConnector::new().with_interface(config.scanning.interface.clone());

    let service = WifiService::new(
        &config,
        source,
        Arc::new(NoLocation),
        Arc::new(connector),
        store,
    );

    let mut catalog = service.catalog();
    service.start_scanning();

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            changed = catalog.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = catalog.borrow_and_update().clone();
                log_catalog(&snapshot);
            }
        }
    }

    service.stop_scanning();
    info!("WiMap stopped");
    Ok(())
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn CredentialStore>> {
    let password = std::env::var(VAULT_PASSWORD_ENV).ok();
    let Some(password) = password.filter(|_| config.vault.enabled) else {
        info!("Using in-memory credential store");
        return Ok(Arc::new(MemoryCredentialStore::new()));
    };

    let data_dir = AppConfig::data_dir().context("failed to locate data directory")?;
    tokio::fs::create_dir_all(&data_dir)
        .await
        .with_context(|| format!("failed to create {}", data_dir.display()))?;

    let db_path = data_dir.join("vault.db");
    let params = KdfParams::from(&config.vault);
    let vault = CredentialVault::open_or_create(&password, &db_path, params)
        .await
        .context("failed to open credential vault")?;
    info!("Credential vault opened at {}", db_path.display());

    Ok(Arc::new(VaultCredentialStore::new(vault)))
}

async fn scan_source(config: &AppConfig) -> Result<Arc<dyn ScanSource>> {
    match std::env::var(REPLAY_FILE_ENV) {
        Ok(path) => {
            let source = ReplayScanSource::from_json_file(&path)
                .await
                .with_context(|| format!("failed to load replay file {path}"))?;
            info!("Replaying scans from {}", path);
            Ok(Arc::new(source))
        }
        Err(_) => Ok(Arc::new(IwScanSource::new(config.scanning.interface.clone()))),
    }
}

fn log_catalog(snapshot: &CatalogSnapshot) {
    info!("{} networks in range", snapshot.len());
    for record in snapshot.iter() {
        info!(
            "  {} {:<32} {:>4} dBm ch {:<3} {}",
            record.bssid,
            record.display_name(),
            record.rssi,
            record
                .channel
                .map_or_else(|| "?".to_string(), |c| c.to_string()),
            record.security.label(),
        );
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl+C, shutting down"),
        () = terminate => info!("Received terminate signal, shutting down"),
    }
}
