//! EventForge Certificate Ledger Repair
//!
//! Out-of-band batch pass that re-validates every registration claiming an
//! issued certificate and resets the ones whose preconditions no longer
//! hold (event deleted, certificates disabled, template or artifact gone).
//! Idempotent; safe to run on a schedule.
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `EF_MONGO_URL` | `mongodb://localhost:27017` | MongoDB connection URL |
//! | `EF_MONGO_DB` | `eventforge` | MongoDB database name |
//! | `RUST_LOG` | `info` | Log level |

use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ef_platform::repository::{EventRepository, RegistrationRepository};
use ef_platform::service::CertificateRepairService;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let mongo_url = env_or("EF_MONGO_URL", "mongodb://localhost:27017");
    let mongo_db = env_or("EF_MONGO_DB", "eventforge");

    info!("Connecting to MongoDB: {}/{}", mongo_url, mongo_db);
    let mongo_client = mongodb::Client::with_uri_str(&mongo_url).await?;
    let db = mongo_client.database(&mongo_db);

    let registration_repo = Arc::new(RegistrationRepository::new(&db));
    let event_repo = Arc::new(EventRepository::new(&db));

    let repair = CertificateRepairService::new(registration_repo, event_repo);
    let report = repair.run().await?;

    info!(
        scanned = report.scanned,
        repaired = report.repaired,
        "certificate ledger repair finished"
    );
    println!("Cleanup done. Fixed {} records.", report.repaired);

    Ok(())
}
