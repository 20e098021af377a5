use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use crate::services::command_registry::SyncReport;
use crate::services::CommandRegistry;

pub const CATALOG_SYNC_PERIOD: Duration = Duration::from_secs(24 * 60 * 60);

/// Mirrors the built-in command definitions into storage. A failure to read
/// the stored catalog is logged and leaves storage as it was.
pub async fn sync_catalog(registry: Arc<CommandRegistry>) -> Option<SyncReport> {
    match registry.sync_to_storage().await {
        Ok(report) => {
            info!(
                inserted = report.inserted,
                updated = report.updated,
                deleted = report.deleted,
                failed = report.failed,
                "built-in command catalog synced"
            );
            Some(report)
        }
        Err(e) => {
            error!("built-in command catalog sync failed: {}", e);
            None
        }
    }
}
