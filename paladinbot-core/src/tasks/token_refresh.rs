use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use paladinbot_common::traits::api::PlatformApi;

/// App access tokens live roughly 60 days; renew well before that.
pub const TOKEN_REFRESH_PERIOD: Duration = Duration::from_secs(50 * 24 * 60 * 60);

/// Renews the platform API's app access token. Failures are logged and the
/// next tick tries again.
pub async fn refresh_app_token(api: Arc<dyn PlatformApi>) {
    match api.refresh_app_access_token().await {
        Ok(()) => info!("app access token renewed"),
        Err(e) => error!("failed to renew app access token: {}", e),
    }
}
