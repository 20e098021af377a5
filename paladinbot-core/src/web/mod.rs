//! Read-only HTTP surface: the command catalog for the public site and the
//! EventSub webhook callback.

pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use axum::routing::{get, post};
use axum::Router;
use axum_server::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use paladinbot_common::traits::api::PlatformApi;
use crate::platforms::twitch_eventsub::webhook::{handle_eventsub, RecentMessageIds};
use crate::services::{CommandRegistry, StreamStateCache};
use crate::settings::BotSettings;

pub use error::ApiError;

/// In-flight requests get this long once shutdown starts.
const GRACEFUL_SHUTDOWN: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct WebState {
    pub settings: Arc<BotSettings>,
    pub registry: Arc<CommandRegistry>,
    pub stream_state: Arc<StreamStateCache>,
    pub platform_api: Arc<dyn PlatformApi>,
    pub eventsub_secret: Arc<str>,
    pub recent_message_ids: Arc<RecentMessageIds>,
}

impl WebState {
    pub fn new(
        settings: Arc<BotSettings>,
        registry: Arc<CommandRegistry>,
        stream_state: Arc<StreamStateCache>,
        platform_api: Arc<dyn PlatformApi>,
        eventsub_secret: &str,
    ) -> Self {
        Self {
            settings,
            registry,
            stream_state,
            platform_api,
            eventsub_secret: Arc::from(eventsub_secret),
            recent_message_ids: Arc::new(RecentMessageIds::default()),
        }
    }
}

pub fn router(state: WebState) -> Router {
    let v1 = Router::new()
        .route("/", get(routes::index))
        .route("/commands", get(routes::list_commands))
        .route("/commands/{name}", get(routes::get_command))
        .route("/twitch/eventsub", post(handle_eventsub));

    Router::new()
        .nest("/v1", v1)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Binds `addr` and serves until the shutdown flag flips.
pub fn serve(
    addr: SocketAddr,
    state: WebState,
    mut shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let app = router(state);
    let handle = Handle::new();
    let handle_clone = handle.clone();

    tokio::spawn(async move {
        while !*shutdown_rx.borrow() {
            if shutdown_rx.changed().await.is_err() {
                break;
            }
        }
        handle_clone.graceful_shutdown(Some(GRACEFUL_SHUTDOWN));
    });

    info!("HTTP API listening on http://{}", addr);
    tokio::spawn(async move {
        if let Err(e) = axum_server::bind(addr)
            .handle(handle)
            .serve(app.into_make_service())
            .await
        {
            error!("HTTP server error: {}", e);
        }
        info!("HTTP server shut down.");
    })
}
