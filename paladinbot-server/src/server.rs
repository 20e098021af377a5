//! paladinbot-server/src/server.rs
//!
//! Startup order, background tasks and graceful shutdown.

use std::sync::Arc;
use std::time::Duration;
use paladinbot_common::traits::api::ChatSender;
use tracing::{error, info, warn};
use paladinbot_core::Error;
use paladinbot_core::tasks::catalog_sync::{sync_catalog, CATALOG_SYNC_PERIOD};
use paladinbot_core::tasks::cooldown_sweep::{sweep_cooldowns, COOLDOWN_SWEEP_PERIOD};
use paladinbot_core::tasks::go_live_reminder::{go_live_reminder_time, remind_if_offline};
use paladinbot_core::tasks::token_refresh::{refresh_app_token, TOKEN_REFRESH_PERIOD};
use paladinbot_core::tasks::Scheduler;
use paladinbot_core::web;

use crate::Args;
use crate::context::ServerContext;

pub async fn run_server(args: Args) -> Result<(), Error> {
    let grace = Duration::from_secs(args.shutdown_grace_secs);

    // 1) Storage, platform clients, engine
    let ctx = ServerContext::new(&args).await?;
    sync_catalog(ctx.registry.clone()).await;
    match ctx.stream_state.most_recent_status().await {
        Ok(Some(status)) => info!(live = status.live, stream_id = %status.stream_id, "last known stream state"),
        Ok(None) => info!("no stream recorded yet"),
        Err(e) => warn!("could not read stream state: {}", e),
    }

    // 2) Chat: consumer first so no line published after connect is missed
    let chat_loop = ctx.chat_service.clone().start(&ctx.event_bus).await;
    let first = ctx.irc.connect().await?;
    let irc_handle = ctx.irc.clone().spawn(first);

    // 3) Maintenance
    let mut scheduler = Scheduler::new(ctx.event_bus.shutdown_rx.clone());
    {
        let api = ctx.platform_api.clone();
        scheduler.every("token_refresh", TOKEN_REFRESH_PERIOD, move || {
            refresh_app_token(api.clone())
        });
    }
    {
        let registry = ctx.registry.clone();
        scheduler.every("catalog_sync", CATALOG_SYNC_PERIOD, move || {
            let registry = registry.clone();
            async move {
                sync_catalog(registry).await;
            }
        });
    }
    {
        let cooldowns = ctx.cooldowns.clone();
        scheduler.every("cooldown_sweep", COOLDOWN_SWEEP_PERIOD, move || {
            let cooldowns = cooldowns.clone();
            async move {
                sweep_cooldowns(&cooldowns);
            }
        });
    }
    {
        let api = ctx.platform_api.clone();
        let sender: Arc<dyn ChatSender> = ctx.irc.clone();
        let channel = ctx.settings.channel.clone();
        scheduler.daily_at(
            "go_live_reminder",
            ctx.settings.timezone,
            go_live_reminder_time(),
            move || {
                let (api, sender, channel) = (api.clone(), sender.clone(), channel.clone());
                async move {
                    remind_if_offline(api, sender, channel).await;
                }
            },
        );
    }
    info!("{} maintenance tasks scheduled", scheduler.len());

    // 4) HTTP API and webhook receiver
    let http_handle = web::serve(
        ctx.http_addr,
        ctx.web_state.clone(),
        ctx.event_bus.shutdown_rx.clone(),
    );

    info!(channel = %ctx.settings.channel, "PaladinBot is running");

    // 5) Wait for Ctrl-C
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {:?}", e);
    }
    info!("Ctrl-C detected; shutting down...");
    ctx.event_bus.shutdown();

    // 6) Chat reading has stopped but the IRC session stays open; let running
    //    commands finish and reply. A second Ctrl-C skips the wait.
    tokio::select! {
        drained = ctx.chat_service.drain(grace) => {
            if drained {
                info!("All in-flight commands finished");
            }
        }
        _ = tokio::signal::ctrl_c() => {
            warn!("Second Ctrl-C; exiting without waiting for {} commands", ctx.chat_service.in_flight());
            return Ok(());
        }
    }

    if let Err(e) = chat_loop.await {
        error!("chat loop panicked: {}", e);
    }
    if let Err(e) = irc_handle.await {
        error!("IRC task panicked: {}", e);
    }
    // Replies of drained commands have been handed to the writer by now.
    ctx.irc.disconnect().await;
    scheduler.shutdown_and_join().await;
    if let Err(e) = http_handle.await {
        error!("HTTP task panicked: {}", e);
    }

    ctx.db.pool().close().await;
    info!("Shutdown complete");
    Ok(())
}
