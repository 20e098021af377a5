use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use crate::services::command_registry::{CatalogEntry, CommandCatalog};
use crate::utils::time::time_difference;
use super::{ApiError, WebState};

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub name: String,
    pub version: String,
    pub channel: String,
    pub uptime: String,
}

pub async fn index(State(state): State<WebState>) -> Json<IndexResponse> {
    let settings = &state.settings;
    Json(IndexResponse {
        name: settings.bot_name.clone(),
        version: settings.version.clone(),
        channel: settings.channel.clone(),
        uptime: time_difference(settings.started_at, Utc::now(), false),
    })
}

pub async fn list_commands(
    State(state): State<WebState>,
) -> Result<Json<CommandCatalog>, ApiError> {
    Ok(Json(state.registry.catalog().await?))
}

pub async fn get_command(
    State(state): State<WebState>,
    Path(name): Path<String>,
) -> Result<Json<CatalogEntry>, ApiError> {
    state
        .registry
        .describe(&name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Command not found"))
}
