use std::collections::VecDeque;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use parking_lot::Mutex;
use sha2::Sha256;
use tracing::{debug, error, info, warn};
use paladinbot_common::models::{CategoryRef, StreamMetadata};
use crate::Error;
use crate::web::{ApiError, WebState};
use super::events::{ChannelUpdate, EventSubEnvelope, StreamOnline};

pub const HEADER_MESSAGE_ID: &str = "twitch-eventsub-message-id";
pub const HEADER_MESSAGE_TIMESTAMP: &str = "twitch-eventsub-message-timestamp";
pub const HEADER_MESSAGE_SIGNATURE: &str = "twitch-eventsub-message-signature";
pub const HEADER_MESSAGE_TYPE: &str = "twitch-eventsub-message-type";

/// Messages older than this are rejected as possible replays.
const MAX_MESSAGE_AGE_MINUTES: i64 = 10;
const RECENT_ID_CAPACITY: usize = 256;

type HmacSha256 = Hmac<Sha256>;

/// `sha256=<hex>` over message id, timestamp and raw body.
pub fn sign_message(secret: &str, message_id: &str, timestamp: &str, body: &[u8]) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return String::new(),
    };
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Constant-time check of the signature header.
pub fn verify_signature(
    secret: &str,
    message_id: &str,
    timestamp: &str,
    body: &[u8],
    signature: &str,
) -> bool {
    let Some(expected) = signature
        .strip_prefix("sha256=")
        .and_then(|h| hex::decode(h).ok())
    else {
        return false;
    };
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(message_id.as_bytes());
    mac.update(timestamp.as_bytes());
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

/// Twitch redelivers on timeouts; ids of notifications being applied or
/// already applied are kept so a redelivery is acknowledged without being
/// applied twice.
#[derive(Default)]
pub struct RecentMessageIds {
    ids: Mutex<VecDeque<String>>,
}

impl RecentMessageIds {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.lock().iter().any(|seen| seen == id)
    }

    /// Claims `id` for processing. Returns `false` if it is already claimed.
    pub fn reserve(&self, id: &str) -> bool {
        let mut ids = self.ids.lock();
        if ids.iter().any(|seen| seen == id) {
            return false;
        }
        if ids.len() >= RECENT_ID_CAPACITY {
            ids.pop_front();
        }
        ids.push_back(id.to_string());
        true
    }

    /// Gives up a claim so a later delivery of `id` is applied.
    pub fn release(&self, id: &str) {
        self.ids.lock().retain(|seen| seen != id);
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, ApiError> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::bad_request(format!("missing header {}", name)))
}

pub async fn handle_eventsub(
    State(state): State<WebState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let message_id = header_str(&headers, HEADER_MESSAGE_ID)?;
    let timestamp = header_str(&headers, HEADER_MESSAGE_TIMESTAMP)?;
    let signature = header_str(&headers, HEADER_MESSAGE_SIGNATURE)?;
    let message_type = header_str(&headers, HEADER_MESSAGE_TYPE)?;

    if !verify_signature(&state.eventsub_secret, message_id, timestamp, &body, signature) {
        warn!(message_id, "EventSub signature mismatch");
        return Err(ApiError::forbidden("invalid signature"));
    }

    let sent_at = DateTime::parse_from_rfc3339(timestamp)
        .map_err(|_| ApiError::bad_request("invalid message timestamp"))?
        .with_timezone(&Utc);
    if Utc::now() - sent_at > Duration::minutes(MAX_MESSAGE_AGE_MINUTES) {
        warn!(message_id, %sent_at, "EventSub message too old");
        return Err(ApiError::forbidden("message too old"));
    }

    let envelope: EventSubEnvelope = serde_json::from_slice(&body)
        .map_err(|e| ApiError::bad_request(format!("invalid body: {}", e)))?;

    match message_type {
        "webhook_callback_verification" => {
            let challenge = envelope
                .challenge
                .ok_or_else(|| ApiError::bad_request("missing challenge"))?;
            info!(subscription = %envelope.subscription.r#type, "EventSub subscription verified");
            Ok((StatusCode::OK, [(header::CONTENT_TYPE, "text/plain")], challenge).into_response())
        }
        "revocation" => {
            warn!(
                subscription = %envelope.subscription.r#type,
                status = %envelope.subscription.status,
                "EventSub subscription revoked"
            );
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        "notification" => {
            if !state.recent_message_ids.reserve(message_id) {
                debug!(message_id, "duplicate EventSub message ignored");
                return Ok(StatusCode::NO_CONTENT.into_response());
            }
            match apply_notification(&state, &envelope).await {
                Ok(()) | Err(Error::NotFound(_)) => Ok(StatusCode::NO_CONTENT.into_response()),
                Err(e) => {
                    // Twitch retries on 5xx; the retry must not look like a duplicate.
                    state.recent_message_ids.release(message_id);
                    error!(subscription = %envelope.subscription.r#type, "failed to apply EventSub notification: {}", e);
                    Err(ApiError::internal("failed to apply notification"))
                }
            }
        }
        other => Err(ApiError::bad_request(format!("unknown message type {}", other))),
    }
}

async fn apply_notification(state: &WebState, envelope: &EventSubEnvelope) -> Result<(), Error> {
    let event = envelope
        .event
        .clone()
        .ok_or_else(|| Error::Parse("notification without event".into()))?;

    match envelope.subscription.r#type.as_str() {
        "stream.online" => {
            let online: StreamOnline = serde_json::from_value(event)?;
            let mut meta = StreamMetadata {
                stream_id: online.id.clone(),
                title: None,
                category: None,
                started_at: online.started_at,
            };
            match state.platform_api.get_channel_info(&online.broadcaster_user_id).await {
                Ok(Some(info)) => {
                    meta.title = Some(info.title);
                    if !info.category_id.is_empty() {
                        meta.category = Some(CategoryRef {
                            id: info.category_id,
                            name: info.category_name,
                        });
                    }
                }
                Ok(None) => warn!(broadcaster = %online.broadcaster_user_login, "no channel info for go-live"),
                Err(e) => warn!("channel info lookup failed, recording go-live without metadata: {}", e),
            }
            state.stream_state.went_live(meta).await?;
        }
        "stream.offline" => {
            state.stream_state.went_offline(Utc::now()).await?;
        }
        "channel.update" => {
            let update: ChannelUpdate = serde_json::from_value(event)?;
            let category = (!update.category_id.is_empty()).then(|| CategoryRef {
                id: update.category_id.clone(),
                name: update.category_name.clone(),
            });
            state
                .stream_state
                .metadata_changed(Some(&update.title), category.as_ref())
                .await?;
        }
        other => debug!("ignoring EventSub notification {}", other),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_round_trip_and_tamper() {
        let sig = sign_message("s3cret", "id-1", "2024-01-01T00:00:00Z", b"{}");
        assert!(sig.starts_with("sha256="));
        assert!(verify_signature("s3cret", "id-1", "2024-01-01T00:00:00Z", b"{}", &sig));
        assert!(!verify_signature("s3cret", "id-1", "2024-01-01T00:00:00Z", b"{ }", &sig));
        assert!(!verify_signature("other", "id-1", "2024-01-01T00:00:00Z", b"{}", &sig));
        assert!(!verify_signature("s3cret", "id-1", "2024-01-01T00:00:00Z", b"{}", "md5=00"));
    }

    #[test]
    fn reserve_claims_once_until_released() {
        let ids = RecentMessageIds::default();
        assert!(ids.reserve("m-1"));
        assert!(!ids.reserve("m-1"));
        ids.release("m-1");
        assert!(!ids.contains("m-1"));
        assert!(ids.reserve("m-1"));
    }

    #[test]
    fn recent_ids_are_bounded() {
        let ids = RecentMessageIds::default();
        assert!(ids.reserve("first"));
        for i in 0..RECENT_ID_CAPACITY {
            assert!(ids.reserve(&format!("id-{}", i)));
        }
        assert!(!ids.contains("first"));
        assert!(ids.contains(&format!("id-{}", RECENT_ID_CAPACITY - 1)));
    }
}
