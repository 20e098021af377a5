// tests/web_tests.rs

use std::sync::Arc;
use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;
use paladinbot_common::models::{ChannelInfo, CustomCommand, LiveStream, TwitchUser};
use paladinbot_common::traits::api::PlatformApi;
use paladinbot_core::platforms::twitch_eventsub::sign_message;
use paladinbot_core::platforms::twitch_eventsub::webhook::{
    HEADER_MESSAGE_ID, HEADER_MESSAGE_SIGNATURE, HEADER_MESSAGE_TIMESTAMP, HEADER_MESSAGE_TYPE,
};
use paladinbot_core::test_utils::{BotFixture, StaticPlatformApi};
use paladinbot_core::web::router;
use paladinbot_core::Error;

const SECRET: &str = "eventsub-test-secret";
const BROADCASTER_ID: &str = "1234";

async fn fixture() -> Result<(BotFixture, Router), Error> {
    let api = StaticPlatformApi::new().with_channel(ChannelInfo {
        broadcaster_id: BROADCASTER_ID.into(),
        title: "Road to Diamond".into(),
        category_id: "21779".into(),
        category_name: "League of Legends".into(),
    });
    let fx = BotFixture::builder()
        .platform_api(Arc::new(api))
        .custom(vec![CustomCommand::new("lurk", "enjoy the lurk")])
        .build()
        .await?;
    let app = router(fx.web_state(SECRET));
    Ok((fx, app))
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn now_stamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn eventsub_request(message_id: &str, message_type: &str, timestamp: &str, body: &Value) -> Request<Body> {
    let raw = serde_json::to_vec(body).unwrap();
    let signature = sign_message(SECRET, message_id, timestamp, &raw);
    Request::builder()
        .method("POST")
        .uri("/v1/twitch/eventsub")
        .header("content-type", "application/json")
        .header(HEADER_MESSAGE_ID, message_id)
        .header(HEADER_MESSAGE_TIMESTAMP, timestamp)
        .header(HEADER_MESSAGE_SIGNATURE, signature)
        .header(HEADER_MESSAGE_TYPE, message_type)
        .body(Body::from(raw))
        .unwrap()
}

fn notification(kind: &str, event: Value) -> Value {
    json!({
        "subscription": { "id": "sub-1", "type": kind, "version": "1", "status": "enabled" },
        "event": event,
    })
}

fn online_event() -> Value {
    json!({
        "id": "9001",
        "broadcaster_user_id": BROADCASTER_ID,
        "broadcaster_user_login": "streamer",
        "broadcaster_user_name": "Streamer",
        "type": "live",
        "started_at": "2024-03-01T18:00:00Z",
    })
}

#[tokio::test]
async fn test_index() -> Result<(), Error> {
    let (_fx, app) = fixture().await?;
    let resp = app
        .oneshot(Request::builder().uri("/v1").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["name"], "paladinbot");
    assert_eq!(body["channel"], "testchannel");
    Ok(())
}

#[tokio::test]
async fn test_list_commands_shape() -> Result<(), Error> {
    let (fx, app) = fixture().await?;
    fx.registry.sync_to_storage().await?;

    let resp = app
        .oneshot(Request::builder().uri("/v1/commands").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;

    let defaults = body["default_commands"].as_array().unwrap();
    let ping = defaults.iter().find(|c| c["name"] == "ping").unwrap();
    assert_eq!(ping["usage_count"], 0);
    assert_eq!(ping["global_cooldown"], 10);
    let command = defaults.iter().find(|c| c["name"] == "command").unwrap();
    assert_eq!(command["permissions"], json!(["broadcaster", "moderator"]));
    assert_eq!(command["aliases"], json!(["cmd"]));

    assert_eq!(
        body["custom_commands"],
        json!([{ "name": "lurk", "response": "enjoy the lurk", "usage_count": 0 }])
    );
    Ok(())
}

#[tokio::test]
async fn test_get_command_by_name_and_alias() -> Result<(), Error> {
    let (_fx, app) = fixture().await?;

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/v1/commands/category").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["default_command"]["name"], "game");

    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/v1/commands/lurk").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(body_json(resp).await["custom_command"]["response"], "enjoy the lurk");

    let resp = app
        .oneshot(Request::builder().uri("/v1/commands/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body = body_json(resp).await;
    assert_eq!(body["error"]["status_code"], 404);
    assert_eq!(body["error"]["error_code"], 10440);
    assert!(body["timestamp"].as_i64().is_some());
    Ok(())
}

#[tokio::test]
async fn test_eventsub_challenge_is_echoed() -> Result<(), Error> {
    let (_fx, app) = fixture().await?;
    let body = json!({
        "challenge": "pogchamp-kappa-360noscope",
        "subscription": { "id": "sub-1", "type": "stream.online", "status": "webhook_callback_verification_pending" },
    });

    let resp = app
        .oneshot(eventsub_request("m-1", "webhook_callback_verification", &now_stamp(), &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["content-type"], "text/plain");
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"pogchamp-kappa-360noscope");
    Ok(())
}

#[tokio::test]
async fn test_eventsub_rejects_bad_signature_and_stale_messages() -> Result<(), Error> {
    let (fx, app) = fixture().await?;
    let body = notification("stream.online", online_event());

    let mut req = eventsub_request("m-1", "notification", &now_stamp(), &body);
    req.headers_mut()
        .insert(HEADER_MESSAGE_SIGNATURE, "sha256=deadbeef".parse().unwrap());
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let old = (Utc::now() - Duration::minutes(11)).to_rfc3339_opts(SecondsFormat::Millis, true);
    let resp = app
        .clone()
        .oneshot(eventsub_request("m-2", "notification", &old, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/twitch/eventsub")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(!fx.stream_state.is_live().await?);
    Ok(())
}

#[tokio::test]
async fn test_eventsub_stream_lifecycle() -> Result<(), Error> {
    let (fx, app) = fixture().await?;

    let resp = app
        .clone()
        .oneshot(eventsub_request("m-1", "notification", &now_stamp(), &notification("stream.online", online_event())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let status = fx.stream_state.most_recent_status().await?.unwrap();
    assert!(status.live);
    assert_eq!(status.stream_id, "9001");
    assert_eq!(status.title.as_deref(), Some("Road to Diamond"));
    assert_eq!(status.category_name.as_deref(), Some("League of Legends"));

    let update = json!({
        "broadcaster_user_id": BROADCASTER_ID,
        "broadcaster_user_login": "streamer",
        "broadcaster_user_name": "Streamer",
        "title": "Chill games",
        "language": "en",
        "category_id": "509658",
        "category_name": "Just Chatting",
    });
    let resp = app
        .clone()
        .oneshot(eventsub_request("m-2", "notification", &now_stamp(), &notification("channel.update", update)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let status = fx.stream_state.most_recent_status().await?.unwrap();
    assert_eq!(status.title.as_deref(), Some("Chill games"));
    assert_eq!(status.category_name.as_deref(), Some("Just Chatting"));

    let offline = json!({
        "broadcaster_user_id": BROADCASTER_ID,
        "broadcaster_user_login": "streamer",
        "broadcaster_user_name": "Streamer",
    });
    let resp = app
        .clone()
        .oneshot(eventsub_request("m-3", "notification", &now_stamp(), &notification("stream.offline", offline.clone())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(!fx.stream_state.is_live().await?);

    // A second offline has nothing to close; still acknowledged.
    let resp = app
        .oneshot(eventsub_request("m-4", "notification", &now_stamp(), &notification("stream.offline", offline)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert_eq!(fx.stream_repo.records().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_eventsub_redelivery_is_applied_once() -> Result<(), Error> {
    let (fx, app) = fixture().await?;
    let body = notification("stream.online", online_event());
    let stamp = now_stamp();

    for _ in 0..2 {
        let resp = app
            .clone()
            .oneshot(eventsub_request("same-id", "notification", &stamp, &body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
    assert_eq!(fx.stream_repo.records().len(), 1);
    Ok(())
}

/// Answers channel lookups only after a delay, so two deliveries overlap.
struct SlowChannelApi {
    inner: StaticPlatformApi,
    delay: std::time::Duration,
}

#[async_trait]
impl PlatformApi for SlowChannelApi {
    async fn resolve_users(&self, logins: &[String]) -> Result<Vec<TwitchUser>, Error> {
        self.inner.resolve_users(logins).await
    }

    async fn get_channel_info(&self, broadcaster_id: &str) -> Result<Option<ChannelInfo>, Error> {
        tokio::time::sleep(self.delay).await;
        self.inner.get_channel_info(broadcaster_id).await
    }

    async fn get_streams(&self, logins: &[String]) -> Result<Vec<LiveStream>, Error> {
        self.inner.get_streams(logins).await
    }

    async fn refresh_app_access_token(&self) -> Result<(), Error> {
        self.inner.refresh_app_access_token().await
    }
}

#[tokio::test]
async fn test_eventsub_overlapping_redelivery_is_applied_once() -> Result<(), Error> {
    let api = SlowChannelApi {
        inner: StaticPlatformApi::new(),
        delay: std::time::Duration::from_millis(50),
    };
    let fx = BotFixture::builder().platform_api(Arc::new(api)).build().await?;
    let app = router(fx.web_state(SECRET));
    let body = notification("stream.online", online_event());
    let stamp = now_stamp();

    let (first, second) = tokio::join!(
        app.clone().oneshot(eventsub_request("same-id", "notification", &stamp, &body)),
        app.clone().oneshot(eventsub_request("same-id", "notification", &stamp, &body)),
    );
    assert_eq!(first.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(second.unwrap().status(), StatusCode::NO_CONTENT);
    assert_eq!(fx.stream_repo.records().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_eventsub_retry_after_failure_is_applied() -> Result<(), Error> {
    let (fx, app) = fixture().await?;
    let body = notification("stream.online", online_event());
    let stamp = now_stamp();

    fx.stream_repo.set_fail_writes(true);
    let resp = app
        .clone()
        .oneshot(eventsub_request("retry-id", "notification", &stamp, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

    fx.stream_repo.set_fail_writes(false);
    let resp = app
        .oneshot(eventsub_request("retry-id", "notification", &stamp, &body))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(fx.stream_state.is_live().await?);
    Ok(())
}

#[tokio::test]
async fn test_eventsub_go_live_survives_channel_lookup_failure() -> Result<(), Error> {
    let api = Arc::new(StaticPlatformApi::new());
    api.set_fail(true);
    let fx = BotFixture::builder().platform_api(api).build().await?;
    let app = router(fx.web_state(SECRET));

    let resp = app
        .oneshot(eventsub_request("m-1", "notification", &now_stamp(), &notification("stream.online", online_event())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let status = fx.stream_state.most_recent_status().await?.unwrap();
    assert!(status.live);
    assert!(status.title.is_none());
    Ok(())
}

#[tokio::test]
async fn test_eventsub_storage_failure_asks_for_retry() -> Result<(), Error> {
    let (fx, app) = fixture().await?;
    fx.stream_repo.set_fail_writes(true);

    let resp = app
        .oneshot(eventsub_request("m-1", "notification", &now_stamp(), &notification("stream.online", online_event())))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    Ok(())
}
