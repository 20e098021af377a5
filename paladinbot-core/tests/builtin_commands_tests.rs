// tests/builtin_commands_tests.rs

use std::sync::Arc;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use mockall::mock;
use paladinbot_common::models::{CategoryRef, ChannelInfo, LiveStream, StreamMetadata, TwitchUser};
use paladinbot_common::traits::api::PlatformApi;
use paladinbot_core::services::dispatcher::DispatchOutcome;
use paladinbot_core::test_utils::{chatter, BotFixture, TEST_CHANNEL};
use paladinbot_core::{BotSettings, Error};

mock! {
    Helix {}
    #[async_trait]
    impl PlatformApi for Helix {
        async fn resolve_users(&self, logins: &[String]) -> Result<Vec<TwitchUser>, Error>;
        async fn get_channel_info(&self, broadcaster_id: &str) -> Result<Option<ChannelInfo>, Error>;
        async fn get_streams(&self, logins: &[String]) -> Result<Vec<LiveStream>, Error>;
        async fn refresh_app_access_token(&self) -> Result<(), Error>;
    }
}

/// Dispatches after every cooldown from earlier calls has lapsed.
async fn reply(fx: &BotFixture, login: &str, text: &str) -> String {
    tokio::time::advance(std::time::Duration::from_secs(31)).await;
    match fx.dispatcher.dispatch(TEST_CHANNEL, &chatter(login, &[]), text).await {
        DispatchOutcome::Reply(t) | DispatchOutcome::ErrorReported(t) => t,
        other => panic!("expected a reply to {text:?}, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_accountage_for_self_and_other() -> Result<(), Error> {
    let created = Utc::now() - Duration::days(400);
    let mut api = MockHelix::new();
    api.expect_resolve_users()
        .withf(|logins| logins.len() == 1 && logins[0] == "alice")
        .times(1)
        .returning(move |_| {
            Ok(vec![TwitchUser {
                id: "1".into(),
                login: "alice".into(),
                display_name: "Alice".into(),
                created_at: created,
            }])
        });
    api.expect_resolve_users()
        .withf(|logins| logins.len() == 1 && logins[0] == "bob")
        .times(1)
        .returning(|_| Ok(vec![]));

    let fx = BotFixture::builder().platform_api(Arc::new(api)).build().await?;

    let text = reply(&fx, "alice", "!accountage").await;
    assert!(text.starts_with("@alice, you created your account 1 yr"), "{text}");

    let text = reply(&fx, "carol", "!accountage @Bob").await;
    assert_eq!(text, "@carol, sorry I couldn't find a user with that name!");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_accountage_platform_failure_is_generic() -> Result<(), Error> {
    let mut api = MockHelix::new();
    api.expect_resolve_users()
        .returning(|_| Err(Error::Platform("503".into())));
    let fx = BotFixture::builder().platform_api(Arc::new(api)).build().await?;

    let text = reply(&fx, "alice", "!accountage").await;
    assert_eq!(text, "@alice, something went wrong... please try again later.");
    assert!(fx.cooldowns.is_empty());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_uptime_reflects_stream_state() -> Result<(), Error> {
    let fx = BotFixture::new().await?;
    assert_eq!(
        reply(&fx, "a1", "!uptime").await,
        "@a1, the stream has not gone live yet"
    );

    fx.go_live(Utc::now() - Duration::minutes(90)).await?;
    let text = reply(&fx, "a2", "!uptime").await;
    assert!(text.starts_with("@a2, the stream has been live for 1 hr"), "{text}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_uptime_offline_and_target() -> Result<(), Error> {
    let fx = BotFixture::new().await?;
    fx.go_live(Utc::now() - Duration::hours(5)).await?;
    fx.stream_state.went_offline(Utc::now() - Duration::hours(2)).await?;

    let text = reply(&fx, "a1", "!uptime @SomeoneElse").await;
    assert!(text.starts_with("@someoneelse, the stream has been offline for 2 hrs"), "{text}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_title_and_game() -> Result<(), Error> {
    let fx = BotFixture::new().await?;
    assert_eq!(reply(&fx, "a1", "!title").await, "@a1 the title is not set to anything");
    assert_eq!(
        reply(&fx, "a1", "!game").await,
        format!("@a1, {} isn't under a specific category", TEST_CHANNEL)
    );

    fx.stream_state
        .went_live(StreamMetadata {
            stream_id: "s1".into(),
            title: Some("speedruns all day".into()),
            category: Some(CategoryRef {
                id: "1".into(),
                name: "Celeste".into(),
            }),
            started_at: Utc::now(),
        })
        .await?;
    assert_eq!(reply(&fx, "a2", "!title").await, "@a2 current title: speedruns all day");
    assert_eq!(
        reply(&fx, "a2", "!category").await,
        format!("@a2, {} is playing Celeste", TEST_CHANNEL)
    );

    let chatting = CategoryRef {
        id: "509658".into(),
        name: "Just Chatting".into(),
    };
    fx.stream_state.metadata_changed(None, Some(&chatting)).await?;
    assert_eq!(
        reply(&fx, "a3", "!game").await,
        format!("@a3, {} is under the category: Just Chatting", TEST_CHANNEL)
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_help_points_at_website() -> Result<(), Error> {
    let fx = BotFixture::new().await?;
    let text = reply(&fx, "a1", "!help").await;
    assert!(text.contains("https://bot.example/"), "{text}");
    assert!(text.contains(env!("CARGO_PKG_VERSION")));

    let text = reply(&fx, "a2", "!about !Uptime").await;
    assert_eq!(
        text,
        "@a2 help for the command \"uptime\": https://bot.example/commands/uptime"
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_time_uses_configured_zone() -> Result<(), Error> {
    let settings = BotSettings::new(TEST_CHANNEL).with_timezone(chrono_tz::Asia::Tokyo);
    let fx = BotFixture::builder().settings(settings).build().await?;

    let text = reply(&fx, "a1", "!time").await;
    assert!(text.contains("JST"), "{text}");
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_ping_reports_bot_uptime() -> Result<(), Error> {
    let started = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    let settings = BotSettings::new(TEST_CHANNEL).with_started_at(started);
    let fx = BotFixture::builder().settings(settings).build().await?;

    let text = reply(&fx, "alice", "!ping").await;
    assert!(text.starts_with("@alice, FeelsOkayMan 🏓 Uptime: "), "{text}");
    assert!(text.contains("yr"), "{text}");
    Ok(())
}
