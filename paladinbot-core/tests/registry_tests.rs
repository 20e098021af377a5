// tests/registry_tests.rs

use std::sync::Arc;
use std::time::Duration;
use paladinbot_common::error::RegistryError;
use paladinbot_common::models::{BuiltinCommandRecord, CustomCommand, Permission};
use paladinbot_core::services::builtin_commands::{default_commands, to_record};
use paladinbot_core::services::command_registry::{CatalogEntry, CommandMatch, CommandRegistry, SyncReport};
use paladinbot_core::services::dispatcher::DispatchOutcome;
use paladinbot_core::test_utils::{
    chatter, BotFixture, MemoryBuiltinCommandRepository, MemoryCustomCommandRepository, TEST_CHANNEL,
};
use paladinbot_core::Error;

fn custom_response(m: Option<CommandMatch>) -> Option<String> {
    match m {
        Some(CommandMatch::Custom(c)) => Some(c.response),
        _ => None,
    }
}

#[tokio::test]
async fn test_add_custom_twice_fails_and_keeps_first() -> Result<(), Error> {
    let fx = BotFixture::new().await?;

    fx.registry.add_custom("foo", "first").await.map_err(|e| Error::Parse(e.to_string()))?;
    let err = fx.registry.add_custom("foo", "second").await.unwrap_err();
    assert!(matches!(err, RegistryError::AlreadyExists(ref n) if n == "foo"));

    assert_eq!(custom_response(fx.registry.lookup("foo").await).as_deref(), Some("first"));
    assert_eq!(fx.custom_repo.snapshot().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_custom_cannot_shadow_builtin_name_or_alias() -> Result<(), Error> {
    let fx = BotFixture::new().await?;

    for name in ["ping", "PING", "!category", "about", "cmd"] {
        let err = fx.registry.add_custom(name, "nope").await.unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyExists(_)), "{name}: {err:?}");
    }
    assert!(fx.registry.list_custom().await.is_empty());
    assert!(fx.custom_repo.snapshot().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_names_are_normalized() -> Result<(), Error> {
    let fx = BotFixture::new().await?;

    let cmd = fx.registry.add_custom("!Discord", "link").await.unwrap();
    assert_eq!(cmd.name, "discord");
    assert!(fx.registry.lookup("DISCORD").await.is_some());

    for bad in ["", "   ", "!", "two words"] {
        let err = fx.registry.add_custom(bad, "x").await.unwrap_err();
        assert!(matches!(err, RegistryError::InvalidName(_)), "{bad:?}: {err:?}");
    }
    Ok(())
}

#[tokio::test]
async fn test_storage_failure_leaves_memory_untouched() -> Result<(), Error> {
    let fx = BotFixture::builder()
        .custom(vec![CustomCommand::new("keep", "original")])
        .build()
        .await?;
    fx.custom_repo.set_fail_writes(true);

    assert!(matches!(
        fx.registry.add_custom("fresh", "x").await,
        Err(RegistryError::Storage(_))
    ));
    assert!(fx.registry.lookup("fresh").await.is_none());

    assert!(matches!(
        fx.registry.edit_custom("keep", "changed").await,
        Err(RegistryError::Storage(_))
    ));
    assert!(matches!(
        fx.registry.remove_custom("keep").await,
        Err(RegistryError::Storage(_))
    ));
    assert_eq!(custom_response(fx.registry.lookup("keep").await).as_deref(), Some("original"));
    Ok(())
}

#[tokio::test]
async fn test_edit_and_remove_missing_command() -> Result<(), Error> {
    let fx = BotFixture::new().await?;

    assert!(matches!(
        fx.registry.edit_custom("ghost", "boo").await,
        Err(RegistryError::NotFound(ref n)) if n == "ghost"
    ));
    assert!(matches!(
        fx.registry.remove_custom("ghost").await,
        Err(RegistryError::NotFound(_))
    ));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_create_then_invoke_then_delete_through_chat() -> Result<(), Error> {
    let fx = BotFixture::new().await?;
    let streamer = chatter(TEST_CHANNEL, &["broadcaster", "subscriber"]);
    let moderator = chatter("modder", &["moderator"]);
    let viewer = chatter("viewer", &[]);

    let created = fx
        .dispatcher
        .dispatch(TEST_CHANNEL, &streamer, "!command create greet Hello there")
        .await;
    assert_eq!(
        created,
        DispatchOutcome::Reply("Command 'greet' created with response: Hello there".into())
    );
    assert_eq!(custom_response(fx.registry.lookup("greet").await).as_deref(), Some("Hello there"));

    let greeted = fx.dispatcher.dispatch(TEST_CHANNEL, &viewer, "!greet").await;
    assert_eq!(greeted, DispatchOutcome::Reply("Hello there".into()));

    // Past the global window the create opened.
    tokio::time::advance(Duration::from_secs(11)).await;
    let deleted = fx
        .dispatcher
        .dispatch(TEST_CHANNEL, &moderator, "!command delete greet")
        .await;
    assert_eq!(deleted, DispatchOutcome::Reply("Command 'greet' deleted".into()));
    assert!(fx.registry.lookup("greet").await.is_none());

    let after = fx.dispatcher.dispatch(TEST_CHANNEL, &chatter("late", &[]), "!greet").await;
    assert_eq!(after, DispatchOutcome::Ignored);
    assert!(after.reply_text().is_none());
    Ok(())
}

#[tokio::test]
async fn test_manage_command_errors_are_reported() -> Result<(), Error> {
    let fx = BotFixture::new().await?;
    let streamer = chatter("streamer", &["broadcaster"]);

    let outcome = fx.dispatcher.dispatch(TEST_CHANNEL, &streamer, "!command").await;
    assert!(matches!(outcome, DispatchOutcome::ErrorReported(ref t) if t.starts_with("@streamer, usage: !command")));

    let outcome = fx.dispatcher.dispatch(TEST_CHANNEL, &streamer, "!command create lonely").await;
    assert!(matches!(outcome, DispatchOutcome::ErrorReported(ref t) if t.contains("usage:")));

    let outcome = fx.dispatcher.dispatch(TEST_CHANNEL, &streamer, "!command create uptime x").await;
    assert_eq!(
        outcome,
        DispatchOutcome::ErrorReported("@streamer, command 'uptime' already exists".into())
    );

    let outcome = fx.dispatcher.dispatch(TEST_CHANNEL, &streamer, "!command edit ghost x").await;
    assert_eq!(
        outcome,
        DispatchOutcome::ErrorReported("@streamer, command 'ghost' does not exist".into())
    );

    fx.custom_repo.set_fail_writes(true);
    let outcome = fx.dispatcher.dispatch(TEST_CHANNEL, &streamer, "!command create fine y").await;
    assert_eq!(
        outcome,
        DispatchOutcome::ErrorReported("@streamer, something went wrong... please try again later.".into())
    );
    Ok(())
}

#[tokio::test]
async fn test_edit_through_chat() -> Result<(), Error> {
    let fx = BotFixture::builder()
        .custom(vec![CustomCommand::new("so", "go follow ${user}")])
        .build()
        .await?;
    let streamer = chatter("streamer", &["broadcaster"]);

    let outcome = fx
        .dispatcher
        .dispatch(TEST_CHANNEL, &streamer, "!cmd edit so check out ${user}!")
        .await;
    assert_eq!(
        outcome,
        DispatchOutcome::Reply("Command 'so' updated with new response: check out ${user}!".into())
    );
    assert_eq!(fx.custom_repo.snapshot()[0].response, "check out ${user}!");
    Ok(())
}

#[test]
fn test_duplicate_builtin_tokens_are_rejected() {
    let mut builtins = default_commands();
    builtins.push(builtins[0].clone());
    let result = CommandRegistry::new(
        "!",
        builtins,
        Arc::new(MemoryBuiltinCommandRepository::new()),
        Arc::new(MemoryCustomCommandRepository::new()),
    );
    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn test_sync_reconciles_stored_catalog() -> Result<(), Error> {
    let stale = BuiltinCommandRecord {
        name: "retired".into(),
        aliases: vec![],
        permissions: vec![],
        description: "gone".into(),
        dynamic_description: vec![],
        global_cooldown: 10,
        user_cooldown: 30,
        enabled_offline: true,
        enabled_online: true,
        usage_count: 99,
    };
    let ping = to_record(default_commands()[0].as_ref(), "!");
    let mut outdated_title = to_record(default_commands()[2].as_ref(), "!");
    outdated_title.description = "old text".into();
    outdated_title.usage_count = 42;

    let builtin_repo = Arc::new(MemoryBuiltinCommandRepository::with_rows([
        stale,
        ping,
        outdated_title,
    ]));
    let registry = CommandRegistry::new(
        "!",
        default_commands(),
        builtin_repo.clone(),
        Arc::new(MemoryCustomCommandRepository::new()),
    )?;

    let report = registry.sync_to_storage().await?;
    let total = default_commands().len();
    assert_eq!(
        report,
        SyncReport {
            inserted: total - 2,
            updated: 1,
            deleted: 1,
            unchanged: 1,
            failed: 0,
        }
    );

    let rows = builtin_repo.snapshot();
    assert_eq!(rows.len(), total);
    assert!(!rows.contains_key("retired"));
    assert_eq!(rows["title"].description, "Get the title of the stream.");
    assert_eq!(rows["title"].usage_count, 42, "update keeps the usage counter");
    assert_eq!(rows["command"].permissions, vec![Permission::Broadcaster, Permission::Moderator]);

    // A second pass has nothing to do.
    let again = registry.sync_to_storage().await?;
    assert_eq!(again.unchanged, total);
    Ok(())
}

#[tokio::test]
async fn test_sync_counts_row_failures_and_continues() -> Result<(), Error> {
    let builtin_repo = Arc::new(MemoryBuiltinCommandRepository::new());
    builtin_repo.fail_writes_for("time");
    let registry = CommandRegistry::new(
        "!",
        default_commands(),
        builtin_repo.clone(),
        Arc::new(MemoryCustomCommandRepository::new()),
    )?;

    let report = registry.sync_to_storage().await?;
    assert_eq!(report.failed, 1);
    assert_eq!(report.inserted, default_commands().len() - 1);
    assert!(!builtin_repo.snapshot().contains_key("time"));
    Ok(())
}

#[tokio::test]
async fn test_sync_aborts_when_catalog_unreadable() -> Result<(), Error> {
    let builtin_repo = Arc::new(MemoryBuiltinCommandRepository::new());
    builtin_repo.set_fail_reads(true);
    let registry = CommandRegistry::new(
        "!",
        default_commands(),
        builtin_repo.clone(),
        Arc::new(MemoryCustomCommandRepository::new()),
    )?;

    assert!(registry.sync_to_storage().await.is_err());
    builtin_repo.set_fail_reads(false);
    assert!(builtin_repo.snapshot().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_catalog_joins_usage_counts() -> Result<(), Error> {
    let fx = BotFixture::builder()
        .custom(vec![CustomCommand::new("lurk", "enjoy the lurk")])
        .build()
        .await?;
    fx.registry.sync_to_storage().await?;

    fx.dispatcher.dispatch(TEST_CHANNEL, &chatter("alice", &[]), "!ping").await;
    fx.dispatcher.dispatch(TEST_CHANNEL, &chatter("alice", &[]), "!lurk").await;

    let catalog = fx.registry.catalog().await?;
    assert_eq!(catalog.default_commands.len(), default_commands().len());
    let ping = catalog.default_commands.iter().find(|c| c.name == "ping").unwrap();
    assert_eq!(ping.usage_count, 1);
    assert_eq!(catalog.custom_commands, vec![CustomCommand {
        name: "lurk".into(),
        response: "enjoy the lurk".into(),
        usage_count: 1,
    }]);

    match fx.registry.describe("category").await? {
        Some(CatalogEntry::Builtin(record)) => assert_eq!(record.name, "game"),
        other => panic!("expected built-in, got {other:?}"),
    }
    assert!(matches!(fx.registry.describe("lurk").await?, Some(CatalogEntry::Custom(_))));
    assert!(fx.registry.describe("nothing").await?.is_none());
    Ok(())
}
