//! src/platforms/twitch_irc/runtime.rs
//!
//! Keeps one IRC connection to the bot's channel alive, publishes chat lines
//! on the event bus and implements the outbound side of the chat transport.

use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use paladinbot_common::models::{Chatter, SubscriptionNotice};
use paladinbot_common::traits::api::ChatSender;
use crate::Error;
use crate::eventbus::{BotEvent, EventBus};

use super::client::{IrcIncomingEvent, TwitchIrcClient};

const MAX_RECONNECT_BACKOFF: Duration = Duration::from_secs(60);
const DISCONNECT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub struct IrcCredentials {
    pub username: String,
    /// With or without the `oauth:` prefix.
    pub oauth_token: String,
}

pub struct TwitchIrcPlatform {
    credentials: IrcCredentials,
    channel: String,
    event_bus: EventBus,
    client: RwLock<Option<TwitchIrcClient>>,
}

impl TwitchIrcPlatform {
    pub fn new(credentials: IrcCredentials, channel: &str, event_bus: EventBus) -> Self {
        Self {
            credentials,
            channel: channel.trim_start_matches('#').to_lowercase(),
            event_bus,
            client: RwLock::new(None),
        }
    }

    /// Opens a connection, joins the channel and returns the incoming line
    /// stream. Any previous connection is shut down.
    pub async fn connect(&self) -> Result<mpsc::UnboundedReceiver<IrcIncomingEvent>, Error> {
        let username = self.credentials.username.to_lowercase();
        if username.is_empty() {
            return Err(Error::Auth("Twitch IRC credentials missing username".into()));
        }
        let token = if self.credentials.oauth_token.starts_with("oauth:") {
            self.credentials.oauth_token.clone()
        } else {
            format!("oauth:{}", self.credentials.oauth_token)
        };

        let client = TwitchIrcClient::connect(&username, &token)
            .await
            .map_err(|e| Error::Platform(format!("Twitch IRC connect failed: {}", e)))?;
        self.attach(client).await
    }

    /// Takes over an established session: joins the channel and returns its
    /// incoming line stream. Any previous session is shut down.
    pub async fn attach(&self, mut client: TwitchIrcClient) -> Result<mpsc::UnboundedReceiver<IrcIncomingEvent>, Error> {
        let incoming = client
            .incoming
            .take()
            .ok_or_else(|| Error::Platform("No incoming channel in TwitchIrcClient".into()))?;

        client.join_channel(&self.channel);
        info!(channel = %self.channel, "(TwitchIrcPlatform) connected and joined");

        if let Some(old) = self.client.write().await.replace(client) {
            old.shutdown();
        }
        Ok(incoming)
    }

    /// Drives the connection until shutdown: forwards chat lines to the event
    /// bus and reconnects with exponential backoff whenever the server hangs
    /// up. On shutdown only reading stops; the session stays open for replies
    /// of commands still running until `disconnect` is called.
    pub fn spawn(self: Arc<Self>, first: mpsc::UnboundedReceiver<IrcIncomingEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut shutdown_rx = self.event_bus.shutdown_rx.clone();
            let mut incoming = first;
            let mut backoff = Duration::from_secs(1);

            loop {
                if self.pump(&mut incoming, &mut shutdown_rx).await {
                    break;
                }
                warn!("(TwitchIrcPlatform) connection lost, reconnecting");

                incoming = loop {
                    tokio::select! {
                        _ = tokio::time::sleep(backoff) => {}
                        _ = shutdown_rx.changed() => {
                            self.disconnect().await;
                            return;
                        }
                    }
                    match self.connect().await {
                        Ok(rx) => {
                            backoff = Duration::from_secs(1);
                            break rx;
                        }
                        Err(e) => {
                            error!("(TwitchIrcPlatform) reconnect failed: {}", e);
                            backoff = (backoff * 2).min(MAX_RECONNECT_BACKOFF);
                        }
                    }
                };
            }

            info!("(TwitchIrcPlatform) stopped reading chat");
        })
    }

    /// Returns `true` when stopped by shutdown, `false` when the connection
    /// closed.
    async fn pump(
        &self,
        incoming: &mut mpsc::UnboundedReceiver<IrcIncomingEvent>,
        shutdown_rx: &mut tokio::sync::watch::Receiver<bool>,
    ) -> bool {
        if *shutdown_rx.borrow() {
            return true;
        }
        loop {
            tokio::select! {
                maybe_evt = incoming.recv() => {
                    let Some(evt) = maybe_evt else {
                        return false;
                    };
                    self.forward(evt).await;
                }
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        return true;
                    }
                }
            }
        }
    }

    async fn forward(&self, evt: IrcIncomingEvent) {
        match evt.command.as_str() {
            "PRIVMSG" => self.forward_chat(evt).await,
            "USERNOTICE" => self.forward_user_notice(evt).await,
            other => debug!("(TwitchIrcPlatform) ignoring {}", other),
        }
    }

    async fn forward_chat(&self, evt: IrcIncomingEvent) {
        let (Some(channel), Some(text), Some(login)) = (evt.channel, evt.text, evt.user_login) else {
            warn!("(TwitchIrcPlatform) incomplete PRIVMSG: {}", evt.raw_line);
            return;
        };
        let Some(id) = evt.user_id.as_deref().and_then(|id| id.parse::<i64>().ok()) else {
            warn!(user = %login, "(TwitchIrcPlatform) PRIVMSG without a numeric user-id");
            return;
        };

        let display_name = evt.display_name.unwrap_or_else(|| login.clone());
        let chatter = Chatter::new(id, login, display_name).with_badges(evt.badges);
        self.event_bus.publish_chat(&channel, chatter, &text).await;
    }

    /// Only `sub` and `resub` are announced; gifts, raids and the rest are
    /// dropped here.
    async fn forward_user_notice(&self, evt: IrcIncomingEvent) {
        let kind = match evt.msg_id.as_deref() {
            Some(kind @ ("sub" | "resub")) => kind.to_string(),
            other => {
                debug!(msg_id = ?other, "(TwitchIrcPlatform) ignoring USERNOTICE");
                return;
            }
        };
        let (Some(channel), Some(system_msg)) = (evt.channel, evt.system_msg) else {
            warn!("(TwitchIrcPlatform) incomplete USERNOTICE: {}", evt.raw_line);
            return;
        };

        let notice = SubscriptionNotice {
            channel,
            login: evt.user_login.unwrap_or_default(),
            kind,
            system_msg,
        };
        self.event_bus.publish(BotEvent::Subscription(notice)).await;
    }

    pub async fn disconnect(&self) {
        let client = self.client.write().await.take();
        if let Some(client) = client {
            client.close(DISCONNECT_FLUSH_TIMEOUT).await;
            info!("(TwitchIrcPlatform) disconnected");
        }
    }
}

#[async_trait]
impl ChatSender for TwitchIrcPlatform {
    async fn send_message(&self, channel: &str, text: &str) -> Result<(), Error> {
        let guard = self.client.read().await;
        match guard.as_ref() {
            Some(client) if !client.is_closed() => {
                if client.send_privmsg(channel, text) {
                    Ok(())
                } else {
                    Err(Error::Platform("Twitch IRC writer is gone".into()))
                }
            }
            _ => Err(Error::Platform("No active Twitch IRC connection".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
    use tokio::time::timeout;

    async fn line_starting_with(server: &mut BufReader<DuplexStream>, prefix: &str) -> String {
        let read = async {
            loop {
                let mut line = String::new();
                let n = server.read_line(&mut line).await.unwrap();
                assert!(n > 0, "session closed before {prefix:?}");
                if line.starts_with(prefix) {
                    return line.trim_end().to_string();
                }
            }
        };
        timeout(Duration::from_secs(2), read).await.expect("line not sent in time")
    }

    #[tokio::test]
    async fn replies_still_go_out_after_shutdown_until_disconnect() {
        let bus = EventBus::new();
        let mut events = bus.subscribe(None).await;
        let platform = Arc::new(TwitchIrcPlatform::new(
            IrcCredentials {
                username: "paladinbot".into(),
                oauth_token: "secret".into(),
            },
            "#TestChannel",
            bus.clone(),
        ));

        let (client_io, server_io) = tokio::io::duplex(8 * 1024);
        let mut server = BufReader::new(server_io);
        let client = TwitchIrcClient::from_stream(client_io, "paladinbot", "oauth:secret");
        let incoming = platform.attach(client).await.unwrap();
        let reader = platform.clone().spawn(incoming);
        line_starting_with(&mut server, "JOIN #testchannel").await;

        server
            .get_mut()
            .write_all(b"@badges=moderator/1;display-name=Alice;user-id=42 :alice!alice@alice.tmi.twitch.tv PRIVMSG #testchannel :!ping\r\n")
            .await
            .unwrap();
        let event = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
        let BotEvent::ChatMessage(msg) = event else {
            panic!("expected a chat message");
        };
        assert_eq!(msg.chatter.id, 42);
        assert_eq!(msg.chatter.badges, vec!["moderator".to_string()]);
        assert_eq!(msg.text, "!ping");

        bus.shutdown();
        timeout(Duration::from_secs(2), reader).await.unwrap().unwrap();

        // A command still finishing after shutdown can answer.
        platform.send_message("testchannel", "pong, late").await.unwrap();
        assert_eq!(
            line_starting_with(&mut server, "PRIVMSG").await,
            "PRIVMSG #testchannel :pong, late"
        );

        platform.disconnect().await;
        assert!(platform.send_message("testchannel", "too late").await.is_err());
    }

    #[tokio::test]
    async fn subscription_notices_are_published() {
        let bus = EventBus::new();
        let mut events = bus.subscribe(None).await;
        let platform = Arc::new(TwitchIrcPlatform::new(
            IrcCredentials {
                username: "paladinbot".into(),
                oauth_token: "secret".into(),
            },
            "testchannel",
            bus.clone(),
        ));

        let (client_io, server_io) = tokio::io::duplex(8 * 1024);
        let mut server = BufReader::new(server_io);
        let client = TwitchIrcClient::from_stream(client_io, "paladinbot", "oauth:secret");
        let incoming = platform.attach(client).await.unwrap();
        let reader = platform.clone().spawn(incoming);
        line_starting_with(&mut server, "JOIN #testchannel").await;

        // A gift notice is not announced; the resub after it is.
        server
            .get_mut()
            .write_all(b"@login=gifter;msg-id=submysterygift;system-msg=gifter\\sis\\sgifting\\s5\\ssubs :tmi.twitch.tv USERNOTICE #testchannel\r\n")
            .await
            .unwrap();
        server
            .get_mut()
            .write_all(b"@login=alice;msg-id=resub;system-msg=alice\\ssubscribed\\sfor\\s3\\smonths!;user-id=42 :tmi.twitch.tv USERNOTICE #testchannel :hi\r\n")
            .await
            .unwrap();

        let event = timeout(Duration::from_secs(2), events.recv()).await.unwrap().unwrap();
        let BotEvent::Subscription(notice) = event else {
            panic!("expected a subscription notice");
        };
        assert_eq!(
            notice,
            SubscriptionNotice {
                channel: "testchannel".into(),
                login: "alice".into(),
                kind: "resub".into(),
                system_msg: "alice subscribed for 3 months!".into(),
            }
        );

        bus.shutdown();
        timeout(Duration::from_secs(2), reader).await.unwrap().unwrap();
        platform.disconnect().await;
    }
}
