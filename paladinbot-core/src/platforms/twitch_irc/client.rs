//! src/platforms/twitch_irc/client.rs

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter, split};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use tokio_native_tls::native_tls;
use tokio_native_tls::TlsConnector;
use tracing::{info, error, debug};

const TWITCH_IRC_HOST: &str = "irc.chat.twitch.tv";
const TWITCH_IRC_TLS_PORT: u16 = 6697;

/// Minimal representation of a parsed IRC message from Twitch.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTwitchMsg {
    pub tags: Option<String>,
    pub prefix: Option<String>,
    pub command: String,
    pub params: Vec<String>,
    pub trailing: Option<String>,
}

impl ParsedTwitchMsg {
    pub fn parse_irc_line(line: &str) -> Self {
        let mut rest = line.trim();
        let mut tags = None;
        let mut prefix = None;
        let mut command = String::new();
        let mut params = Vec::new();
        let mut trailing = None;

        if rest.starts_with('@') {
            match rest.split_once(' ') {
                Some((t, after)) => {
                    tags = Some(t.to_string());
                    rest = after;
                }
                None => {
                    return Self { tags: Some(rest.to_string()), prefix, command, params, trailing };
                }
            }
        }

        if rest.starts_with(':') {
            match rest.split_once(' ') {
                Some((p, after)) => {
                    prefix = Some(p.trim_start_matches(':').to_string());
                    rest = after;
                }
                None => {
                    prefix = Some(rest.trim_start_matches(':').to_string());
                    return Self { tags, prefix, command, params, trailing };
                }
            }
        }

        let mut parts = rest.splitn(2, ' ');
        if let Some(cmd) = parts.next() {
            command = cmd.to_string();
        }
        rest = parts.next().unwrap_or("");

        if let Some(stripped) = rest.strip_prefix(':') {
            trailing = Some(stripped.to_string());
        } else if let Some(idx) = rest.find(" :") {
            trailing = Some(rest[idx + 2..].to_string());
            params.extend(rest[..idx].split_whitespace().map(|s| s.to_string()));
        } else {
            params.extend(rest.split_whitespace().map(|s| s.to_string()));
        }

        Self { tags, prefix, command, params, trailing }
    }

    pub fn tag(&self, key: &str) -> Option<String> {
        self.tags.as_deref().and_then(|t| extract_tag_value(t, key))
    }

    /// Nick from a `nick!user@host` prefix.
    pub fn nick(&self) -> Option<&str> {
        let prefix = self.prefix.as_deref()?;
        Some(prefix.split_once('!').map_or(prefix, |(nick, _)| nick))
    }
}

/// A chat line as read off the socket, before it is turned into a
/// `ChatMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct IrcIncomingEvent {
    pub command: String,
    /// Without the leading `#`.
    pub channel: Option<String>,
    pub user_id: Option<String>,
    pub user_login: Option<String>,
    pub display_name: Option<String>,
    pub badges: Vec<String>,
    pub text: Option<String>,
    /// `msg-id` tag; names the kind of a `USERNOTICE`.
    pub msg_id: Option<String>,
    /// `system-msg` tag of a `USERNOTICE`.
    pub system_msg: Option<String>,
    pub raw_line: String,
}

impl IrcIncomingEvent {
    pub fn from_parsed(parsed: &ParsedTwitchMsg, raw_line: &str) -> Self {
        let command = parsed.command.to_uppercase();
        let channel = parsed
            .params
            .first()
            .map(|c| c.trim_start_matches('#').to_lowercase());
        // USERNOTICE comes from the server; the user is in the `login` tag.
        let user_login = parsed
            .tag("login")
            .filter(|l| !l.is_empty())
            .or_else(|| parsed.nick().map(str::to_string))
            .map(|n| n.to_lowercase());
        let display_name = parsed.tag("display-name").filter(|d| !d.is_empty());
        let badges = parsed
            .tag("badges")
            .map(|b| parse_badges(&b))
            .unwrap_or_default();

        Self {
            command,
            channel,
            user_id: parsed.tag("user-id"),
            user_login,
            display_name,
            badges,
            text: parsed.trailing.clone(),
            msg_id: parsed.tag("msg-id").filter(|m| !m.is_empty()),
            system_msg: parsed.tag("system-msg").filter(|m| !m.is_empty()),
            raw_line: raw_line.to_string(),
        }
    }
}

/// Low-level IRC client that connects to Twitch via TLS.
pub struct TwitchIrcClient {
    raw_outgoing: mpsc::UnboundedSender<String>,

    /// Taken once by whoever drives the connection.
    pub incoming: Option<mpsc::UnboundedReceiver<IrcIncomingEvent>>,

    read_task: JoinHandle<()>,
    write_task: JoinHandle<()>,
}

impl TwitchIrcClient {
    /// Connects to Twitch IRC over TLS, sends PASS/NICK/CAP and spawns the
    /// read and write tasks. The incoming channel closes when the server
    /// hangs up or asks us to reconnect.
    pub async fn connect(username: &str, oauth_token: &str) -> io::Result<Self> {
        let tcp = TcpStream::connect((TWITCH_IRC_HOST, TWITCH_IRC_TLS_PORT))
            .await
            .map_err(|e| io::Error::other(format!("TCP connect error: {e}")))?;

        let native_connector = native_tls::TlsConnector::new()
            .map_err(|e| io::Error::other(format!("TLSConnector::new() => {e}")))?;
        let connector = TlsConnector::from(native_connector);

        let tls_stream = connector
            .connect(TWITCH_IRC_HOST, tcp)
            .await
            .map_err(|e| io::Error::other(format!("TLS connect() => {e}")))?;

        Ok(Self::from_stream(tls_stream, username, oauth_token))
    }

    /// Runs the IRC session over an already established stream.
    pub fn from_stream<S>(stream: S, username: &str, oauth_token: &str) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        let (read_half, write_half) = split(stream);

        let (tx_outgoing, rx_outgoing) = mpsc::unbounded_channel::<String>();
        let (tx_incoming, rx_incoming) = mpsc::unbounded_channel::<IrcIncomingEvent>();

        let write_task = tokio::spawn(Self::writer_loop(write_half, rx_outgoing));

        tx_outgoing.send(format!("PASS {}", oauth_token)).ok();
        tx_outgoing.send(format!("NICK {}", username)).ok();
        tx_outgoing.send("CAP REQ :twitch.tv/commands twitch.tv/tags".to_string()).ok();

        let read_task = tokio::spawn(Self::reader_loop(read_half, tx_incoming, tx_outgoing.clone()));

        Self {
            raw_outgoing: tx_outgoing,
            incoming: Some(rx_incoming),
            read_task,
            write_task,
        }
    }

    async fn reader_loop<R>(
        read_half: R,
        tx_incoming: mpsc::UnboundedSender<IrcIncomingEvent>,
        tx_outgoing: mpsc::UnboundedSender<String>,
    )
    where
        R: tokio::io::AsyncRead + Unpin,
    {
        let mut reader = BufReader::new(read_half);
        let mut line_buffer = String::new();

        loop {
            line_buffer.clear();
            match reader.read_line(&mut line_buffer).await {
                Ok(0) => {
                    info!("(TwitchIrcClient) read_loop => EOF");
                    break;
                }
                Ok(_) => {
                    let line = line_buffer.trim_end();
                    if line.is_empty() {
                        continue;
                    }
                    debug!("<< {}", line);

                    let parsed = ParsedTwitchMsg::parse_irc_line(line);
                    match parsed.command.to_uppercase().as_str() {
                        "PING" => {
                            let payload = parsed.trailing.as_deref().unwrap_or("tmi.twitch.tv");
                            tx_outgoing.send(format!("PONG :{}", payload)).ok();
                            continue;
                        }
                        "RECONNECT" => {
                            info!("(TwitchIrcClient) server requested reconnect");
                            break;
                        }
                        "NOTICE" if parsed.trailing.as_deref().is_some_and(|t| t.contains("Login authentication failed")) => {
                            error!("(TwitchIrcClient) login authentication failed");
                            break;
                        }
                        _ => {}
                    }

                    // Nobody reads lines while shutting down; keep the session
                    // alive for outgoing replies and PONGs.
                    if tx_incoming.send(IrcIncomingEvent::from_parsed(&parsed, line)).is_err() {
                        debug!("(TwitchIrcClient) no listener, line dropped");
                    }
                }
                Err(e) => {
                    error!("(TwitchIrcClient) read error => {:?}", e);
                    break;
                }
            }
        }

        info!("(TwitchIrcClient) reader_loop ended.");
    }

    async fn writer_loop<W>(mut write_half: W, mut rx_outgoing: mpsc::UnboundedReceiver<String>)
    where
        W: tokio::io::AsyncWrite + Unpin,
    {
        let mut writer = BufWriter::new(&mut write_half);

        while let Some(line) = rx_outgoing.recv().await {
            if line.starts_with("PASS ") {
                debug!(">> PASS ***");
            } else {
                debug!(">> {}", line);
            }
            let written = async {
                writer.write_all(line.as_bytes()).await?;
                writer.write_all(b"\r\n").await?;
                writer.flush().await
            }
            .await;
            if let Err(e) = written {
                error!("writer error => {:?}", e);
                break;
            }
        }

        info!("(TwitchIrcClient) writer_loop ended.");
    }

    pub fn send_raw_line(&self, line: &str) -> bool {
        self.raw_outgoing.send(line.to_string()).is_ok()
    }

    pub fn join_channel(&self, channel: &str) -> bool {
        self.send_raw_line(&format!("JOIN #{}", channel.trim_start_matches('#')))
    }

    pub fn send_privmsg(&self, channel: &str, message: &str) -> bool {
        // IRC lines cannot carry newlines
        let message = message.replace(['\r', '\n'], " ");
        self.send_raw_line(&format!("PRIVMSG #{} :{}", channel.trim_start_matches('#'), message))
    }

    pub fn is_closed(&self) -> bool {
        self.raw_outgoing.is_closed() || self.read_task.is_finished()
    }

    pub fn shutdown(self) {
        self.read_task.abort();
        self.write_task.abort();
    }

    /// Stops reading, lets the writer flush what is already queued, then
    /// closes the session.
    pub async fn close(self, flush_timeout: std::time::Duration) {
        self.read_task.abort();
        let _ = self.read_task.await;
        drop(self.raw_outgoing);
        let mut write_task = self.write_task;
        if tokio::time::timeout(flush_timeout, &mut write_task).await.is_err() {
            write_task.abort();
        }
    }
}

/// Value of `key` in a tag string like `@badge-info=;user-id=1234;...`,
/// with IRCv3 escapes undone.
fn extract_tag_value(tag_str: &str, key: &str) -> Option<String> {
    tag_str
        .trim_start_matches('@')
        .split(';')
        .filter_map(|kv| kv.split_once('=').or(Some((kv, ""))))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| unescape_tag_value(v))
}

fn unescape_tag_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// `broadcaster/1,subscriber/12` -> `["broadcaster", "subscriber"]`
pub fn parse_badges(raw: &str) -> Vec<String> {
    raw.split(',')
        .filter_map(|b| b.split('/').next())
        .filter(|b| !b.is_empty())
        .map(|b| b.to_string())
        .collect()
}
