// File: paladinbot-core/src/platforms/twitch_helix/client.rs

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use paladinbot_common::models::{ChannelInfo, LiveStream, TwitchUser};
use paladinbot_common::traits::api::PlatformApi;
use crate::Error;
use super::requests::{AppTokenResponse, ChannelData, HelixList, StreamData, UserData};

const HELIX_BASE_URL: &str = "https://api.twitch.tv/helix";
const OAUTH_TOKEN_URL: &str = "https://id.twitch.tv/oauth2/token";

/// Helix caps `login=` query parameters per request.
const MAX_LOGINS_PER_REQUEST: usize = 100;

/// Helix client authenticated with an app access token obtained through the
/// client-credentials flow.
pub struct TwitchHelixClient {
    http: ReqwestClient,
    client_id: String,
    client_secret: String,
    app_token: RwLock<Option<String>>,
}

impl TwitchHelixClient {
    pub fn new(client_id: &str, client_secret: &str) -> Self {
        Self {
            http: ReqwestClient::new(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            app_token: RwLock::new(None),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    async fn token(&self) -> Result<String, Error> {
        if let Some(token) = self.app_token.read().await.clone() {
            return Ok(token);
        }
        self.refresh_app_access_token().await?;
        self.app_token
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::Auth("no app access token after refresh".into()))
    }

    /// GET a Helix endpoint. A 401 triggers one token refresh and a retry.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = format!("{}/{}", HELIX_BASE_URL, path);

        for attempt in 0..2 {
            let token = self.token().await?;
            let resp = self
                .http
                .get(&url)
                .query(query)
                .header("Client-Id", &self.client_id)
                .bearer_auth(&token)
                .send()
                .await?;

            match resp.status() {
                StatusCode::UNAUTHORIZED if attempt == 0 => {
                    warn!(path, "Helix returned 401; refreshing app token");
                    self.refresh_app_access_token().await?;
                }
                status if status.is_success() => return Ok(resp.json::<T>().await?),
                status => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(Error::Platform(format!(
                        "Helix GET {} failed: HTTP {} => {}",
                        path, status, body
                    )));
                }
            }
        }
        Err(Error::Auth(format!("Helix GET {} unauthorized after token refresh", path)))
    }
}

#[async_trait]
impl PlatformApi for TwitchHelixClient {
    async fn resolve_users(&self, logins: &[String]) -> Result<Vec<TwitchUser>, Error> {
        let mut users = Vec::with_capacity(logins.len());
        for chunk in logins.chunks(MAX_LOGINS_PER_REQUEST) {
            let query: Vec<(&str, &str)> = chunk.iter().map(|l| ("login", l.as_str())).collect();
            let list: HelixList<UserData> = self.get("users", &query).await?;
            users.extend(list.data.into_iter().map(TwitchUser::from));
        }
        debug!("resolved {} of {} logins", users.len(), logins.len());
        Ok(users)
    }

    async fn get_channel_info(&self, broadcaster_id: &str) -> Result<Option<ChannelInfo>, Error> {
        let list: HelixList<ChannelData> = self
            .get("channels", &[("broadcaster_id", broadcaster_id)])
            .await?;
        Ok(list.data.into_iter().next().map(ChannelInfo::from))
    }

    async fn get_streams(&self, logins: &[String]) -> Result<Vec<LiveStream>, Error> {
        let mut streams = Vec::new();
        for chunk in logins.chunks(MAX_LOGINS_PER_REQUEST) {
            let query: Vec<(&str, &str)> = chunk.iter().map(|l| ("user_login", l.as_str())).collect();
            let list: HelixList<StreamData> = self.get("streams", &query).await?;
            streams.extend(list.data.into_iter().map(LiveStream::from));
        }
        Ok(streams)
    }

    async fn refresh_app_access_token(&self) -> Result<(), Error> {
        let resp = self
            .http
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "app token request failed: HTTP {} => {}",
                status, body
            )));
        }

        let token: AppTokenResponse = resp.json().await?;
        debug!(token_type = %token.token_type, "received app access token");
        *self.app_token.write().await = Some(token.access_token);
        info!("Helix app access token refreshed (expires in {}s)", token.expires_in);
        Ok(())
    }
}
