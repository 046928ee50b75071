pub mod catalog;
pub mod error;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::{
    audio::{engine::EngineState, error::PlayerError, traits::Backend},
    config::{PlayBodyFormat, PlayerConfig},
    model::{Track, TrackId},
};

pub use catalog::normalize_catalog;
pub use error::ApiError;

/// Credential payload. The backend answers in one of two shapes.
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Flat { access_token: String },
    Nested { data: TokenData },
}

#[derive(Deserialize)]
struct TokenData {
    token: String,
}

impl TokenResponse {
    fn into_token(self) -> String {
        match self {
            Self::Flat { access_token } => access_token,
            Self::Nested { data } => data.token,
        }
    }
}

/// HTTP client for the backend that proxies the streaming platform.
pub struct ApiService {
    client: Client,
    base_url: String,
    play_body: PlayBodyFormat,
}

impl ApiService {
    pub fn new(config: &PlayerConfig) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::InvalidUrl(base_url));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            play_body: config.play_body,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn fetch_tracks(&self) -> Result<Vec<Track>, ApiError> {
        let response = self.client.get(self.url("/api/tracks")).send().await?;
        let payload: Value = checked(response).await?.json().await?;
        let tracks = normalize_catalog(payload)?;
        info!(count = tracks.len(), "catalog fetched");
        Ok(tracks)
    }

    pub async fn fetch_token(&self) -> Result<String, ApiError> {
        let response = self.client.get(self.url("/spotify/token")).send().await?;
        let payload: Value = checked(response).await?.json().await?;
        serde_json::from_value::<TokenResponse>(payload)
            .map(TokenResponse::into_token)
            .map_err(|_| ApiError::Format("token response has no access token".to_string()))
    }

    pub async fn play(&self, track_id: &TrackId, device_id: Option<&str>) -> Result<(), ApiError> {
        let body = match self.play_body {
            PlayBodyFormat::TrackId => json!({ "trackId": track_id, "deviceId": device_id }),
            PlayBodyFormat::Uris => json!({ "uris": [track_uri(track_id)], "deviceId": device_id }),
        };
        debug!(%track_id, ?device_id, "PUT /spotify/play");
        let response = self
            .client
            .put(self.url("/spotify/play"))
            .json(&body)
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    pub async fn pause(&self, device_id: Option<&str>) -> Result<(), ApiError> {
        debug!(?device_id, "PUT /spotify/pause");
        let response = self
            .client
            .put(self.url("/spotify/pause"))
            .json(&json!({ "deviceId": device_id }))
            .send()
            .await?;
        checked(response).await?;
        Ok(())
    }

    /// Current engine state; `None` when nothing is loaded on the device.
    pub async fn fetch_player_state(
        &self,
        token: Option<&str>,
    ) -> Result<Option<EngineState>, ApiError> {
        let mut request = self.client.get(self.url("/spotify/state"));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let response = checked(request.send().await?).await?;
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let payload: Value = response.json().await?;
        if payload.is_null() {
            return Ok(None);
        }
        serde_json::from_value(payload)
            .map(Some)
            .map_err(|e| ApiError::Format(format!("player state: {e}")))
    }
}

#[async_trait]
impl Backend for ApiService {
    async fn fetch_catalog(&self) -> Result<Vec<Track>, PlayerError> {
        self.fetch_tracks().await.map_err(ApiError::into_catalog_error)
    }

    async fn fetch_token(&self) -> Result<String, PlayerError> {
        ApiService::fetch_token(self)
            .await
            .map_err(|e| PlayerError::CredentialFetch(e.to_string()))
    }

    async fn play(&self, track_id: &TrackId, device_id: Option<&str>) -> Result<(), PlayerError> {
        ApiService::play(self, track_id, device_id)
            .await
            .map_err(|e| PlayerError::Command(e.to_string()))
    }

    async fn pause(&self, device_id: Option<&str>) -> Result<(), PlayerError> {
        ApiService::pause(self, device_id)
            .await
            .map_err(|e| PlayerError::Command(e.to_string()))
    }
}

/// `spotify:track:<id>` unless `track_id` already is a platform URI.
pub fn track_uri(track_id: &TrackId) -> String {
    if track_id.as_str().starts_with("spotify:") {
        track_id.to_string()
    } else {
        format!("spotify:track:{track_id}")
    }
}

async fn checked(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}
