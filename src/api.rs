use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::error::QueuerError;
use crate::models::{
    AddPosition, CecCommand, CecConfig, CecPowerStatus, MessageResponse, PlaybackClient,
    PlaylistEntry, WolConfig,
};

const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

/// Thin wrapper over the backend's REST endpoints.
///
/// Every call either returns the decoded payload or a [`QueuerError`]. Status
/// codes other than the one each endpoint is documented to return are turned
/// into [`QueuerError::Backend`] carrying the backend's `message`, if any.
#[derive(Clone)]
pub struct ApiClient {
    client: Arc<Client>,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the backend at `base_url`. Optionally accepts a
    /// custom reqwest client for connection reuse.
    pub fn new(
        base_url: &str,
        request_timeout: Duration,
        custom_client: Option<Arc<Client>>,
    ) -> Result<Self, QueuerError> {
        let client = match custom_client {
            Some(client) => client,
            None => Arc::new(
                Client::builder()
                    .pool_idle_timeout(Some(POOL_IDLE_TIMEOUT))
                    .timeout(request_timeout)
                    .connect_timeout(request_timeout)
                    .build()?,
            ),
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // --- Playback clients ---

    /// `None` when the backend answers `null`, which it does when it has no
    /// list to give; an empty body or `[]` is an empty list.
    pub async fn list_clients(&self) -> Result<Option<Vec<PlaybackClient>>, QueuerError> {
        let response = self.client.get(self.url("/pbcs")).send().await?;
        let body = expect_status(response, StatusCode::OK).await?;
        if body.trim().is_empty() {
            return Ok(Some(Vec::new()));
        }
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn register_client(&self, name: &str) -> Result<PlaybackClient, QueuerError> {
        debug!("Registering playback client '{}'", name);
        let response = self
            .client
            .post(self.url("/pbcs/register"))
            .query(&[("name", name)])
            .send()
            .await?;
        let body = expect_status(response, StatusCode::OK).await?;
        Ok(serde_json::from_str(&body)?)
    }

    // --- Playlists ---

    pub async fn get_playlist(&self, client_id: &str) -> Result<Vec<PlaylistEntry>, QueuerError> {
        let response = self
            .client
            .get(self.url(&format!("/playlists/{}", client_id)))
            .send()
            .await?;

        match response.status() {
            StatusCode::NO_CONTENT => Ok(Vec::new()),
            StatusCode::OK => decode_list(&response.text().await?),
            _ => Err(backend_error(response).await),
        }
    }

    /// Queue `video_id`, returning the backend's confirmation message.
    pub async fn add_video(
        &self,
        client_id: &str,
        video_id: &str,
        position: AddPosition,
    ) -> Result<Option<String>, QueuerError> {
        let path = match position {
            AddPosition::Back => format!("/playlists/{}/{}", client_id, video_id),
            AddPosition::Front => format!("/playlists/{}/{}/next", client_id, video_id),
        };
        let response = self.client.post(self.url(&path)).send().await?;
        let body = expect_status(response, StatusCode::OK).await?;
        Ok(parse_message(&body))
    }

    pub async fn remove_video(&self, client_id: &str, video_id: &str) -> Result<(), QueuerError> {
        let response = self
            .client
            .delete(self.url(&format!("/playlists/{}/{}", client_id, video_id)))
            .send()
            .await?;
        expect_status(response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    pub async fn clear_playlist(&self, client_id: &str) -> Result<(), QueuerError> {
        let response = self
            .client
            .delete(self.url(&format!("/playlists/{}", client_id)))
            .send()
            .await?;
        expect_status(response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    /// Advance the queue head. `None` means the playlist is empty; a 404 means
    /// the backend no longer knows this playback client.
    pub async fn next_video(&self, client_id: &str) -> Result<Option<PlaylistEntry>, QueuerError> {
        let response = self
            .client
            .get(self.url(&format!("/playlists/{}/next", client_id)))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                Ok(Some(serde_json::from_str(&body)?))
            }
            StatusCode::NO_CONTENT => {
                trace!("Playlist for {} is empty", client_id);
                Ok(None)
            }
            StatusCode::NOT_FOUND => {
                warn!("Backend does not recognize playback client {}", client_id);
                Err(QueuerError::ClientNotRecognized)
            }
            _ => Err(backend_error(response).await),
        }
    }

    pub async fn peek_video(&self, client_id: &str) -> Result<Option<PlaylistEntry>, QueuerError> {
        let response = self
            .client
            .get(self.url(&format!("/playlists/{}/peek", client_id)))
            .send()
            .await?;
        decode_optional(response).await
    }

    // --- Wake On LAN ---

    pub async fn get_wol(&self, client_id: &str) -> Result<Option<WolConfig>, QueuerError> {
        let response = self
            .client
            .get(self.url(&format!("/wol/{}", client_id)))
            .send()
            .await?;
        decode_optional(response).await
    }

    pub async fn create_wol(&self, client_id: &str, wol: &WolConfig) -> Result<(), QueuerError> {
        let response = self
            .client
            .post(self.url(&format!("/wol/{}", client_id)))
            .query(&wol.query())
            .send()
            .await?;
        expect_status(response, StatusCode::CREATED).await?;
        Ok(())
    }

    pub async fn update_wol(&self, client_id: &str, wol: &WolConfig) -> Result<(), QueuerError> {
        let response = self
            .client
            .put(self.url(&format!("/wol/{}", client_id)))
            .query(&wol.query())
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn delete_wol(&self, client_id: &str) -> Result<(), QueuerError> {
        let response = self
            .client
            .delete(self.url(&format!("/wol/{}", client_id)))
            .send()
            .await?;
        expect_status(response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    pub async fn wake(&self, client_id: &str) -> Result<(), QueuerError> {
        let response = self
            .client
            .post(self.url(&format!("/wol/{}/wake", client_id)))
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await?;
        Ok(())
    }

    // --- CEC ---

    pub async fn get_cec(&self, client_id: &str) -> Result<Option<CecConfig>, QueuerError> {
        let response = self
            .client
            .get(self.url(&format!("/cec/{}", client_id)))
            .send()
            .await?;
        decode_optional(response).await
    }

    pub async fn create_cec(&self, client_id: &str, cec: &CecConfig) -> Result<(), QueuerError> {
        let response = self
            .client
            .post(self.url(&format!("/cec/{}", client_id)))
            .query(&cec.query())
            .send()
            .await?;
        expect_status(response, StatusCode::CREATED).await?;
        Ok(())
    }

    pub async fn update_cec(&self, client_id: &str, cec: &CecConfig) -> Result<(), QueuerError> {
        let response = self
            .client
            .put(self.url(&format!("/cec/{}", client_id)))
            .query(&cec.query())
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn delete_cec(&self, client_id: &str) -> Result<(), QueuerError> {
        let response = self
            .client
            .delete(self.url(&format!("/cec/{}", client_id)))
            .send()
            .await?;
        expect_status(response, StatusCode::NO_CONTENT).await?;
        Ok(())
    }

    pub async fn cec_power(&self, client_id: &str, command: CecCommand) -> Result<(), QueuerError> {
        let response = self
            .client
            .post(self.url(&format!("/cec/{}/power/{}", client_id, command.as_str())))
            .send()
            .await?;
        expect_status(response, StatusCode::OK).await?;
        Ok(())
    }

    pub async fn cec_power_status(&self, client_id: &str) -> Result<CecPowerStatus, QueuerError> {
        let response = self
            .client
            .get(self.url(&format!("/cec/{}/power/status", client_id)))
            .send()
            .await?;
        let body = expect_status(response, StatusCode::OK).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Read the body if the response carries `expected`, otherwise build the
/// backend error from it.
async fn expect_status(response: Response, expected: StatusCode) -> Result<String, QueuerError> {
    if response.status() != expected {
        return Err(backend_error(response).await);
    }
    Ok(response.text().await?)
}

async fn backend_error(response: Response) -> QueuerError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    debug!(status, body = %body, "Unexpected backend status");
    QueuerError::Backend {
        status,
        message: parse_message(&body),
    }
}

// 200 with a JSON body or 204 for "nothing configured"
async fn decode_optional<T: DeserializeOwned>(response: Response) -> Result<Option<T>, QueuerError> {
    match response.status() {
        StatusCode::NO_CONTENT => Ok(None),
        StatusCode::OK => {
            let body = response.text().await?;
            if body.trim().is_empty() {
                return Ok(None);
            }
            Ok(Some(serde_json::from_str(&body)?))
        }
        _ => Err(backend_error(response).await),
    }
}

// The backend encodes an empty list as an empty body or `null`
fn decode_list<T: DeserializeOwned>(body: &str) -> Result<Vec<T>, QueuerError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let list: Option<Vec<T>> = serde_json::from_str(trimmed)?;
    Ok(list.unwrap_or_default())
}

fn parse_message(body: &str) -> Option<String> {
    serde_json::from_str::<MessageResponse>(body)
        .ok()
        .and_then(|m| m.message)
        .filter(|m| !m.is_empty())
}
