use super::directory::{DirectoryError, RoomDirectory};
use super::types::{
    ApiErrorEnvelope, RoomDetail, RoomId, RoomList, RoomListFilter, RoomStatistics, RoomSummary,
    UpdateRoomRequest,
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

/// Whether HTTPS certificates are checked on requests to the HipChat server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TlsVerification {
    #[default]
    Verify,
    /// Accept any certificate, e.g. a self-hosted server with a self-signed one
    Skip,
}

/// Client for the HipChat v2 REST API
#[derive(Clone)]
pub struct HipChatClient {
    client: Client,
    token: String,
    base_url: Url,
}

impl HipChatClient {
    /// `base_url` points at the API root, e.g. `https://hipchat.example.com/v2/`
    pub fn new(token: String, base_url: Url, tls: TlsVerification) -> Result<Self, DirectoryError> {
        let mut builder = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));

        if tls == TlsVerification::Skip {
            tracing::warn!("Certificate verification is disabled for requests to {}", base_url);
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(DirectoryError::Client)?;

        Ok(Self {
            client,
            token,
            base_url: with_trailing_slash(base_url),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, DirectoryError> {
        self.base_url
            .join(path)
            .map_err(|source| DirectoryError::InvalidEndpoint {
                path: path.to_string(),
                source,
            })
    }

    /// Send an authenticated request, turning non-2xx responses into errors
    async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, DirectoryError> {
        let response = request
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await
            .map_err(|source| DirectoryError::Transport {
                endpoint: endpoint.to_string(),
                source,
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorEnvelope>(&body) {
            Ok(envelope) if envelope.error.kind.is_empty() => envelope.error.message,
            Ok(envelope) => format!("{}: {}", envelope.error.kind, envelope.error.message),
            Err(_) => body,
        };

        Err(DirectoryError::Api {
            endpoint: endpoint.to_string(),
            status,
            message,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, DirectoryError> {
        let url = self.endpoint(path)?;
        let endpoint = url.path().to_string();

        let response = self
            .send(&endpoint, self.client.get(url).query(query))
            .await?;

        response
            .json::<T>()
            .await
            .map_err(|source| DirectoryError::Decode { endpoint, source })
    }
}

#[async_trait]
impl RoomDirectory for HipChatClient {
    /// List rooms. Only the first page is read.
    async fn list_rooms(&self, filter: RoomListFilter) -> Result<Vec<RoomSummary>, DirectoryError> {
        let list: RoomList = self.get_json("room", &filter.query()).await?;
        Ok(list.items)
    }

    async fn get_room(&self, id: RoomId) -> Result<RoomDetail, DirectoryError> {
        self.get_json(&format!("room/{}", id), &[]).await
    }

    async fn get_room_statistics(&self, id: RoomId) -> Result<RoomStatistics, DirectoryError> {
        self.get_json(&format!("room/{}/statistics", id), &[]).await
    }

    async fn update_room(&self, id: RoomId, request: &UpdateRoomRequest) -> Result<(), DirectoryError> {
        let url = self.endpoint(&format!("room/{}", id))?;
        let endpoint = url.path().to_string();

        self.send(&endpoint, self.client.put(url).json(request)).await?;
        Ok(())
    }
}

/// `Url::join` drops the last path segment unless it ends in a slash
fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
