use super::types::{RoomDetail, RoomId, RoomListFilter, RoomStatistics, RoomSummary, UpdateRoomRequest};
use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the room directory
#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid endpoint '{path}': {source}")]
    InvalidEndpoint {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} returned {status}: {message}")]
    Api {
        endpoint: String,
        status: StatusCode,
        message: String,
    },

    #[error("unexpected response from {endpoint}: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
}

/// The room operations the janitor depends on
#[async_trait]
pub trait RoomDirectory: Send + Sync {
    async fn list_rooms(&self, filter: RoomListFilter) -> Result<Vec<RoomSummary>, DirectoryError>;

    async fn get_room(&self, id: RoomId) -> Result<RoomDetail, DirectoryError>;

    async fn get_room_statistics(&self, id: RoomId) -> Result<RoomStatistics, DirectoryError>;

    async fn update_room(&self, id: RoomId, request: &UpdateRoomRequest) -> Result<(), DirectoryError>;
}
