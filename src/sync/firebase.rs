// sync/firebase.rs

use crate::model::SyncError;
use crate::sync::RoomStore;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Rooms stored at `<database_url>/rooms/<room>.json` through the
/// Realtime Database REST API.
pub struct FirebaseRoomStore {
    client: Client,
    base_url: String,
    request_timeout: Duration,
}

impl FirebaseRoomStore {
    pub fn new(database_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: database_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn room_url(&self, room: &str) -> String {
        format!("{}/rooms/{}.json", self.base_url, room)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_else(|_| "unknown".into());
        warn!("❌ Room store responded [{}]: {}", status, body);
        Err(SyncError::Remote(format!("[{}] {}", status, body)))
    }
}

#[async_trait::async_trait]
impl RoomStore for FirebaseRoomStore {
    async fn write_room(&self, room: &str, body: Value) -> Result<(), SyncError> {
        let url = self.room_url(room);
        let response = timeout(self.request_timeout, self.client.put(&url).json(&body).send())
            .await
            .map_err(|_| SyncError::Remote(format!("PUT {} timed out", url)))??;
        Self::check(response).await?;
        debug!("PUT {} ok", url);
        Ok(())
    }

    async fn read_room(&self, room: &str) -> Result<Option<Value>, SyncError> {
        let url = self.room_url(room);
        let response = timeout(self.request_timeout, self.client.get(&url).send())
            .await
            .map_err(|_| SyncError::Remote(format!("GET {} timed out", url)))??;
        let value: Value = Self::check(response).await?.json().await?;
        Ok((!value.is_null()).then_some(value))
    }
}
