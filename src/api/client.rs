//! reqwest transport for the commit pipeline.

use super::server::USER_HEADER;
use crate::libs::board::BoardSnapshot;
use crate::libs::commit::MoveTransport;
use crate::libs::config::ClientConfig;
use crate::libs::error::{CommitError, ErrorBody};
use crate::libs::move_task::{MoveRequest, MoveResponse};
use crate::libs::task::{BoardId, UserId};
use anyhow::Result;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct HttpTransport {
    client: Client,
    api_url: String,
    user_id: UserId,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_millis(config.timeout_ms)).build()?;

        Ok(HttpTransport {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            user_id: config.user_id,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CommitError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let text = response.text().await.unwrap_or_default();
        let body = serde_json::from_str::<ErrorBody>(&text)
            .unwrap_or_else(|_| ErrorBody::new(status.canonical_reason().unwrap_or("Request failed")));
        Err(CommitError::from_response(status.as_u16(), body))
    }
}

impl MoveTransport for HttpTransport {
    async fn send_move(&self, request: &MoveRequest) -> Result<MoveResponse, CommitError> {
        let response = self
            .client
            .post(self.url("/api/tasks/move"))
            .header(USER_HEADER, self.user_id.to_string())
            .json(request)
            .send()
            .await?;

        Self::decode(response).await
    }

    async fn fetch_board(&self, board_id: BoardId) -> Result<BoardSnapshot, CommitError> {
        let response = self
            .client
            .get(self.url(&format!("/api/boards/{}/tasks", board_id)))
            .header(USER_HEADER, self.user_id.to_string())
            .send()
            .await?;

        Self::decode(response).await
    }
}
