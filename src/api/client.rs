use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use taskboard_common::{ActivityEntry, Lane, Member, Role, Sprint, WorkItem};
use tracing::debug;

use super::{
    AssignSprintRequest, BoardApi, CreateItemRequest, CreateLaneRequest, MoveItemRequest,
    UpdateItemRequest, UpdateMemberRequest,
};
use crate::config::ServerSettings;
use crate::errors::{BoardError, BoardResult};

const API_PREFIX: &str = "/api/v1";

/// HTTP implementation of `BoardApi`.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    request_timeout: Duration,
    comment_delete_timeout: Duration,
}

impl RestClient {
    pub fn new(settings: &ServerSettings) -> BoardResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(settings.request_timeout)
            .user_agent(concat!("taskboard/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| BoardError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            token: settings.token.clone(),
            request_timeout: settings.request_timeout,
            comment_delete_timeout: settings.comment_delete_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> (RequestBuilder, String) {
        let url = self.url(path);
        let mut builder = self.http.request(method, &url);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        (builder, url)
    }

    async fn execute(&self, builder: RequestBuilder, url: &str) -> BoardResult<reqwest::Response> {
        debug!(url, "backend request");
        let resp = builder.send().await.map_err(|source| {
            if source.is_timeout() {
                BoardError::Timeout {
                    url: url.to_string(),
                    timeout: self.request_timeout,
                }
            } else {
                BoardError::Http {
                    url: url.to_string(),
                    source,
                }
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(BoardError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, url: String) -> BoardResult<T> {
        self.execute(builder, &url)
            .await?
            .json::<T>()
            .await
            .map_err(|source| BoardError::Decode { url, source })
    }

    async fn send_empty(&self, builder: RequestBuilder, url: String) -> BoardResult<()> {
        self.execute(builder, &url).await.map(|_| ())
    }
}

#[async_trait]
impl BoardApi for RestClient {
    async fn list_lanes(&self, project_id: i64) -> BoardResult<Vec<Lane>> {
        let (req, url) = self.request(Method::GET, &format!("/projects/{}/lanes", project_id));
        self.send_json(req, url).await
    }

    async fn create_lane(&self, project_id: i64, body: &CreateLaneRequest) -> BoardResult<Lane> {
        let (req, url) = self.request(Method::POST, &format!("/projects/{}/lanes", project_id));
        self.send_json(req.json(body), url).await
    }

    async fn list_items(&self, project_id: i64) -> BoardResult<Vec<WorkItem>> {
        let (req, url) = self.request(Method::GET, &format!("/projects/{}/items", project_id));
        self.send_json(req, url).await
    }

    async fn create_item(&self, project_id: i64, body: &CreateItemRequest) -> BoardResult<WorkItem> {
        let (req, url) = self.request(Method::POST, &format!("/projects/{}/items", project_id));
        self.send_json(req.json(body), url).await
    }

    async fn update_item(&self, item_id: i64, body: &UpdateItemRequest) -> BoardResult<WorkItem> {
        let (req, url) = self.request(Method::PATCH, &format!("/items/{}", item_id));
        self.send_json(req.json(body), url).await
    }

    async fn delete_item(&self, item_id: i64) -> BoardResult<()> {
        let (req, url) = self.request(Method::DELETE, &format!("/items/{}", item_id));
        self.send_empty(req, url).await
    }

    async fn move_item(&self, item_id: i64, body: &MoveItemRequest) -> BoardResult<WorkItem> {
        let (req, url) = self.request(Method::PATCH, &format!("/items/{}/move", item_id));
        self.send_json(req.json(body), url).await
    }

    async fn assign_sprint(
        &self,
        item_id: i64,
        body: &AssignSprintRequest,
    ) -> BoardResult<WorkItem> {
        let (req, url) = self.request(Method::PATCH, &format!("/items/{}/sprint", item_id));
        self.send_json(req.json(body), url).await
    }

    async fn list_sprints(&self, project_id: i64) -> BoardResult<Vec<Sprint>> {
        let (req, url) = self.request(Method::GET, &format!("/projects/{}/sprints", project_id));
        self.send_json(req, url).await
    }

    async fn list_activity(&self, item_id: i64) -> BoardResult<Vec<ActivityEntry>> {
        let (req, url) = self.request(Method::GET, &format!("/items/{}/activity", item_id));
        self.send_json(req, url).await
    }

    async fn record_activity(&self, entry: &ActivityEntry) -> BoardResult<()> {
        let (req, url) = self.request(Method::POST, &format!("/items/{}/activity", entry.item_id));
        self.send_empty(req.json(entry), url).await
    }

    /// Bounded by `comment_delete_timeout` regardless of the client-wide
    /// request timeout.
    async fn delete_comment(&self, item_id: i64, comment_id: i64) -> BoardResult<()> {
        let (req, url) = self.request(
            Method::DELETE,
            &format!("/items/{}/comments/{}", item_id, comment_id),
        );
        let timeout = self.comment_delete_timeout;
        match tokio::time::timeout(timeout, self.send_empty(req, url.clone())).await {
            Ok(result) => result,
            Err(_) => Err(BoardError::Timeout { url, timeout }),
        }
    }

    async fn list_members(&self, project_id: i64) -> BoardResult<Vec<Member>> {
        let (req, url) = self.request(Method::GET, &format!("/projects/{}/members", project_id));
        self.send_json(req, url).await
    }

    async fn list_roles(&self, project_id: i64) -> BoardResult<Vec<Role>> {
        let (req, url) = self.request(Method::GET, &format!("/projects/{}/roles", project_id));
        self.send_json(req, url).await
    }

    async fn update_member_role(
        &self,
        member_id: i64,
        body: &UpdateMemberRequest,
    ) -> BoardResult<Member> {
        let (req, url) = self.request(Method::PATCH, &format!("/members/{}", member_id));
        self.send_json(req.json(body), url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_prefix_and_trims_slash() {
        let client = RestClient::new(&ServerSettings::for_url("http://localhost:9000/", 1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000");
        assert_eq!(
            client.url("/items/4/move"),
            "http://localhost:9000/api/v1/items/4/move"
        );
    }

    #[tokio::test]
    async fn test_delete_comment_times_out() {
        // Accepts connections but never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _accept = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let mut settings = ServerSettings::for_url(format!("http://{}", addr), 1);
        settings.comment_delete_timeout = Duration::from_millis(100);
        let client = RestClient::new(&settings).unwrap();
        let err = client.delete_comment(1, 2).await.unwrap_err();
        match err {
            BoardError::Timeout { url, timeout } => {
                assert!(url.ends_with("/items/1/comments/2"));
                assert_eq!(timeout, Duration::from_millis(100));
            }
            other => panic!("Expected Timeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_connection_refused_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = RestClient::new(&ServerSettings::for_url(format!("http://{}", addr), 1)).unwrap();
        let err = client.list_lanes(1).await.unwrap_err();
        assert!(matches!(err, BoardError::Http { .. }), "got {:?}", err);
    }
}
