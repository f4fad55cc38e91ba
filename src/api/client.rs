//! RabbitMQ Management API HTTP 클라이언트
//!
//! 리소스마다 인증된 GET 요청을 한 번 보내고 JSON 응답을 디코딩합니다.
//! 재시도는 하지 않습니다.

use reqwest::{Client, ClientBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::records::{AlivenessStatus, Exchange, Node, Overview, Queue, Record, Shovel};
use crate::config::BrokerConfig;
use crate::error::ApiError;

/// API 작업 결과 타입
pub type ApiResult<T> = Result<T, ApiError>;

/// Management API HTTP 클라이언트
#[derive(Clone)]
pub struct ManagementClient {
    client: Client,
    base_url: Url,
    auth: Option<(String, String)>,
}

impl ManagementClient {
    /// 새 클라이언트 생성
    ///
    /// # Arguments
    /// * `base_url` - API 루트 URL (예: "http://localhost:15672/api")
    ///
    /// # Example
    /// ```ignore
    /// let client = ManagementClient::new("http://localhost:15672/api")?
    ///     .with_auth("guest", "guest");
    /// ```
    pub fn new(base_url: &str) -> ApiResult<Self> {
        let parsed = Url::parse(base_url).map_err(|e| ApiError::InvalidUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: base_url.to_string(),
                reason: "URL cannot carry a path".to_string(),
            });
        }

        let client = ClientBuilder::new()
            .build()
            .map_err(ApiError::HttpClientInit)?;

        Ok(Self {
            client,
            base_url: parsed,
            auth: None,
        })
    }

    /// 브로커 설정으로 클라이언트 생성 (Basic Auth 포함)
    pub fn from_config(config: &BrokerConfig) -> ApiResult<Self> {
        Ok(Self::new(&config.api_base_url())?.with_auth(&config.username, &config.password))
    }

    /// Basic Auth 설정
    pub fn with_auth(mut self, username: &str, password: &str) -> Self {
        self.auth = Some((username.to_string(), password.to_string()));
        self
    }

    /// 경로 세그먼트로 요청 URL 생성
    ///
    /// 세그먼트는 퍼센트 인코딩되므로 vhost `/`는 `%2F`가 됩니다.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// 임의 리소스 조회 (디코딩 전 JSON 값)
    pub async fn fetch(&self, segments: &[&str]) -> ApiResult<Value> {
        self.get(segments).await
    }

    /// 큐 목록 조회
    pub async fn queues(&self) -> ApiResult<Vec<Record<Queue>>> {
        self.get(&["queues"]).await
    }

    /// Exchange 목록 조회
    pub async fn exchanges(&self) -> ApiResult<Vec<Record<Exchange>>> {
        self.get(&["exchanges"]).await
    }

    /// 클러스터 노드 목록 조회
    pub async fn nodes(&self) -> ApiResult<Vec<Record<Node>>> {
        self.get(&["nodes"]).await
    }

    /// Shovel 목록 조회
    ///
    /// shovel 플러그인이 없으면 `ApiError::NotFound`를 반환합니다.
    pub async fn shovels(&self) -> ApiResult<Vec<Record<Shovel>>> {
        self.get(&["shovels"]).await
    }

    /// 클러스터 개요 조회
    pub async fn overview(&self) -> ApiResult<Overview> {
        self.get(&["overview"]).await
    }

    /// vhost aliveness 테스트
    pub async fn aliveness(&self, vhost: &str) -> ApiResult<AlivenessStatus> {
        self.get(&["aliveness-test", vhost]).await
    }

    #[instrument(skip(self, segments), fields(path = %segments.join("/")))]
    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<T> {
        let url = self.endpoint(segments);
        let path = segments.join("/");

        debug!(url = %url, host = ?self.base_url.host_str(), "Issuing management API call");

        let mut req = self.client.get(url);

        if let Some((username, password)) = &self.auth {
            req = req.basic_auth(username, Some(password));
        }

        let response = req.send().await.map_err(ApiError::Transport)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(path));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path,
            });
        }

        let body = response.bytes().await.map_err(ApiError::Transport)?;

        serde_json::from_slice(&body).map_err(|source| ApiError::Parse { path, source })
    }
}
