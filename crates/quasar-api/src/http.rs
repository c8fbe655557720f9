use std::time::Duration;

use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::types::{ApiError, EndpointApi};
use crate::wire::{
    CreateEndpointRequest, ListEndpointsResponse, RemoteEndpoint, UpdateEndpointRequest,
};

pub const DEFAULT_API_URL: &str = "https://api.endpoints.huggingface.cloud/v2/endpoint";

#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    /// Base URL without the namespace segment.
    pub base_url: String,
    /// User or organization owning the endpoints.
    pub namespace: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl HttpApiConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            namespace: namespace.into(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// [`EndpointApi`] over the control plane's REST interface.
#[derive(Debug, Clone)]
pub struct HttpEndpointApi {
    client: Client,
    config: HttpApiConfig,
}

impl HttpEndpointApi {
    pub fn new(config: HttpApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    fn collection_url(&self) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.config.namespace)
        )
    }

    fn item_url(&self, name: &str) -> String {
        format!("{}/{}", self.collection_url(), urlencoding::encode(name))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.config.token {
            Some(t) => builder.bearer_auth(t),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let resp = builder.send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "control plane response");
        if status.is_success() {
            Ok(body)
        } else {
            Err(classify_failure(status, &body))
        }
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        let body = self.send(builder).await?;
        decode(&body)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Map a non-2xx response to an [`ApiError`].
///
/// 404 is `NotFound`. 400, 409 and 422 are rejections of the payload and carry
/// the server's message, taken from an `error` or `message` field when the body
/// is JSON. Anything else keeps its status and raw body.
pub fn classify_failure(status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
            ApiError::Validation(server_message(body))
        }
        other => ApiError::Status {
            status: other.as_u16(),
            body: body.to_string(),
        },
    }
}

fn server_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("message")))
        .and_then(|m| m.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait::async_trait]
impl EndpointApi for HttpEndpointApi {
    async fn list(&self) -> Result<Vec<RemoteEndpoint>, ApiError> {
        let url = self.collection_url();
        debug!(%url, "listing endpoints");
        let resp: ListEndpointsResponse = self.send_json(self.request(Method::GET, &url)).await?;
        Ok(resp.items)
    }

    async fn create(&self, req: &CreateEndpointRequest) -> Result<RemoteEndpoint, ApiError> {
        let url = self.collection_url();
        debug!(%url, name = %req.name, "creating endpoint");
        let builder = self.request(Method::POST, &url).json(req);
        self.send_json(builder).await
    }

    async fn get(&self, name: &str) -> Result<RemoteEndpoint, ApiError> {
        let url = self.item_url(name);
        debug!(%url, "fetching endpoint");
        self.send_json(self.request(Method::GET, &url)).await
    }

    async fn update(
        &self,
        name: &str,
        req: &UpdateEndpointRequest,
    ) -> Result<RemoteEndpoint, ApiError> {
        let url = self.item_url(name);
        debug!(%url, "updating endpoint");
        let builder = self.request(Method::PUT, &url).json(req);
        self.send_json(builder).await
    }

    async fn delete(&self, name: &str) -> Result<(), ApiError> {
        let url = self.item_url(name);
        debug!(%url, "deleting endpoint");
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }
}
