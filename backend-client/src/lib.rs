//! HTTP implementation of [`RecordStore`].

use async_trait::async_trait;
use leaddesk_core::LeaddeskConfig;
use leaddesk_core::RecordStore;
use leaddesk_core::SessionContext;
use leaddesk_core::StoreError;
use leaddesk_protocol::BulkDeleteRequest;
use leaddesk_protocol::BulkDeleteResponse;
use leaddesk_protocol::BulkUpdateRequest;
use leaddesk_protocol::BulkUpdateResponse;
use leaddesk_protocol::Lead;
use leaddesk_protocol::LeadPatch;
use leaddesk_protocol::ListParams;
use leaddesk_protocol::ListResponse;
use reqwest::RequestBuilder;
use reqwest::Response;
use reqwest::StatusCode;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;
use tracing::warn;
use url::Url;

#[derive(Clone)]
pub struct HttpRecordStore {
    http: reqwest::Client,
    base_url: Url,
    session: SessionContext,
}

impl HttpRecordStore {
    pub fn new(config: &LeaddeskConfig, session: SessionContext) -> Result<Self, StoreError> {
        let base_url = Url::parse(&config.base_url).map_err(|err| {
            StoreError::Transport(format!("invalid base url '{}': {err}", config.base_url))
        })?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|err| StoreError::Transport(err.to_string()))?;
        Ok(Self {
            http,
            base_url,
            session,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    fn url(&self, segments: &[&str]) -> Result<Url, StoreError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                StoreError::Transport(format!("base url '{}' cannot have a path", self.base_url))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> Result<RequestBuilder, StoreError> {
        if !self.session.is_active() {
            return Err(StoreError::Unauthorized {
                message: "session has ended".to_string(),
            });
        }
        Ok(match self.session.api_token() {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        })
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        what: &str,
    ) -> Result<T, StoreError> {
        let resp = self
            .authorize(request)?
            .send()
            .await
            .map_err(|err| transport_error(what, &err))?;
        let resp = check_status(resp, what).await?;
        resp.json().await.map_err(|err| {
            warn!("{what} response could not be decoded: {err}");
            StoreError::Decode(err.to_string())
        })
    }
}

#[async_trait]
impl RecordStore for HttpRecordStore {
    async fn list(&self, params: &ListParams) -> Result<ListResponse, StoreError> {
        let url = self.url(&["records"])?;
        debug!(unit = %params.unit_id, skip = params.skip, limit = params.limit, "GET /records");
        self.send(self.http.get(url).query(params), "list").await
    }

    async fn update(&self, id: &str, patch: &LeadPatch) -> Result<Lead, StoreError> {
        let url = self.url(&["records", id])?;
        debug!(lead = id, "PATCH /records/{{id}}");
        self.send(self.http.patch(url).json(patch), "update").await
    }

    async fn bulk_update(
        &self,
        request: &BulkUpdateRequest,
    ) -> Result<BulkUpdateResponse, StoreError> {
        let url = self.url(&["records", "bulk"])?;
        debug!(count = request.ids.len(), "PATCH /records/bulk");
        self.send(self.http.patch(url).json(request), "bulk update").await
    }

    async fn bulk_delete(
        &self,
        request: &BulkDeleteRequest,
    ) -> Result<BulkDeleteResponse, StoreError> {
        let url = self.url(&["records", "bulk-delete"])?;
        debug!(count = request.ids.len(), "POST /records/bulk-delete");
        self.send(self.http.post(url).json(request), "bulk delete").await
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn transport_error(what: &str, err: &reqwest::Error) -> StoreError {
    warn!("{what} request failed: {err}");
    StoreError::Transport(err.to_string())
}

async fn check_status(resp: Response, what: &str) -> Result<Response, StoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!("{what} request failed: {status} - {message}");
    Err(map_status(status, message))
}

/// Prefers a `message` or `error` field of a JSON body, then the raw body,
/// then the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body)
        && let Some(message) = parsed.message.or(parsed.error)
    {
        return message;
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("request failed").to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_status(status: StatusCode, message: String) -> StoreError {
    match status {
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
            StoreError::Validation { message }
        }
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => StoreError::Unauthorized { message },
        _ => StoreError::Status {
            status: status.as_u16(),
            message,
        },
    }
}
