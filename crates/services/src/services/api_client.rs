//! Shared HTTP client for the Plant Planner API.
//!
//! Every call performs exactly one request, parses the `{ data, error, meta }`
//! envelope and either yields the data or a classified [`ApiError`]. Nothing is
//! retried here. Cancellation is by dropping the returned future, which aborts
//! the underlying request.

use std::sync::Arc;

use reqwest::{
    Client, Method, RequestBuilder, Response, StatusCode,
    cookie::{CookieStore, Jar},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, warn};
use url::Url;
use utils::response::{ApiEnvelope, EnvelopeBody, ResponseMeta};

use super::{api_error::ApiError, config::ClientConfig};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Successful call: the envelope data plus correlation info.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub request_id: Option<String>,
    pub meta: Option<ResponseMeta>,
}

impl<T> ApiResponse<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            request_id: self.request_id,
            meta: self.meta,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: Url,
    cookies: Arc<Jar>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut base_url = Url::parse(&config.base_url)
            .map_err(|e| ApiError::network(format!("invalid base url {}: {e}", config.base_url)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let cookies = Arc::new(Jar::default());
        let http = Client::builder()
            .timeout(config.request_timeout())
            .user_agent(config.user_agent.clone())
            .cookie_provider(cookies.clone())
            .build()
            .map_err(|e| ApiError::network(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            cookies,
        })
    }

    /// Session cookies as a single `Cookie` header value, for persisting a sign-in.
    pub fn export_session(&self) -> Option<String> {
        self.cookies
            .cookies(&self.base_url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }

    /// Restore cookies previously returned by [`ApiClient::export_session`].
    pub fn import_session(&self, cookie_header: &str) {
        for pair in cookie_header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.cookies.add_cookie_str(pair, &self.base_url);
        }
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::network(format!("invalid request path {path}: {e}")))?;
        Ok(self.http.request(method, url))
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<ApiResponse<T>, ApiError> {
        self.execute(self.request(Method::GET, path)?).await
    }

    pub(crate) async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.execute(self.request(Method::GET, path)?.query(query)).await
    }

    pub(crate) async fn send_json<T, B>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse<T>, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.execute(self.request(method, path)?.json(body)).await
    }

    /// Send a request parsing the envelope into `T`.
    pub(crate) async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let (status, header_request_id, body) = self.dispatch(request).await?;
        parse_envelope(status, header_request_id, &body)
    }

    /// Send a request whose success carries no meaningful data. A 204 or an
    /// empty body is success; anything else must still be a valid envelope.
    pub(crate) async fn execute_empty(&self, request: RequestBuilder) -> Result<ApiResponse<()>, ApiError> {
        let (status, header_request_id, body) = self.dispatch(request).await?;
        let empty = status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace);
        if status.is_success() && empty {
            return Ok(ApiResponse {
                data: (),
                request_id: header_request_id,
                meta: None,
            });
        }
        parse_envelope::<serde_json::Value>(status, header_request_id, &body).map(|r| r.map(|_| ()))
    }

    async fn dispatch(
        &self,
        request: RequestBuilder,
    ) -> Result<(StatusCode, Option<String>, Vec<u8>), ApiError> {
        let res = request.send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        let header_request_id = request_id_header(&res);
        debug!(
            url = %res.url().path(),
            status = status.as_u16(),
            request_id = header_request_id.as_deref().unwrap_or("-"),
            "api response"
        );
        let body = res.bytes().await.map_err(map_reqwest_error)?;
        Ok((status, header_request_id, body.to_vec()))
    }
}

fn request_id_header(res: &Response) -> Option<String> {
    res.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn parse_envelope<T: DeserializeOwned>(
    status: StatusCode,
    header_request_id: Option<String>,
    body: &[u8],
) -> Result<ApiResponse<T>, ApiError> {
    let status_code = status.as_u16();
    let envelope: ApiEnvelope<T> = serde_json::from_slice(body).map_err(|e| {
        warn!(status = status_code, error = %e, "unparseable api response");
        ApiError::parse(
            format!("invalid response body: {e}"),
            Some(status_code),
            header_request_id.clone(),
        )
    })?;

    let (body, meta) = envelope.into_body().map_err(|e| {
        warn!(status = status_code, error = %e, "api envelope contract violated");
        ApiError::parse(e.to_string(), Some(status_code), header_request_id.clone())
    })?;

    let request_id = meta
        .as_ref()
        .and_then(|m| m.request_id.clone())
        .or(header_request_id);

    match body {
        EnvelopeBody::Data(data) if status.is_success() => Ok(ApiResponse {
            data,
            request_id,
            meta,
        }),
        EnvelopeBody::Data(_) => {
            warn!(status = status_code, "api returned data with an error status");
            Err(ApiError::parse(
                format!("unexpected data with status {status_code}"),
                Some(status_code),
                request_id,
            ))
        }
        EnvelopeBody::Error(payload) => {
            let error = ApiError::from_payload(status_code, payload, meta.as_ref(), request_id);
            debug!(
                status = status_code,
                code = %error.code,
                kind = %error.kind,
                request_id = error.request_id.as_deref().unwrap_or("-"),
                "api call failed"
            );
            Err(error)
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::timeout()
    } else if e.is_decode() {
        ApiError::parse(e.to_string(), e.status().map(|s| s.as_u16()), None)
    } else {
        ApiError::network(e.to_string())
    }
}
