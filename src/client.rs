use crate::auth::{TokenGrant, REFRESH_PATH};
use crate::config::ClientConfig;
use crate::error::{ApiError, RefreshError};
use crate::redact::{mask_token, redact_body, sanitize_body};
use crate::refresh::{RefreshCoordinator, RefreshTurn};
use crate::request::{ApiRequest, ApiResponse};
use crate::session::{SessionStorage, SessionStore, StoreError};
use crate::signal::{AuthSignal, SignalBus};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Serialize)]
struct RefreshBody<'a> {
    refresh: &'a str,
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

fn into_result(response: ApiResponse) -> Result<ApiResponse, ApiError> {
    if response.status.is_success() {
        return Ok(response);
    }
    Err(ApiError::Status {
        status: response.status,
        body: redact_body(&response.body),
    })
}

/// HTTP client for the dashboard API. Attaches the session's bearer token to
/// every request and, when the API answers 401, refreshes the token pair
/// once and replays the request. Cheap to clone; clones share the session
/// and the refresh state.
#[derive(Clone)]
pub struct ApiClient {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
    session: SessionStorage,
    refresh: RefreshCoordinator,
    signals: SignalBus,
}

impl ApiClient {
    pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers())
            .build()?;
        Ok(Self {
            config: Arc::new(config),
            http,
            session: SessionStorage::new(store),
            refresh: RefreshCoordinator::new(),
            signals: SignalBus::new(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStorage {
        &self.session
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthSignal> {
        self.signals.subscribe()
    }

    pub fn refresh_in_progress(&self) -> bool {
        self.refresh.is_refreshing()
    }

    /// Sends `request` with the current access token. A 401 triggers one
    /// coordinated refresh and a single replay; every other outcome is
    /// returned as-is. Non-success statuses surface as [`ApiError::Status`].
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let token = self.session.access_token()?;
        let response = self.dispatch(&request, token.as_deref()).await?;
        if response.status != StatusCode::UNAUTHORIZED {
            return into_result(response);
        }

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            "access token rejected; recovering"
        );
        let fresh = self.recover(token.as_deref()).await?;

        // The replay is final: a second 401 goes straight to the caller.
        let replay = self.dispatch(&request, Some(&fresh)).await?;
        into_result(replay)
    }

    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.send(request).await?.json()
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::get(path)).await
    }

    pub async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::post(path).json(body)?).await
    }

    pub async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::put(path).json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.send(ApiRequest::delete(path)).await
    }

    /// Sends without a bearer token and without refresh handling, for the
    /// endpoints that establish a session.
    pub(crate) async fn send_anonymous(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        let response = self.dispatch(&request, None).await?;
        into_result(response)
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        token: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.config.endpoint(&request.path)?;
        let mut headers = request.headers.clone();
        headers.remove(AUTHORIZATION);

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        let masked = token.map(mask_token).unwrap_or_else(|| "-".to_string());
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = status.as_u16(),
            token = %masked,
            "api call"
        );
        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }

    async fn recover(&self, rejected: Option<&str>) -> Result<String, ApiError> {
        let session = self.session.clone();
        let turn = self.refresh.enter(rejected, || session.access_token())?;

        match turn {
            RefreshTurn::Ready(token) => Ok(token),
            RefreshTurn::Wait(waiter) => {
                tracing::debug!(queued = self.refresh.waiting(), "waiting for token refresh");
                Ok(waiter.settled().await?)
            }
            RefreshTurn::Lead(lease) => {
                let outcome = self.refresh_session().await;
                match &outcome {
                    Ok(_) => self.signals.emit(AuthSignal::Refreshed),
                    Err(err) => {
                        tracing::warn!("token refresh failed: {err}");
                        if let Err(store_err) = self.end_session() {
                            tracing::warn!("failed to clear session after refresh failure: {store_err}");
                        }
                    }
                }
                lease.complete(outcome.clone());
                Ok(outcome?)
            }
        }
    }

    async fn refresh_session(&self) -> Result<String, RefreshError> {
        let refresh_token = self
            .session
            .refresh_token()
            .map_err(|e| RefreshError::Storage(e.to_string()))?
            .ok_or(RefreshError::MissingRefreshToken)?;

        let grant = self.request_refresh(&refresh_token).await?;
        self.session
            .persist_grant(&grant)
            .map_err(|e| RefreshError::Storage(e.to_string()))?;

        tracing::info!(token = %mask_token(&grant.access), "access token refreshed");
        Ok(grant.access)
    }

    async fn request_refresh(&self, refresh_token: &str) -> Result<TokenGrant, RefreshError> {
        let url = self
            .config
            .endpoint(REFRESH_PATH)
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let response = self
            .http
            .post(url)
            .json(&RefreshBody {
                refresh: refresh_token,
            })
            .send()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RefreshError::Network(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(
                status = status.as_u16(),
                body = %sanitize_body(&body),
                "refresh endpoint rejected the refresh token"
            );
            return Err(RefreshError::Rejected {
                status,
                body: redact_body(&body),
            });
        }

        TokenGrant::parse(&body).map_err(|e| RefreshError::Malformed(e.to_string()))
    }

    /// Clears every session key and tells subscribers to send the user to
    /// the login entry point.
    pub(crate) fn end_session(&self) -> Result<(), StoreError> {
        let cleared = self.session.clear();
        self.signals.emit(AuthSignal::LoggedOut {
            redirect_to: self.config.login_path.clone(),
        });
        cleared
    }
}
