use std::sync::Arc;

use reqwest::{RequestBuilder, Response, StatusCode};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use alcove_types::api::{RefreshRequest, RefreshResponse};

use crate::error::ApiError;
use crate::session::Session;

type RefreshListener = Box<dyn Fn(&str) + Send + Sync>;

/// Authorized REST client. Every call attaches the session's bearer
/// credential; a 401 triggers the refresh flow below.
///
/// The refresh flow is the explicit state machine
/// `NORMAL -> REFRESHING -> (RETRY once | REDIRECT)`: a failed authorized
/// call refreshes the access credential at most once and retries the
/// original call at most once. A second rejection, or a refresh failure,
/// surfaces as [`ApiError::SessionExpired`] — the caller's cue to clear the
/// session and return to login. Concurrent 401s share one refresh: waiters
/// that arrive while a refresh is in flight reuse the fresh token instead of
/// spending the refresh credential again.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<Session>,
    refresh_gate: Mutex<()>,
    on_refresh: Option<RefreshListener>,
}

impl ApiClient {
    pub fn new(http: reqwest::Client, base_url: &str, session: Arc<Session>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            refresh_gate: Mutex::new(()),
            on_refresh: None,
        }
    }

    /// Register a callback invoked with each freshly minted access token,
    /// so the owner can persist it.
    pub fn with_refresh_listener(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_refresh = Some(Box::new(f));
        self
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Issue an authorized request, refreshing the access credential once on
    /// a 401 and retrying the original call once.
    ///
    /// `build` is called per attempt because a `RequestBuilder` is consumed
    /// by `send`.
    pub(crate) async fn send_authorized<F>(&self, build: F) -> Result<Response, ApiError>
    where
        F: Fn(&reqwest::Client) -> RequestBuilder,
    {
        let stale = self.session.access_token();
        let resp = build(&self.http).bearer_auth(&stale).send().await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(resp);
        }

        debug!("access credential rejected, attempting refresh");
        self.refresh_access_token(&stale).await?;

        let resp = build(&self.http)
            .bearer_auth(self.session.access_token())
            .send()
            .await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            // Refreshed credential rejected too — do not refresh again.
            warn!("retried call rejected after refresh, session expired");
            return Err(ApiError::SessionExpired);
        }
        check_status(resp)
    }

    /// Exchange the refresh credential for a new access credential.
    ///
    /// `stale` is the access token the failed call used: if it no longer
    /// matches the session, another caller already refreshed while we waited
    /// on the gate, and this call returns without spending the refresh
    /// credential.
    async fn refresh_access_token(&self, stale: &str) -> Result<(), ApiError> {
        let _guard = self.refresh_gate.lock().await;
        if self.session.access_token() != stale {
            debug!("access credential already refreshed by a concurrent call");
            return Ok(());
        }

        let resp = self
            .http
            .post(self.url("auth/refresh-token/"))
            .json(&RefreshRequest {
                refresh: self.session.refresh_token(),
            })
            .send()
            .await
            .map_err(|e| {
                warn!("credential refresh failed: {}", e);
                ApiError::SessionExpired
            })?;

        if !resp.status().is_success() {
            warn!("credential refresh rejected with {}", resp.status());
            return Err(ApiError::SessionExpired);
        }

        let body: RefreshResponse = resp.json().await.map_err(|e| {
            warn!("credential refresh returned malformed body: {}", e);
            ApiError::SessionExpired
        })?;

        self.session.set_access_token(body.access.clone());
        if let Some(listener) = &self.on_refresh {
            listener(&body.access);
        }
        debug!("access credential refreshed");
        Ok(())
    }
}

fn check_status(resp: Response) -> Result<Response, ApiError> {
    if resp.status().is_success() {
        Ok(resp)
    } else {
        Err(ApiError::status(resp.status()))
    }
}
