//! HTTP client for the dino backend.
//!
//! All five endpoints are POST with JSON bodies; replies are decoded
//! regardless of HTTP status, since the backend reports failures as
//! `{"success": false, "error": ...}` bodies on error statuses too.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::error::ApiError;
use crate::protocol::{
    AckReply, DuckRequest, EmptyRequest, GameStatus, JumpReply, StartReply, StartRequest,
    UpdateReply,
};

/// Default backend address (the dev server the game ships with).
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:5000";

/// Env var overriding the backend address.
pub const SERVER_ENV: &str = "DINORUN_SERVER";

pub const START_GAME: &str = "/api/start-game";
pub const RESTART: &str = "/api/restart";
pub const JUMP: &str = "/api/jump";
pub const DUCK: &str = "/api/duck";
pub const UPDATE: &str = "/api/update";

/// One method per backend endpoint.
///
/// The controller is generic over this trait so tests can script replies
/// without a network. All use is monomorphic and single-task, so no `Send`
/// bound is imposed on the returned futures.
#[allow(async_fn_in_trait)]
pub trait GameApi {
    async fn start_game(&self, name: &str) -> Result<StartReply, ApiError>;
    async fn restart(&self) -> Result<AckReply, ApiError>;
    async fn jump(&self) -> Result<JumpReply, ApiError>;
    async fn duck(&self, duck: bool) -> Result<AckReply, ApiError>;
    async fn update(&self) -> Result<UpdateReply, ApiError>;
}

/// Production [`GameApi`] over a shared HTTP connection pool.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base: String,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base = base_url.into();
        while base.ends_with('/') {
            base.pop();
        }
        Self {
            client: reqwest::Client::new(),
            base,
        }
    }

    /// Base URL from [`SERVER_ENV`], falling back to [`DEFAULT_SERVER`].
    pub fn from_env() -> Self {
        let base = std::env::var(SERVER_ENV).unwrap_or_else(|_| DEFAULT_SERVER.to_string());
        Self::new(base)
    }

    pub fn base_url(&self) -> &str {
        &self.base
    }

    async fn post<B, R>(&self, endpoint: &'static str, body: &B) -> Result<R, ApiError>
    where
        B: Serialize,
        R: DeserializeOwned,
    {
        let url = format!("{}{}", self.base, endpoint);
        debug!(%url, "POST");
        let reply = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::transport(endpoint, e))?;
        reply
            .json()
            .await
            .map_err(|e| ApiError::decode(endpoint, e))
    }
}

impl GameApi for HttpApi {
    async fn start_game(&self, name: &str) -> Result<StartReply, ApiError> {
        let body = StartRequest {
            name: name.to_string(),
        };
        self.post(START_GAME, &body).await
    }

    async fn restart(&self) -> Result<AckReply, ApiError> {
        self.post(RESTART, &EmptyRequest {}).await
    }

    async fn jump(&self) -> Result<JumpReply, ApiError> {
        self.post(JUMP, &EmptyRequest {}).await
    }

    async fn duck(&self, duck: bool) -> Result<AckReply, ApiError> {
        self.post(DUCK, &DuckRequest { duck }).await
    }

    async fn update(&self) -> Result<UpdateReply, ApiError> {
        self.post(UPDATE, &EmptyRequest {}).await
    }
}

/// Convenience for frontends that want to print a status line.
pub fn format_status(status: &GameStatus) -> String {
    format!(
        "name={} score={} jumping={} ducking={} over={}",
        if status.name.is_empty() {
            "?"
        } else {
            status.name.as_str()
        },
        status.score,
        status.jumping,
        status.ducking,
        status.over,
    )
}
