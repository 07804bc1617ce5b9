//! Wire format for the dino backend's HTTP JSON endpoints.
//!
//! Shapes mirror the backend exactly. Replies often carry more than the
//! client acts on (full status objects, the session id); optional fields
//! default so a minimal `{"success": true}` body still decodes.

use serde::{Deserialize, Serialize};

/// Body for `POST /api/start-game`.
#[derive(Debug, Clone, Serialize)]
pub struct StartRequest {
    pub name: String,
}

/// Body for `POST /api/duck`.
#[derive(Debug, Clone, Serialize)]
pub struct DuckRequest {
    pub duck: bool,
}

/// Empty JSON body (`{}`) for endpoints that take no parameters.
#[derive(Debug, Clone, Serialize)]
pub struct EmptyRequest {}

/// Reply from `/api/start-game`.
#[derive(Debug, Clone, Deserialize)]
pub struct StartReply {
    pub success: bool,
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply from `/api/restart` and `/api/duck`.
#[derive(Debug, Clone, Deserialize)]
pub struct AckReply {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply from `/api/jump`. `jump_ok` is false when the backend refuses the
/// jump (already airborne, or the game is over).
#[derive(Debug, Clone, Deserialize)]
pub struct JumpReply {
    pub success: bool,
    #[serde(default)]
    pub jump_ok: bool,
}

/// Reply from `/api/update`, one per poll tick.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReply {
    pub success: bool,
    #[serde(default)]
    pub status: Option<GameStatus>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Snapshot of the authoritative game state. The controller acts on `score`
/// and `over`; the rest is carried for display.
#[derive(Debug, Clone, Deserialize)]
pub struct GameStatus {
    #[serde(default)]
    pub name: String,
    pub score: u64,
    #[serde(default)]
    pub jumping: bool,
    #[serde(default)]
    pub ducking: bool,
    pub over: bool,
}
