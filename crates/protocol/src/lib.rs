use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceRequest {
    pub x: i64,
    pub y: i64,
    /// Upper-case compass name; NORTH when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionView {
    pub x: i64,
    pub y: i64,
    pub direction: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardView {
    pub n: i64,
}

/// Returned by `place`, `turn` and `resize`. `position` is null when the
/// robot is unplaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateResponse {
    pub position: Option<PositionView>,
    pub board: BoardView,
}

/// Returned by the movement endpoints. A blocked step is still a success;
/// `moved` tells the two apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveResponse {
    pub position: PositionView,
    pub board: BoardView,
    pub moved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub seq: u64,
    /// RFC 3339, UTC.
    pub at: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
    pub ok: bool,
    pub detail: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub position: PositionView,
    /// Human-readable lines, oldest first.
    pub logs: Vec<String>,
    /// The same entries with their structured fields.
    pub history: Vec<LogRecord>,
    pub board: BoardView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}

pub mod codes {
    pub const OUT_OF_BOUNDS: &str = "out_of_bounds";
    pub const INVALID_SIZE: &str = "invalid_size";
    pub const NOT_PLACED: &str = "not_placed";
    pub const INVALID_DIRECTION: &str = "invalid_direction";
    pub const INVALID_ROTATION: &str = "invalid_rotation";
    pub const INTERNAL: &str = "internal";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn place_request_direction_is_optional() {
        let req: PlaceRequest = serde_json::from_str(r#"{"x":0,"y":0}"#).unwrap();
        assert_eq!(req.direction, None);
        let req: PlaceRequest =
            serde_json::from_str(r#"{"x":1,"y":2,"direction":"EAST"}"#).unwrap();
        assert_eq!(req.direction.as_deref(), Some("EAST"));
    }

    #[test]
    fn unplaced_state_serializes_null_position() {
        let body = StateResponse {
            position: None,
            board: BoardView { n: 7 },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert!(v["position"].is_null());
        assert_eq!(v["board"]["n"], 7);
    }
}
