use serde::{Deserialize, Serialize};

/// Admin requests over the Unix socket.
/// Wire format: 4-byte little-endian length prefix + MessagePack payload.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AdminRequest {
    Ping,
    Health,
    /// Active-session counts and per-session remaining time.
    Sessions,
    /// Run an expiry sweep immediately, outside the timer.
    Sweep,
    EndSession {
        user_id: uuid::Uuid,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AdminResponse {
    pub status: String,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub version: String,
}

impl AdminResponse {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            status: "ok".to_string(),
            data: Some(data),
            error: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(msg.into()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn pong() -> Self {
        Self::ok(serde_json::json!({"pong": true}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_roundtrips_through_messagepack() {
        let user_id = uuid::Uuid::new_v4();
        let req = AdminRequest::EndSession { user_id };
        let bytes = rmp_serde::to_vec_named(&req).unwrap();
        let back: AdminRequest = rmp_serde::from_slice(&bytes).unwrap();
        match back {
            AdminRequest::EndSession { user_id: got } => assert_eq!(got, user_id),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_err_response_shape() {
        let resp = AdminResponse::err("sweep failed");
        assert_eq!(resp.status, "error");
        assert!(resp.data.is_none());
        assert_eq!(resp.error.as_deref(), Some("sweep failed"));
    }
}
