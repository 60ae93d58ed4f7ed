//! Gateway response envelope decoding
//!
//! The login endpoint answers JSONP style: `dr1003({"info":1,...})`.
//! The payload is the text strictly between the first `(` and the first `)`.

use crate::error::LoginError;
use serde::Deserialize;

/// Info code the gateway uses for a successful login
pub const INFO_SUCCESS: i64 = 1;

/// Info code the gateway uses for an explicit rejection
pub const INFO_REJECTED: i64 = 0;

/// Longest body excerpt kept in a `MalformedEnvelope` error
const MAX_EXCERPT_LEN: usize = 120;

/// Decoded login reply
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoginReply {
    pub info: Option<i64>,
    #[serde(default)]
    pub msg: Option<String>,
}

/// Return the text between the first `(` and the first `)`
pub fn extract_payload(body: &str) -> Result<&str, LoginError> {
    match (body.find('('), body.find(')')) {
        (Some(start), Some(end)) if start < end => Ok(&body[start + 1..end]),
        _ => Err(LoginError::MalformedEnvelope {
            body: excerpt(body),
        }),
    }
}

/// Decode a raw response body into a `LoginReply`
pub fn decode_reply(body: &str) -> Result<LoginReply, LoginError> {
    let payload = extract_payload(body)?;
    serde_json::from_str(payload).map_err(|e| LoginError::InvalidJson {
        reason: e.to_string(),
    })
}

/// Decode a raw response body and turn the gateway verdict into a result
pub fn interpret(body: &str) -> Result<(), LoginError> {
    let reply = decode_reply(body)?;
    match reply.info {
        Some(INFO_SUCCESS) => Ok(()),
        Some(INFO_REJECTED) => Err(LoginError::Rejected {
            message: reply
                .msg
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "no reason given".to_string()),
        }),
        Some(code) => Err(LoginError::UnexpectedInfo { code }),
        None => Err(LoginError::MissingInfo),
    }
}

fn excerpt(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_EXCERPT_LEN) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}
