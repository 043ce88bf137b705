//! Shared-key request signing for the ingestion API.
//!
//! The Authorization header is `SharedKey {workspace}:{sig}` where `sig` is the
//! base64 HMAC-SHA256, keyed with the base64-decoded shared key, of
//!
//! ```text
//! POST\n{content length}\napplication/json\nx-ms-date:{rfc1123 date}\n/api/logs
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::common::constants::{INGESTION_CONTENT_TYPE, INGESTION_METHOD, INGESTION_RESOURCE};
use crate::common::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// `Tue, 15 Apr 2025 10:00:00 GMT`
pub fn rfc1123_date(ts: DateTime<Utc>) -> String {
    ts.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

pub fn string_to_sign(content_length: usize, date: &str) -> String {
    format!(
        "{}\n{}\n{}\nx-ms-date:{}\n{}",
        INGESTION_METHOD, content_length, INGESTION_CONTENT_TYPE, date, INGESTION_RESOURCE
    )
}

/// Base64 HMAC-SHA256 of `message` under the base64-encoded `shared_key`
pub fn sign(shared_key: &str, message: &str) -> Result<String, SignatureError> {
    let key = STANDARD.decode(shared_key.trim())?;
    let mut mac = HmacSha256::new_from_slice(&key).expect("HMAC accepts keys of any length");
    mac.update(message.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Full Authorization header value for a body of `content_length` bytes
pub fn build_signature(
    workspace_id: &str,
    shared_key: &str,
    date: &str,
    content_length: usize,
) -> Result<String, SignatureError> {
    let signature = sign(shared_key, &string_to_sign(content_length, date))?;
    Ok(format!("SharedKey {}:{}", workspace_id, signature))
}
