use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One audit record as returned by the source API.
///
/// Only the five forwarded fields are named; everything else the source sends
/// is kept in `extra` so that new or unknown fields never fail deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawAuditRecord {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub summary: Option<Value>,
    #[serde(default)]
    pub created: Option<Value>,
    #[serde(default)]
    pub author_key: Option<Value>,
    #[serde(default)]
    pub remote_address: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of the audit API response. Paging metadata (offset, total, ...) is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuditPage {
    #[serde(default)]
    pub records: Vec<RawAuditRecord>,
}

/// The fixed five-field shape posted to the ingestion endpoint.
/// Field order and names are part of the wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedLogEntry {
    #[serde(rename = "LogEntryID")]
    pub log_entry_id: Value,
    #[serde(rename = "Summary")]
    pub summary: Value,
    #[serde(rename = "Created")]
    pub created: Value,
    #[serde(rename = "Author")]
    pub author: Value,
    #[serde(rename = "RemoteIP")]
    pub remote_ip: Value,
}
