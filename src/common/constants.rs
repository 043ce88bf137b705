/// Defaults and fixed protocol values shared across the forwarder.
/// Anything an operator may need to change lives in `config.rs` instead.

// Window and paging defaults
pub const DEFAULT_WINDOW_SECS: i64 = 5 * 60;
pub const DEFAULT_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_LOG_TYPE: &str = "JiraAuditLog";

// Ingestion (HTTP Data Collector) API
pub const INGESTION_HOST_SUFFIX: &str = "ods.opinsights.azure.com";
pub const INGESTION_RESOURCE: &str = "/api/logs";
pub const INGESTION_API_VERSION: &str = "2016-04-01";
pub const INGESTION_CONTENT_TYPE: &str = "application/json";
pub const INGESTION_METHOD: &str = "POST";

/// Upper bound the ingestion service places on the Log-Type header value
pub const MAX_LOG_TYPE_LEN: usize = 100;

// Header names
pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_LOG_TYPE: &str = "Log-Type";
pub const HEADER_MS_DATE: &str = "x-ms-date";
pub const HEADER_TIME_GENERATED_FIELD: &str = "time-generated-field";

/// Error bodies echoed back into error messages are cut to this many bytes
pub const MAX_ERROR_BODY_BYTES: usize = 512;

/// Build the ingestion endpoint URL for a workspace
pub fn ingestion_url(workspace_id: &str) -> String {
    format!(
        "https://{}.{}{}?api-version={}",
        workspace_id, INGESTION_HOST_SUFFIX, INGESTION_RESOURCE, INGESTION_API_VERSION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingestion_url() {
        assert_eq!(
            ingestion_url("ws-123"),
            "https://ws-123.ods.opinsights.azure.com/api/logs?api-version=2016-04-01"
        );
    }
}
