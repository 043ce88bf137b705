use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::{debug, info, instrument, warn};

use crate::app::ports::{HttpClientPort, HttpRequest};
use crate::common::constants::{HEADER_ACCEPT, HEADER_AUTHORIZATION};
use crate::common::error::{truncate_body, FetchError};
use crate::common::types::{AuditPage, RawAuditRecord};
use crate::config::ForwarderConfig;
use crate::pipeline::window::TimeWindow;

/// Reads one page of audit records for a time window.
///
/// There is no paging: anything past `page_limit` inside the window is not
/// fetched, and no checkpoint is kept between runs.
pub struct AuditFetcher<'a> {
    http: &'a dyn HttpClientPort,
    config: &'a ForwarderConfig,
}

impl<'a> AuditFetcher<'a> {
    pub fn new(http: &'a dyn HttpClientPort, config: &'a ForwarderConfig) -> Self {
        Self { http, config }
    }

    /// Build the GET request for `window`; query pairs already on the base URL are kept
    pub fn request_for(&self, window: &TimeWindow) -> Result<HttpRequest, FetchError> {
        let url = reqwest::Url::parse_with_params(
            &self.config.source_url,
            [
                ("from", window.from_param()),
                ("to", window.to_param()),
                ("limit", self.config.page_limit.to_string()),
            ],
        )
        .map_err(|e| FetchError::InvalidUrl(e.to_string()))?;

        Ok(HttpRequest::get(url.to_string())
            .header(HEADER_AUTHORIZATION, self.basic_auth())
            .header(HEADER_ACCEPT, "application/json"))
    }

    fn basic_auth(&self) -> String {
        let credentials = format!("{}:{}", self.config.source_email, self.config.source_token);
        format!("Basic {}", STANDARD.encode(credentials))
    }

    #[instrument(skip(self), fields(from = %window.from_param(), to = %window.to_param()))]
    pub async fn fetch(&self, window: &TimeWindow) -> Result<Vec<RawAuditRecord>, FetchError> {
        let request = self.request_for(window)?;
        debug!("Requesting audit records from {}", request.url);

        let response = self.http.send(request).await.map_err(FetchError::Transport)?;
        if !response.is_success() {
            return Err(FetchError::Status {
                status: response.status,
                body: truncate_body(&response.body),
            });
        }

        let page: AuditPage = serde_json::from_slice(&response.body)
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        info!("Fetched {} audit records", page.records.len());
        if page.records.len() >= self.config.page_limit as usize {
            warn!(
                "Audit page is full ({} records); records beyond the page limit in this window are not forwarded",
                page.records.len()
            );
        }
        Ok(page.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ports::HttpResponse;
    use crate::config::FileConfig;
    use async_trait::async_trait;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Mutex;

    struct MockHttp {
        response: Result<HttpResponse, String>,
        requests: Mutex<Vec<HttpRequest>>,
    }

    impl MockHttp {
        fn replying(status: u16, body: &str) -> Self {
            Self {
                response: Ok(HttpResponse { status, body: body.as_bytes().to_vec() }),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn failing(message: &str) -> Self {
            Self { response: Err(message.to_string()), requests: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl HttpClientPort for MockHttp {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            self.requests.lock().unwrap().push(request);
            self.response.clone()
        }
    }

    fn config(source_url: &str, page_limit: u32) -> ForwarderConfig {
        let source_url = source_url.to_string();
        let page_limit = page_limit.to_string();
        ForwarderConfig::from_sources(FileConfig::default(), move |key| match key {
            "WORKSPACE_ID" => Some("ws-123".into()),
            "SHARED_KEY" => Some("Zm9yd2FyZGVyLXRlc3Qtc2hhcmVkLWtleS0wMDAwMDE=".into()),
            "SOURCE_URL" => Some(source_url.clone()),
            "SOURCE_EMAIL" => Some("ops@example.com".into()),
            "SOURCE_TOKEN" => Some("api-token-123".into()),
            "PAGE_LIMIT" => Some(page_limit.clone()),
            _ => None,
        })
        .unwrap()
    }

    fn window() -> TimeWindow {
        TimeWindow::ending_at(Utc.with_ymd_and_hms(2025, 4, 15, 10, 0, 0).unwrap(), Duration::minutes(5))
    }

    const SOURCE: &str = "https://example.atlassian.net/rest/api/3/auditing/record";

    #[test]
    fn test_request_shape() {
        let http = MockHttp::replying(200, "{}");
        let config = config(SOURCE, 100);
        let request = AuditFetcher::new(&http, &config).request_for(&window()).unwrap();

        assert_eq!(request.method, "GET");
        assert_eq!(request.header_value("Authorization"), Some("Basic b3BzQGV4YW1wbGUuY29tOmFwaS10b2tlbi0xMjM="));
        assert_eq!(request.header_value("accept"), Some("application/json"));

        let url = reqwest::Url::parse(&request.url).unwrap();
        assert_eq!(url.path(), "/rest/api/3/auditing/record");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("from".to_string(), "2025-04-15T09:55:00Z".to_string()),
                ("to".to_string(), "2025-04-15T10:00:00Z".to_string()),
                ("limit".to_string(), "100".to_string()),
            ]
        );
    }

    #[test]
    fn test_existing_query_kept() {
        let http = MockHttp::replying(200, "{}");
        let config = config("https://example.atlassian.net/audit?filter=user", 25);
        let request = AuditFetcher::new(&http, &config).request_for(&window()).unwrap();

        let url = reqwest::Url::parse(&request.url).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("filter".to_string(), "user".to_string()));
        assert_eq!(pairs[3], ("limit".to_string(), "25".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_records() {
        let http = MockHttp::replying(
            200,
            r#"{"offset":0,"limit":100,"total":2,"records":[
                {"id":1,"summary":"User created","authorKey":"a1"},
                {"id":2,"summary":"User deleted","remoteAddress":"10.0.0.9"}
            ]}"#,
        );
        let config = config(SOURCE, 100);
        let records = AuditFetcher::new(&http, &config).fetch(&window()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].summary, Some(serde_json::json!("User created")));
        assert_eq!(records[1].remote_address, Some(serde_json::json!("10.0.0.9")));
        assert_eq!(http.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_full_page_is_not_followed() {
        // Only one page is requested even when the page is full
        let http = MockHttp::replying(200, r#"{"records":[{"id":1},{"id":2}]}"#);
        let config = config(SOURCE, 2);
        let records = AuditFetcher::new(&http, &config).fetch(&window()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(http.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_result() {
        let http = MockHttp::replying(200, r#"{"records":[]}"#);
        let config = config(SOURCE, 100);
        let records = AuditFetcher::new(&http, &config).fetch(&window()).await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_transport_error() {
        let http = MockHttp::failing("connection refused");
        let config = config(SOURCE, 100);
        let err = AuditFetcher::new(&http, &config).fetch(&window()).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport(ref m) if m == "connection refused"));
    }

    #[tokio::test]
    async fn test_non_success_status() {
        let http = MockHttp::replying(401, "Unauthorized");
        let config = config(SOURCE, 100);
        let err = AuditFetcher::new(&http, &config).fetch(&window()).await.unwrap_err();
        match err {
            FetchError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Unauthorized");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let http = MockHttp::replying(200, "<html>maintenance</html>");
        let config = config(SOURCE, 100);
        let err = AuditFetcher::new(&http, &config).fetch(&window()).await.unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }
}
