use serde::Serialize;
use tracing::{info, instrument};

use crate::app::ports::{Clock, HttpClientPort, HttpRequest};
use crate::common::constants::{
    ingestion_url, HEADER_AUTHORIZATION, HEADER_CONTENT_TYPE, HEADER_LOG_TYPE, HEADER_MS_DATE,
    HEADER_TIME_GENERATED_FIELD, INGESTION_CONTENT_TYPE,
};
use crate::common::error::{truncate_body, PublishError};
use crate::common::types::NormalizedLogEntry;
use crate::config::ForwarderConfig;
use crate::pipeline::signature::{build_signature, rfc1123_date};

/// Outcome of a successful publish
#[derive(Debug, Clone, Serialize)]
pub struct PublishReceipt {
    pub entries: usize,
    pub body_bytes: usize,
    pub status: u16,
}

/// Signs and posts a batch of entries to the ingestion endpoint
pub struct LogPublisher<'a> {
    http: &'a dyn HttpClientPort,
    config: &'a ForwarderConfig,
    clock: &'a dyn Clock,
}

impl<'a> LogPublisher<'a> {
    pub fn new(http: &'a dyn HttpClientPort, config: &'a ForwarderConfig, clock: &'a dyn Clock) -> Self {
        Self { http, config, clock }
    }

    /// Serialize once and sign those exact bytes; an empty batch becomes `[]`
    pub fn build_request(&self, entries: &[NormalizedLogEntry]) -> Result<HttpRequest, PublishError> {
        let body = serde_json::to_vec(entries)?;
        let date = rfc1123_date(self.clock.now());
        let authorization =
            build_signature(&self.config.workspace_id, &self.config.shared_key, &date, body.len())?;

        let mut request = HttpRequest::post(ingestion_url(&self.config.workspace_id), body)
            .header(HEADER_CONTENT_TYPE, INGESTION_CONTENT_TYPE)
            .header(HEADER_LOG_TYPE, self.config.log_type.as_str())
            .header(HEADER_MS_DATE, date)
            .header(HEADER_AUTHORIZATION, authorization);
        if let Some(field) = &self.config.time_generated_field {
            request = request.header(HEADER_TIME_GENERATED_FIELD, field.as_str());
        }
        Ok(request)
    }

    /// Single attempt; failures are returned to the caller, never retried here
    #[instrument(skip(self, entries), fields(entries = entries.len(), log_type = %self.config.log_type))]
    pub async fn publish(&self, entries: &[NormalizedLogEntry]) -> Result<PublishReceipt, PublishError> {
        let request = self.build_request(entries)?;
        let body_bytes = request.body.len();

        let response = self.http.send(request).await.map_err(PublishError::Transport)?;
        if !response.is_success() {
            return Err(PublishError::Status {
                status: response.status,
                body: truncate_body(&response.body),
            });
        }

        info!("Published {} entries ({} bytes), status {}", entries.len(), body_bytes, response.status);
        Ok(PublishReceipt { entries: entries.len(), body_bytes, status: response.status })
    }
}
