use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use crate::app::ports::{Clock, HttpClientPort};
use crate::common::error::Result;
use crate::config::ForwarderConfig;
use crate::observability::ForwarderMetrics;
use crate::pipeline::fetcher::AuditFetcher;
use crate::pipeline::mapper::map_records;
use crate::pipeline::publisher::LogPublisher;
use crate::pipeline::window::TimeWindow;

/// Summary of one successful forwarding run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub window: TimeWindow,
    pub fetched: usize,
    pub published: usize,
    pub body_bytes: usize,
}

/// Use case for one tick: window -> fetch -> map -> publish, strictly in sequence.
///
/// Any stage error ends the run; a failed fetch means nothing is published.
pub struct ForwardUseCase {
    config: Arc<ForwarderConfig>,
    http: Arc<dyn HttpClientPort>,
    clock: Arc<dyn Clock>,
}

impl ForwardUseCase {
    pub fn new(config: Arc<ForwarderConfig>, http: Arc<dyn HttpClientPort>, clock: Arc<dyn Clock>) -> Self {
        Self { config, http, clock }
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub async fn run_once(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let window = TimeWindow::ending_at(self.clock.now(), self.config.window());
        let span = info_span!(
            "forward_run",
            run_id = %run_id,
            from = %window.from_param(),
            to = %window.to_param()
        );

        async move {
            ForwarderMetrics::record_run_started();
            let started = Instant::now();

            let result = self.execute(run_id, window).await;
            ForwarderMetrics::record_run_duration(started.elapsed().as_secs_f64());

            match &result {
                Ok(report) => info!(
                    "Run complete: fetched={} published={} body_bytes={}",
                    report.fetched, report.published, report.body_bytes
                ),
                Err(e) => {
                    ForwarderMetrics::record_failure(e.stage());
                    error!(stage = e.stage(), "Run failed: {}", e);
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(&self, run_id: Uuid, window: TimeWindow) -> Result<RunReport> {
        let records = AuditFetcher::new(self.http.as_ref(), &self.config).fetch(&window).await?;
        ForwarderMetrics::record_fetched(records.len());

        let entries = map_records(&records);

        let receipt = LogPublisher::new(self.http.as_ref(), &self.config, self.clock.as_ref())
            .publish(&entries)
            .await?;
        ForwarderMetrics::record_published(receipt.entries, receipt.body_bytes);

        Ok(RunReport {
            run_id,
            window,
            fetched: records.len(),
            published: receipt.entries,
            body_bytes: receipt.body_bytes,
        })
    }
}
