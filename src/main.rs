use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use audit_forwarder::app::ports::{Clock, SystemClock};
use audit_forwarder::infra::http_client::ReqwestHttp;
use audit_forwarder::observability::{self, ForwarderMetrics};
use audit_forwarder::pipeline::signature::{build_signature, rfc1123_date, string_to_sign};
use audit_forwarder::config::SigningConfig;
use audit_forwarder::{ForwardUseCase, ForwarderConfig, ForwarderError};

#[derive(Parser)]
#[command(name = "audit_forwarder")]
#[command(about = "Forwards issue-tracker audit records to a log-ingestion endpoint")]
#[command(version)]
struct Cli {
    /// Optional TOML config file; environment variables override it
    #[arg(long, global = true, env = "AUDIT_FWD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Forward the current window once (one scheduler tick)
    Run,
    /// Forward on a fixed interval until interrupted
    Schedule {
        /// Expose Prometheus metrics on this address, e.g. 0.0.0.0:9898
        #[arg(long, env = "AUDIT_FWD_METRICS_ADDR")]
        metrics_addr: Option<SocketAddr>,
    },
    /// Print the string-to-sign and Authorization header for a request body
    Sign {
        /// File holding the exact JSON body that was (or will be) posted
        #[arg(long)]
        body_file: PathBuf,
        /// RFC 1123 date, e.g. "Tue, 15 Apr 2025 10:00:00 GMT"; defaults to now
        #[arg(long)]
        date: Option<String>,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<Arc<ForwarderConfig>, ForwarderError> {
    match ForwarderConfig::load(path.map(PathBuf::as_path)) {
        Ok(config) => {
            info!(?config, "Configuration loaded");
            Ok(Arc::new(config))
        }
        Err(e) => {
            let e = ForwarderError::from(e);
            ForwarderMetrics::record_failure(e.stage());
            error!("Configuration error: {}", e);
            Err(e)
        }
    }
}

fn build_use_case(config: Arc<ForwarderConfig>) -> anyhow::Result<ForwardUseCase> {
    let http = ReqwestHttp::new(config.http_timeout()).context("Failed to build HTTP client")?;
    Ok(ForwardUseCase::new(config, Arc::new(http), Arc::new(SystemClock)))
}

async fn run_schedule(use_case: ForwardUseCase) {
    let interval = use_case.config().interval();
    info!("Forwarding every {}s", interval.as_secs());

    let mut ticker = tokio::time::interval(interval);
    // A run that overlaps the next tick delays it; ticks never pile up
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                // Failures are logged and counted inside run_once; the next tick still runs
                if use_case.run_once().await.is_err() {
                    warn!("Tick failed; waiting for the next one");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            let config = load_config(cli.config.as_ref())?;
            let report = build_use_case(config)?.run_once().await?;
            println!(
                "✅ Forwarded {} of {} records for {} .. {} ({} bytes)",
                report.published,
                report.fetched,
                report.window.from_param(),
                report.window.to_param(),
                report.body_bytes
            );
        }
        Commands::Schedule { metrics_addr } => {
            if let Some(addr) = metrics_addr {
                observability::init_metrics(addr);
            }
            let config = load_config(cli.config.as_ref())?;
            run_schedule(build_use_case(config)?).await;
        }
        Commands::Sign { body_file, date } => {
            // Only the ingestion credentials are needed to reproduce a signature
            let config = SigningConfig::load(cli.config.as_deref()).context("Configuration error")?;
            let body = std::fs::read(&body_file)
                .with_context(|| format!("Failed to read body file '{}'", body_file.display()))?;
            let date = date.unwrap_or_else(|| rfc1123_date(SystemClock.now()));
            let authorization = build_signature(&config.workspace_id, &config.shared_key, &date, body.len())
                .context("Failed to sign body")?;

            println!("Content-Length: {}", body.len());
            println!("x-ms-date: {}", date);
            println!("String-to-sign: {:?}", string_to_sign(body.len(), &date));
            println!("Authorization: {}", authorization);
        }
    }
    Ok(())
}
