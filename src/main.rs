//! Mirror gateway driver.
//!
//! Reads request messages as JSON lines on stdin, feeds them through the
//! gateway loops and prints each response as a JSON line on stdout.
//!
//! ```text
//!   stdin (JSON lines) ──▶ RequestSender ──▶ queue ──▶ GatewayLoop × N ──▶ ChannelDelivery ──▶ stdout
//! ```
//!
//! End of input queues the shutdown sentinel; Ctrl-C cancels.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use mirror_gateway::config::{self, GatewayConfig};
use mirror_gateway::delivery::ChannelDelivery;
use mirror_gateway::gateway::GatewayHandle;
use mirror_gateway::lifecycle::signals::cancel_on_ctrl_c;
use mirror_gateway::message::RequestMessage;
use mirror_gateway::observability;

#[derive(Parser)]
#[command(name = "mirror-gateway")]
#[command(about = "Queue-mediated request mirroring gateway", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `worker.response_body_temp_dir`.
    #[arg(long)]
    temp_dir: Option<PathBuf>,

    /// Override `worker.workers`.
    #[arg(short, long)]
    workers: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => GatewayConfig::default(),
    };
    if let Some(dir) = cli.temp_dir {
        config.worker.response_body_temp_dir = dir;
    }
    if let Some(workers) = cli.workers {
        config.worker.workers = workers;
    }
    config::validation::validate_config(&config).map_err(config::ConfigError::Validation)?;

    observability::logging::init(&config.observability)?;
    tracing::info!("mirror-gateway v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse::<std::net::SocketAddr>()?;
        observability::metrics::init_metrics(addr)?;
    }

    let (delivery, mut responses) = ChannelDelivery::new();
    let gateway = GatewayHandle::start(Arc::new(config), delivery).await?;

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(response) = responses.recv().await {
            match serde_json::to_vec(&response) {
                Ok(mut line) => {
                    line.push(b'\n');
                    if let Err(e) = stdout.write_all(&line).await {
                        tracing::error!(error = %e, "Failed to write response");
                        break;
                    }
                }
                Err(e) => tracing::error!(handle = %response.handle, error = %e, "Failed to encode response"),
            }
        }
        if let Err(e) = stdout.flush().await {
            tracing::error!(error = %e, "Failed to flush responses");
        }
    });

    let canceller = gateway.canceller();
    let mut cancelled = canceller.subscribe();
    tokio::spawn(cancel_on_ctrl_c(canceller));

    let mut lines = spawn_line_reader(io::BufReader::new(io::stdin()))?;
    let graceful = loop {
        let line = tokio::select! {
            line = lines.recv() => line.transpose()?,
            _ = cancelled.recv() => break false,
        };
        let Some(line) = line else {
            break true;
        };
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<RequestMessage>(&line) {
            Ok(request) => gateway.send(request).await?,
            Err(e) => tracing::warn!(error = %e, "Skipping malformed request line"),
        }
    };

    let outcomes = if graceful {
        gateway.shutdown().await?
    } else {
        gateway.join().await?
    };
    if let Err(e) = writer.await {
        tracing::error!(error = %e, "Response writer failed");
    }

    tracing::info!(
        processed = outcomes.iter().map(|o| o.processed).sum::<u64>(),
        failed_deliveries = outcomes.iter().map(|o| o.failed_deliveries).sum::<u64>(),
        "Shutdown complete"
    );
    Ok(())
}

/// Reads lines on a detached thread feeding a channel.
///
/// A blocked read cannot be cancelled, so it must not live on the runtime's
/// blocking pool: the process would not exit until input reached EOF.
fn spawn_line_reader<R>(reader: R) -> io::Result<mpsc::Receiver<io::Result<String>>>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::channel(64);
    std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.blocking_send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}
