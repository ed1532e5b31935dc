use anyhow::{Context, Result};
use clap::Parser;
use havok_core::{SyncEngine, SyncMetrics};
use havok_docker::DockerRuntime;
use havok_etcd::EtcdClient;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod metrics_server;

use cli::{Args, LogFormat};

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
}

/// Resolve with the name of the first termination signal received
async fn shutdown_signal() -> Result<&'static str> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    tokio::select! {
        res = tokio::signal::ctrl_c() => {
            res?;
            Ok("SIGINT")
        }
        _ = terminate.recv() => Ok("SIGTERM"),
        _ = quit.recv() => Ok("SIGQUIT"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);

    info!("Havok {}", env!("CARGO_PKG_VERSION"));

    let config = args.engine_config();
    config.validate()?;

    let runtime = DockerRuntime::connect(&config.runtime_endpoint)
        .context("failed to create docker client")?;
    runtime
        .ping()
        .await
        .with_context(|| format!("docker at {} is not reachable", config.runtime_endpoint))?;

    let store = EtcdClient::new(
        config.store_endpoints.clone(),
        Duration::from_secs(args.etcd_timeout_secs),
    )
    .context("failed to create etcd client")?;

    let metrics = Arc::new(SyncMetrics::new()?);

    if let Some(addr) = args.metrics_addr {
        let metrics = metrics.clone();
        tokio::spawn(async move {
            if let Err(e) = metrics_server::serve(addr, metrics).await {
                error!("Metrics server failed: {:#}", e);
            }
        });
    }

    let engine = Arc::new(SyncEngine::new(
        config,
        Arc::new(store),
        Arc::new(runtime),
        metrics,
    ));

    let runner = engine.clone();
    let mut task = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        signal = shutdown_signal() => {
            let name = signal?;
            info!("Received {}, stopping engine", name);
            engine.stop();
            task.await?.context("engine failed during shutdown")?;
            info!("Engine stopped");
        }
        res = &mut task => {
            res?.context("engine failed")?;
            warn!("Container event stream closed, exiting");
            anyhow::bail!("container event stream closed unexpectedly");
        }
    }

    Ok(())
}
