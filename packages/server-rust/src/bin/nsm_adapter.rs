//! NSM adapter server binary.

use std::sync::Arc;

use anyhow::Context as _;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use nsm_adapter::actions::CommandActions;
use nsm_adapter::cli::Args;
use nsm_adapter::network::NetworkModule;
use nsm_adapter::service::Dispatcher;
use nsm_adapter::shutdown::ShutdownController;
use nsm_adapter::sink::BroadcastEventSink;
use nsm_adapter::store::ConfigStore;
use nsm_adapter::telemetry;
use nsm_adapter_core::{ConfigHandler, EventSink, MeshActions};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    telemetry::initialise(&args.telemetry_config())?;

    if let Some(addr) = args.metrics_addr {
        PrometheusBuilder::new()
            .with_http_listener(addr)
            .install()
            .context("failed to start Prometheus exporter")?;
        info!(%addr, "Prometheus exporter listening");
    }

    let store = match &args.operations_file {
        Some(path) => ConfigStore::from_operations_file(path)?,
        None => ConfigStore::with_default_operations(),
    };
    let config: Arc<dyn ConfigHandler> = Arc::new(store);
    let events = Arc::new(BroadcastEventSink::default());
    let sink: Arc<dyn EventSink> = Arc::clone(&events) as Arc<dyn EventSink>;
    let actions: Arc<dyn MeshActions> = Arc::new(CommandActions::new(args.helm_repo.clone()));
    let shutdown = Arc::new(ShutdownController::new());

    let adapter_config = args.adapter_config();
    let dispatcher = Arc::new(Dispatcher::new(
        &adapter_config,
        config,
        sink,
        actions,
        Arc::clone(&shutdown),
    ));

    let mut network = NetworkModule::new(args.network_config(), shutdown);
    let port = network.start().await?;
    info!(
        name = %adapter_config.name,
        port,
        max_concurrent_operations = adapter_config.max_concurrent_operations,
        queue_capacity = adapter_config.queue_capacity,
        "adapter started"
    );

    network.serve(dispatcher, events, shutdown_signal()).await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
