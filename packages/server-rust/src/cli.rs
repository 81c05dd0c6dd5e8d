//! Command-line arguments of the adapter binary.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use crate::actions::DEFAULT_HELM_REPO;
use crate::network::{NetworkConfig, DEFAULT_PORT};
use crate::service::config::{DEFAULT_SMI_MANIFEST, DEFAULT_SMI_NAMESPACE};
use crate::service::AdapterConfig;
use crate::telemetry::{LogFormat, TelemetryConfig, DEFAULT_LOG_FILTER};

/// NSM service mesh adapter.
#[derive(Debug, Clone, Parser)]
#[command(name = "nsm-adapter", version, about)]
pub struct Args {
    /// Address to bind the HTTP server to.
    #[arg(long, env = "NSM_ADAPTER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, env = "NSM_ADAPTER_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Component name stamped on events.
    #[arg(long, env = "NSM_ADAPTER_NAME", default_value = "nsm-adapter")]
    pub name: String,

    /// Component type stamped on events.
    #[arg(long, env = "NSM_ADAPTER_COMPONENT_TYPE", default_value = "adapter")]
    pub component_type: String,

    /// JSON operations table replacing the built-in catalogue.
    #[arg(long, env = "NSM_ADAPTER_OPERATIONS_FILE")]
    pub operations_file: Option<PathBuf>,

    /// Manifest of the SMI conformance tool.
    #[arg(long, env = "NSM_ADAPTER_SMI_MANIFEST", default_value = DEFAULT_SMI_MANIFEST)]
    pub smi_manifest: String,

    /// Namespace the SMI conformance tool runs in.
    #[arg(long, env = "NSM_ADAPTER_SMI_NAMESPACE", default_value = DEFAULT_SMI_NAMESPACE)]
    pub smi_namespace: String,

    /// Helm repository serving the NSM charts.
    #[arg(long, env = "NSM_ADAPTER_HELM_REPO", default_value = DEFAULT_HELM_REPO)]
    pub helm_repo: String,

    /// Operations executing at once.
    #[arg(long, env = "NSM_ADAPTER_MAX_CONCURRENT_OPERATIONS", default_value_t = 16)]
    pub max_concurrent_operations: u32,

    /// Accepted operations waiting to run before new ones are rejected.
    #[arg(long, env = "NSM_ADAPTER_QUEUE_CAPACITY", default_value_t = 256)]
    pub queue_capacity: usize,

    /// Per-operation deadline in milliseconds. Unset means no deadline.
    #[arg(long, env = "NSM_ADAPTER_OPERATION_TIMEOUT_MS")]
    pub operation_timeout_ms: Option<u64>,

    #[arg(long, env = "NSM_ADAPTER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Json)]
    pub log_format: LogFormat,

    /// `tracing` filter directives.
    #[arg(long, env = "RUST_LOG", default_value = DEFAULT_LOG_FILTER)]
    pub log_filter: String,

    /// Address of the Prometheus scrape endpoint. Metrics are off when unset.
    #[arg(long, env = "NSM_ADAPTER_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

impl Args {
    #[must_use]
    pub fn adapter_config(&self) -> AdapterConfig {
        AdapterConfig {
            name: self.name.clone(),
            component_type: self.component_type.clone(),
            smi_manifest: self.smi_manifest.clone(),
            smi_namespace: self.smi_namespace.clone(),
            max_concurrent_operations: self.max_concurrent_operations,
            queue_capacity: self.queue_capacity,
            operation_timeout_ms: self.operation_timeout_ms,
        }
    }

    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            host: self.host.clone(),
            port: self.port,
            ..NetworkConfig::default()
        }
    }

    #[must_use]
    pub fn telemetry_config(&self) -> TelemetryConfig {
        TelemetryConfig {
            format: self.log_format,
            filter: self.log_filter.clone(),
        }
    }
}
