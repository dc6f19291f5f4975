//! CLI surface.
//!
//! Mirrors the shape of [`stackable_operator::cli::RunArguments`]: a `Run` command flattening a
//! common set of options plus the knobs this controller adds for batching and the orchestration
//! queue's rate limit.

use clap::{Parser, Subcommand};
use stackable_operator::{
    namespace::WatchNamespace,
    time::{Duration, ParseDurationError},
    utils::cluster_info::KubernetesClusterInfoOptions,
};
use tracing_subscriber::filter::LevelFilter;

fn parse_duration_arg(input: &str) -> Result<Duration, ParseDurationError> {
    input.parse()
}

pub const APP_NAME: &str = "autoscaler";
pub const OPERATOR_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the CRD objects this controller owns.
    Crd,
    /// Run the controller.
    Run(Box<RunArguments>),
}

#[derive(Debug, clap::Args)]
pub struct RunArguments {
    /// Restricts NodeClaim/NodePool reconciliation to a single namespace.
    ///
    /// NodeClaims and NodePools are cluster-scoped, so this only affects which namespace the
    /// controller watches Pods, DaemonSets and PersistentVolumeClaims in.
    #[arg(long, env, default_value = "")]
    pub watch_namespace: WatchNamespace,

    #[command(flatten)]
    pub cluster_info: KubernetesClusterInfoOptions,

    #[command(flatten)]
    pub telemetry: TelemetryArguments,

    #[command(flatten)]
    pub batching: BatchingArguments,

    #[command(flatten)]
    pub rate_limit: RateLimitArguments,
}

/// Batching mailbox knobs.
#[derive(Debug, clap::Args)]
pub struct BatchingArguments {
    /// How long the Provisioner waits for additional pending pods after the last one arrives
    /// before running the Scheduler.
    #[arg(long, env, default_value = "1s", value_parser = parse_duration_arg)]
    pub batch_idle_duration: Duration,

    /// The maximum time the Provisioner will keep extending the idle window before running the
    /// Scheduler regardless of new arrivals.
    #[arg(long, env, default_value = "10s", value_parser = parse_duration_arg)]
    pub batch_max_duration: Duration,
}

/// Orchestration queue rate limit.
#[derive(Debug, clap::Args)]
pub struct RateLimitArguments {
    #[arg(long, env, default_value_t = 10)]
    pub queue_qps: u32,

    #[arg(long, env, default_value_t = 100)]
    pub queue_burst: u32,

    #[arg(long, env, default_value = "100ms", value_parser = parse_duration_arg)]
    pub queue_backoff_base: Duration,

    #[arg(long, env, default_value = "10s", value_parser = parse_duration_arg)]
    pub queue_backoff_max: Duration,
}

/// Minimal stand-in for `stackable_telemetry::tracing::Tracing`'s constructor arguments, wired up
/// by hand because this snapshot of `stackable-telemetry` does not (yet) export a ready-made
/// `clap::Args` struct for it.
#[derive(Debug, clap::Args)]
pub struct TelemetryArguments {
    /// Disables the OTLP log exporter even if `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
    #[arg(long, env)]
    pub disable_otlp_logs: bool,

    /// Disables the OTLP trace exporter even if `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
    #[arg(long, env)]
    pub disable_otlp_traces: bool,
}

impl TelemetryArguments {
    pub fn console_log_default_level(&self) -> LevelFilter {
        LevelFilter::INFO
    }
}
