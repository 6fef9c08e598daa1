//! Logging bootstrap for binaries built on top of the ACMI core.
//!
//! Library crates (`acmi-common`, `acmi-formats`) only ever emit `tracing`
//! events; only a binary (e.g. `acmi-dump`) calls `init_logging`. No
//! OpenTelemetry/OTLP export path is wired in since nothing in this crate's
//! scope has a collector to send spans to.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_tree::HierarchicalLayer;

/// Initialise a hierarchical, env-filtered subscriber.
///
/// `use_tree` toggles the indented span tree (handy interactively, noisy
/// under a non-terminal log collector).
#[tracing::instrument]
pub fn init_logging(use_tree: bool) {
    let filter = EnvFilter::from_default_env();

    let tree = if use_tree {
        Some(
            HierarchicalLayer::new(2)
                .with_ansi(true)
                .with_span_retrace(true)
                .with_span_modes(true)
                .with_targets(true)
                .with_verbose_entry(true)
                .with_verbose_exit(true)
                .with_bracketed_fields(true),
        )
    } else {
        None
    };

    tracing_subscriber::registry().with(filter).with(tree).init();
}
