//! The factored learning loop (§4.5–§4.8): rolling statistics, a DBN
//! transition model, cooperative prioritized sweeping, and cooperative
//! Q-learning.

pub mod cps_queue;
pub mod dbn;
pub mod qlearning;
pub mod stats;

pub use cps_queue::CpsQueue;
pub use dbn::{Dbn, VariableModel};
pub use qlearning::CooperativeQLearning;
pub use stats::{FactoredStatistics, RollingStatistic, SingleAgentStatistics};

/// Installs a `tracing` subscriber that logs each solver/backup span's
/// duration on completion (the elimination-order, backup, and pruning
/// spans this workspace's `debug_span!` calls open), honoring `RUST_LOG`
/// and defaulting to `factorplan=info` when unset. Idempotent; safe to
/// call from multiple entry points (tests, examples, binaries built on
/// this crate).
pub fn init_logging() {
    static INIT_LOGGING: std::sync::Once = std::sync::Once::new();

    INIT_LOGGING.call_once(|| {
        use tracing_subscriber::fmt::format::FmtSpan;
        use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

        std::panic::set_hook(Box::new(|info| {
            tracing::error!(panic = %info, "factorplan panicked");
        }));

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("factorplan=info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_span_events(FmtSpan::CLOSE).with_target(false).compact())
            .init();
    });
}
