//! Log output setup.
//!
//! The suite itself only emits `tracing` events; this installs the global
//! subscriber that prints them. Filtering follows `RUST_LOG`, default `info`.

use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INIT: OnceLock<()> = OnceLock::new();

/// Output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl LogFormat {
    /// Pick the format from the suite's `json_logs` switch
    #[must_use]
    pub const fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init_tracing(format: LogFormat) {
    INIT.get_or_init(|| {
        let registry = Registry::default().with(env_filter());
        let result = match format {
            LogFormat::Text => registry
                .with(fmt::layer().with_target(false))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_current_span(true))
                .try_init(),
        };
        if result.is_err() {
            tracing::debug!("global subscriber already installed");
        }
    });
}

/// Subscriber for tests: output captured by the test harness
pub fn init_test_tracing() {
    let _ = fmt()
        .with_env_filter(env_filter())
        .with_test_writer()
        .try_init();
}
