use std::sync::Once;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Install the stderr tracing subscriber. `RUST_LOG` overrides the default level.
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    });
}

/// Wall-clock stopwatch for a single request.
pub struct Telemetry {
    label: &'static str,
    start: Instant,
}

impl Telemetry {
    pub fn start(label: &'static str) -> Self {
        Self {
            label,
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Emit the elapsed time at debug level and return it.
    pub fn finish(self) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!(label = self.label, elapsed_ms = elapsed.as_millis() as u64, "finished");
        elapsed
    }
}
