//! Diagnostic logging setup.

use std::{collections::HashSet, fmt::Display};

use tracing_subscriber::{Layer, filter::Targets, layer::SubscriberExt, util::SubscriberInitExt};

/// Type of event to trace.
#[derive(Clone, Debug, Eq, Hash, PartialEq, clap::ValueEnum)]
pub enum TraceEvent {
    /// Traces test discovery.
    #[clap(name = "discover")]
    Discover,
    /// Traces launching and reaping the command under test.
    #[clap(name = "execute")]
    Execute,
    /// Traces line-by-line output comparison.
    #[clap(name = "compare")]
    Compare,
}

impl Display for TraceEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Discover => write!(f, "discover"),
            Self::Execute => write!(f, "execute"),
            Self::Compare => write!(f, "compare"),
        }
    }
}

/// Configuration of the diagnostic log, which is written to standard error so that the
/// test report on standard output stays clean.
#[derive(Debug, Default)]
pub struct TraceEventConfig {
    enabled_trace_events: HashSet<TraceEvent>,
    verbose: bool,
}

impl TraceEventConfig {
    /// Installs a global subscriber with the given events enabled. With `verbose`, all
    /// events are enabled.
    pub fn init(enabled_trace_events: &[TraceEvent], verbose: bool) -> Self {
        let config = Self {
            enabled_trace_events: enabled_trace_events.iter().cloned().collect(),
            verbose,
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .without_time()
            .with_target(false)
            .with_filter(config.compose_filter());

        if tracing_subscriber::registry()
            .with(layer)
            .try_init()
            .is_err()
        {
            // Something went wrong; proceed on anyway but complain audibly.
            eprintln!("warning: failed to initialize tracing.");
        }

        config
    }

    /// Returns the set of enabled events.
    pub const fn enabled_events(&self) -> &HashSet<TraceEvent> {
        &self.enabled_trace_events
    }

    fn compose_filter(&self) -> Targets {
        if self.verbose {
            return Targets::new().with_default(tracing::Level::DEBUG);
        }

        let mut filter =
            Targets::new().with_default(tracing_subscriber::filter::LevelFilter::WARN);

        for event in &self.enabled_trace_events {
            filter = filter.with_target(event.to_string(), tracing::Level::DEBUG);
        }

        filter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    #[test]
    fn filter_enables_selected_targets() {
        let config = TraceEventConfig {
            enabled_trace_events: [TraceEvent::Compare].into_iter().collect(),
            verbose: false,
        };

        let filter = config.compose_filter();
        assert!(filter.would_enable("compare", &Level::DEBUG));
        assert!(!filter.would_enable("execute", &Level::DEBUG));
        assert!(filter.would_enable("execute", &Level::WARN));
    }

    #[test]
    fn verbose_enables_everything() {
        let config = TraceEventConfig {
            enabled_trace_events: HashSet::new(),
            verbose: true,
        };

        let filter = config.compose_filter();
        assert!(filter.would_enable("discover", &Level::DEBUG));
    }
}
