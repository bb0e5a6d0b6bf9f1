use eyre::Result;
use tracing_subscriber::{
    filter::{LevelFilter, Targets},
    fmt,
    prelude::*,
    Layer, Registry,
};

/// Logging level. A "higher level" means more will be logged.
#[derive(Default, Debug, Clone, Copy, serde::Deserialize, PartialOrd, Ord, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Level {
    /// Off
    Off = 0,
    /// Error
    Error = 1,
    /// Warn
    Warn = 2,
    /// Debug
    Debug = 4,
    /// Trace
    Trace = 5,
    /// Info
    #[serde(other)]
    #[default]
    Info = 3,
}

impl From<Level> for LevelFilter {
    fn from(level: Level) -> LevelFilter {
        match level {
            Level::Off => LevelFilter::OFF,
            Level::Error => LevelFilter::ERROR,
            Level::Warn => LevelFilter::WARN,
            Level::Debug => LevelFilter::DEBUG,
            Level::Trace => LevelFilter::TRACE,
            Level::Info => LevelFilter::INFO,
        }
    }
}

/// Output format of the log lines.
#[derive(Default, Debug, Clone, Copy, serde::Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Style {
    /// Multi-line, human oriented
    Pretty,
    /// One JSON object per event
    Json,
    /// Single line, abbreviated
    Compact,
    /// Single line with every field
    #[serde(other)]
    #[default]
    Full,
}

impl Style {
    fn layer(self) -> Box<dyn Layer<Registry> + Send + Sync> {
        match self {
            Style::Pretty => fmt::layer().pretty().boxed(),
            Style::Json => fmt::layer().json().boxed(),
            Style::Compact => fmt::layer().compact().boxed(),
            Style::Full => fmt::layer().boxed(),
        }
    }
}

/// Configuration for the tracing subscriber of applications using the
/// bindings
#[derive(Debug, Clone, Default, serde::Deserialize, PartialEq, Eq)]
pub struct TracingConfig {
    #[serde(default)]
    fmt: Style,
    #[serde(default)]
    level: Level,
}

impl TracingConfig {
    /// A config with the given style and level
    pub fn new(fmt: Style, level: Level) -> Self {
        Self { fmt, level }
    }

    /// The level events are filtered at
    pub fn level(&self) -> Level {
        self.level
    }

    fn targets(&self) -> Targets {
        let mut targets = Targets::new().with_default(self.level);
        if self.level < Level::Trace {
            // only show transport internals at trace level
            targets = targets.with_target("hyper", Level::Info);
            targets = targets.with_target("reqwest", Level::Info);
            targets = targets.with_target("ethers_providers", Level::Info);
        }
        targets
    }

    /// Attempt to instantiate and register a tracing subscriber setup from
    /// settings.
    pub fn start_tracing(&self) -> Result<()> {
        let err_layer = tracing_error::ErrorLayer::default();

        let subscriber = Registry::default()
            .with(self.fmt.layer())
            .with(self.targets())
            .with(err_layer);

        subscriber.try_init()?;
        Ok(())
    }
}
