//! Clone options
//!
//! Builder-style settings for a single call. The serializable subset can also
//! be loaded from JSON:
//!
//! ```json
//! { "logMode": "quiet", "prioritizePerformance": true, "async": false }
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::customizer::Customizer;
use crate::error::{CloneError, CloneResult};
use crate::tag::ResolveMode;

/// How much detail degradation reports carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Report nothing
    Silent,
    /// Report without paths
    Quiet,
    /// Report with the path from the root
    #[default]
    Verbose,
}

impl LogMode {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            LogMode::Silent => "silent",
            LogMode::Quiet => "quiet",
            LogMode::Verbose => "verbose",
        }
    }
}

impl FromStr for LogMode {
    type Err = CloneError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(LogMode::Silent),
            "quiet" => Ok(LogMode::Quiet),
            "verbose" => Ok(LogMode::Verbose),
            other => Err(CloneError::InvalidOptions(format!(
                "unknown log mode `{other}` (expected silent, quiet or verbose)"
            ))),
        }
    }
}

impl fmt::Display for LogMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Receiver of degradation reports
#[derive(Clone)]
pub struct LogSink(Arc<dyn Fn(&CloneError) + Send + Sync>);

impl LogSink {
    /// Wrap a callback
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&CloneError) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn emit(&self, err: &CloneError) {
        (self.0)(err)
    }
}

impl fmt::Debug for LogSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("LogSink(..)")
    }
}

/// Options for [`clone_deep`](crate::clone_deep)
#[derive(Debug, Clone, Default)]
pub struct CloneOptions {
    /// Consulted before the built-in strategies
    pub customizer: Option<Customizer>,
    /// Where reports go; `tracing::warn!` when unset
    pub log: Option<LogSink>,
    /// Report detail
    pub log_mode: LogMode,
    /// Trust own `Symbol.toStringTag` claims when resolving kinds
    pub prioritize_performance: bool,
    /// Never call `Symbol.cloningMethod`
    pub ignore_cloning_methods: bool,
    /// Fail the call when a customizer errors instead of falling back
    pub let_customizer_throw: bool,
    /// Return a promise that waits for every async placeholder
    pub async_mode: bool,
}

impl CloneOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the customizer
    pub fn customizer(mut self, customizer: Customizer) -> Self {
        self.customizer = Some(customizer);
        self
    }

    /// Set the log sink
    pub fn log<F>(mut self, f: F) -> Self
    where
        F: Fn(&CloneError) + Send + Sync + 'static,
    {
        self.log = Some(LogSink::new(f));
        self
    }

    /// Set the log mode
    pub fn log_mode(mut self, mode: LogMode) -> Self {
        self.log_mode = mode;
        self
    }

    /// Enable or disable tag-claim trust
    pub fn prioritize_performance(mut self, enabled: bool) -> Self {
        self.prioritize_performance = enabled;
        self
    }

    /// Enable or disable cloning-method lookup
    pub fn ignore_cloning_methods(mut self, enabled: bool) -> Self {
        self.ignore_cloning_methods = enabled;
        self
    }

    /// Enable or disable customizer error propagation
    pub fn let_customizer_throw(mut self, enabled: bool) -> Self {
        self.let_customizer_throw = enabled;
        self
    }

    /// Enable or disable async mode
    pub fn async_mode(mut self, enabled: bool) -> Self {
        self.async_mode = enabled;
        self
    }

    /// Load the serializable settings from JSON
    pub fn from_json_str(json: &str) -> CloneResult<Self> {
        let config = CloneConfig::parse(json)?;
        if config.force {
            return Err(CloneError::InvalidOptions(
                "`force` only applies to clone_deep_fully".into(),
            ));
        }
        Ok(config.into_options())
    }

    pub(crate) fn resolve_mode(&self) -> ResolveMode {
        if self.prioritize_performance {
            ResolveMode::Fast
        } else {
            ResolveMode::Robust
        }
    }
}

/// Options for [`clone_deep_fully`](crate::clone_deep_fully)
#[derive(Debug, Clone, Default)]
pub struct FullCloneOptions {
    /// Everything [`clone_deep`](crate::clone_deep) accepts
    pub options: CloneOptions,
    /// Keep cloning prototypes past ones that carry methods
    pub force: bool,
}

impl FullCloneOptions {
    /// Default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `force`
    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Replace the base options
    pub fn options(mut self, options: CloneOptions) -> Self {
        self.options = options;
        self
    }

    /// Load the serializable settings (including `force`) from JSON
    pub fn from_json_str(json: &str) -> CloneResult<Self> {
        let config = CloneConfig::parse(json)?;
        let force = config.force;
        Ok(Self {
            options: config.into_options(),
            force,
        })
    }
}

impl From<CloneOptions> for FullCloneOptions {
    fn from(options: CloneOptions) -> Self {
        Self {
            options,
            force: false,
        }
    }
}

/// Serializable option subset
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, default)]
struct CloneConfig {
    log_mode: LogMode,
    prioritize_performance: bool,
    ignore_cloning_methods: bool,
    let_customizer_throw: bool,
    #[serde(rename = "async")]
    async_mode: bool,
    force: bool,
}

impl CloneConfig {
    fn parse(json: &str) -> CloneResult<Self> {
        serde_json::from_str(json).map_err(|e| CloneError::InvalidOptions(e.to_string()))
    }

    fn into_options(self) -> CloneOptions {
        CloneOptions {
            log_mode: self.log_mode,
            prioritize_performance: self.prioritize_performance,
            ignore_cloning_methods: self.ignore_cloning_methods,
            let_customizer_throw: self.let_customizer_throw,
            async_mode: self.async_mode,
            ..CloneOptions::default()
        }
    }
}
