//! Runtime session state, options, and configuration for Tarn.
//!
//! A [`Session`] bundles everything a host needs to set up before it starts
//! evaluating programs:
//!
//! - Runtime [`Options`] (handoff buffer sizes, daemon thread settings,
//!   logging filter), loadable from a TOML file
//! - The [`SymbolGenerator`] used by desugaring passes to mint fresh names
//!
//! # Configuration file
//!
//! ```toml
//! log_filter = "tarn_core=debug,info"
//! handoff_capacity = 64
//! daemon_stack_size = 4194304
//! symbol_prefix = "$"
//! ```
//!
//! Every key is optional; missing keys take their [`Default`] values.

#![warn(missing_docs)]

mod symbol;

pub use symbol::{AtomicSymbolGenerator, SymbolGenerator};

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Runtime options that can be set from a configuration file or by the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// `tracing` filter directive used by [`init_tracing`].
    pub log_filter: String,
    /// Capacity of the bounded channels behind rallies and daemon feeds.
    pub handoff_capacity: usize,
    /// Stack size for daemon and rally worker threads.
    pub daemon_stack_size: usize,
    /// Prefix of generated symbols.
    pub symbol_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            log_filter: "warn".to_string(),
            handoff_capacity: 64,
            daemon_stack_size: 2 * 1024 * 1024, // 2 MB
            symbol_prefix: "$".to_string(),
        }
    }
}

impl Options {
    /// Parse options from TOML source.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is not valid TOML or a key has the
    /// wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self, SessionError> {
        let options: Self = toml::from_str(source)?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist, cannot be read, or does
    /// not contain valid options.
    pub fn load(path: impl AsRef<Utf8Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SessionError::ConfigNotFound(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    fn validate(&self) -> Result<(), SessionError> {
        if self.handoff_capacity == 0 {
            return Err(SessionError::InvalidConfig(
                "handoff_capacity must be at least 1".to_string(),
            ));
        }
        if self.daemon_stack_size < 64 * 1024 {
            return Err(SessionError::InvalidConfig(format!(
                "daemon_stack_size of {} bytes is too small",
                self.daemon_stack_size
            )));
        }
        Ok(())
    }
}

/// Errors that can occur during session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Configuration file not found.
    #[error("configuration file not found: {0}")]
    ConfigNotFound(Utf8PathBuf),
    /// Invalid configuration values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// TOML parsing error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    /// The logging subscriber could not be installed.
    #[error("failed to initialize logging: {0}")]
    Logging(String),
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The session holds the state shared by every evaluation in a process.
pub struct Session {
    /// Runtime options.
    pub options: Options,
    symbols: Arc<dyn SymbolGenerator>,
}

impl Session {
    /// Create a new session with the given options.
    #[must_use]
    pub fn new(options: Options) -> Self {
        let symbols = Arc::new(AtomicSymbolGenerator::with_prefix(
            options.symbol_prefix.clone(),
        ));
        Self { options, symbols }
    }

    /// Create a new session with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Options::default())
    }

    /// Replace the symbol generator, for hosts and tests that need to
    /// isolate or share name generation.
    #[must_use]
    pub fn with_symbol_generator(mut self, symbols: Arc<dyn SymbolGenerator>) -> Self {
        self.symbols = symbols;
        self
    }

    /// The symbol generator of this session.
    #[must_use]
    pub fn symbols(&self) -> &Arc<dyn SymbolGenerator> {
        &self.symbols
    }
}

/// A shared, thread-safe reference to a session.
pub type SessionRef = Arc<Session>;

/// Install a global `tracing` subscriber that writes formatted events to
/// stderr, filtered by [`Options::log_filter`].
///
/// # Errors
///
/// Returns an error if the filter does not parse or a global subscriber is
/// already installed.
pub fn init_tracing(options: &Options) -> Result<(), SessionError> {
    let filter = EnvFilter::try_new(&options.log_filter)
        .map_err(|e| SessionError::InvalidConfig(format!("invalid log filter: {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| SessionError::Logging(e.to_string()))?;

    tracing::debug!(filter = %options.log_filter, "logging initialized");
    Ok(())
}
