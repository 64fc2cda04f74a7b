//! Shared setup for commands that talk to the store or run a session.

use std::future::Future;

use tokio::runtime::Runtime;
use tracing::info;

use proxima::config::ConfigFile;
use proxima::logging::{self, LoggingConfig, LoggingGuard};

use crate::error::CliError;

/// Loaded configuration, logging, and a Tokio runtime for one command.
pub struct CliRunner {
    config: ConfigFile,
    runtime: Runtime,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load the config file, install logging, and build the runtime.
    ///
    /// `verbose` raises the log level to `debug` unless `RUST_LOG` is set.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;

        let mut logging_config = LoggingConfig::from(&config.logging);
        if verbose {
            logging_config = logging_config.with_level("debug");
        }
        let guard = logging::init(&logging_config)?;

        let runtime = Runtime::new()?;

        Ok(Self {
            config,
            runtime,
            _logging: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log which command is starting.
    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = env!("CARGO_PKG_VERSION"),
            store_configured = self.config.store.url.is_some(),
            "Proxima CLI starting"
        );
    }

    /// Run a future to completion on the command's runtime.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}
