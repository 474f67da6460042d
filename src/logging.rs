use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::Level;
use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::domain::DashError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Write to the given file (the TUI owns the terminal).
    File,
    Stderr,
    Discard,
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
    pub log_file: Option<PathBuf>,
    pub target: LogTarget,
}

impl LogConfig {
    /// 0: info, 1: debug, 2+: trace
    pub fn from_verbosity(verbosity: u8) -> Self {
        let level = match verbosity {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        };
        Self {
            level,
            log_file: None,
            target: LogTarget::Discard,
        }
    }

    pub fn with_file(mut self, log_file: Option<PathBuf>) -> Self {
        self.target = if log_file.is_some() {
            LogTarget::File
        } else {
            self.target
        };
        self.log_file = log_file;
        self
    }

    pub fn with_target(mut self, target: LogTarget) -> Self {
        if self.log_file.is_none() {
            self.target = target;
        }
        self
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(format!("stockview={}", self.level)))
    }
}

pub fn init_logging(config: &LogConfig) -> Result<(), DashError> {
    let registry = tracing_subscriber::registry()
        .with(config.filter())
        .with(ErrorLayer::default());

    match (config.target, &config.log_file) {
        (LogTarget::File, Some(path)) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .try_init()
                .map_err(|e| DashError::LoadingFailed(format!("logging: {e}")))?;
        }
        (LogTarget::Stderr, _) => {
            registry
                .with(fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| DashError::LoadingFailed(format!("logging: {e}")))?;
        }
        _ => {
            registry
                .with(fmt::layer().with_writer(std::io::sink))
                .try_init()
                .map_err(|e| DashError::LoadingFailed(format!("logging: {e}")))?;
        }
    }
    Ok(())
}
