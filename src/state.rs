//! Shared, read-only request state.

use std::{path::PathBuf, sync::Arc};

use crate::{config::Config, services::pandoc::Converter};

/// Everything a request needs from process-wide configuration.
///
/// Cloned into every handler by Axum; nothing in here is mutated after startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub converter: Arc<Converter>,
    pub staging_dir: Arc<PathBuf>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn from_config(config: &Config) -> Self {
        Self {
            converter: Arc::new(Converter::from_config(config)),
            staging_dir: Arc::new(config.staging_dir()),
            max_body_bytes: config.max_body_bytes,
        }
    }
}
