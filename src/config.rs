//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

use crate::middleware::auth::Credentials;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `SERVER_HOST` (optional): bind address, defaults to `0.0.0.0`
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 1337
/// - `BASIC_AUTH_ENABLED` (optional): guard `/md-to-pdf` with Basic Auth, defaults to `true`
/// - `BASIC_AUTH_USERNAME` / `BASIC_AUTH_PASSWORD` (optional): credentials, default to empty
/// - `BASIC_AUTH_REALM` (optional): realm named in the challenge, defaults to `Pandoxed`
/// - `MAX_BODY_BYTES` (optional): upload ceiling, defaults to 1,000,000
/// - `PANDOC_TIMEOUT_SECS` (optional): converter wall-clock limit, defaults to 10
/// - `PANDOC_PATH` (optional): converter executable, defaults to `pandoc`
/// - `PDF_ENGINE` (optional): value passed to `--pdf-engine`, defaults to `lualatex`
/// - `STAGING_DIR` (optional): where temporary files live, defaults to the OS temp dir
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub server_host: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_auth_enabled")]
    pub basic_auth_enabled: bool,

    #[serde(default)]
    pub basic_auth_username: String,

    /// Older deployments spell the variable `BASIC_AUTH_PASWORD`.
    #[serde(default, alias = "basic_auth_pasword")]
    pub basic_auth_password: String,

    #[serde(default = "default_realm")]
    pub basic_auth_realm: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    #[serde(default = "default_pandoc_timeout_secs")]
    pub pandoc_timeout_secs: u64,

    #[serde(default = "default_pandoc_path")]
    pub pandoc_path: String,

    #[serde(default = "default_pdf_engine")]
    pub pdf_engine: String,

    #[serde(default)]
    pub staging_dir: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1337
}

fn default_auth_enabled() -> bool {
    true
}

fn default_realm() -> String {
    "Pandoxed".to_string()
}

fn default_max_body_bytes() -> usize {
    1_000_000
}

fn default_pandoc_timeout_secs() -> u64 {
    10
}

fn default_pandoc_path() -> String {
    "pandoc".to_string()
}

fn default_pdf_engine() -> String {
    "lualatex".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: default_host(),
            server_port: default_port(),
            basic_auth_enabled: default_auth_enabled(),
            basic_auth_username: String::new(),
            basic_auth_password: String::new(),
            basic_auth_realm: default_realm(),
            max_body_bytes: default_max_body_bytes(),
            pandoc_timeout_secs: default_pandoc_timeout_secs(),
            pandoc_path: default_pandoc_path(),
            pdf_engine: default_pdf_engine(),
            staging_dir: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment variable value cannot be parsed
    /// into the expected type (e.g. `SERVER_PORT=abc`).
    pub fn from_env() -> Result<Self, envy::Error> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: server_port -> SERVER_PORT
        envy::from_env::<Config>()
    }

    /// Address the listener binds to, e.g. `0.0.0.0:1337`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    pub fn pandoc_timeout(&self) -> Duration {
        Duration::from_secs(self.pandoc_timeout_secs)
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Credentials for the Auth Gate, or `None` when the gate is switched off.
    ///
    /// Empty credentials are still returned; the gate rejects everything in that case.
    pub fn credentials(&self) -> Option<Credentials> {
        self.basic_auth_enabled.then(|| {
            Credentials::new(
                &self.basic_auth_username,
                &self.basic_auth_password,
                &self.basic_auth_realm,
            )
        })
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("basic_auth_enabled", &self.basic_auth_enabled)
            .field("basic_auth_username", &self.basic_auth_username)
            .field("basic_auth_password", &"<redacted>")
            .field("basic_auth_realm", &self.basic_auth_realm)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("pandoc_timeout_secs", &self.pandoc_timeout_secs)
            .field("pandoc_path", &self.pandoc_path)
            .field("pdf_engine", &self.pdf_engine)
            .field("staging_dir", &self.staging_dir)
            .finish()
    }
}
