//! Server settings read from the environment.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SEED_PATH: &str = "catalog.toml";

/// Runtime configuration for the HTTP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Address the listener binds to (`BIND_ADDR`)
    pub bind_addr: SocketAddr,
    /// `SeaORM` connection string (`DATABASE_URL`)
    pub database_url: String,
    /// Catalog seed file (`CATALOG_SEED_PATH`)
    pub seed_path: PathBuf,
}

impl ServerConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Unset or blank keys fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let bind_addr = get("BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_addr.parse().map_err(|e| Error::Config {
            message: format!("BIND_ADDR '{bind_addr}' is not a socket address: {e}"),
        })?;

        Ok(Self {
            bind_addr,
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            seed_path: PathBuf::from(get("CATALOG_SEED_PATH", DEFAULT_SEED_PATH)),
        })
    }
}
