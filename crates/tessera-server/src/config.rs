//! Server configuration: listener, logging, and the provider with its
//! statically registered clients and accounts.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use tessera_auth::{Account, Client, ProviderConfig};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub provider: ProviderConfig,
    /// Clients served by the in-memory registry.
    pub clients: Vec<Client>,
    /// Accounts served by the in-memory account provider.
    pub accounts: Vec<Account>,
}

impl AppConfig {
    /// Listen address; an unparseable host falls back to all interfaces.
    pub fn addr(&self) -> SocketAddr {
        let ip = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        SocketAddr::new(ip, self.server.port)
    }

    /// Checks the listener settings, the provider section and every client
    /// registration.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        self.provider
            .validate()
            .map_err(|e| format!("provider: {e}"))?;

        let mut seen = std::collections::HashSet::new();
        for client in &self.clients {
            client
                .validate()
                .map_err(|e| format!("client '{}': {e}", client.client_id))?;
            if !seen.insert(client.client_id.as_str()) {
                return Err(format!("client '{}' is registered twice", client.client_id));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for form and JSON request bodies.
    pub body_limit_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            body_limit_bytes: 64 * 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `tessera_auth=debug,info`.
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File, FileFormat};
    use std::path::Path;

    /// Loads `path` (TOML, optional) and applies `TESSERA__` environment
    /// overrides, e.g. `TESSERA__SERVER__PORT=9090`.
    pub fn load_config(path: &Path) -> Result<AppConfig, String> {
        let file = File::from(path)
            .format(FileFormat::Toml)
            .required(false);
        let merged: AppConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix("TESSERA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| format!("config build error: {e}"))?
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        merged.validate()?;
        Ok(merged)
    }
}
