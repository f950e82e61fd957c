use anyhow::Context;
use serde::Deserialize;

/// Maximum number of concurrently tracked connections.
pub const MAX_CLIENTS: usize = 128;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Size of the session pool
    pub max_clients: usize,
    /// Read quota for a single receive call
    pub recv_chunk_size: usize,
    /// Write quota for a single send call
    pub send_chunk_size: usize,
    /// Upper bound on an unterminated header accumulation
    pub max_header_bytes: usize,
    /// Largest `Content-Length` a request may declare
    pub max_body_bytes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:6969".to_string(),
            max_clients: MAX_CLIENTS,
            recv_chunk_size: 4096,
            send_chunk_size: 4096,
            max_header_bytes: 64 * 1024,
            max_body_bytes: 64 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Loads the YAML file named by `CUPIDO_CONFIG`, or the defaults when it
    /// is unset. `LISTEN` overrides the listen address either way.
    pub fn load() -> anyhow::Result<Self> {
        let mut cfg = match std::env::var("CUPIDO_CONFIG") {
            Ok(path) => {
                let text = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config file {}", path))?;
                Self::from_yaml(&text)?
            }
            Err(_) => Self::default(),
        };

        if let Ok(addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = addr;
        }

        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        let cfg: Config = serde_yaml::from_str(text).context("Invalid config")?;

        anyhow::ensure!(cfg.server.max_clients > 0, "server.max_clients must be positive");
        anyhow::ensure!(cfg.server.recv_chunk_size > 0, "server.recv_chunk_size must be positive");
        anyhow::ensure!(cfg.server.send_chunk_size > 0, "server.send_chunk_size must be positive");

        Ok(cfg)
    }
}
