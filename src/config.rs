use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::sync::EchoPolicy;
use crate::sync::paginator::DEFAULT_PAGE_SIZE;

pub const DEFAULT_CONFIG_PATH: &str = "config/client.json";
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server_url: String,
    /// Pre-fills the user for `/join` when it is omitted.
    pub username: Option<String>,
    pub page_size: usize,
    pub echo_policy: EchoPolicy,
    pub channel_capacity: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            username: None,
            page_size: DEFAULT_PAGE_SIZE,
            echo_policy: EchoPolicy::default(),
            channel_capacity: 100,
        }
    }
}

impl AppConfig {
    /// CLI and environment values win over the file.
    pub fn with_overrides(mut self, server_url: Option<String>, username: Option<String>) -> Self {
        if let Some(server_url) = server_url {
            self.server_url = server_url;
        }
        if username.is_some() {
            self.username = username;
        }
        self
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    match fs::read_to_string(path) {
        Ok(content) => parse_config(&content).unwrap_or_else(|err| {
            log::warn!("Failed to parse config file {}: {err}", path.display());
            AppConfig::default()
        }),
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    }
}

fn parse_config(content: &str) -> serde_json::Result<AppConfig> {
    serde_json::from_str(content)
}
