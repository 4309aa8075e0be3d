use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;
use url::Url;

const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:5000/ws";

#[derive(Debug, Clone)]
pub struct Config {
    pub server_url: Url,
    pub catalog_path: PathBuf,
    pub currency_symbol: String,
    pub log_level: String,
    pub environment: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`Config::from_env`], but reads variables from the given env file first.
    pub fn from_env_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        dotenv::from_path(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw_url = lookup("ORDER_SERVER_URL").unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
        let server_url = Url::parse(&raw_url)
            .map_err(|e| anyhow::anyhow!("ORDER_SERVER_URL is not a valid URL: {}", e))?;

        let config = Config {
            server_url,
            catalog_path: lookup("CATALOG_PATH")
                .unwrap_or_else(|| "catalog.json".to_string())
                .into(),
            currency_symbol: lookup("CURRENCY_SYMBOL").unwrap_or_else(|| "₹".to_string()),
            log_level: lookup("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            environment: lookup("APP_ENV").unwrap_or_else(|| "development".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), anyhow::Error> {
        match self.server_url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(anyhow::anyhow!(
                    "ORDER_SERVER_URL must use ws:// or wss://, got {}://",
                    other
                ))
            }
        }

        if self.is_production() && self.server_url.scheme() != "wss" {
            return Err(anyhow::anyhow!(
                "ORDER_SERVER_URL must use wss:// in production"
            ));
        }

        if self.catalog_path.as_os_str().is_empty() {
            return Err(anyhow::anyhow!("CATALOG_PATH is empty"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.server_url.as_str(), "ws://127.0.0.1:5000/ws");
        assert_eq!(config.catalog_path, PathBuf::from("catalog.json"));
        assert_eq!(config.currency_symbol, "₹");
        assert_eq!(config.log_level, "info");
        assert!(!config.is_production());
    }

    #[test]
    fn test_rejects_http_scheme() {
        let result = Config::from_lookup(lookup(&[("ORDER_SERVER_URL", "http://localhost:5000")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_garbage_url() {
        let result = Config::from_lookup(lookup(&[("ORDER_SERVER_URL", "not a url")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_production_requires_wss() {
        let insecure = Config::from_lookup(lookup(&[("APP_ENV", "production")]));
        assert!(insecure.is_err());

        let secure = Config::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("ORDER_SERVER_URL", "wss://orders.example.com/ws"),
        ]))
        .unwrap();
        assert!(secure.is_production());
    }
}
