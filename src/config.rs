use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use tracing::info;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

pub const ENV_CHANNEL_ACCESS_TOKEN: &str = "LINE_CHANNEL_ACCESS_TOKEN";
pub const ENV_CHANNEL_SECRET: &str = "LINE_CHANNEL_SECRET";
pub const ENV_GENERATION_API_KEY: &str = "GEMINI_API_KEY";
pub const ENV_ADMIN_TOKEN: &str = "LINE_RESPONDER_ADMIN_TOKEN";

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub line: LineConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub http: HTTPConfig,
}
impl AppConfig {
    /// Reads the TOML config (an explicit path must exist, the default one may not),
    /// then fills any secrets left out of the file from the environment.
    pub fn load(config_filepath: Option<PathBuf>) -> Result<Self> {
        let config = match config_filepath {
            Some(config_path) => Self::from_file(config_path)?,
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                if default_path.is_file() {
                    Self::from_file(default_path)?
                } else {
                    info!("No {DEFAULT_CONFIG_PATH} found, using defaults and environment");
                    Self::default()
                }
            }
        };

        config
            .with_secrets(|name| std::env::var(name).ok())?
            .validate()
    }

    fn validate(self) -> Result<Self> {
        if !self.http.callback_path.starts_with('/') {
            bail!(
                "HTTP callback_path must start with '/', got {:?}",
                self.http.callback_path
            );
        }
        if self.line.request_timeout_secs == 0 {
            bail!("LINE request_timeout_secs must be greater than zero!");
        }
        if self.generation.timeout_secs == 0 {
            bail!("Generation timeout_secs must be greater than zero!");
        }
        Ok(self)
    }

    fn from_file(config_path: PathBuf) -> Result<Self> {
        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {config_path:?}"))?;

        toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse TOML config file: {config_path:?}"))
    }

    /// Values already present in the file take priority over `lookup`.
    pub fn with_secrets<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        fill_required(
            &mut self.line.channel_access_token,
            ENV_CHANNEL_ACCESS_TOKEN,
            &lookup,
        )?;
        fill_required(&mut self.line.channel_secret, ENV_CHANNEL_SECRET, &lookup)?;

        if self.generation.api_key.is_none() {
            self.generation.api_key = lookup(ENV_GENERATION_API_KEY);
        }
        if self.http.admin_token.is_none() {
            self.http.admin_token = lookup(ENV_ADMIN_TOKEN);
        }

        Ok(self)
    }
}

fn fill_required<F>(value: &mut String, env_name: &str, lookup: &F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if !value.trim().is_empty() {
        return Ok(());
    }
    match lookup(env_name) {
        Some(found) => {
            *value = found;
            Ok(())
        }
        None => bail!("Missing required {env_name} environment variable or config value!"),
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LineConfig {
    #[serde(default)]
    pub channel_access_token: String,

    #[serde(default)]
    pub channel_secret: String,

    #[serde(default = "default_line_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_line_request_timeout")]
    pub request_timeout_secs: u64,
}
impl Default for LineConfig {
    fn default() -> Self {
        Self {
            channel_access_token: String::new(),
            channel_secret: String::new(),
            api_base_url: default_line_api_base_url(),
            request_timeout_secs: default_line_request_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Without a key, unmatched messages get the static fallback reply.
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_generation_model")]
    pub model: String,

    #[serde(default = "default_generation_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,
}
impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_generation_model(),
            api_base_url: default_generation_api_base_url(),
            timeout_secs: default_generation_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct HTTPConfig {
    #[serde(default = "default_http_address")]
    pub address: SocketAddr,

    #[serde(default = "default_callback_path")]
    pub callback_path: String,

    /// Enables the authenticated `/sys/set-log-level` route.
    #[serde(default)]
    pub admin_token: Option<String>,

    #[serde(default)]
    pub tls: Option<TLSConfig>,
}
impl Default for HTTPConfig {
    fn default() -> Self {
        Self {
            address: default_http_address(),
            callback_path: default_callback_path(),
            admin_token: None,
            tls: None,
        }
    }
}

#[cfg_attr(
    not(any(feature = "tls-rustls", feature = "tls-native")),
    allow(dead_code)
)]
#[derive(Debug, Clone, Deserialize)]
pub struct TLSConfig {
    #[serde(deserialize_with = "deserialize_existing_file")]
    pub certificate_path: PathBuf,

    #[serde(deserialize_with = "deserialize_existing_file")]
    pub key_path: PathBuf,
}

fn default_line_api_base_url() -> String {
    "https://api.line.me".to_string()
}
fn default_line_request_timeout() -> u64 {
    10
}
fn default_generation_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_generation_api_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}
fn default_generation_timeout() -> u64 {
    20
}
fn default_http_address() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 5000)
}
fn default_callback_path() -> String {
    "/callback".to_string()
}

fn deserialize_existing_file<'de, D>(deserializer: D) -> Result<PathBuf, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let path = PathBuf::deserialize(deserializer)?;
    if !path.is_file() {
        return Err(serde::de::Error::custom(format!(
            "File does not exist: {}",
            path.display()
        )));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config.line.api_base_url, "https://api.line.me");
        assert_eq!(config.line.request_timeout_secs, 10);
        assert_eq!(config.generation.api_key, None);
        assert_eq!(config.generation.model, "gemini-2.0-flash");
        assert_eq!(config.generation.timeout_secs, 20);
        assert_eq!(config.http.address, "127.0.0.1:5000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.http.callback_path, "/callback");
        assert!(config.http.tls.is_none());
    }

    #[test]
    fn test_file_values() {
        let config: AppConfig = toml::from_str(
            r#"
            [line]
            channel_access_token = "file-token"
            channel_secret = "file-secret"
            request_timeout_secs = 3

            [generation]
            api_key = "file-key"
            model = "gemini-1.5-pro"

            [http]
            address = "0.0.0.0:8080"
            callback_path = "/hooks/line"
            "#,
        )
        .unwrap();

        let config = config
            .with_secrets(env(&[
                (ENV_CHANNEL_ACCESS_TOKEN, "env-token"),
                (ENV_GENERATION_API_KEY, "env-key"),
            ]))
            .unwrap();

        assert_eq!(config.line.channel_access_token, "file-token");
        assert_eq!(config.line.channel_secret, "file-secret");
        assert_eq!(config.line.request_timeout_secs, 3);
        assert_eq!(config.generation.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.generation.model, "gemini-1.5-pro");
        assert_eq!(config.http.address.port(), 8080);
        assert_eq!(config.http.callback_path, "/hooks/line");
    }

    #[test]
    fn test_secrets_from_environment() {
        let config = AppConfig::default()
            .with_secrets(env(&[
                (ENV_CHANNEL_ACCESS_TOKEN, "env-token"),
                (ENV_CHANNEL_SECRET, "env-secret"),
                (ENV_GENERATION_API_KEY, "   "),
                (ENV_ADMIN_TOKEN, "admin"),
            ]))
            .unwrap();

        assert_eq!(config.line.channel_access_token, "env-token");
        assert_eq!(config.line.channel_secret, "env-secret");
        assert_eq!(config.generation.api_key, None, "Blank key must not enable generation");
        assert_eq!(config.http.admin_token.as_deref(), Some("admin"));
    }

    #[test]
    fn test_missing_required_secret() {
        let error = AppConfig::default()
            .with_secrets(env(&[(ENV_CHANNEL_ACCESS_TOKEN, "env-token")]))
            .unwrap_err();
        assert!(error.to_string().contains(ENV_CHANNEL_SECRET), "{error}");
    }

    #[test]
    fn test_validation() {
        let config: AppConfig = toml::from_str("[http]\ncallback_path = \"callback\"").unwrap();
        assert!(config.validate().is_err());
        assert!(AppConfig::default().validate().is_ok());

        let config: AppConfig = toml::from_str("[line]\nrequest_timeout_secs = 0").unwrap();
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("request_timeout_secs"), "{error}");

        let config: AppConfig = toml::from_str("[generation]\ntimeout_secs = 0").unwrap();
        let error = config.validate().unwrap_err();
        assert!(error.to_string().contains("timeout_secs"), "{error}");
    }

    #[test]
    fn test_tls_paths_must_exist() {
        let result = toml::from_str::<AppConfig>(
            r#"
            [http.tls]
            certificate_path = "/definitely/not/here.pem"
            key_path = "/definitely/not/here.key"
            "#,
        );
        assert!(result.is_err());
    }
}
