use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "postbridge.toml";

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub discord: DiscordConfig,
    pub github: GitHubConfig,
    pub server: ServerConfig,
    pub site: SiteConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DiscordConfig {
    /// Hex-encoded Ed25519 public key from the application's developer portal.
    pub public_key: String,
    pub application_id: String,
    /// The only identity allowed to invoke commands or submit modals.
    pub authorized_user_id: String,
}

#[derive(Clone, Debug)]
pub struct GitHubConfig {
    pub token: SecretString,
    /// Target repository in `owner/name` form.
    pub repo: String,
    pub base_branch: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub health_check_port: u16,
}

#[derive(Clone, Debug)]
pub struct SiteConfig {
    /// Public base URL of the published site, used in follow-up messages.
    pub base_url: String,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub discord_public_key: Option<String>,
    pub discord_application_id: Option<String>,
    pub discord_authorized_user_id: Option<String>,
    pub github_token: Option<String>,
    pub github_repo: Option<String>,
    pub github_base_branch: Option<String>,
    pub github_api_base: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            discord: DiscordConfig {
                public_key: String::new(),
                application_id: String::new(),
                authorized_user_id: String::new(),
            },
            github: GitHubConfig {
                token: String::new().into(),
                repo: String::new(),
                base_branch: "main".to_string(),
                api_base: "https://api.github.com".to_string(),
                timeout_secs: 10,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 3000,
                health_check_port: 8080,
            },
            site: SiteConfig { base_url: String::new() },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected =
                options.config_path.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(discord) = patch.discord {
            if let Some(public_key) = discord.public_key {
                self.discord.public_key = public_key;
            }
            if let Some(application_id) = discord.application_id {
                self.discord.application_id = application_id;
            }
            if let Some(authorized_user_id) = discord.authorized_user_id {
                self.discord.authorized_user_id = authorized_user_id;
            }
        }

        if let Some(github) = patch.github {
            if let Some(token_value) = github.token {
                self.github.token = token_value.into();
            }
            if let Some(repo) = github.repo {
                self.github.repo = repo;
            }
            if let Some(base_branch) = github.base_branch {
                self.github.base_branch = base_branch;
            }
            if let Some(api_base) = github.api_base {
                self.github.api_base = api_base;
            }
            if let Some(timeout_secs) = github.timeout_secs {
                self.github.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(health_check_port) = server.health_check_port {
                self.server.health_check_port = health_check_port;
            }
        }

        if let Some(site) = patch.site {
            if let Some(base_url) = site.base_url {
                self.site.base_url = base_url;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("POSTBRIDGE_DISCORD_PUBLIC_KEY") {
            self.discord.public_key = value;
        }
        if let Some(value) = read_env("POSTBRIDGE_DISCORD_APPLICATION_ID") {
            self.discord.application_id = value;
        }
        if let Some(value) = read_env("POSTBRIDGE_DISCORD_AUTHORIZED_USER_ID") {
            self.discord.authorized_user_id = value;
        }

        if let Some(value) = read_env("POSTBRIDGE_GITHUB_TOKEN") {
            self.github.token = value.into();
        }
        if let Some(value) = read_env("POSTBRIDGE_GITHUB_REPO") {
            self.github.repo = value;
        }
        if let Some(value) = read_env("POSTBRIDGE_GITHUB_BASE_BRANCH") {
            self.github.base_branch = value;
        }
        if let Some(value) = read_env("POSTBRIDGE_GITHUB_API_BASE") {
            self.github.api_base = value;
        }
        if let Some(value) = read_env("POSTBRIDGE_GITHUB_TIMEOUT_SECS") {
            self.github.timeout_secs = parse_u64("POSTBRIDGE_GITHUB_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("POSTBRIDGE_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("POSTBRIDGE_SERVER_PORT") {
            self.server.port = parse_u16("POSTBRIDGE_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("POSTBRIDGE_SERVER_HEALTH_CHECK_PORT") {
            self.server.health_check_port =
                parse_u16("POSTBRIDGE_SERVER_HEALTH_CHECK_PORT", &value)?;
        }

        if let Some(value) = read_env("POSTBRIDGE_SITE_BASE_URL") {
            self.site.base_url = value;
        }

        if let Some(value) = read_env("POSTBRIDGE_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("POSTBRIDGE_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(public_key) = overrides.discord_public_key {
            self.discord.public_key = public_key;
        }
        if let Some(application_id) = overrides.discord_application_id {
            self.discord.application_id = application_id;
        }
        if let Some(authorized_user_id) = overrides.discord_authorized_user_id {
            self.discord.authorized_user_id = authorized_user_id;
        }
        if let Some(token_value) = overrides.github_token {
            self.github.token = token_value.into();
        }
        if let Some(repo) = overrides.github_repo {
            self.github.repo = repo;
        }
        if let Some(base_branch) = overrides.github_base_branch {
            self.github.base_branch = base_branch;
        }
        if let Some(api_base) = overrides.github_api_base {
            self.github.api_base = api_base;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let key = self.discord.public_key.trim();
        if key.is_empty() {
            return Err(ConfigError::Validation(
                "discord.public_key must be set to the application's Ed25519 public key"
                    .to_string(),
            ));
        }
        match hex::decode(key) {
            Ok(bytes) if bytes.len() == 32 => {}
            _ => {
                return Err(ConfigError::Validation(
                    "discord.public_key must be 32 bytes of hex".to_string(),
                ))
            }
        }

        if self.discord.authorized_user_id.trim().is_empty() {
            return Err(ConfigError::Validation(
                "discord.authorized_user_id must name the identity allowed to publish".to_string(),
            ));
        }

        if self.github.token.expose_secret().trim().is_empty() {
            return Err(ConfigError::Validation("github.token must be set".to_string()));
        }

        let repo = self.github.repo.trim();
        let valid_repo = matches!(
            repo.split_once('/'),
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/')
        );
        if !valid_repo {
            return Err(ConfigError::Validation(format!(
                "github.repo must be `owner/name`, got `{repo}`"
            )));
        }

        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    discord: Option<DiscordPatch>,
    github: Option<GitHubPatch>,
    server: Option<ServerPatch>,
    site: Option<SitePatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Deserialize)]
struct DiscordPatch {
    public_key: Option<String>,
    application_id: Option<String>,
    authorized_user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitHubPatch {
    token: Option<String>,
    repo: Option<String>,
    base_branch: Option<String>,
    api_base: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    health_check_port: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct SitePatch {
    base_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => path.exists().then(|| path.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    }
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;
    toml::from_str(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().map(|value| value.trim().to_owned()).filter(|value| !value.is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidEnvOverride { key: key.to_owned(), value: value.to_owned() })
}
