use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use std::{env, fmt, str::FromStr, time::Duration};

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum SmtpTls {
    /// Implicit TLS, usually port 465
    Tls,
    Starttls,
    None,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub trust_x_forwarded_for: bool,

    #[serde(default = "default_rate_limit_max")]
    pub rate_limit_max: u64,

    #[serde(default = "default_rate_limit_window_secs")]
    pub rate_limit_window_secs: u64,

    #[serde(default = "default_duplicate_window_secs")]
    pub duplicate_window_secs: i64,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    #[serde(default = "default_smtp_tls")]
    pub smtp_tls: SmtpTls,

    #[serde(default)]
    pub smtp_username: String,

    #[serde(default)]
    pub smtp_password: String,

    #[serde(default = "default_smtp_timeout_secs")]
    pub smtp_timeout_secs: u64,

    #[serde(default)]
    pub mail_from: Option<String>,

    #[serde(default)]
    pub mail_to: Option<String>,

    #[serde(default = "default_owner_name")]
    pub owner_name: String,

    #[serde(default)]
    pub admin_api_key: Option<String>,

    #[serde(default)]
    pub log_format: Option<LogFormat>,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-Contact-API".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_rate_limit_max() -> u64 {
    5
}
fn default_rate_limit_window_secs() -> u64 {
    15 * 60
}
fn default_duplicate_window_secs() -> i64 {
    60 * 60
}
fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}
fn default_smtp_port() -> u16 {
    465
}
fn default_smtp_tls() -> SmtpTls {
    SmtpTls::Tls
}
fn default_smtp_timeout_secs() -> u64 {
    10
}
fn default_owner_name() -> String {
    "Portfolio Owner".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: 1,
            database_url: String::new(),
            redis_url: None,
            cors_allowed_origins: default_cors_origins(),
            trust_x_forwarded_for: false,
            rate_limit_max: default_rate_limit_max(),
            rate_limit_window_secs: default_rate_limit_window_secs(),
            duplicate_window_secs: default_duplicate_window_secs(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_tls: default_smtp_tls(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            smtp_timeout_secs: default_smtp_timeout_secs(),
            mail_from: None,
            mail_to: None,
            owner_name: default_owner_name(),
            admin_api_key: None,
            log_format: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Hosting platforms usually inject a bare DATABASE_URL
        config.database_url = fill_or_env(config.database_url, "DATABASE_URL")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.rate_limit_window_secs == 0 {
            errors.push("RATE_LIMIT_WINDOW_SECS must be greater than zero");
        }
        if self.duplicate_window_secs < 0 {
            errors.push("DUPLICATE_WINDOW_SECS cannot be negative");
        }
        if self.admin_api_key.as_deref().is_some_and(|k| k.len() < 16) {
            errors.push("ADMIN_API_KEY must be at least 16 characters");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn duplicate_window(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.duplicate_window_secs)
    }

    /// Sender address; the SMTP account itself unless overridden.
    pub fn mail_from_address(&self) -> &str {
        self.mail_from.as_deref().unwrap_or(&self.smtp_username)
    }

    /// Where owner notifications go; the SMTP account itself unless overridden.
    pub fn mail_to_address(&self) -> &str {
        self.mail_to.as_deref().unwrap_or(&self.smtp_username)
    }

    pub fn smtp_configured(&self) -> bool {
        !self.smtp_host.trim().is_empty()
            && !self.smtp_username.trim().is_empty()
            && !self.smtp_password.is_empty()
    }

    pub fn effective_log_format(&self) -> LogFormat {
        self.log_format.unwrap_or(if self.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        })
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        self.as_deref().unwrap_or_default().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("redis_url", &self.redis_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("rate_limit_max", &self.rate_limit_max)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("duplicate_window_secs", &self.duplicate_window_secs)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_tls", &self.smtp_tls)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &self.smtp_password.redact())
            .field("mail_from", &self.mail_from)
            .field("mail_to", &self.mail_to)
            .field("owner_name", &self.owner_name)
            .field("admin_api_key", &self.admin_api_key.redact())
            .field("log_format", &self.log_format)
            .finish()
    }
}
