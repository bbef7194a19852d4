use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// 配置错误，启动阶段出现即拒绝启动
#[derive(Debug)]
pub enum ConfigError {
    Var(env::VarError),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Var(e) => write!(f, "missing environment variable: {}", e),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<env::VarError> for ConfigError {
    fn from(e: env::VarError) -> Self {
        ConfigError::Var(e)
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub jwt_expiration_secs: u64,
    pub rate_limit_requests: u32,
    pub rate_limit_window_secs: u64,
    pub cache_ttl_secs: u64,
    pub store_timeout_ms: u64,
    pub server_host: String,
    pub server_port: u16,
}

/// 设置项缺失时使用默认值；给出但无法解析（含负数）直接视为配置错误
fn parse_setting<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| {
            ConfigError::Invalid(format!("{} must be a positive integer, got '{}'", name, value))
        }),
        None => Ok(default),
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    parse_setting(name, env::var(name).ok(), default)
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let jwt_expiration = env::var("JWT_EXPIRATION")?
            .trim_end_matches('h')
            .parse::<u64>()
            .unwrap_or(24);
        let config = Config {
            database_url: env::var("DATABASE_URL")?,
            redis_url: env::var("REDIS_URL")?,
            server_host: env::var("SERVER_HOST")?,
            server_port: env::var("SERVER_PORT")?.parse().unwrap_or(3000),
            jwt_secret: env::var("JWT_SECRET")?,
            jwt_expiration_secs: jwt_expiration * 3600,
            rate_limit_requests: env_parse("RATE_LIMIT_REQUESTS", 100)?,
            rate_limit_window_secs: env_parse("RATE_LIMIT_WINDOW", 60)?,
            cache_ttl_secs: env_parse("CACHE_TTL", 300)?,
            store_timeout_ms: env_parse("STORE_TIMEOUT_MS", 1000)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// 限额、窗口和TTL必须为正数，零值视为配置错误
    fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_limit_requests == 0 {
            return Err(ConfigError::Invalid(
                "RATE_LIMIT_REQUESTS must be positive".into(),
            ));
        }
        if self.rate_limit_window_secs == 0 {
            return Err(ConfigError::Invalid(
                "RATE_LIMIT_WINDOW must be positive".into(),
            ));
        }
        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::Invalid("CACHE_TTL must be positive".into()));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "STORE_TIMEOUT_MS must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn jwt_expiration(&self) -> Duration {
        Duration::from_secs(self.jwt_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}
