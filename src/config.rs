use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub stripe: StripeConfig,
    #[serde(default)]
    pub turnstile: TurnstileConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    /// How long a request waits for a pooled connection before failing as retryable
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_acquire_timeout() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StripeConfig {
    pub webhook_secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TurnstileConfig {
    pub secret_key: String,
    #[serde(default)]
    pub expected_hostname: Option<String>,
    #[serde(default)]
    pub expected_action: Option<String>,
}

/// Which registrations occupy a capacity slot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// pending, partial, confirmed and paid registrations all hold a slot
    #[default]
    Reserved,
    /// only confirmed and paid registrations hold a slot
    ConfirmedOnly,
}

impl std::str::FromStr for CapacityPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reserved" => Ok(CapacityPolicy::Reserved),
            "confirmed_only" => Ok(CapacityPolicy::ConfirmedOnly),
            other => Err(format!("unknown capacity policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub capacity_policy: CapacityPolicy,
    /// 0 disables the background reconciliation sweep
    #[serde(default = "default_reconcile_interval")]
    pub reconcile_interval_secs: u64,
}

fn default_reconcile_interval() -> u64 {
    3600
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            capacity_policy: CapacityPolicy::default(),
            reconcile_interval_secs: default_reconcile_interval(),
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // file first, environment overrides below
                toml::from_str(&config_str)
                    .map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and config.toml was not found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                        connect_timeout_secs: get_env_parse(
                            "DB_CONNECT_TIMEOUT_SECS",
                            default_connect_timeout(),
                        ),
                        acquire_timeout_secs: get_env_parse(
                            "DB_ACQUIRE_TIMEOUT_SECS",
                            default_acquire_timeout(),
                        ),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                    },
                    stripe: StripeConfig {
                        webhook_secret: get_env("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                    },
                    turnstile: TurnstileConfig {
                        secret_key: get_env("TURNSTILE_SECRET_KEY").unwrap_or_default(),
                        expected_hostname: get_env("TURNSTILE_EXPECTED_HOSTNAME"),
                        expected_action: get_env("TURNSTILE_EXPECTED_ACTION"),
                    },
                    registration: RegistrationConfig {
                        capacity_policy: get_env_parse(
                            "REGISTRATION_CAPACITY_POLICY",
                            CapacityPolicy::default(),
                        ),
                        reconcile_interval_secs: get_env_parse(
                            "RECONCILE_INTERVAL_SECS",
                            default_reconcile_interval(),
                        ),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Cannot read config file {config_path}: {e}").into());
            }
        };

        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("DB_CONNECT_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            config.database.connect_timeout_secs = n;
        }
        if let Ok(v) = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            && let Ok(n) = v.parse()
        {
            config.database.acquire_timeout_secs = n;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("STRIPE_WEBHOOK_SECRET") {
            config.stripe.webhook_secret = v;
        }

        // Turnstile
        if let Ok(v) = env::var("TURNSTILE_SECRET_KEY") {
            config.turnstile.secret_key = v;
        }
        if let Ok(v) = env::var("TURNSTILE_EXPECTED_HOSTNAME") {
            config.turnstile.expected_hostname = Some(v);
        }
        if let Ok(v) = env::var("TURNSTILE_EXPECTED_ACTION") {
            config.turnstile.expected_action = Some(v);
        }

        if let Ok(v) = env::var("REGISTRATION_CAPACITY_POLICY") {
            config.registration.capacity_policy = v.parse()?;
        }
        if let Ok(v) = env::var("RECONCILE_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.registration.reconcile_interval_secs = n;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_file_with_defaults() {
        let raw = r#"
[server]
host = "127.0.0.1"
port = 9000

[database]
url = "postgres://localhost/church"
max_connections = 4

[jwt]
secret = "s3cret"
"#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.database.acquire_timeout_secs, 5);
        assert_eq!(cfg.registration.capacity_policy, CapacityPolicy::Reserved);
        assert_eq!(cfg.registration.reconcile_interval_secs, 3600);
        assert!(cfg.turnstile.secret_key.is_empty());
    }

    #[test]
    fn capacity_policy_from_file_and_str() {
        let raw = r#"
[server]
host = "0.0.0.0"
port = 8080

[database]
url = "postgres://localhost/church"
max_connections = 10

[jwt]
secret = "x"

[registration]
capacity_policy = "confirmed_only"
reconcile_interval_secs = 0
"#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.registration.capacity_policy, CapacityPolicy::ConfirmedOnly);
        assert_eq!(cfg.registration.reconcile_interval_secs, 0);
        assert_eq!("reserved".parse::<CapacityPolicy>(), Ok(CapacityPolicy::Reserved));
        assert!("everyone".parse::<CapacityPolicy>().is_err());
    }
}
