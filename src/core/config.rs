use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    pub dispatch: DispatchConfig,
    pub notifications: NotificationConfig,
}

/// Connection pool settings; timeouts in seconds
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

/// Tunables of the dispatch engine itself. Scoring weights live in the
/// `assignment_rules` table, not here.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// How many times a dispatch re-selects after losing a commit race
    pub max_commit_attempts: u32,
    /// Re-dispatch unassigned PENDING tickets once when the binary starts
    pub redispatch_on_boot: bool,
    /// Leave a technician who just declined out of the immediate re-dispatch
    pub exclude_decliner: bool,
}

#[derive(Debug, Clone)]
pub struct NotificationConfig {
    /// Write notifications to the `notifications` inbox table (otherwise log only)
    pub persist: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            database: DatabaseConfig::from_env()?,
            dispatch: DispatchConfig::from_env()?,
            notifications: NotificationConfig::from_env()?,
        })
    }
}

impl DatabaseConfig {
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = parse_var("DB_MAX_CONNECTIONS", Self::DEFAULT_MAX_CONNECTIONS)?;
        let min_connections = parse_var("DB_MIN_CONNECTIONS", Self::DEFAULT_MIN_CONNECTIONS)?;
        if min_connections > max_connections {
            return Err("DB_MIN_CONNECTIONS must not exceed DB_MAX_CONNECTIONS".to_string());
        }

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs: parse_var(
                "DB_ACQUIRE_TIMEOUT_SECS",
                Self::DEFAULT_ACQUIRE_TIMEOUT_SECS,
            )?,
            idle_timeout_secs: parse_var("DB_IDLE_TIMEOUT_SECS", Self::DEFAULT_IDLE_TIMEOUT_SECS)?,
            max_lifetime_secs: parse_var("DB_MAX_LIFETIME_SECS", Self::DEFAULT_MAX_LIFETIME_SECS)?,
        })
    }
}

impl DispatchConfig {
    const DEFAULT_MAX_COMMIT_ATTEMPTS: u32 = 3;

    pub fn from_env() -> Result<Self, String> {
        let max_commit_attempts =
            parse_var("DISPATCH_MAX_COMMIT_ATTEMPTS", Self::DEFAULT_MAX_COMMIT_ATTEMPTS)?;
        if max_commit_attempts == 0 {
            return Err("DISPATCH_MAX_COMMIT_ATTEMPTS must be at least 1".to_string());
        }

        Ok(Self {
            max_commit_attempts,
            redispatch_on_boot: parse_bool("DISPATCH_REDISPATCH_ON_BOOT", false)?,
            exclude_decliner: parse_bool("DISPATCH_EXCLUDE_DECLINER", false)?,
        })
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_commit_attempts: Self::DEFAULT_MAX_COMMIT_ATTEMPTS,
            redispatch_on_boot: false,
            exclude_decliner: false,
        }
    }
}

impl NotificationConfig {
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            persist: parse_bool("NOTIFICATIONS_PERSIST", true)?,
        })
    }
}

/// Read `key` as a `T`, falling back to `default` when unset
fn parse_var<T: FromStr>(key: &str, default: T) -> Result<T, String> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| format!("{} must be a valid number", key)),
        Err(_) => Ok(default),
    }
}

fn parse_bool(key: &str, default: bool) -> Result<bool, String> {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(format!("{} must be a boolean", key)),
        },
        Err(_) => Ok(default),
    }
}
