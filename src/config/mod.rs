use serde::Deserialize;
use std::env;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
}

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub booking: BookingConfig,
    pub features: FeatureFlags,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

// Настройки базы данных
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
}

// Настройки Redis (кеш схемы зала)
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
    pub layout_ttl_seconds: u64,
}

// Правила бронирования
#[derive(Debug, Clone, Deserialize)]
pub struct BookingConfig {
    pub max_seats_per_booking: usize,
    /// Отмена запрещена, если до начала сеанса осталось меньше этого числа минут.
    pub cancellation_cutoff_minutes: i64,
    pub lock_timeout_ms: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            max_seats_per_booking: 6,
            cancellation_cutoff_minutes: 0,
            lock_timeout_ms: 2000,
        }
    }
}

// Feature flags для включения/выключения функциональности
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    pub enable_layout_cache: bool,
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn or_default(key: &'static str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_value<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid { key, value })
}

fn parsed<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    parse_value(key, or_default(key, default))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let booking_defaults = BookingConfig::default();

        let booking = BookingConfig {
            max_seats_per_booking: parsed(
                "MAX_SEATS_PER_BOOKING",
                &booking_defaults.max_seats_per_booking.to_string(),
            )?,
            cancellation_cutoff_minutes: parsed(
                "CANCELLATION_CUTOFF_MINUTES",
                &booking_defaults.cancellation_cutoff_minutes.to_string(),
            )?,
            lock_timeout_ms: parsed("INVENTORY_LOCK_TIMEOUT_MS", &booking_defaults.lock_timeout_ms.to_string())?,
        };
        if booking.max_seats_per_booking == 0 {
            return Err(ConfigError::Invalid { key: "MAX_SEATS_PER_BOOKING", value: "0".to_string() });
        }
        if booking.cancellation_cutoff_minutes < 0 {
            return Err(ConfigError::Invalid {
                key: "CANCELLATION_CUTOFF_MINUTES",
                value: booking.cancellation_cutoff_minutes.to_string(),
            });
        }

        Ok(Config {
            app: AppConfig {
                host: or_default("HOST", "0.0.0.0"),
                port: parsed("PORT", "8000")?,
                environment: or_default("ENVIRONMENT", "development"),
                rust_log: or_default("RUST_LOG", "cinema_booking=debug,tower_http=debug"),
            },
            database: DatabaseConfig {
                url: required("DATABASE_URL")?,
                pool_size: parsed("DB_POOL_SIZE", "20")?,
            },
            redis: RedisConfig {
                url: or_default("REDIS_URL", "redis://127.0.0.1:6379"),
                layout_ttl_seconds: parsed("LAYOUT_CACHE_TTL_SECONDS", "5")?,
            },
            booking,
            features: FeatureFlags {
                enable_layout_cache: parsed("ENABLE_LAYOUT_CACHE", "true")?,
            },
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.app.host, self.app.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app: AppConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
                environment: "development".to_string(),
                rust_log: "cinema_booking=debug,tower_http=debug".to_string(),
            },
            database: DatabaseConfig { url: String::new(), pool_size: 20 },
            redis: RedisConfig { url: "redis://127.0.0.1:6379".to_string(), layout_ttl_seconds: 5 },
            booking: BookingConfig::default(),
            features: FeatureFlags { enable_layout_cache: false },
        }
    }
}
