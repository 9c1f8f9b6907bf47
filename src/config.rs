use chrono_tz::Tz;
use tracing::info;

use crate::limits::MAX_HORIZON_DAYS;

pub const TIMEZONE_VAR: &str = "BOOKABLE_TIMEZONE";
pub const HORIZON_DAYS_VAR: &str = "BOOKABLE_HORIZON_DAYS";

/// Zone used for resources that do not declare their own.
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::America::New_York;
pub const DEFAULT_HORIZON_DAYS: u32 = 7;

/// Process-wide defaults for availability answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub timezone: Tz,
    /// How far ahead next-slot searches look.
    pub horizon_days: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE,
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Unset or blank keys take their
    /// defaults; malformed values are errors rather than silently ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut settings = Settings::default();
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = value(TIMEZONE_VAR) {
            settings.timezone = name
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidTimezone(name.clone()))?;
        }

        if let Some(raw) = value(HORIZON_DAYS_VAR) {
            let days: u32 = raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
                key: HORIZON_DAYS_VAR,
                value: raw.clone(),
            })?;
            if days == 0 || days > MAX_HORIZON_DAYS {
                return Err(ConfigError::OutOfRange {
                    key: HORIZON_DAYS_VAR,
                    value: days,
                    max: MAX_HORIZON_DAYS,
                });
            }
            settings.horizon_days = days;
        }

        info!(
            timezone = %settings.timezone,
            horizon_days = settings.horizon_days,
            "availability settings loaded"
        );
        Ok(settings)
    }

    /// Zone for one resource: its own if declared, else the default.
    pub fn timezone_for(&self, declared: Option<Tz>) -> Tz {
        declared.unwrap_or(self.timezone)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidTimezone(String),
    InvalidNumber { key: &'static str, value: String },
    OutOfRange { key: &'static str, value: u32, max: u32 },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidTimezone(name) => write!(f, "unknown timezone: {name}"),
            ConfigError::InvalidNumber { key, value } => {
                write!(f, "{key} must be a whole number, got {value:?}")
            }
            ConfigError::OutOfRange { key, value, max } => {
                write!(f, "{key} must be between 1 and {max}, got {value}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
