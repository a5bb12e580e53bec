//! Index layer configuration.
//!
//! This module provides statement-level settings for index writes, loaded
//! from environment variables.
//!
//! # Environment Variables
//!
//! - `TABLEKV_BATCH_CHECK`: skip the read-before-write uniqueness check because
//!   the caller already checked the whole batch (default: `false`)
//! - `TABLEKV_KEY_BUFFER_CAPACITY`: initial capacity of the reusable index key
//!   buffer in bytes (default: `64`)
//!
//! # Invariants
//!
//! - `key_buffer_capacity` is always greater than zero

/// Index write configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexConfig {
    /// Skip the uniqueness check on distinct entries.
    /// Only safe when the caller has already verified the batch has no conflicts.
    pub batch_check: bool,
    /// Initial capacity of the reusable key buffer.
    pub key_buffer_capacity: usize,
}

/// Error returned when loading configuration fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    InvalidValue { name: String, message: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { name, message } => {
                write!(f, "invalid value for {name}: {message}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            batch_check: false,
            key_buffer_capacity: Self::DEFAULT_KEY_BUFFER_CAPACITY,
        }
    }
}

impl IndexConfig {
    /// Default key buffer capacity.
    pub const DEFAULT_KEY_BUFFER_CAPACITY: usize = 64;

    const BATCH_CHECK_VAR: &'static str = "TABLEKV_BATCH_CHECK";
    const KEY_BUFFER_CAPACITY_VAR: &'static str = "TABLEKV_KEY_BUFFER_CAPACITY";

    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let batch_check = match lookup(Self::BATCH_CHECK_VAR) {
            Some(value) => parse_bool(Self::BATCH_CHECK_VAR, &value)?,
            None => false,
        };
        let key_buffer_capacity = match lookup(Self::KEY_BUFFER_CAPACITY_VAR) {
            Some(value) => parse_capacity(Self::KEY_BUFFER_CAPACITY_VAR, &value)?,
            None => Self::DEFAULT_KEY_BUFFER_CAPACITY,
        };

        Ok(Self {
            batch_check,
            key_buffer_capacity,
        })
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a boolean (expected true/false/1/0)"),
        }),
    }
}

fn parse_capacity(name: &str, value: &str) -> Result<usize, ConfigError> {
    match value.trim().parse::<usize>() {
        Ok(capacity) if capacity > 0 => Ok(capacity),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            message: format!("'{value}' is not a positive integer"),
        }),
    }
}
