//! Configuration module for the order tracker.
//!
//! This module provides structures and utilities for managing tracker
//! configuration. It supports loading configuration from TOML files and
//! provides validation to ensure all required configuration values are
//! properly set. Environment variables may be referenced in the file as
//! `${VAR}` or `${VAR:-default}` and are resolved before parsing.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the order tracker.
///
/// Contains all sections required for the tracker to operate: the
/// tracker instance settings, the order store backend, the carrier
/// integration, and the notification transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to the tracker instance.
	pub tracker: TrackerConfig,
	/// Configuration for the order store backend.
	pub store: StoreConfig,
	/// Configuration for the carrier integration.
	pub carrier: CarrierConfig,
	/// Configuration for the notification transport.
	pub notify: NotifyConfig,
}

/// Configuration specific to the tracker instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerConfig {
	/// Unique identifier for this tracker instance.
	pub id: String,
	/// Interval in seconds between reconciliation cycles per order.
	/// Defaults to 20 seconds if not specified.
	#[serde(default = "default_poll_interval_secs")]
	pub poll_interval_secs: u64,
	/// Quiet period in milliseconds for coalescing push events.
	/// Defaults to 300 ms if not specified.
	#[serde(default = "default_debounce_ms")]
	pub debounce_ms: u64,
	/// Number of consecutive persistence failures after which a
	/// user-visible warning is published. Defaults to 3.
	#[serde(default = "default_persistence_warn_cycles")]
	pub persistence_warn_cycles: u32,
}

/// Returns the default reconciliation poll interval in seconds.
fn default_poll_interval_secs() -> u64 {
	20
}

/// Returns the default debounce quiet period in milliseconds.
fn default_debounce_ms() -> u64 {
	300
}

/// Returns the default persistence-failure warning threshold.
fn default_persistence_warn_cycles() -> u32 {
	3
}

/// Configuration for the order store backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of store implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the carrier integration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CarrierConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of carrier implementation names to their configurations.
	/// Each implementation has its own format stored as raw TOML values.
	pub implementations: HashMap<String, toml::Value>,
	/// Timeout in seconds for a single tracking lookup.
	/// Defaults to 10 seconds if not specified.
	#[serde(default = "default_request_timeout_secs")]
	pub request_timeout_secs: u64,
}

/// Returns the default carrier request timeout in seconds.
fn default_request_timeout_secs() -> u64 {
	10
}

/// Configuration for the notification transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NotifyConfig {
	/// Map of transport implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Expands environment variable references in raw configuration text.
///
/// `${VAR}` substitutes the variable's value and fails when it is
/// unset; `${VAR:-fallback}` substitutes the fallback instead.
/// Expansion runs before TOML parsing, so references may appear
/// anywhere in the file. Input is capped at 1MB.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Bounds the text handed to the regex scan.
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Back to front, so earlier spans keep their byte offsets.
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a TOML file.
	///
	/// Environment variables are resolved and the configuration is
	/// validated after parsing.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let raw = tokio::fs::read_to_string(path).await?;
		raw.parse()
	}

	/// Validates the configuration to ensure all required fields are
	/// properly set.
	///
	/// This method performs validation across all sections:
	/// - Ensures the tracker id is not empty
	/// - Keeps the poll interval and debounce window within sane bounds
	/// - Checks that each primary implementation is actually configured
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate tracker config
		if self.tracker.id.is_empty() {
			return Err(ConfigError::Validation("Tracker ID cannot be empty".into()));
		}
		if self.tracker.poll_interval_secs == 0 {
			return Err(ConfigError::Validation(
				"poll_interval_secs must be greater than 0".into(),
			));
		}
		if self.tracker.poll_interval_secs > 3600 {
			return Err(ConfigError::Validation(
				"poll_interval_secs cannot exceed 3600 (1 hour)".into(),
			));
		}
		if self.tracker.debounce_ms == 0 {
			return Err(ConfigError::Validation(
				"debounce_ms must be greater than 0".into(),
			));
		}
		if self.tracker.debounce_ms > 60_000 {
			return Err(ConfigError::Validation(
				"debounce_ms cannot exceed 60000 (1 minute)".into(),
			));
		}
		if self.tracker.persistence_warn_cycles == 0 {
			return Err(ConfigError::Validation(
				"persistence_warn_cycles must be at least 1".into(),
			));
		}

		// Validate store config
		if self.store.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one store implementation must be configured".into(),
			));
		}
		if !self.store.implementations.contains_key(&self.store.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary store '{}' not found in implementations",
				self.store.primary
			)));
		}

		// Validate carrier config
		if self.carrier.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one carrier implementation must be configured".into(),
			));
		}
		if !self
			.carrier
			.implementations
			.contains_key(&self.carrier.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary carrier '{}' not found in implementations",
				self.carrier.primary
			)));
		}
		if self.carrier.request_timeout_secs == 0 {
			return Err(ConfigError::Validation(
				"request_timeout_secs must be greater than 0".into(),
			));
		}

		// Validate notify config
		if self.notify.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one notification implementation required".into(),
			));
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// Environment variables are resolved and the configuration is
/// automatically validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const VALID_CONFIG: &str = r#"
[tracker]
id = "showroom-eu"

[store]
primary = "memory"
[store.implementations.memory]

[carrier]
primary = "http"
[carrier.implementations.http]
base_url = "http://localhost:9800"

[notify]
[notify.implementations.channel]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("TEST_CARRIER_HOST", "localhost");
		std::env::set_var("TEST_CARRIER_PORT", "9800");

		let input = "base_url = \"${TEST_CARRIER_HOST}:${TEST_CARRIER_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "base_url = \"localhost:9800\"");

		std::env::remove_var("TEST_CARRIER_HOST");
		std::env::remove_var("TEST_CARRIER_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("MISSING_VAR"));
	}

	#[test]
	fn test_defaults_applied() {
		let config: Config = VALID_CONFIG.parse().unwrap();
		assert_eq!(config.tracker.id, "showroom-eu");
		assert_eq!(config.tracker.poll_interval_secs, 20);
		assert_eq!(config.tracker.debounce_ms, 300);
		assert_eq!(config.tracker.persistence_warn_cycles, 3);
		assert_eq!(config.carrier.request_timeout_secs, 10);
	}

	#[test]
	fn test_empty_id_rejected() {
		let config_str = VALID_CONFIG.replace("\"showroom-eu\"", "\"\"");
		let result = Config::from_str(&config_str);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Tracker ID cannot be empty"));
	}

	#[test]
	fn test_unknown_primary_rejected() {
		let config_str = VALID_CONFIG.replace("primary = \"memory\"", "primary = \"postgres\"");
		let result = Config::from_str(&config_str);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Primary store 'postgres' not found"));
	}

	#[test]
	fn test_zero_poll_interval_rejected() {
		let config_str = VALID_CONFIG.replace(
			"id = \"showroom-eu\"",
			"id = \"showroom-eu\"\npoll_interval_secs = 0",
		);
		let result = Config::from_str(&config_str);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("poll_interval_secs must be greater than 0"));
	}

	#[test]
	fn test_oversized_debounce_rejected() {
		let config_str = VALID_CONFIG.replace(
			"id = \"showroom-eu\"",
			"id = \"showroom-eu\"\ndebounce_ms = 120000",
		);
		let result = Config::from_str(&config_str);
		assert!(result.is_err());
	}

	#[tokio::test]
	async fn test_from_file() {
		use std::io::Write;

		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(VALID_CONFIG.as_bytes()).unwrap();

		let config = Config::from_file(file.path().to_str().unwrap())
			.await
			.unwrap();
		assert_eq!(config.tracker.id, "showroom-eu");
	}
}
