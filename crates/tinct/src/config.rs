//! Daemon configuration file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tinct_acme::{DEFAULT_ACME_ROOT, DEFAULT_STYLES_ROOT};
use tinct_session::{DEFAULT_LAYER_NAME, SessionSettings};

/// Errors that can occur when loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// The file could not be read.
	#[error("reading {path}: {error}")]
	Io { path: PathBuf, error: std::io::Error },

	/// The file is not valid TOML or does not match the schema.
	#[error("parsing {path}: {error}")]
	Parse { path: PathBuf, error: toml::de::Error },

	/// A value is out of range.
	#[error("invalid configuration: {0}")]
	Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
	/// acme-styles palette file; the built-in kind list is used when unset.
	pub style_file: Option<PathBuf>,
	#[serde(default = "default_layer_name")]
	pub layer_name: String,
	/// Directory of `{language}/highlights.scm` query overrides.
	pub query_dir: Option<PathBuf>,
	#[serde(default)]
	pub acme: AcmeConfig,
	#[serde(default)]
	pub timing: TimingConfig,
	/// Window-name patterns, tried in order.
	#[serde(default)]
	pub filename_handlers: Vec<FilenameHandlerConfig>,
	/// Extra interpreter names (version suffix stripped) to language ids.
	#[serde(default)]
	pub interpreters: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AcmeConfig {
	pub root: PathBuf,
	pub styles_root: PathBuf,
}

impl Default for AcmeConfig {
	fn default() -> Self {
		Self {
			root: PathBuf::from(DEFAULT_ACME_ROOT),
			styles_root: PathBuf::from(DEFAULT_STYLES_ROOT),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TimingConfig {
	pub debounce_ms: u64,
	pub backoff_base_ms: u64,
	pub backoff_cap_ms: u64,
}

impl Default for TimingConfig {
	fn default() -> Self {
		Self {
			debounce_ms: 200,
			backoff_base_ms: 200,
			backoff_cap_ms: 30_000,
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilenameHandlerConfig {
	/// Regular expression matched against the window name.
	pub pattern: String,
	pub language_id: String,
}

fn default_layer_name() -> String {
	DEFAULT_LAYER_NAME.to_string()
}

impl Config {
	/// Reads, parses and validates a config file.
	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config: Self = toml::from_str(&text).map_err(|error| ConfigError::Parse {
			path: path.to_path_buf(),
			error,
		})?;
		config.validate()?;
		Ok(config)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.layer_name.trim().is_empty() {
			return Err(ConfigError::Invalid("layer_name must not be empty".to_string()));
		}
		let timing = &self.timing;
		if timing.backoff_base_ms == 0 {
			return Err(ConfigError::Invalid("timing.backoff_base_ms must be positive".to_string()));
		}
		if timing.backoff_cap_ms < timing.backoff_base_ms {
			return Err(ConfigError::Invalid(format!(
				"timing.backoff_cap_ms ({}) is below timing.backoff_base_ms ({})",
				timing.backoff_cap_ms, timing.backoff_base_ms
			)));
		}
		Ok(())
	}

	pub fn session_settings(&self) -> SessionSettings {
		SessionSettings {
			layer_name: self.layer_name.clone(),
			debounce: Duration::from_millis(self.timing.debounce_ms),
			backoff_base: Duration::from_millis(self.timing.backoff_base_ms),
			backoff_cap: Duration::from_millis(self.timing.backoff_cap_ms),
		}
	}
}
