use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ShellError, ShellResult};

const CONFIG_ENV: &str = "ISH_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Printed before each line when reading from a terminal.
	pub prompt: String,
	pub history_capacity: usize,
	/// `env_logger` filter; `RUST_LOG` takes precedence.
	pub log_level: String,
	/// Print "Process running in background with PID N" for `&` pipelines.
	pub notify_background: bool,
}

impl Default for Config {
	fn default() -> Config {
		Config {
			prompt: "ish> ".to_string(),
			history_capacity: 50,
			log_level: "warn".to_string(),
			notify_background: true,
		}
	}
}

impl Config {
	/// Parses a TOML document; keys it leaves out keep their defaults.
	pub fn from_toml(content: &str) -> ShellResult<Config> {
		toml::from_str(content).map_err(|e| ShellError::Config(e.to_string()))
	}

	pub fn load_from(path: &Path) -> ShellResult<Config> {
		let content = fs::read_to_string(path)?;
		Config::from_toml(&content)
			.map_err(|e| ShellError::Config(format!("{}: {}", path.display(), e)))
	}

	/// `$ISH_CONFIG`, else `~/.config/ish/config.toml`.
	pub fn user_path() -> Option<PathBuf> {
		if let Some(path) = env::var_os(CONFIG_ENV) {
			return Some(PathBuf::from(path));
		}
		let home = env::var_os("HOME")?;
		Some(Path::new(&home).join(".config/ish/config.toml"))
	}

	/// Defaults overlaid with the user's file. A missing file is not an error;
	/// an unreadable or malformed one is reported and ignored.
	pub fn load() -> Config {
		let path = match Config::user_path() {
			Some(p) if p.exists() => p,
			_ => return Config::default(),
		};
		match Config::load_from(&path) {
			Ok(config) => config,
			Err(e) => {
				eprintln!("ish: {}", e);
				Config::default()
			},
		}
	}
}
