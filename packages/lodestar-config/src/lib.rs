mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Postgres, Rebuild, Search, Service, Storage, VectorBackend};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.storage.vector.url.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.vector.url must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector.embedding_model.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.vector.embedding_model must be non-empty.".to_string(),
		});
	}
	if cfg.storage.vector.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "storage.vector.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.retry_attempts == 0 {
		return Err(Error::Validation {
			message: "search.retry_attempts must be greater than zero.".to_string(),
		});
	}
	if cfg.rebuild.page_size == 0 {
		return Err(Error::Validation {
			message: "rebuild.page_size must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	while cfg.storage.vector.url.ends_with('/') {
		cfg.storage.vector.url.pop();
	}
}
