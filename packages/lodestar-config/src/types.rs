use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub rebuild: Rebuild,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub vector: VectorBackend,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct VectorBackend {
	pub url: String,
	/// Model name the backend binds to each collection; documents and query
	/// text are embedded backend-side, never by this process.
	pub embedding_model: String,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	#[serde(default = "default_retry_attempts")]
	pub retry_attempts: u32,
	#[serde(default = "default_retry_backoff_ms")]
	pub retry_backoff_ms: u64,
}

#[derive(Debug, Deserialize)]
pub struct Rebuild {
	#[serde(default = "default_page_size")]
	pub page_size: u32,
	#[serde(default = "default_page_delay_ms")]
	pub page_delay_ms: u64,
}

impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: default_limit(),
			retry_attempts: default_retry_attempts(),
			retry_backoff_ms: default_retry_backoff_ms(),
		}
	}
}

impl Default for Rebuild {
	fn default() -> Self {
		Self { page_size: default_page_size(), page_delay_ms: default_page_delay_ms() }
	}
}

fn default_timeout_ms() -> u64 {
	15_000
}

fn default_limit() -> u32 {
	10
}

fn default_retry_attempts() -> u32 {
	3
}

fn default_retry_backoff_ms() -> u64 {
	100
}

fn default_page_size() -> u32 {
	500
}

fn default_page_delay_ms() -> u64 {
	100
}
