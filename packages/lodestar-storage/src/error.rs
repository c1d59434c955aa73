#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error(transparent)]
	Http(#[from] reqwest::Error),
	#[error("Vector backend returned {status}: {message}")]
	Backend { status: u16, message: String },
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Collection initialization failed for: {0}")]
	Init(String),
	#[error("Invalid vector backend response: {0}")]
	InvalidResponse(String),
}
impl Error {
	pub fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}

	pub fn is_conflict(&self) -> bool {
		matches!(self, Self::Conflict(_))
	}
}
