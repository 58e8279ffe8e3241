use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConceptMapError {
	#[error("result payload is not valid JSON: {0}")]
	Json(#[from] serde_json::Error),

	#[error("tool result has no text content")]
	MissingTextContent,

	#[error("tool reported an error: {0}")]
	ToolError(String),

	#[error("invalid concept context result: {0}")]
	InvalidResult(String),

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("host call failed: {0}")]
	Host(String),
}

pub type Result<T> = std::result::Result<T, ConceptMapError>;
