use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoopOptError {
	#[error("system error: {0}")]
	SystemError(String),
	#[error("unknown pass in pipeline: {0}")]
	PipelineError(String),
}

pub type Result<T> = std::result::Result<T, LoopOptError>;

pub fn map_sys_err(e: std::io::Error) -> LoopOptError {
	LoopOptError::SystemError(e.to_string())
}
