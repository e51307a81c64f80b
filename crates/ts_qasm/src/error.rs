use thiserror::Error;

#[derive(Error, Debug)]
pub enum QasmError {
    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Build error: {0}")]
    BuildError(String),

    #[error("{0}")]
    Core(#[from] ts_core::TsError),
}

pub type Result<T> = std::result::Result<T, QasmError>;
