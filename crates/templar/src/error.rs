//! Facade errors

use templar_ast::CompileError;
use templar_runtime::RenderError;
use thiserror::Error;

/// Facade result type
pub type Result<T> = std::result::Result<T, Error>;

/// Either half of the pipeline failing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error(transparent)]
    Compile(#[from] CompileError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

impl Error {
    pub fn as_compile(&self) -> Option<&CompileError> {
        match self {
            Error::Compile(e) => Some(e),
            Error::Render(_) => None,
        }
    }

    pub fn as_render(&self) -> Option<&RenderError> {
        match self {
            Error::Render(e) => Some(e),
            Error::Compile(_) => None,
        }
    }
}
