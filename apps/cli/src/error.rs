//! CLI boundary error type.
//!
//! Every menu handler returns `AppResult<()>`; the menu loop renders the
//! error in red and control falls back to the enclosing menu. The process
//! never exits on a handler error.

use thiserror::Error;
use usms_core::{CoreError, ValidationError};
use usms_db::DbError;

/// Anything a menu handler can fail with.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
