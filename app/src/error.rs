use thiserror::Error;

use pollcheck_client::ApiError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
