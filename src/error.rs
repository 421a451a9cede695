use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Typed outcomes of contest operations.
///
/// The first four variants are expected results of normal concurrent use,
/// not defects; they map to specific user-facing messages. Storage failures
/// stay generic on the wire so no internal detail leaks.
#[derive(Error, Debug)]
pub enum ContestError {
    #[error("Email not found in participant list. Ask the host to add you.")]
    UnauthorizedVoter,

    #[error("You have already submitted a photo.")]
    DuplicateSubmission,

    #[error("Contestant not found.")]
    ContestantNotFound,

    #[error("You have already voted.")]
    AlreadyVoted,

    #[error("Please enter a valid email.")]
    InvalidEmail,

    #[error("Invalid key.")]
    InvalidAdminKey,

    #[error("Something went wrong. Please try again.")]
    Storage(#[from] StoreError),
}

impl IntoResponse for ContestError {
    fn into_response(self) -> Response {
        let status = match self {
            ContestError::UnauthorizedVoter | ContestError::InvalidAdminKey => {
                StatusCode::FORBIDDEN
            }
            ContestError::DuplicateSubmission | ContestError::AlreadyVoted => {
                StatusCode::CONFLICT
            }
            ContestError::ContestantNotFound => StatusCode::NOT_FOUND,
            ContestError::InvalidEmail => StatusCode::BAD_REQUEST,
            ContestError::Storage(ref source) => {
                error!("storage failure: {source}");
                StatusCode::SERVICE_UNAVAILABLE
            }
        };

        (status, self.to_string()).into_response()
    }
}
