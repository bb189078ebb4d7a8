use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

/// Reasons a write is rejected before anything is mutated.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A mandatory field was left empty.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    /// An additional party member still carries its placeholder name.
    #[error("please enter a name for Guest {slot}")]
    UnnamedGuest { slot: usize },
    /// Two members of one party share a name.
    #[error("each party member must have a unique name (`{name}` appears twice)")]
    DuplicateInParty { name: String },
    /// The name belongs to a guest outside the party being saved.
    #[error("\"{name}\" is already registered by someone else")]
    NameTaken { name: String },
    /// Two categories share a name.
    #[error("category `{name}` is defined more than once")]
    DuplicateCategory { name: String },
    /// The category is not part of the configured set.
    #[error("unknown category `{category}`")]
    UnknownCategory { category: String },
    /// The nominee is not listed in the category.
    #[error("`{nominee}` is not a nominee of `{category}`")]
    UnknownNominee { category: String, nominee: String },
    /// The show date could not be parsed.
    #[error("invalid show date `{value}`")]
    InvalidShowDate { value: String },
}

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input failed validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(reason) => AppError::BadRequest(reason.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_guest_message_names_the_slot() {
        let err = ValidationError::UnnamedGuest { slot: 2 };
        assert_eq!(err.to_string(), "please enter a name for Guest 2");
    }

    #[test]
    fn validation_maps_to_bad_request() {
        let app: AppError = ServiceError::from(ValidationError::MissingField("name")).into();
        assert_eq!(app.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn not_found_maps_to_404() {
        let app: AppError = ServiceError::NotFound("party `p1`".into()).into();
        assert_eq!(app.into_response().status(), StatusCode::NOT_FOUND);
    }
}
