use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use derive_new::new;
use serde::Serialize;
use snafu::{Location, Snafu};

use crate::auth::AuthError;
use crate::database::DatabaseError;
use crate::model::{UserError, VideoError};

/// Every boundary failure renders the same fixed-shape envelope: a numeric
/// status plus a message.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum ApiError {
    #[snafu(display("{message}"))]
    Validation {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{message}"))]
    NotFound {
        message: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("storage operation failed: {source}"))]
    Storage {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    UserOp {
        source: UserError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("{source}"))]
    VideoOp {
        source: VideoError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to issue a token: {source}"))]
    IssueToken {
        source: AuthError,
        #[snafu(implicit)]
        location: Location,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ValidationSnafu {
            message: message.into(),
        }
        .build()
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        NotFoundSnafu {
            message: message.into(),
        }
        .build()
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::UserOp {
                source: UserError::UserNotFound { .. },
                ..
            } => StatusCode::NOT_FOUND,
            ApiError::VideoOp {
                source: VideoError::VideoNotFound { .. } | VideoError::CommentNotAppended { .. },
                ..
            } => StatusCode::NOT_FOUND,
            ApiError::Storage { .. }
            | ApiError::UserOp { .. }
            | ApiError::VideoOp { .. }
            | ApiError::IssueToken { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Validation { message, .. } | ApiError::NotFound { message, .. } => {
                message.clone()
            }
            ApiError::UserOp {
                source: UserError::UserNotFound { .. },
                ..
            } => "User not found".to_string(),
            ApiError::VideoOp {
                source: VideoError::VideoNotFound { .. },
                ..
            } => "Video not found".to_string(),
            ApiError::VideoOp {
                source: VideoError::CommentNotAppended { .. },
                ..
            } => "Video not found or nothing changed".to_string(),
            ApiError::Storage { .. }
            | ApiError::UserOp { .. }
            | ApiError::VideoOp { .. }
            | ApiError::IssueToken { .. } => "Unexpected storage error".to_string(),
        }
    }
}

/// The message half of the response envelope, shared by errors and
/// confirmation replies.
#[derive(Debug, Serialize, new)]
pub struct Notice {
    pub status: u16,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::warn!(error = %self, "request rejected");
        }

        let content = Notice::new(status.as_u16(), self.message());
        (status, Json(content)).into_response()
    }
}

/// JSON body extractor whose rejection is the 400 envelope instead of axum's
/// default plain-text response.
pub struct Payload<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: serde::de::DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(request, state)
            .await
            .map_err(|rejection: JsonRejection| ApiError::validation(rejection.body_text()))?;

        Ok(Payload(value))
    }
}
