use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use derive_new::new;
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::auth::Claims;
use crate::model::{NewUser, User, UserPatch};

use super::error::{Notice, Payload, StorageSnafu, UserOpSnafu};
use super::state::App;
use super::{ApiError, Result};

#[derive(Debug, Serialize, new)]
pub struct UserListing {
    status: u16,
    users: Vec<User>,
}

#[derive(Debug, Serialize, new)]
pub struct UserReply {
    status: u16,
    user: User,
}

#[derive(Debug, Serialize, new)]
pub struct UserCreated {
    status: u16,
    #[serde(rename = "newUser")]
    new_user: User,
}

pub async fn list(State(app): State<App>) -> Result<Json<UserListing>> {
    let users = User::list(&app.database).await.context(StorageSnafu)?;
    Ok(Json(UserListing::new(200, users)))
}

pub async fn find(State(app): State<App>, Path(id): Path<i64>) -> Result<Json<UserReply>> {
    User::find(id, &app.database)
        .await
        .context(StorageSnafu)?
        .map(|user| Json(UserReply::new(200, user)))
        .ok_or_else(|| ApiError::not_found("User not found"))
}

pub async fn create(
    State(app): State<App>,
    _claims: Claims,
    Payload(payload): Payload<NewUser>,
) -> Result<(StatusCode, Json<UserCreated>)> {
    payload.validate().map_err(ApiError::validation)?;

    // the duplicate check is advisory only: a match is logged, never enforced
    let duplicate = User::is_duplicate(&payload.first_name, &payload.email, &app.database)
        .await
        .context(StorageSnafu)?;

    if duplicate {
        tracing::warn!(email = %payload.email, "duplicate user detected, creating anyway");
    }

    let user = User::create(payload, &app.database)
        .await
        .context(UserOpSnafu)?;

    Ok((StatusCode::CREATED, Json(UserCreated::new(201, user))))
}

pub async fn update(
    State(app): State<App>,
    _claims: Claims,
    Path(id): Path<i64>,
    Payload(patch): Payload<UserPatch>,
) -> Result<Json<Notice>> {
    patch.validate().map_err(ApiError::validation)?;

    User::update(id, patch, &app.database)
        .await
        .context(StorageSnafu)?
        .map(|_| Json(Notice::new(200, "User updated successfully".to_string())))
        .ok_or_else(|| ApiError::not_found("User not found or nothing changed"))
}

pub async fn remove(
    State(app): State<App>,
    _claims: Claims,
    Path(id): Path<i64>,
) -> Result<Json<Notice>> {
    User::remove(id, &app.database)
        .await
        .context(StorageSnafu)?
        .map(|_| Json(Notice::new(200, "User deleted successfully".to_string())))
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// Target of the link embedded in the verification mail, so it is reachable
/// without a token.
pub async fn verify(State(app): State<App>, Path(id): Path<i64>) -> Result<Json<Notice>> {
    User::verify(id, &app.database)
        .await
        .context(StorageSnafu)?
        .map(|_| Json(Notice::new(200, "User verified successfully".to_string())))
        .ok_or_else(|| ApiError::not_found("User not found or nothing changed"))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendVerification {
    pub email: String,
    pub last_name: String,
}

pub async fn send_verification(
    State(app): State<App>,
    Payload(request): Payload<SendVerification>,
) -> Result<Json<Notice>> {
    User::send_verification(&request.email, &request.last_name, &app.database, &app.mailer)
        .await
        .context(UserOpSnafu)?;

    Ok(Json(Notice::new(
        200,
        "Verification email sent".to_string(),
    )))
}
