use axum::extract::State;
use axum::Json;
use derive_new::new;
use serde::{Deserialize, Serialize};
use snafu::ResultExt as _;

use crate::auth::Role;

use super::error::{IssueTokenSnafu, Payload};
use super::state::App;
use super::{ApiError, Result};

#[derive(Debug, Deserialize)]
pub struct TokenRequest {
    pub role: String,
}

#[derive(Debug, Serialize, new)]
pub struct TokenReply {
    status: u16,
    token: String,
}

/// Issues a signed token for a recognized role. Any other role value is
/// rejected before a token is ever constructed.
pub async fn issue(
    State(app): State<App>,
    Payload(request): Payload<TokenRequest>,
) -> Result<Json<TokenReply>> {
    let role: Role = request
        .role
        .parse()
        .map_err(|_| ApiError::validation("Invalid Credentials required"))?;

    let token = app.authenticator.issue(role).context(IssueTokenSnafu)?;

    Ok(Json(TokenReply::new(200, token)))
}
