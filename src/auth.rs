use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{Duration, Utc};
use derive_new::new;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Validation};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize};
use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};

pub type Result<T, E = AuthError> = std::result::Result<T, E>;

/// Roles recognized by the token issuer. Anything else is rejected at issuance,
/// and a token carrying an unknown role fails claim decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownRole::new(other.to_string())),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Snafu, new)]
#[snafu(display("role `{role}` is not recognized"))]
pub struct UnknownRole {
    pub role: String,
}

/// The signed token payload: the role claim plus issuance and expiry stamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Snafu)]
pub enum AuthError {
    #[snafu(display("failed to encode JWT token"))]
    Encode {
        source: jsonwebtoken::errors::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("failed to decode JWT token"))]
    Decode {
        source: jsonwebtoken::errors::Error,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("request is not authenticated"))]
    ExtractToken {
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Serialize)]
struct AuthResponse {
    status: u16,
    message: &'static str,
    solution: &'static str,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        tracing::warn!(error = %self, "rejected unauthenticated request");

        let content = AuthResponse {
            status: 401,
            message: "Unauthorized",
            solution: "Please LogIn or Register",
        };

        (StatusCode::UNAUTHORIZED, Json(content)).into_response()
    }
}

/// Issues and verifies the HS256 tokens guarding the mutating routes.
#[derive(Debug, Clone)]
pub struct Authenticator {
    secret: SecretString,
    algorithm: Algorithm,
    validation: Validation,
}

impl Authenticator {
    pub fn new(secret: SecretString) -> Self {
        let algorithm = Algorithm::HS256;

        Authenticator {
            secret,
            algorithm,
            validation: Validation::new(algorithm),
        }
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.expose_secret().as_ref())
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.expose_secret().as_ref())
    }

    fn header(&self) -> jsonwebtoken::Header {
        jsonwebtoken::Header::new(self.algorithm)
    }

    pub fn expiration(&self) -> i64 {
        (Utc::now() + Duration::days(7)).timestamp()
    }

    pub fn claims(&self, role: Role) -> Claims {
        Claims {
            role,
            iat: Utc::now().timestamp(),
            exp: self.expiration(),
        }
    }

    pub fn issue(&self, role: Role) -> Result<String> {
        jsonwebtoken::encode(&self.header(), &self.claims(role), &self.encoding_key())
            .context(EncodeSnafu)
    }

    pub fn decode(&self, token: &str) -> Result<Claims> {
        jsonwebtoken::decode::<Claims>(token, &self.decoding_key(), &self.validation)
            .map(|data| data.claims)
            .context(DecodeSnafu)
    }

    pub fn extract(&self, parts: &Parts) -> Result<Claims> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .context(ExtractTokenSnafu)?;

        let token = header.to_str().ok().context(ExtractTokenSnafu)?;
        let token = token.strip_prefix("Bearer ").context(ExtractTokenSnafu)?;

        self.decode(token)
    }
}

/// Extracting [Claims] is what marks a handler as token-guarded: the request
/// must carry a bearer token that decodes to a recognized role.
#[axum::async_trait]
impl<S> FromRequestParts<S> for Claims
where
    S: Send + Sync,
    Authenticator: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let authenticator = Authenticator::from_ref(state);
        authenticator.extract(parts)
    }
}
