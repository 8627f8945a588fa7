use std::net::SocketAddr;

use secrecy::SecretString;
use serde::Deserialize;
use snafu::ResultExt as _;

use crate::auth::Authenticator;
use crate::database::{Database, DatabaseError};
use crate::error::{ApplicationError, ConfigLoadSnafu};
use crate::mailer::{MailError, Mailer};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(rename = "host_address", default = "default_host")]
    pub host: SocketAddr,
    #[serde(rename = "jwt_key")]
    pub jwt_key: String,
    #[serde(flatten)]
    pub surreal: SurrealConfig,
    #[serde(flatten)]
    pub mail: MailConfig,
}

fn default_host() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

impl Config {
    pub fn from_env() -> Result<Config, ApplicationError> {
        envy::from_env::<Config>().context(ConfigLoadSnafu)
    }

    pub async fn database(&self) -> Result<Database, DatabaseError> {
        Database::connect(&self.surreal).await
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(SecretString::new(self.jwt_key.clone()))
    }

    pub fn mailer(&self) -> Result<Mailer, MailError> {
        Mailer::from_config(&self.mail)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SurrealConfig {
    #[serde(rename = "surreal_endpoint")]
    pub endpoint: String,
    #[serde(rename = "surreal_namespace")]
    pub namespace: String,
    #[serde(rename = "surreal_database")]
    pub database: String,
    #[serde(flatten)]
    pub credentials: Option<SurrealCredentials>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SurrealCredentials {
    #[serde(rename = "surreal_username")]
    pub username: String,
    #[serde(rename = "surreal_password")]
    pub password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    /// Base URL embedded into verification links.
    #[serde(rename = "public_url", default = "default_public_url")]
    pub public_url: String,
    #[serde(flatten)]
    pub smtp: Option<SmtpConfig>,
}

fn default_public_url() -> String {
    "http://localhost:3000".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpConfig {
    #[serde(rename = "smtp_relay")]
    pub relay: String,
    #[serde(rename = "smtp_username")]
    pub username: String,
    #[serde(rename = "smtp_password")]
    pub password: String,
    #[serde(rename = "mail_from")]
    pub from: String,
}
