// Not every test binary uses every helper.
#![allow(dead_code)]

use secrecy::SecretString;

use tanuki::api::App;
use tanuki::auth::Authenticator;
use tanuki::database::Database;
use tanuki::mailer::Mailer;

/// A fresh, isolated in-memory store per call, so tests never observe each
/// other's records.
pub async fn database() -> Database {
    Database::memory().await.expect("in-memory database")
}

pub fn authenticator() -> Authenticator {
    Authenticator::new(SecretString::new("integration-test-key".to_string()))
}

pub fn app(database: Database) -> App {
    App::new(
        database,
        authenticator(),
        Mailer::disabled("http://localhost:3000"),
    )
}
