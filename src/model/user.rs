use serde::{Deserialize, Serialize};
use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};

use crate::database::{Database, DatabaseError, EmptyResponseSnafu, EntityId, QuerySnafu, Table};
use crate::mailer::{MailError, Mailer};
use crate::sequence::{self, SequenceError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum UserError {
    #[snafu(display("no user matches email `{email}` and last name `{last_name}`"))]
    UserNotFound {
        email: String,
        last_name: String,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not allocate a user id: {source}"))]
    AllocateUserId {
        source: SequenceError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("user storage operation failed: {source}"))]
    UserStorage {
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },

    #[snafu(display("could not deliver the verification email to `{email}`: {source}"))]
    Delivery {
        email: String,
        source: MailError,
        #[snafu(implicit)]
        location: Location,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: EntityId<User>,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    pub verified: bool,
}

impl Table for User {
    fn table() -> &'static str {
        "users"
    }
}

/// Payload for creating a user. `verified` never comes from the request: a new
/// account always starts unverified, whatever the caller claims.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
    #[serde(skip_deserializing)]
    pub verified: bool,
}

/// Partial update; only the provided fields are merged into the record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl NewUser {
    /// Boundary validation, applied before the payload reaches storage.
    pub fn validate(&self) -> Result<(), String> {
        if self.first_name.trim().is_empty() {
            return Err("firstName is required".to_string());
        }
        if self.last_name.trim().is_empty() {
            return Err("lastName is required".to_string());
        }
        if self.phone.trim().is_empty() {
            return Err("phone is required".to_string());
        }

        validate_email(&self.email)
    }
}

impl UserPatch {
    pub fn validate(&self) -> Result<(), String> {
        match &self.email {
            Some(email) => validate_email(email),
            None => Ok(()),
        }
    }
}

fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("email is required".to_string());
    }
    if !email.contains('@') {
        return Err("email must be a valid email address".to_string());
    }

    Ok(())
}

impl User {
    /// Inserts a new user under a freshly allocated identifier. A failed
    /// allocation aborts the creation.
    #[tracing::instrument(skip(db))]
    pub async fn create(mut payload: NewUser, db: &Database) -> Result<User, UserError> {
        // a new account always starts unverified, whatever the caller claims
        payload.verified = false;

        let id = sequence::next_id("user", db)
            .await
            .context(AllocateUserIdSnafu)?;

        let created: Option<User> = db
            .create((User::table(), id))
            .content(&payload)
            .await
            .context(QuerySnafu)
            .context(UserStorageSnafu)?;

        let user = created
            .context(EmptyResponseSnafu)
            .context(UserStorageSnafu)?;

        tracing::info!(%user.id, "created user");
        Ok(user)
    }

    pub async fn list(db: &Database) -> crate::database::Result<Vec<User>> {
        db.select(User::table()).await.context(QuerySnafu)
    }

    pub async fn find(id: i64, db: &Database) -> crate::database::Result<Option<User>> {
        db.select((User::table(), id)).await.context(QuerySnafu)
    }

    /// Merges the patch into the record. `None` means no such id, which is a
    /// normal outcome rather than an error.
    pub async fn update(
        id: i64,
        patch: UserPatch,
        db: &Database,
    ) -> crate::database::Result<Option<User>> {
        db.sql("UPDATE users MERGE $patch WHERE id = type::thing('users', $id) RETURN AFTER")
            .bind(("patch", patch))
            .bind(("id", id))
            .fetch_first()
            .await
    }

    pub async fn remove(id: i64, db: &Database) -> crate::database::Result<Option<User>> {
        db.delete((User::table(), id)).await.context(QuerySnafu)
    }

    /// Sets the verified flag. Same zero/one contract as [update](User::update).
    pub async fn verify(id: i64, db: &Database) -> crate::database::Result<Option<User>> {
        db.sql("UPDATE users SET verified = true WHERE id = type::thing('users', $id) RETURN AFTER")
            .bind(("id", id))
            .fetch_first()
            .await
    }

    /// True iff a record matches both fields exactly (case-sensitive). Advisory
    /// only: nothing enforces uniqueness.
    pub async fn is_duplicate(
        first_name: &str,
        email: &str,
        db: &Database,
    ) -> crate::database::Result<bool> {
        let existing: Option<User> = db
            .sql("SELECT * FROM users WHERE firstName = $first_name AND email = $email LIMIT 1")
            .bind(("first_name", first_name))
            .bind(("email", email))
            .fetch_first()
            .await?;

        Ok(existing.is_some())
    }

    pub async fn by_email(
        email: &str,
        last_name: &str,
        db: &Database,
    ) -> crate::database::Result<Option<User>> {
        db.sql("SELECT * FROM users WHERE email = $email AND lastName = $last_name LIMIT 1")
            .bind(("email", email))
            .bind(("last_name", last_name))
            .fetch_first()
            .await
    }

    /// Looks the user up by last name and email, dispatches the verification
    /// mail, and marks the account verified.
    ///
    /// The flag is set as soon as the mail is dispatched, before the recipient
    /// follows the link; the only gate is that a matching record existed.
    #[tracing::instrument(skip(db, mailer))]
    pub async fn send_verification(
        email: &str,
        last_name: &str,
        db: &Database,
        mailer: &Mailer,
    ) -> Result<User, UserError> {
        let user = User::by_email(email, last_name, db)
            .await
            .context(UserStorageSnafu)?
            .context(UserNotFoundSnafu { email, last_name })?;

        mailer
            .send_verification(&user)
            .await
            .context(DeliverySnafu { email })?;

        let verified = User::verify(user.id.value(), db)
            .await
            .context(UserStorageSnafu)?
            .context(UserNotFoundSnafu { email, last_name })?;

        tracing::info!(%verified.id, "verification email dispatched");
        Ok(verified)
    }
}
