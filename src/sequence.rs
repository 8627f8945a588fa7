//! Sequence allocation for entity identifiers.
//!
//! Identifiers are handed out from a shared `counters` collection, one counter per
//! entity type. The increment-and-fetch is a single SurrealQL statement, which the
//! engine executes atomically, so two concurrent allocations for the same key can
//! never observe the same value. The counter record is created on first use and is
//! never deleted.

use serde::Deserialize;
use snafu::{Location, OptionExt as _, ResultExt as _, Snafu};

use crate::database::{Database, DatabaseError, Thing};

pub type Result<T, E = SequenceError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SequenceError {
    #[snafu(display("counter store is unreachable for key `{key}` at {location}: {source}"))]
    Unavailable {
        key: String,
        source: DatabaseError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("counter store returned no record for key `{key}` at {location}"))]
    MissingCounter {
        key: String,
        #[snafu(implicit)]
        location: Location,
    },
}

/// A named integer register inside the `counters` collection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Counter {
    pub id: Thing,
    pub value: i64,
}

/// Allocates the next identifier for the given entity type (`"user"`, `"video"`).
///
/// Counter records are keyed `<entity>Id`, e.g. `counters:userId`. A failed
/// allocation means the caller must not proceed with entity creation.
pub async fn next_id(entity: &str, db: &Database) -> Result<i64> {
    let key = format!("{entity}Id");

    let counter: Option<Counter> = db
        .sql("UPDATE type::thing('counters', $key) SET value += 1 RETURN AFTER")
        .bind(("key", &key))
        .fetch_first()
        .await
        .context(UnavailableSnafu { key: &key })?;

    let counter = counter.context(MissingCounterSnafu { key: &key })?;
    tracing::debug!(%counter.id, counter.value, "allocated identifier");

    Ok(counter.value)
}
