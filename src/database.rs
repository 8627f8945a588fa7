use snafu::{Location, ResultExt as _, Snafu};
use surrealdb::engine::any::Any;
use surrealdb::opt::auth;
use surrealdb::opt::{IntoResource, QueryResult};
use surrealdb::Surreal;

pub use surrealdb::sql::{Id, Thing};

use crate::config::SurrealConfig;

pub type Result<T, E = DatabaseError> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum DatabaseError {
    #[snafu(display("cannot connect to the database `{endpoint}` at {location}: {source}"))]
    Connection {
        endpoint: String,
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to query the database at {location}: {source}"))]
    Query {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to deserialize the database response at {location}: {source}"))]
    Deserialize {
        source: surrealdb::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to parse the database response at {location}: response is empty"))]
    EmptyResponse {
        #[snafu(implicit)]
        location: Location,
    },
}

/// Associates a model with the collection it is stored in.
pub trait Table {
    /// Returns the name of the table associated with the record.
    fn table() -> &'static str;
}

/// Represents a database wrapper.
///
/// This struct provides a wrapper around a database, allowing for easier interaction and abstraction.
#[derive(Debug, Clone)]
pub struct Database {
    database: Surreal<Any>,
}

impl Database {
    /// Connects to the endpoint given in the configuration, signing in when
    /// credentials are present and selecting the configured namespace and database.
    pub async fn connect(config: &SurrealConfig) -> Result<Self> {
        let endpoint = config.endpoint.as_str();

        let database = surrealdb::engine::any::connect(endpoint)
            .await
            .context(ConnectionSnafu { endpoint })?;

        if let Some(credentials) = &config.credentials {
            database
                .signin(auth::Database {
                    namespace: &config.namespace,
                    database: &config.database,
                    username: &credentials.username,
                    password: &credentials.password,
                })
                .await
                .context(ConnectionSnafu { endpoint })?;
        }

        database
            .use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .context(ConnectionSnafu { endpoint })?;

        Ok(Database { database })
    }

    /// An isolated in-memory database. Every call returns a fresh store, which is
    /// what backs the test suites and local development without a server.
    pub async fn memory() -> Result<Self> {
        let endpoint = "mem://";

        let database = surrealdb::engine::any::connect(endpoint)
            .await
            .context(ConnectionSnafu { endpoint })?;

        database
            .use_ns("tanuki")
            .use_db("tanuki")
            .await
            .context(ConnectionSnafu { endpoint })?;

        Ok(Database { database })
    }

    /// Create a builder to execute arbitrary SurrealQL on the database. Parameters can be
    /// bound using the [bind](Bindings::bind) method which takes any serializable data structure.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let top: Vec<Video> = db.sql("SELECT * FROM videos ORDER BY likes DESC LIMIT 5")
    ///     .fetch_first()
    ///     .await?;
    /// ```
    pub fn sql(&self, query: &str) -> Bindings<'_> {
        let query = self.database.query(query);
        Bindings { query }
    }
}

impl std::ops::Deref for Database {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.database
    }
}

#[derive(Debug)]
pub struct Bindings<'a> {
    query: surrealdb::method::Query<'a, Any>,
}

impl Bindings<'_> {
    pub fn bind(mut self, params: impl serde::Serialize) -> Self {
        let query = self.query;
        self.query = query.bind(params);
        self
    }

    /// Execute the query and return a [surrealdb::Response] which is SurrealDB's way to
    /// represent a list of statements returned from the database.
    pub async fn execute(self) -> Result<surrealdb::Response> {
        let response = self.query.await.context(QuerySnafu)?;
        tracing::debug!(?response, "executed query");
        Ok(response)
    }

    /// Execute the queries and deserialize all the results into a list of values.
    pub async fn fetch_all<T: serde::de::DeserializeOwned>(self) -> Result<Vec<T>>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.execute().await?;
        let size = statements.num_statements();

        let mut results = Vec::with_capacity(size);
        for i in 0..size {
            let result = statements.take::<T>(i).context(DeserializeSnafu)?;
            results.push(result);
        }

        Ok(results)
    }

    /// Execute the query and return the first statement's result as a deserialized value.
    ///
    /// The result can be deserialized into either a single value (`Option<T>`) or a
    /// collection of values (`Vec<T>`).
    pub async fn fetch_first<T: serde::de::DeserializeOwned>(self) -> Result<T>
    where
        usize: QueryResult<T>,
    {
        let mut statements = self.execute().await?;
        let result = statements.take::<T>(0).context(DeserializeSnafu)?;
        Ok(result)
    }
}

/// A typed record id for a database record. Type `T` must implement the [Table] trait so
/// that the table name can be inferred.
///
/// Identifiers are allocator-assigned integers, so the storage record id (`users:3`) and
/// the identifier exposed at the API boundary (`3`) are the same number: deserialization
/// reads the stored [Thing] and validates its table, serialization emits the bare integer.
pub struct EntityId<T> {
    value: i64,
    _marker: std::marker::PhantomData<T>,
}

impl<T: Table> EntityId<T> {
    /// Creates a new `EntityId` from the specified integer, inferring the table name from `T`.
    pub fn new(value: i64) -> Self {
        EntityId {
            value,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// The full record pointer (`<table>:<value>`) for this identifier.
    pub fn thing(&self) -> Thing {
        Thing {
            tb: T::table().to_string(),
            id: Id::Number(self.value),
        }
    }
}

impl<T> std::fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> std::fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.value.fmt(f)
    }
}

impl<T> std::clone::Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> std::marker::Copy for EntityId<T> {}

impl<T> std::cmp::PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> std::cmp::Eq for EntityId<T> {}

impl<T> std::hash::Hash for EntityId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state)
    }
}

impl<T> serde::Serialize for EntityId<T> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T: Table> serde::Deserialize<'de> for EntityId<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let thing = Thing::deserialize(deserializer)?;

        let expected = T::table();
        let actual = &thing.tb;

        if expected != actual {
            return Err(serde::de::Error::custom(format!(
                "table name mismatch, expected '{expected}' but got '{actual}'"
            )));
        }

        match thing.id {
            Id::Number(value) => Ok(EntityId::new(value)),
            other => Err(serde::de::Error::custom(format!(
                "expected a numeric record id for '{expected}' but got '{other}'"
            ))),
        }
    }
}

impl<T, R> IntoResource<R> for EntityId<T>
where
    T: Table,
    Thing: IntoResource<R>,
{
    fn into_resource(self) -> std::result::Result<surrealdb::opt::Resource, surrealdb::Error> {
        self.thing().into_resource()
    }
}
