use axum::routing::{get, post};
use axum::Router;
use snafu::ResultExt as _;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::error::{
    ApplicationError, BindAddressSnafu, ConnectDatabaseSnafu, SetupMailerSnafu, WebServerSnafu,
};

mod error;
mod state;
mod token;
mod users;
mod videos;

pub use error::*;
pub use state::*;

pub type Result<T, E = ApiError> = std::result::Result<T, E>;

/// Routes map one-to-one onto the user and video operations. Creation, update
/// and deletion require a bearer token; listings, reads and the verification
/// flow are public.
pub fn router(app: App) -> Router {
    let users = Router::new()
        .route("/", get(users::list).post(users::create))
        .route("/verify/:id", get(users::verify))
        .route("/send-verification", post(users::send_verification))
        .route(
            "/:id",
            get(users::find).put(users::update).delete(users::remove),
        );

    let videos = Router::new()
        .route("/", get(videos::list).post(videos::create))
        .route("/likes", get(videos::top_by_likes))
        .route("/visibility/:visibility", get(videos::by_visibility))
        .route("/user/:user_id", get(videos::by_user))
        .route("/comment/:id", post(videos::add_comment))
        .route("/like/:id", post(videos::like))
        .route(
            "/:id",
            get(videos::find).put(videos::update).delete(videos::remove),
        );

    Router::new()
        .nest("/user", users)
        .nest("/video", videos)
        .route("/token", post(token::issue))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app)
}

pub async fn serve(config: Config) -> Result<(), ApplicationError> {
    let database = config.database().await.context(ConnectDatabaseSnafu)?;
    let mailer = config.mailer().context(SetupMailerSnafu)?;
    let app = App::new(database, config.authenticator(), mailer);

    let listener = tokio::net::TcpListener::bind(config.host)
        .await
        .context(BindAddressSnafu {
            address: config.host,
        })?;

    tracing::info!(address = %config.host, "listening");

    axum::serve(listener, router(app)).await.context(WebServerSnafu)
}
