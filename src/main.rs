use dotenvy::dotenv;

use tanuki::api;
use tanuki::config::Config;
use tanuki::error::ApplicationError;
use tanuki::logging;

#[tokio::main]
async fn main() -> Result<(), ApplicationError> {
    dotenv().ok();

    let config = Config::from_env()?;

    logging::init();

    api::serve(config).await
}
