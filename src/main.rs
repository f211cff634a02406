use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use mongodb::Client;
use tracing_subscriber::{fmt, EnvFilter};

use opensplit::config::{Config, Storage};
use opensplit::repository::{memory::InMemoryRepository, mongo::MongoRepository, GroupRepository};
use opensplit::routes;

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("opensplit=info"));
    fmt().with_env_filter(filter).init();
}

fn other_error(err: impl ToString) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, err.to_string())
}

async fn connect(config: &Config) -> std::io::Result<Arc<dyn GroupRepository>> {
    match &config.storage {
        Storage::Mongo { uri } => {
            tracing::info!(database = %config.database, "connecting to MongoDB");
            let client = Client::with_uri_str(uri).await.map_err(other_error)?;
            let repo = MongoRepository::new(&client, &config.database)
                .await
                .map_err(other_error)?;
            tracing::info!("connected");
            Ok(Arc::new(repo))
        }
        Storage::Memory => {
            tracing::warn!("using in-memory storage, data is lost on restart");
            Ok(Arc::new(InMemoryRepository::default()))
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing();
    let config = Config::from_env().map_err(other_error)?;
    let repo = web::Data::from(connect(&config).await?);

    tracing::info!(host = %config.host, port = config.port, "listening");
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(repo.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
