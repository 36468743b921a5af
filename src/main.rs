//! `recipes` server binary.
//!
//! Run with:
//!   RUST_LOG=info cargo run
//!
//! Try:
//!   curl http://localhost:3000/recipes
//!   curl -X POST http://localhost:3000/recipes \
//!        -H 'content-type: application/json' \
//!        -d '{"name":"coffee","ingredients":["coffee grounds","water","milk"]}'
//!   curl -X DELETE http://localhost:3000/recipes/<id>

use std::process::ExitCode;
use std::sync::Arc;

use recipes::config::Config;
use recipes::store::UuidIds;
use recipes::{Error, RecipeStore, Server, api, logging};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::from_env();
    logging::init(config.log_json);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("server error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), Error> {
    let store = if config.seed {
        RecipeStore::seeded(UuidIds)
    } else {
        RecipeStore::with_ids(UuidIds)
    };
    info!(recipes = store.len(), seeded = config.seed, "store ready");

    Server::bind(&config.bind)?
        .max_body_bytes(config.max_body_bytes)
        .drain_timeout(config.drain_timeout)
        .serve(api::router(Arc::new(store)))
        .await
}
