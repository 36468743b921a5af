//! # recipes
//!
//! A small JSON/HTTP service for a collection of recipes, held in memory.
//!
//! ```text
//! GET    /recipes        list
//! POST   /recipes        create   {name, ingredients[]}  → 201
//! GET    /recipes/{id}   fetch one
//! PUT    /recipes/{id}   replace  {name, ingredients[]}  → 200
//! DELETE /recipes/{id}   remove                          → 204
//! ```
//!
//! The store is an explicit [`RecipeStore`] owned by the caller and handed
//! to [`api::router`]; nothing is global. The HTTP layer underneath is a
//! thin hyper server with radix-tree routing via [`matchit`] and graceful
//! shutdown.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use recipes::{RecipeStore, Server, api, store::UuidIds};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), recipes::Error> {
//!     let store = Arc::new(RecipeStore::seeded(UuidIds));
//!     Server::bind("0.0.0.0:3000")?.serve(api::router(store)).await
//! }
//! ```
//!
//! ## Tests and tools
//!
//! [`Server::start`] binds (port 0 is fine), serves in the background and
//! returns a [`RunningServer`] to `stop()` when done.

mod error;
mod handler;
mod method;
mod middleware;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod api;
pub mod config;
pub mod health;
pub mod logging;
pub mod recipe;
pub mod store;

pub use error::{ApiError, Error};
pub use handler::{Handler, with_state};
pub use method::Method;
pub use recipe::{NewRecipe, Recipe};
pub use request::Request;
pub use response::{IntoResponse, Json, Response, ResponseBuilder};
pub use router::Router;
pub use server::{RunningServer, Server};
pub use status::Status;
pub use store::{IdGenerator, RecipeStore};
