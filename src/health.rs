//! Health-check handlers.
//!
//! | Check | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Is the store wired up and answering? |

use std::sync::Arc;

use serde::Serialize;

use crate::request::Request;
use crate::response::{Json, Response};
use crate::store::RecipeStore;

/// Always `200 OK` with body `"ok"`. If the process can answer at all, it is alive.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

#[derive(Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub recipes: usize,
}

/// `200 OK` with the number of stored recipes.
///
/// Taking the store lock proves the handler state is reachable.
pub async fn readiness(store: Arc<RecipeStore>, _req: Request) -> Json<Readiness> {
    Json(Readiness { status: "ready", recipes: store.len() })
}
