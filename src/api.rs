//! Recipe HTTP API.
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | GET | `/recipes` | 200 array | — |
//! | GET | `/recipes/{id}` | 200 object | 404 |
//! | POST | `/recipes` | 201 object + `location` | 400 |
//! | PUT | `/recipes/{id}` | 200 object | 400, 404 |
//! | DELETE | `/recipes/{id}` | 204 | — |
//!
//! DELETE answers 204 whether or not the id existed.

use std::sync::Arc;

use tracing::info;

use crate::error::ApiError;
use crate::handler::with_state;
use crate::health;
use crate::method::Method;
use crate::recipe::{Recipe, RecipePayload};
use crate::request::Request;
use crate::response::{Json, Response};
use crate::router::Router;
use crate::status::Status;
use crate::store::RecipeStore;

/// Wires every route to `store`. This is the composition root for handlers.
pub fn router(store: Arc<RecipeStore>) -> Router {
    Router::new()
        .on(Method::Get,    "/recipes",      with_state(&store, list_recipes))
        .on(Method::Post,   "/recipes",      with_state(&store, create_recipe))
        .on(Method::Get,    "/recipes/{id}", with_state(&store, get_recipe))
        .on(Method::Put,    "/recipes/{id}", with_state(&store, update_recipe))
        .on(Method::Delete, "/recipes/{id}", with_state(&store, delete_recipe))
        .on(Method::Get,    "/healthz",      health::liveness)
        .on(Method::Get,    "/readyz",       with_state(&store, health::readiness))
}

// GET /recipes
async fn list_recipes(store: Arc<RecipeStore>, _req: Request) -> Json<Vec<Recipe>> {
    Json(store.list())
}

// GET /recipes/{id}
async fn get_recipe(store: Arc<RecipeStore>, req: Request) -> Result<Json<Recipe>, ApiError> {
    let id = path_id(&req)?;
    store.get(id).map(Json).ok_or_else(|| not_found(id))
}

// POST /recipes → 201 with the stored record
async fn create_recipe(store: Arc<RecipeStore>, req: Request) -> Result<Response, ApiError> {
    let new = req.json::<RecipePayload>()?.validate()?;
    let recipe = store.create(new);
    info!(id = %recipe.id, name = %recipe.name, "created recipe");

    let location = format!("/recipes/{}", recipe.id);
    Ok(Response::builder()
        .status(Status::Created)
        .header("location", &location)
        .json(encode(&recipe)?))
}

// PUT /recipes/{id} → 200 with the replaced record
async fn update_recipe(store: Arc<RecipeStore>, req: Request) -> Result<Json<Recipe>, ApiError> {
    let id = path_id(&req)?;
    let new = req.json::<RecipePayload>()?.validate_for(id)?;
    let recipe = store.update(id, new).ok_or_else(|| not_found(id))?;
    info!(id = %recipe.id, name = %recipe.name, "updated recipe");
    Ok(Json(recipe))
}

// DELETE /recipes/{id} → 204
async fn delete_recipe(store: Arc<RecipeStore>, req: Request) -> Result<Status, ApiError> {
    let id = path_id(&req)?;
    if store.delete(id) {
        info!(id = %id, "deleted recipe");
    } else {
        info!(id = %id, "delete of unknown recipe ignored");
    }
    Ok(Status::NoContent)
}

fn path_id(req: &Request) -> Result<&str, ApiError> {
    // Every `{id}` route captures it; absence means a wiring mistake.
    req.param("id")
        .ok_or_else(|| ApiError::Validation("Missing recipe id in request path".to_owned()))
}

fn not_found(id: &str) -> ApiError {
    ApiError::NotFound(format!("Recipe `{id}` not found"))
}

fn encode(recipe: &Recipe) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(recipe).map_err(|e| ApiError::Serialize(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::test_request;
    use crate::response::IntoResponse;
    use crate::store::SequentialIds;

    fn store() -> Arc<RecipeStore> {
        Arc::new(RecipeStore::seeded(SequentialIds::default()))
    }

    fn body(resp: &Response) -> serde_json::Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    #[tokio::test]
    async fn create_sets_location_header() {
        let s = store();
        let req = test_request(r#"{"name":"coffee","ingredients":["water"]}"#, &[]);
        let resp = create_recipe(Arc::clone(&s), req).await.into_response();

        assert_eq!(resp.status_code(), 201);
        assert_eq!(resp.header("location"), Some("/recipes/3"));
        assert_eq!(body(&resp)["id"], "3");
        assert_eq!(s.len(), 3);
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let req = test_request("not json", &[]);
        let resp = create_recipe(store(), req).await.into_response();
        assert_eq!(resp.status_code(), 400);
    }

    #[tokio::test]
    async fn update_checks_body_id_against_path() {
        let req = test_request(r#"{"id":"2","name":"x","ingredients":[]}"#, &[("id", "1")]);
        let resp = update_recipe(store(), req).await.into_response();
        assert_eq!(resp.status_code(), 400);
        assert!(body(&resp)["error"].as_str().unwrap().contains("must match"));
    }

    #[tokio::test]
    async fn update_requires_both_fields() {
        let s = store();
        for (body_json, field) in [
            (r#"{"ingredients":["rice"]}"#, "name"),
            (r#"{"name":"sticky rice"}"#, "ingredients"),
        ] {
            let resp = update_recipe(Arc::clone(&s), test_request(body_json, &[("id", "1")]))
                .await
                .into_response();
            assert_eq!(resp.status_code(), 400);
            assert_eq!(body(&resp)["error"], format!("Missing `{field}` in request body"));
        }
        assert_eq!(s.get("1").unwrap().name, "boiled white rice");
    }

    #[tokio::test]
    async fn update_unknown_is_404() {
        let req = test_request(r#"{"name":"x","ingredients":[]}"#, &[("id", "9")]);
        let resp = update_recipe(store(), req).await.into_response();
        assert_eq!(resp.status_code(), 404);
    }

    #[tokio::test]
    async fn get_one_by_id() {
        let resp = get_recipe(store(), test_request("", &[("id", "2")]))
            .await
            .into_response();
        assert_eq!(resp.status_code(), 200);
        assert_eq!(body(&resp)["name"], "milkshake");
    }

    #[tokio::test]
    async fn delete_unknown_is_still_204() {
        let s = store();
        let resp = delete_recipe(Arc::clone(&s), test_request("", &[("id", "x")]))
            .await
            .into_response();
        assert_eq!(resp.status_code(), 204);
        assert!(resp.body().is_empty());
        assert_eq!(s.len(), 2);
    }
}
