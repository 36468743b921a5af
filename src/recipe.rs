//! Recipe record and the request payload that creates or replaces one.

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// A stored recipe. Serializes as `{"id", "name", "ingredients"}`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub name: String,
    /// Kept in the order the client sent them.
    pub ingredients: Vec<String>,
}

/// Fields a client supplies on POST and PUT.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct NewRecipe {
    pub name: String,
    pub ingredients: Vec<String>,
}

impl NewRecipe {
    pub fn new<I, S>(name: impl Into<String>, ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            ingredients: ingredients.into_iter().map(Into::into).collect(),
        }
    }
}

/// Raw JSON body of POST / PUT before presence checks.
///
/// Every field is optional here so a missing one surfaces as a validation
/// message naming it, not as a generic decode error.
#[derive(Debug, Default, Deserialize)]
pub struct RecipePayload {
    pub id: Option<String>,
    pub name: Option<String>,
    pub ingredients: Option<Vec<String>>,
}

impl RecipePayload {
    /// Checks `name` then `ingredients` are present.
    pub fn validate(self) -> Result<NewRecipe, ApiError> {
        let name = self.name.ok_or_else(|| missing("name"))?;
        let ingredients = self.ingredients.ok_or_else(|| missing("ingredients"))?;
        Ok(NewRecipe { name, ingredients })
    }

    /// Like [`validate`](Self::validate), and additionally rejects a body `id`
    /// that disagrees with the id in the request path.
    pub fn validate_for(self, path_id: &str) -> Result<NewRecipe, ApiError> {
        if let Some(body_id) = self.id.as_deref() {
            if body_id != path_id {
                return Err(ApiError::Validation(format!(
                    "Request path id (`{path_id}`) and request body id (`{body_id}`) must match"
                )));
            }
        }
        self.validate()
    }
}

fn missing(field: &str) -> ApiError {
    ApiError::Validation(format!("Missing `{field}` in request body"))
}
