//! In-memory recipe store.
//!
//! An ordered `Vec` behind a mutex. Every operation holds the lock for its
//! whole read-modify-write and never across an `.await`, so ids stay unique
//! and updates stay in place under the multi-threaded runtime.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::debug;

use crate::recipe::{NewRecipe, Recipe};

// ── Id generation ─────────────────────────────────────────────────────────────

/// Source of record identifiers.
///
/// Implementations must never hand out the same id twice over the life of
/// the store, including ids of records that have since been deleted.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

/// Random UUID v4 ids, e.g. `"9b2e0c6a-…"`. The default.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdGenerator for UuidIds {
    fn next_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// `"1"`, `"2"`, `"3"`, … Deterministic, for tests and local poking.
#[derive(Debug, Default)]
pub struct SequentialIds(AtomicU64);

impl IdGenerator for SequentialIds {
    fn next_id(&self) -> String {
        (self.0.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}

// ── Store ─────────────────────────────────────────────────────────────────────

/// Recipes present when a seeded store is created, in insertion order.
pub const SEED_RECIPES: [(&str, [&str; 3]); 2] = [
    ("boiled white rice", ["1 cup white rice", "2 cups water", "pinch of salt"]),
    ("milkshake", ["2 tbsp cocoa", "2 cups vanilla ice cream", "1 cup milk"]),
];

/// The recipe collection, in insertion order.
pub struct RecipeStore {
    items: Mutex<Vec<Recipe>>,
    ids: Box<dyn IdGenerator>,
}

impl RecipeStore {
    /// An empty store issuing UUID v4 ids.
    pub fn new() -> Self {
        Self::with_ids(UuidIds)
    }

    pub fn with_ids(ids: impl IdGenerator + 'static) -> Self {
        Self { items: Mutex::new(Vec::new()), ids: Box::new(ids) }
    }

    /// A store holding [`SEED_RECIPES`].
    pub fn seeded(ids: impl IdGenerator + 'static) -> Self {
        let store = Self::with_ids(ids);
        for (name, ingredients) in SEED_RECIPES {
            store.create(NewRecipe::new(name, ingredients));
        }
        store
    }

    /// Every record, in insertion order.
    pub fn list(&self) -> Vec<Recipe> {
        self.items.lock().clone()
    }

    pub fn get(&self, id: &str) -> Option<Recipe> {
        self.items.lock().iter().find(|r| r.id == id).cloned()
    }

    /// Appends a record under a freshly generated id and returns it.
    pub fn create(&self, new: NewRecipe) -> Recipe {
        let recipe = Recipe {
            id: self.ids.next_id(),
            name: new.name,
            ingredients: new.ingredients,
        };
        self.items.lock().push(recipe.clone());
        debug!(id = %recipe.id, "recipe created");
        recipe
    }

    /// Replaces `name` and `ingredients` of the record with `id`, keeping its
    /// id and position. `None` if there is no such record.
    pub fn update(&self, id: &str, new: NewRecipe) -> Option<Recipe> {
        let mut items = self.items.lock();
        let recipe = items.iter_mut().find(|r| r.id == id)?;
        recipe.name = new.name;
        recipe.ingredients = new.ingredients;
        debug!(id = %id, "recipe updated");
        Some(recipe.clone())
    }

    /// Removes the record with `id`. Returns whether one was there.
    pub fn delete(&self, id: &str) -> bool {
        let mut items = self.items.lock();
        match items.iter().position(|r| r.id == id) {
            Some(idx) => {
                items.remove(idx);
                debug!(id = %id, "recipe deleted");
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl Default for RecipeStore {
    fn default() -> Self { Self::new() }
}
