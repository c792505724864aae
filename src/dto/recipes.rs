use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Recipe;

/// One `(ingredient, amount)` pair of a recipe write.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct IngredientAmountRequest {
    pub id: Uuid,
    pub amount: i32,
}

/// Body of both recipe creation and recipe update. An update replaces the
/// tag set and the ingredient set as a whole.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecipeWriteRequest {
    pub tags: Vec<Uuid>,
    pub ingredients: Vec<IngredientAmountRequest>,
    pub name: String,
    /// Opaque image reference. Required on create, kept as-is when omitted on update.
    pub image: Option<String>,
    pub text: String,
    pub cooking_time: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct RecipeList {
    #[schema(value_type = Vec<Recipe>)]
    pub items: Vec<Recipe>,
}
