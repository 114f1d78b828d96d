use agent_core::{split_terms, AgentError, Result, TextModel};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::spoonacular::{Recipe, RecipeCatalog, RecipeQuery};

/// Keyword used whenever mood inference fails or produces nothing usable.
pub const DEFAULT_KEYWORD: &str = "comfort food";

const NO_INSTRUCTIONS_FALLBACK: &str =
    "No detailed instructions available, please visit the source URL.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealContext {
    Breakfast,
    Lunch,
    Dinner,
    #[default]
    General,
}

impl MealContext {
    /// Wording interpolated into the keyword-inference prompt.
    fn prompt_description(self) -> &'static str {
        match self {
            MealContext::Breakfast => "a delicious breakfast or brunch meal",
            MealContext::Lunch => "a satisfying lunch meal",
            MealContext::Dinner => "a hearty dinner meal",
            MealContext::General => "a satisfying meal (breakfast, lunch, or dinner)",
        }
    }

    /// Spoonacular `type` filter for the primary search.
    fn catalog_types(self) -> &'static str {
        match self {
            MealContext::Breakfast => "breakfast",
            MealContext::Lunch => "lunch",
            // "main course" is the closest Spoonacular type for dinner
            MealContext::Dinner => "main course",
            MealContext::General => "main course,breakfast,lunch,appetizer,salad,soup",
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MealRecommendation {
    pub meal_title: String,
    pub meal_image_url: String,
    pub meal_description: String,
    pub meal_source_url: String,
}

pub fn keyword_prompt(mood: &str, context: MealContext) -> String {
    format!(
        r#"The user is feeling: "{mood}".
Your task is to suggest 3-5 distinct food-related keywords that would perfectly match this mood for {description}.

STRICTLY AVOID suggesting any:
- Desserts (e.g., cake, cookie, pie, ice cream, tart, sweet pastries)
- Sweet-only snacks (e.g., fruit by itself, nuts, plain yogurt, sweet smoothies)
- Drinks (e.g., coffee, tea, juice)

Keywords can include:
- Cuisine types (e.g., "Italian", "Mexican", "Thai", "Mediterranean")
- Meal categories specific to the context (e.g., "omelette", "pancakes", "sandwich", "soup", "stir-fry", "roast", "casserole", "curry", "burrito", "pasta", "pizza")
- Main protein or vegetable (e.g., "chicken", "beef", "fish", "lentil", "tofu")
- Preparation styles (e.g., "grilled", "baked", "braised", "quick", "easy")

Examples:
- If mood is "cozy" and meal type is "breakfast", keywords: "warm oatmeal", "breakfast casserole", "fluffy pancakes".
- If mood is "energetic" and meal type is "lunch", keywords: "grilled chicken salad", "lean protein bowl", "fresh wrap".
- If mood is "romantic" and meal type is "dinner", keywords: "elegant steak", "seafood pasta", "wine pairing meal".
- If mood is "tired" and meal type is "any", keywords: "easy one-pan meal", "quick pasta", "soup and sandwich".

Return the keywords as a comma-separated list."#,
        mood = mood,
        description = context.prompt_description(),
    )
}

/// Translate free-form mood text into search keywords. Best-effort: any model
/// failure or an empty reply falls back to a single default keyword.
pub async fn infer_keywords(
    model: &dyn TextModel,
    mood: &str,
    context: MealContext,
) -> Vec<String> {
    match model.complete(&keyword_prompt(mood, context)).await {
        Ok(reply) => {
            let keywords = split_terms(&reply);
            if keywords.is_empty() {
                warn!(%mood, "model inferred no keywords, falling back to '{DEFAULT_KEYWORD}'");
                vec![DEFAULT_KEYWORD.to_string()]
            } else {
                info!(%mood, ?keywords, "inferred meal keywords");
                keywords
            }
        }
        Err(e) => {
            warn!(%mood, error = %e, "keyword inference failed, falling back to '{DEFAULT_KEYWORD}'");
            vec![DEFAULT_KEYWORD.to_string()]
        }
    }
}

pub async fn recommend_meal(
    model: &dyn TextModel,
    catalog: &dyn RecipeCatalog,
    mood: &str,
    context: MealContext,
) -> Result<MealRecommendation> {
    let keywords = infer_keywords(model, mood, context).await;

    let primary = RecipeQuery::primary(&keywords[0], context.catalog_types());
    let mut recipes = catalog.search(&primary).await?;
    info!(count = recipes.len(), keyword = %primary.query, "primary recipe search returned");

    if recipes.is_empty() {
        warn!(keyword = %primary.query, "no recipes found, trying broadened fallback query");
        recipes = catalog.search(&RecipeQuery::fallback()).await?;
        info!(count = recipes.len(), "fallback recipe search returned");
    }

    let selected = pick_random(&recipes).ok_or_else(|| {
        AgentError::NoCandidates("could not find any recipes, even with the fallback query".into())
    })?;

    info!(title = %selected.title, "selected meal");
    Ok(flatten(selected))
}

fn flatten(recipe: &Recipe) -> MealRecommendation {
    let description = recipe
        .summary
        .clone()
        .or_else(|| recipe.instructions.clone())
        .unwrap_or_else(|| NO_INSTRUCTIONS_FALLBACK.to_string());

    MealRecommendation {
        meal_title: recipe.title.clone(),
        meal_image_url: recipe.image.clone().unwrap_or_default(),
        meal_description: description,
        meal_source_url: recipe.source_url.clone().unwrap_or_default(),
    }
}

fn pick_random<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}
