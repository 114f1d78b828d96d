use agent_core::TextModel;
use serde::Deserialize;
use tracing::{error, info};

/// Returned without calling the model when no context was supplied.
pub const NO_CONTEXT_MESSAGE: &str = "No specific meal or movie provided for trivia.";

/// Returned when the model call fails; trivia generation never errors.
pub const FALLBACK_MESSAGE: &str = "Could not generate trivia fact at this time.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealInfo {
    #[serde(default)]
    pub meal_title: Option<String>,
    #[serde(default)]
    pub meal_description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieInfo {
    #[serde(default)]
    pub movie_title: Option<String>,
    #[serde(default)]
    pub movie_description: Option<String>,
}

/// Assemble the trivia prompt from whatever context is present. Returns `None`
/// when there is nothing to build a fact from.
pub fn trivia_prompt(meal: Option<&MealInfo>, movie: Option<&MovieInfo>) -> Option<String> {
    let mut parts = Vec::new();

    if let Some(meal) = meal {
        let title = meal.meal_title.as_deref().unwrap_or("a meal");
        let description = meal.meal_description.as_deref().unwrap_or_default();
        parts.push(format!(
            "Regarding the meal '{title}' which is described as: {description}"
        ));
    }

    if let Some(movie) = movie {
        let title = movie.movie_title.as_deref().unwrap_or("a movie");
        let description = movie.movie_description.as_deref().unwrap_or_default();
        parts.push(format!(
            "Regarding the movie '{title}' which is described as: {description}"
        ));
    }

    if parts.is_empty() {
        return None;
    }

    Some(format!(
        "Generate one interesting, short, and surprising trivia fact based on the following information. \
         The fact should be concise and engaging. Do not start with 'Did you know' or similar phrases. \
         Keep it to a single sentence, or two very short sentences.\n\n{}\n\nTrivia Fact:",
        parts.join("\n")
    ))
}

/// Produce one trivia sentence. Never fails: missing context and model errors
/// both map to fixed strings.
pub async fn generate_trivia(
    model: &dyn TextModel,
    meal: Option<&MealInfo>,
    movie: Option<&MovieInfo>,
) -> String {
    let Some(prompt) = trivia_prompt(meal, movie) else {
        return NO_CONTEXT_MESSAGE.to_string();
    };

    match model.complete(&prompt).await {
        Ok(fact) => {
            info!(%fact, "generated trivia");
            fact
        }
        Err(e) => {
            error!(error = %e, "trivia generation failed");
            FALLBACK_MESSAGE.to_string()
        }
    }
}
