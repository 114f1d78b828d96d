use agent_core::{AgentError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const BASE_URL: &str = "https://api.spoonacular.com";

/// Ingredients excluded from every mood-driven search; the agent recommends
/// meals, not desserts.
const EXCLUDED_INGREDIENTS: &str =
    "muffin, pastry, cookie, cake, ice cream, donut, sweet, honey, chocolate, tart, dessert, pie, brownie";

const FALLBACK_QUERY: &str = "popular food";
const FALLBACK_MEAL_TYPES: &str = "main course,breakfast,lunch";
const RESULT_COUNT: u32 = 5;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<Recipe>,
}

/// One `complexSearch` attempt. The primary attempt carries the mood keyword
/// and the full filter set; the fallback widens the meal types and drops the
/// calorie/time/exclusion filters entirely.
#[derive(Debug, Clone)]
pub struct RecipeQuery {
    pub query: String,
    pub meal_types: String,
    pub min_calories: Option<u32>,
    pub max_ready_time: Option<u32>,
    pub exclude_ingredients: Option<String>,
}

impl RecipeQuery {
    pub fn primary(keyword: &str, meal_types: &str) -> Self {
        Self {
            query: keyword.to_string(),
            meal_types: meal_types.to_string(),
            min_calories: Some(250),
            max_ready_time: Some(90),
            exclude_ingredients: Some(EXCLUDED_INGREDIENTS.to_string()),
        }
    }

    pub fn fallback() -> Self {
        Self {
            query: FALLBACK_QUERY.to_string(),
            meal_types: FALLBACK_MEAL_TYPES.to_string(),
            min_calories: None,
            max_ready_time: None,
            exclude_ingredients: None,
        }
    }
}

#[async_trait]
pub trait RecipeCatalog: Send + Sync {
    async fn search(&self, query: &RecipeQuery) -> Result<Vec<Recipe>>;
}

pub struct SpoonacularClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl SpoonacularClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, BASE_URL)
    }

    fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RecipeCatalog for SpoonacularClient {
    async fn search(&self, query: &RecipeQuery) -> Result<Vec<Recipe>> {
        let mut params: Vec<(&str, String)> = vec![
            ("apiKey", self.api_key.clone()),
            ("query", query.query.clone()),
            ("number", RESULT_COUNT.to_string()),
            ("addRecipeInformation", "true".to_string()),
            ("instructionsRequired", "true".to_string()),
            ("type", query.meal_types.clone()),
            ("sort", "random".to_string()),
        ];
        if let Some(min_calories) = query.min_calories {
            params.push(("minCalories", min_calories.to_string()));
        }
        if let Some(max_ready_time) = query.max_ready_time {
            params.push(("maxReadyTime", max_ready_time.to_string()));
        }
        if let Some(excluded) = &query.exclude_ingredients {
            params.push(("excludeIngredients", excluded.clone()));
        }

        debug!(query = %query.query, meal_types = %query.meal_types, "searching recipes");

        let response = self
            .http
            .get(format!("{}/recipes/complexSearch", self.base_url))
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::PAYMENT_REQUIRED {
            return Err(AgentError::QuotaExhausted);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn recipe_json(title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": 715538,
            "title": title,
            "image": format!("https://img.spoonacular.com/{title}.jpg"),
            "sourceUrl": format!("https://example.com/{title}"),
            "summary": format!("A lovely {title}."),
        })
    }

    #[tokio::test]
    async fn search_sends_filters_and_parses_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recipes/complexSearch"))
            .and(query_param("query", "comfort food"))
            .and(query_param("sort", "random"))
            .and(query_param("minCalories", "250"))
            .and(query_param("maxReadyTime", "90"))
            .and(query_param("type", "main course"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [recipe_json("goulash"), recipe_json("ramen")],
                "totalResults": 2
            })))
            .mount(&server)
            .await;

        let client = SpoonacularClient::with_base_url("key", server.uri());
        let query = RecipeQuery::primary("comfort food", "main course");
        let recipes = client.search(&query).await.unwrap();
        assert_eq!(recipes.len(), 2);
        assert_eq!(recipes[0].title, "goulash");
        assert_eq!(
            recipes[0].source_url.as_deref(),
            Some("https://example.com/goulash")
        );
    }

    #[tokio::test]
    async fn fallback_query_omits_narrow_filters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recipes/complexSearch"))
            .and(query_param("query", "popular food"))
            .and(query_param("type", "main course,breakfast,lunch"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "results": [recipe_json("stew")] })),
            )
            .mount(&server)
            .await;

        let client = SpoonacularClient::with_base_url("key", server.uri());
        let recipes = client.search(&RecipeQuery::fallback()).await.unwrap();
        assert_eq!(recipes.len(), 1);

        // The fallback request must not carry the primary-only filters.
        let requests = server.received_requests().await.unwrap();
        let query_string = requests[0].url.query().unwrap_or_default().to_string();
        assert!(!query_string.contains("minCalories"));
        assert!(!query_string.contains("excludeIngredients"));
    }

    #[tokio::test]
    async fn payment_required_maps_to_quota_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recipes/complexSearch"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;

        let client = SpoonacularClient::with_base_url("key", server.uri());
        let err = client
            .search(&RecipeQuery::primary("anything", "main course"))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::QuotaExhausted));
    }

    #[tokio::test]
    async fn server_error_maps_to_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/recipes/complexSearch"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = SpoonacularClient::with_base_url("key", server.uri());
        let err = client
            .search(&RecipeQuery::fallback())
            .await
            .unwrap_err();
        match err {
            AgentError::Provider { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Provider error, got {other:?}"),
        }
    }
}
