mod recommend;
mod spoonacular;

use std::sync::Arc;

use agent_core::{AgentConfig, GeminiModel, SecretStore, TextModel};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::recommend::{recommend_meal, MealContext, MealRecommendation};
use crate::spoonacular::{RecipeCatalog, SpoonacularClient};

#[derive(Clone)]
struct AppState {
    model: Arc<dyn TextModel>,
    catalog: Arc<dyn RecipeCatalog>,
}

#[derive(Debug, Deserialize)]
struct MealRequest {
    mood: Option<String>,
    #[serde(default, rename = "mealContext")]
    meal_context: Option<MealContext>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn health_check() -> &'static str {
    "OK"
}

fn error_response(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

async fn recommend_meal_handler(
    State(state): State<AppState>,
    Json(request): Json<MealRequest>,
) -> Result<Json<MealRecommendation>, (StatusCode, Json<ErrorResponse>)> {
    let Some(mood) = request.mood.filter(|m| !m.is_empty()) else {
        warn!("missing 'mood' in request body");
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing 'mood' in request body",
        ));
    };
    let context = request.meal_context.unwrap_or_default();

    info!(%mood, ?context, "received meal recommendation request");

    let recommendation = recommend_meal(state.model.as_ref(), state.catalog.as_ref(), &mood, context)
        .await
        .map_err(|e| {
            error!(error = %e, "meal recommendation failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    Ok(Json(recommendation))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend_meal", post(recommend_meal_handler))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meal_agent=info,agent_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env();
    info!(project = %config.project_id, region = %config.region, "starting meal agent");

    // Required credentials; a failure here is fatal since the service cannot
    // serve anything without them.
    let secrets = SecretStore::new(&config.project_id);
    let spoonacular_key = secrets.fetch("spoonacular_api_key").await?;
    let gemini_key = secrets.fetch("gemini_api_key").await?;

    let state = AppState {
        model: Arc::new(GeminiModel::new(&gemini_key)),
        catalog: Arc::new(SpoonacularClient::new(spoonacular_key)),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("meal agent listening on http://0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
