mod trivia;

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
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::trivia::{generate_trivia, MealInfo, MovieInfo};

#[derive(Clone)]
struct AppState {
    model: Arc<dyn TextModel>,
}

#[derive(Debug, Deserialize)]
struct TriviaRequest {
    #[serde(default)]
    meal: Option<MealInfo>,
    #[serde(default)]
    movie: Option<MovieInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TriviaResponse {
    trivia_fact: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn health_check() -> &'static str {
    "OK"
}

async fn get_trivia_handler(
    State(state): State<AppState>,
    Json(request): Json<TriviaRequest>,
) -> Result<Json<TriviaResponse>, (StatusCode, Json<ErrorResponse>)> {
    if request.meal.is_none() && request.movie.is_none() {
        warn!("missing 'meal' and 'movie' in request body");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Missing 'meal' or 'movie' data in request body".to_string(),
            }),
        ));
    }

    info!(
        has_meal = request.meal.is_some(),
        has_movie = request.movie.is_some(),
        "received trivia request"
    );

    let trivia_fact = generate_trivia(
        state.model.as_ref(),
        request.meal.as_ref(),
        request.movie.as_ref(),
    )
    .await;

    Ok(Json(TriviaResponse { trivia_fact }))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/get_trivia", post(get_trivia_handler))
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
                .unwrap_or_else(|_| "trivia_agent=info,agent_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env();
    info!(project = %config.project_id, region = %config.region, "starting trivia agent");

    let secrets = SecretStore::new(&config.project_id);
    let gemini_key = secrets.fetch("gemini_api_key").await?;

    let state = AppState {
        model: Arc::new(GeminiModel::new(&gemini_key)),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("trivia agent listening on http://0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt;

    struct StubModel {
        reply: &'static str,
    }

    #[async_trait]
    impl TextModel for StubModel {
        async fn complete(&self, _prompt: &str) -> agent_core::Result<String> {
            Ok(self.reply.to_string())
        }
    }

    fn test_router(reply: &'static str) -> Router {
        router(AppState {
            model: Arc::new(StubModel { reply }),
        })
    }

    fn post_json(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/get_trivia")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn missing_both_contexts_returns_400() {
        let app = test_router("unused");
        let response = app.oneshot(post_json(serde_json::json!({}))).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing 'meal' or 'movie' data in request body");
    }

    #[tokio::test]
    async fn meal_context_alone_yields_a_fact() {
        let app = test_router("Stews predate written recipes.");
        let response = app
            .oneshot(post_json(serde_json::json!({
                "meal": { "mealTitle": "Beef Stew", "mealDescription": "Slow-cooked." }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["triviaFact"], "Stews predate written recipes.");
    }

    #[tokio::test]
    async fn both_contexts_yield_a_fact() {
        let app = test_router("Keanu Reeves trained for months while eating stew.");
        let response = app
            .oneshot(post_json(serde_json::json!({
                "meal": { "mealTitle": "Beef Stew" },
                "movie": { "movieTitle": "The Matrix" }
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["triviaFact"].as_str().unwrap().contains("stew"));
    }
}
