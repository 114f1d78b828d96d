mod genres;
mod recommend;
mod tmdb;

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

use crate::genres::GenreTable;
use crate::recommend::{recommend_movie, MovieRecommendation};
use crate::tmdb::{MovieCatalog, TmdbClient};

#[derive(Clone)]
struct AppState {
    model: Arc<dyn TextModel>,
    catalog: Arc<dyn MovieCatalog>,
    genres: Arc<GenreTable>,
}

#[derive(Debug, Deserialize)]
struct MovieRequest {
    mood: Option<String>,
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

async fn recommend_movie_handler(
    State(state): State<AppState>,
    Json(request): Json<MovieRequest>,
) -> Result<Json<MovieRecommendation>, (StatusCode, Json<ErrorResponse>)> {
    let Some(mood) = request.mood.filter(|m| !m.is_empty()) else {
        warn!("missing 'mood' in request body");
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "Missing 'mood' in request body",
        ));
    };

    info!(%mood, "received movie recommendation request");

    let recommendation = recommend_movie(
        state.model.as_ref(),
        state.catalog.as_ref(),
        &state.genres,
        &mood,
    )
    .await
    .map_err(|e| {
        error!(error = %e, "movie recommendation failed");
        error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;

    Ok(Json(recommendation))
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/recommend_movie", post(recommend_movie_handler))
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
                .unwrap_or_else(|_| "movie_agent=info,agent_core=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AgentConfig::from_env();
    info!(project = %config.project_id, region = %config.region, "starting movie agent");

    let secrets = SecretStore::new(&config.project_id);
    let tmdb_key = secrets.fetch("tmdb_api_key").await?;
    let gemini_key = secrets.fetch("gemini_api_key").await?;

    let catalog = TmdbClient::new(tmdb_key);

    // One-time genre table; a fetch failure degrades to the builtin table
    // rather than blocking startup.
    let genres = match catalog.fetch_genre_table().await {
        Ok(table) => {
            info!(count = table.len(), "genre table loaded");
            table
        }
        Err(e) => {
            error!(error = %e, "failed to fetch genre table, using builtin fallback");
            GenreTable::builtin()
        }
    };

    let state = AppState {
        model: Arc::new(GeminiModel::new(&gemini_key)),
        catalog: Arc::new(catalog),
        genres: Arc::new(genres),
    };

    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!("movie agent listening on http://0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;

    Ok(())
}
