use agent_core::{split_terms, AgentError, Result, TextModel};
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::genres::GenreTable;
use crate::tmdb::{Movie, MovieCatalog, MovieDetails, IMAGE_BASE_URL, PLACEHOLDER_POSTER};

/// Sentinel for detail fields the best-effort enrichment could not supply.
const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovieRecommendation {
    pub movie_title: String,
    pub movie_poster_url: String,
    pub movie_description: String,
    pub movie_source_url: String,
    pub movie_year: String,
    pub movie_runtime: String,
    pub movie_rating: String,
    pub movie_vote_average: String,
}

pub fn genre_prompt(mood: &str, table: &GenreTable) -> String {
    format!(
        r#"The user is feeling: "{mood}".
Suggest 3-5 distinct movie genre names that would perfectly match this mood.
Do not suggest specific movies, actors, or genre IDs.
Choose ONLY from the following genres: {genres}.
If a mood doesn't directly map to a genre, pick the closest fitting ones.
Examples:
- If mood is "sad", genres could be "Drama", "Family", "Music".
- If mood is "adventurous", genres could be "Action", "Adventure", "Fantasy".
- If mood is "cozy and thoughtful", genres could be "Drama", "Family", "Comedy", "Romance", "Animation".
Return the genre names as a comma-separated list."#,
        mood = mood,
        genres = table.names().join(", "),
    )
}

/// Infer genre IDs for a mood. Best-effort: unknown genre names are skipped,
/// and any failure or empty outcome falls back to Drama.
pub async fn infer_genre_ids(model: &dyn TextModel, mood: &str, table: &GenreTable) -> Vec<u32> {
    let inferred = match model.complete(&genre_prompt(mood, table)).await {
        Ok(reply) => {
            let mut ids = Vec::new();
            for name in split_terms(&reply) {
                match table.id_of(&name) {
                    Some(id) => ids.push(id),
                    None => warn!(genre = %name, "inferred genre not in table, skipping"),
                }
            }
            ids
        }
        Err(e) => {
            warn!(%mood, error = %e, "genre inference failed, falling back to drama");
            Vec::new()
        }
    };

    if inferred.is_empty() {
        warn!(%mood, "no usable genres inferred, falling back to drama");
        vec![table.drama_id()]
    } else {
        info!(%mood, genres = ?inferred, "inferred genre ids");
        inferred
    }
}

pub async fn recommend_movie(
    model: &dyn TextModel,
    catalog: &dyn MovieCatalog,
    table: &GenreTable,
    mood: &str,
) -> Result<MovieRecommendation> {
    let genre_ids = infer_genre_ids(model, mood, table).await;

    // A discover failure discards the pool and falls through to the popular
    // fallback; the request only fails once both sources come up empty.
    let mut movies = match catalog.discover(&genre_ids).await {
        Ok(movies) => movies,
        Err(e) => {
            error!(error = %e, "discover search failed");
            Vec::new()
        }
    };
    info!(count = movies.len(), ?genre_ids, "discover search returned");

    if movies.is_empty() {
        warn!(?genre_ids, "no movies found, trying popular fallback");
        movies = match catalog.popular().await {
            Ok(movies) => movies,
            Err(e) => {
                error!(error = %e, "popular fallback failed");
                Vec::new()
            }
        };
        info!(count = movies.len(), "popular fallback returned");
    }

    let selected = pick_random(&movies).ok_or_else(|| {
        AgentError::NoCandidates(
            "could not find any movies with discover or the popular fallback".into(),
        )
    })?;

    info!(title = %selected.title, id = selected.id, "selected movie");

    // Best-effort enrichment; failure leaves the sentinel fields in place.
    let (year, runtime, rating, vote_average) = match catalog.details(selected.id).await {
        Ok(details) => (
            release_year(details.release_date.as_deref()),
            format_runtime(details.runtime),
            us_certification(&details),
            format_vote(details.vote_average),
        ),
        Err(e) => {
            error!(id = selected.id, error = %e, "detail lookup failed, defaulting fields");
            (
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
                NOT_AVAILABLE.to_string(),
            )
        }
    };

    Ok(MovieRecommendation {
        movie_title: selected.title.clone(),
        movie_poster_url: poster_url(selected),
        movie_description: selected.overview.clone().unwrap_or_default(),
        movie_source_url: format!("https://www.themoviedb.org/movie/{}", selected.id),
        movie_year: year,
        movie_runtime: runtime,
        movie_rating: rating,
        movie_vote_average: vote_average,
    })
}

fn poster_url(movie: &Movie) -> String {
    match movie.poster_path.as_deref() {
        Some(path) => format!("{IMAGE_BASE_URL}{}", path.trim_start_matches('/')),
        None => PLACEHOLDER_POSTER.to_string(),
    }
}

fn release_year(release_date: Option<&str>) -> String {
    release_date
        .and_then(|date| date.split('-').next())
        .filter(|year| !year.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn format_runtime(minutes: Option<u32>) -> String {
    match minutes {
        Some(minutes) => format!("{}h {}min", minutes / 60, minutes % 60),
        None => NOT_AVAILABLE.to_string(),
    }
}

fn format_vote(vote_average: Option<f64>) -> String {
    match vote_average {
        Some(avg) => format!("{avg:.1}/10"),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// First non-empty US certification in the release data.
fn us_certification(details: &MovieDetails) -> String {
    details
        .release_dates
        .as_ref()
        .into_iter()
        .flat_map(|envelope| envelope.results.iter())
        .filter(|country| country.iso_3166_1 == "US")
        .flat_map(|country| country.release_dates.iter())
        .map(|release| release.certification.trim())
        .find(|certification| !certification.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn pick_random<T>(items: &[T]) -> Option<&T> {
    items.choose(&mut rand::thread_rng())
}
