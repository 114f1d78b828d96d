use agent_core::{AgentError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::genres::GenreTable;

const BASE_URL: &str = "https://api.themoviedb.org/3";

pub const IMAGE_BASE_URL: &str = "https://image.tmdb.org/t/p/w500/";
pub const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/300x450";

/// Pages of discover results fetched before the fallback is considered.
const DISCOVER_PAGES: u32 = 3;

#[derive(Debug, Clone, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PagedResults {
    #[serde(default)]
    results: Vec<Movie>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieDetails {
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime: Option<u32>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub release_dates: Option<ReleaseDatesEnvelope>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReleaseDatesEnvelope {
    #[serde(default)]
    pub results: Vec<CountryReleaseDates>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CountryReleaseDates {
    pub iso_3166_1: String,
    #[serde(default)]
    pub release_dates: Vec<ReleaseDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseDate {
    #[serde(default)]
    pub certification: String,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    id: u32,
    name: String,
}

#[async_trait]
pub trait MovieCatalog: Send + Sync {
    /// Discover movies matching the genre IDs, pooling up to three pages.
    async fn discover(&self, genre_ids: &[u32]) -> Result<Vec<Movie>>;
    /// Context-free fallback: first page of movies by descending popularity.
    async fn popular(&self) -> Result<Vec<Movie>>;
    /// Detail record for one movie, including region release data.
    async fn details(&self, movie_id: u64) -> Result<MovieDetails>;
}

pub struct TmdbClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
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

    /// Fetch the live genre-name→ID table. Called once at startup; the caller
    /// substitutes the builtin table on failure.
    pub async fn fetch_genre_table(&self) -> Result<GenreTable> {
        let url = format!("{}/genre/movie/list", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", "en-US")])
            .send()
            .await?;
        let body: GenreList = check(response).await?.json().await?;
        Ok(GenreTable::from_pairs(
            body.genres.into_iter().map(|g| (g.name, g.id)),
        ))
    }

    async fn fetch_page(&self, genre_ids: &str, page: u32) -> Result<PagedResults> {
        let url = format!("{}/discover/movie", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "en-US"),
                ("include_adult", "false"),
                ("include_video", "false"),
                ("with_genres", genre_ids),
                ("page", &page.to_string()),
            ])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

/// Map provider-level failure statuses before any body parsing. The 402 quota
/// condition is detected here, on the live response.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
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
    Ok(response)
}

#[async_trait]
impl MovieCatalog for TmdbClient {
    async fn discover(&self, genre_ids: &[u32]) -> Result<Vec<Movie>> {
        let joined = genre_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(",");

        let mut movies = Vec::new();
        for page in 1..=DISCOVER_PAGES {
            let body = self.fetch_page(&joined, page).await?;
            debug!(page, count = body.results.len(), "discover page fetched");
            movies.extend(body.results);
            if let Some(total_pages) = body.total_pages {
                if page >= total_pages {
                    break;
                }
            }
        }
        Ok(movies)
    }

    async fn popular(&self) -> Result<Vec<Movie>> {
        let url = format!("{}/discover/movie", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "en-US"),
                ("sort_by", "popularity.desc"),
                ("include_adult", "false"),
                ("include_video", "false"),
                ("page", "1"),
            ])
            .send()
            .await?;
        let body: PagedResults = check(response).await?.json().await?;
        Ok(body.results)
    }

    async fn details(&self, movie_id: u64) -> Result<MovieDetails> {
        let url = format!("{}/movie/{}", self.base_url, movie_id);
        let response = self
            .http
            .get(&url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("language", "en-US"),
                ("append_to_response", "release_dates"),
            ])
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn movie_json(id: u64, title: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "title": title,
            "poster_path": format!("/{id}.jpg"),
            "overview": format!("The story of {title}."),
        })
    }

    fn page_json(ids: &[u64], total_pages: u32) -> serde_json::Value {
        serde_json::json!({
            "page": 1,
            "results": ids.iter().map(|id| movie_json(*id, &format!("Movie {id}"))).collect::<Vec<_>>(),
            "total_pages": total_pages,
            "total_results": ids.len(),
        })
    }

    #[tokio::test]
    async fn discover_pools_three_pages() {
        let server = MockServer::start().await;
        for page in 1..=3u64 {
            Mock::given(method("GET"))
                .and(path("/discover/movie"))
                .and(query_param("with_genres", "18,35"))
                .and(query_param("page", page.to_string()))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(page_json(&[page * 10, page * 10 + 1], 20)),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = TmdbClient::with_base_url("key", server.uri());
        let movies = client.discover(&[18, 35]).await.unwrap();
        assert_eq!(movies.len(), 6);
    }

    #[tokio::test]
    async fn discover_stops_early_when_results_run_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[1, 2], 1)))
            .expect(1)
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url("key", server.uri());
        let movies = client.discover(&[18]).await.unwrap();
        assert_eq!(movies.len(), 2);
        // Only one request: total_pages=1 short-circuits the loop.
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn popular_sorts_by_descending_popularity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .and(query_param("sort_by", "popularity.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(page_json(&[7], 1)))
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url("key", server.uri());
        let movies = client.popular().await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].id, 7);
    }

    #[tokio::test]
    async fn details_parses_release_data() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/movie/603"))
            .and(query_param("append_to_response", "release_dates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 603,
                "release_date": "1999-03-31",
                "runtime": 136,
                "vote_average": 8.2,
                "release_dates": {
                    "results": [
                        { "iso_3166_1": "DE", "release_dates": [{ "certification": "16" }] },
                        { "iso_3166_1": "US", "release_dates": [{ "certification": "R" }] }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url("key", server.uri());
        let details = client.details(603).await.unwrap();
        assert_eq!(details.release_date.as_deref(), Some("1999-03-31"));
        assert_eq!(details.runtime, Some(136));
        assert_eq!(details.vote_average, Some(8.2));
        assert_eq!(details.release_dates.unwrap().results.len(), 2);
    }

    #[tokio::test]
    async fn genre_fetch_builds_a_lowercased_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/genre/movie/list"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "genres": [
                    { "id": 28, "name": "Action" },
                    { "id": 878, "name": "Science Fiction" }
                ]
            })))
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url("key", server.uri());
        let table = client.fetch_genre_table().await.unwrap();
        assert_eq!(table.id_of("action"), Some(28));
        assert_eq!(table.id_of("Science Fiction"), Some(878));
    }

    #[tokio::test]
    async fn payment_required_maps_to_quota_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .respond_with(ResponseTemplate::new(402))
            .mount(&server)
            .await;

        let client = TmdbClient::with_base_url("key", server.uri());
        let err = client.discover(&[18]).await.unwrap_err();
        assert!(matches!(err, AgentError::QuotaExhausted));
    }
}
