const DEFAULT_PROJECT_ID: &str = "moodfusion-hackathon";
const DEFAULT_REGION: &str = "us-central1";
const DEFAULT_PORT: u16 = 8080;

/// Process-wide configuration, read from the environment once at startup and
/// treated as immutable afterwards.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub project_id: String,
    pub region: String,
    pub port: u16,
}

impl AgentConfig {
    pub fn from_env() -> Self {
        Self {
            project_id: std::env::var("GCP_PROJECT_ID")
                .unwrap_or_else(|_| DEFAULT_PROJECT_ID.to_string()),
            region: std::env::var("GCP_REGION").unwrap_or_else(|_| DEFAULT_REGION.to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}
