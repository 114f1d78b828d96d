use thiserror::Error;

pub type Result<T> = std::result::Result<T, AgentError>;

/// Error type shared by all agent services.
///
/// Best-effort steps (keyword inference, trivia generation, detail enrichment)
/// catch these locally and substitute a default; only terminal conditions reach
/// a request handler.
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("failed to access secret '{name}': {reason}")]
    SecretAccess { name: String, reason: String },

    #[error("generative model call failed: {0}")]
    Model(String),

    #[error("request to provider failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("provider rejected the request (status {status}): {message}")]
    Provider { status: u16, message: String },

    #[error("provider daily limit reached or plan expired")]
    QuotaExhausted,

    #[error("{0}")]
    NoCandidates(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_name_the_failing_secret() {
        let err = AgentError::SecretAccess {
            name: "tmdb_api_key".to_string(),
            reason: "status 403".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to access secret 'tmdb_api_key': status 403"
        );
    }
}
