use thiserror::Error;

/// Errors which can occur when talking to the Clash of Clans API.
#[derive(Debug, Error)]
pub enum CocApiError {
    #[error("Reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("HTTP status error: {0}")]
    Status(reqwest::StatusCode),

    #[error("Decoding raw response error: {0}")]
    Serde(serde_json::Error),

    #[error("no Clash of Clans API token is configured")]
    MissingApiKey,
}

/// A call to the Clash of Clans API either succeeds with the expected
/// payload or fails with a [`CocApiError`].
pub type CocApiResponse<T> = Result<T, CocApiError>;
