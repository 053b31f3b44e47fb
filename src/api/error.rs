use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("login failed: {0}")]
    LoginError(String),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("can't get pool id")]
    PoolIdUnavailable,
    #[error("no data: {0}")]
    NoData(String),
    #[error("invalid response ({1}): {0}")]
    InvalidResponse(String, String),
    #[error("write not applied: {0}")]
    WriteNotApplied(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Map a failed HTTP exchange to `Error`.
pub fn map_api_err(error: reqwest::Error) -> Error {
    match error.status() {
        Some(http::StatusCode::UNAUTHORIZED) | Some(http::StatusCode::FORBIDDEN) => {
            Error::LoginError(error.to_string())
        }
        _ => Error::ApiError(error.to_string()),
    }
}
