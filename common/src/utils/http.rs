use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::AppError;

/// Prefers the remote `{"error": {"message": …}}` payload when present,
/// otherwise derives a message from the status code.
pub fn upstream_error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| {
            payload
                .get("error")?
                .get("message")?
                .as_str()
                .map(ToOwned::to_owned)
        })
        .unwrap_or_else(|| format!("Upstream call failed with status {status}"))
}

/// Reads a JSON payload from an upstream response, mapping error statuses and
/// malformed bodies to upstream errors.
pub async fn read_upstream_json<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(upstream_error_message(status, &body)));
    }

    response
        .json::<T>()
        .await
        .map_err(|err| AppError::Upstream(format!("Malformed upstream response: {err}")))
}

pub fn transport_error(err: reqwest::Error) -> AppError {
    AppError::Upstream(format!("Transport error: {err}"))
}
