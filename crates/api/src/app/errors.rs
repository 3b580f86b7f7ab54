use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use bazaar_core::CoreError;

use crate::settings_store::SettingsStoreError;

pub fn settings_error_to_response(err: SettingsStoreError) -> axum::response::Response {
    tracing::error!("settings store error: {err}");
    match err {
        SettingsStoreError::Unavailable(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "settings_unavailable", msg)
        }
        SettingsStoreError::Corrupt(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "settings_corrupt", msg)
        }
        SettingsStoreError::Io(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "settings_io", e.to_string())
        }
    }
}

pub fn core_error_to_response(err: CoreError) -> axum::response::Response {
    json_error(StatusCode::BAD_REQUEST, "validation_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "success": false,
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
