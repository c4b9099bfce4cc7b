use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tenantgate_auth::AuthError;

pub fn auth_error_to_response(err: AuthError) -> axum::response::Response {
    let status = match err {
        AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
        AuthError::Unauthorized | AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let message = match &err {
        // Backend details stay in the logs.
        AuthError::Unavailable(_) => "authorization backend unavailable".to_string(),
        other => other.to_string(),
    };
    json_error(status, err.code(), message)
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
