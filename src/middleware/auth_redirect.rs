use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

/// Send browsers that hit a page without a valid session to the login page,
/// remembering where they were going.
pub async fn redirect_unauthorized(req: Request, next: Next) -> Response {
    let next_path = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());

    let response = next.run(req).await;
    if response.status() == StatusCode::UNAUTHORIZED {
        Redirect::to(&login_url(&next_path)).into_response()
    } else {
        response
    }
}

fn login_url(next_path: &str) -> String {
    if next_path == "/" || next_path.starts_with("/auth/") {
        return "/auth/login".to_string();
    }
    format!("/auth/login?next={}", percent_encode(next_path))
}

/// Percent-encode everything outside the unreserved set (and `/`).
pub(crate) fn percent_encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b'/' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}
