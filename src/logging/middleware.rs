use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::request_id::{
    MakeRequestUuid, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};

/// Paths served only to a signed-in admin, outside `/api/admin`.
const ADMIN_FILE_PATHS: [&str; 5] = [
    "/api/upload",
    "/api/list-files",
    "/api/delete-file",
    "/api/rename-file",
    "/api/storage-usage",
];

/// Which part of the API a path belongs to, logged with every request.
pub fn surface(path: &str) -> &'static str {
    if path.starts_with("/api/admin") || ADMIN_FILE_PATHS.contains(&path) {
        "admin"
    } else if path == "/health" || path.starts_with("/health/") {
        "health"
    } else {
        "public"
    }
}

/// One log line per request, escalated by response class. Only the path is
/// logged; query strings can carry tokens.
pub async fn log_request(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let surface = surface(&path);

    let req_id: String = request
        .extensions()
        .get::<RequestId>()
        .and_then(|id| id.header_value().to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let response = next.run(request).await;

    let duration_ms = start.elapsed().as_millis();
    let status = response.status();

    match (status.is_server_error(), status.is_client_error()) {
        (true, _) => tracing::error!(
            request_id = %req_id,
            %method,
            %path,
            surface,
            status = status.as_u16(),
            duration_ms,
            "request failed"
        ),
        (_, true) => tracing::warn!(
            request_id = %req_id,
            %method,
            %path,
            surface,
            status = status.as_u16(),
            duration_ms,
            "request rejected"
        ),
        // Readiness probes hit these every few seconds.
        _ if surface == "health" => tracing::debug!(
            request_id = %req_id,
            %path,
            status = status.as_u16(),
            duration_ms,
            "health probe"
        ),
        _ => tracing::info!(
            request_id = %req_id,
            %method,
            %path,
            surface,
            status = status.as_u16(),
            duration_ms,
            "request completed"
        ),
    }

    response
}

pub fn request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::x_request_id(MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::x_request_id()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_classification() {
        assert_eq!(surface("/api/admin/invoices/abc"), "admin");
        assert_eq!(surface("/api/upload"), "admin");
        assert_eq!(surface("/api/storage-usage"), "admin");
        assert_eq!(surface("/health/ready"), "health");
        assert_eq!(surface("/health"), "health");
        assert_eq!(surface("/healthz"), "public");
        assert_eq!(surface("/api/invoices/abc/pdf"), "public");
    }
}
