//! Security response headers.
//!
//! # Responsibilities
//! - Stop browsers from MIME-sniffing JSON and static responses
//!
//! # Design Decisions
//! - Headers set by a handler win (`if_not_present`)
//! - Enabled or disabled as a whole by `security.enable_headers`

use axum::http::{header, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

/// `x-content-type-options: nosniff` on every response.
pub fn nosniff_layer() -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_adds_nosniff_header() {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(nosniff_layer());

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(
            response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
    }
}
