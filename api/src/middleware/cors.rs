use tower_http::cors::{Any, CorsLayer};

/// Browser clients may call from any origin.
///
/// - Origins, methods, headers: any
/// - Credentials: not allowed
/// - Max age: 3600s
pub fn build_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_credentials(false)
        .max_age(std::time::Duration::from_secs(3600))
}

#[cfg(test)]
mod tests {
    use axum::Router;
    use axum::body::Body;
    use axum::http::{Method, Request, StatusCode};
    use axum::routing::post;
    use tower::ServiceExt;

    async fn ok() -> StatusCode {
        StatusCode::OK
    }

    #[tokio::test]
    async fn preflight_allows_any_origin_without_credentials() {
        let app = Router::new()
            .route("/plant-status", post(ok))
            .layer(super::build_cors_layer());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/plant-status")
                    .header("origin", "https://plants.example")
                    .header("access-control-request-method", "POST")
                    .header("access-control-request-headers", "content-type")
                    .body(Body::empty())
                    .expect("request should build"),
            )
            .await
            .expect("request should succeed");

        let headers = response.headers();
        assert_eq!(
            headers
                .get("access-control-allow-origin")
                .expect("allow-origin header should exist"),
            "*"
        );
        assert!(headers.get("access-control-allow-credentials").is_none());
        assert_eq!(
            headers
                .get("access-control-allow-headers")
                .expect("allow-headers header should exist"),
            "*"
        );
    }
}
