//! Axum application setup.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::handlers;
use super::state::AppState;

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api", post(handlers::annotate))
        .route("/info", get(handlers::info))
        .route("/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Start the web server.
pub async fn run_server(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    info!(%addr, "server listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use csvw_annotator::UnitIndex;
    use std::io::Write;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::cli::Settings;

    fn test_state() -> AppState {
        AppState::new(
            Arc::new(UnitIndex::new()),
            Settings {
                port: 8000,
                app_name: "CSVToCSVW".to_string(),
                app_version: "test".to_string(),
                admin_mail: "admin@example.org".to_string(),
                app_mode: "development".to_string(),
            },
        )
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = create_router(test_state())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_info_reports_settings() {
        let response = create_router(test_state())
            .oneshot(Request::get("/info").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert_eq!(json["app_name"], "CSVToCSVW");
        assert_eq!(json["admin_mail"], "admin@example.org");
        assert!(json["units"]["total_units"].as_u64().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_annotate_local_file() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"Operator: Jane Doe\nForce [kN];Way [mm]\n1.5;2\n2.5;3\n")
            .unwrap();

        let request = serde_json::json!({
            "data_url": format!("file://{}", file.path().display()),
            "encoding": "utf-8",
        });
        let response = create_router(test_state())
            .oneshot(
                Request::post("/api")
                    .header("content-type", "application/json")
                    .body(Body::from(request.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        assert!(json["filename"].as_str().unwrap().ends_with("-metadata.json"));
        assert_eq!(json["filedata"]["notes"].as_array().unwrap().len(), 1);
        assert_eq!(json["filedata"]["tables"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_annotate_unresolvable_separator() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(b"hello\nworld\n").unwrap();

        let request = serde_json::json!({
            "data_url": file.path().display().to_string(),
            "encoding": "utf-8",
        });
        let response = create_router(test_state())
            .oneshot(
                Request::post("/api")
                    .header("content-type", "application/json")
                    .body(Body::from(request.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["message"]
            .as_str()
            .unwrap()
            .contains("please select manually"));
    }

    #[tokio::test]
    async fn test_annotate_rejects_bad_separator() {
        let request = serde_json::json!({
            "data_url": "file:///nowhere.csv",
            "separator": "(",
        });
        let response = create_router(test_state())
            .oneshot(
                Request::post("/api")
                    .header("content-type", "application/json")
                    .body(Body::from(request.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
