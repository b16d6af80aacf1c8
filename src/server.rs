use crate::config::AppConfig;
use crate::dashboard;
use crate::data::DataStore;
use crate::map;
use crate::render;
use crate::types::CantonChoice;
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared read-only state: the loaded datasets and the config.
pub struct AppState {
    pub store: DataStore,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(config: AppConfig, store: DataStore) -> Self {
        Self { store, config }
    }

    fn choice(&self, params: &SelectionParams) -> CantonChoice {
        CantonChoice::from_selection(params.canton.as_deref(), &self.config.display.all_option)
    }
}

#[derive(Deserialize)]
pub struct SelectionParams {
    canton: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/cantons", get(cantons_handler))
        .route("/api/choropleth", get(choropleth_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, store: DataStore) -> Result<()> {
    let port = config.server.port;
    let state = Arc::new(AppState::new(config, store));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Response {
    let choice = state.choice(&params);
    info!("Rendering dashboard for {:?}", choice);

    let dash = dashboard::build(&state.store, choice, &state.config.map);
    match render::render_page(&dash, state.store.canton_options(), &state.config) {
        Ok(page) => Html(page).into_response(),
        Err(e) => {
            error!("Failed to render dashboard: {:#}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "failed to render dashboard").into_response()
        }
    }
}

async fn cantons_handler(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.store.canton_options().to_vec())
}

async fn choropleth_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SelectionParams>,
) -> Json<geojson::FeatureCollection> {
    let choice = state.choice(&params);
    let dash = dashboard::build(&state.store, choice, &state.config.map);
    Json(map::choropleth_collection(&dash.features, &dash.scale, &state.config.display))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::tests::{record, square};
    use crate::render::tests::test_config;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        let store = DataStore::from_parts(
            vec![
                record("P1", "A", 1),
                record("P1", "A", 3),
                record("P2", "B", 2),
            ],
            vec![square("A", -84.0, 10.0), square("B", -83.0, 10.0)],
            "Todos",
        );
        router(Arc::new(AppState::new(test_config(), store)))
    }

    async fn get_body(uri: &str) -> (StatusCode, String) {
        let response = app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn serves_dashboard_for_all() {
        let (status, body) = get_body("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<option value="Todos" selected>"#));
        assert!(body.contains("<td>A</td>"));
        assert!(body.contains("<td>B</td>"));
    }

    #[tokio::test]
    async fn serves_dashboard_for_one_canton() {
        let (status, body) = get_body("/?canton=B").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains(r#"<option value="B" selected>"#));
        assert!(!body.contains("<td>A</td>"));
    }

    #[tokio::test]
    async fn lists_options() {
        let (_, body) = get_body("/api/cantons").await;
        let options: Vec<String> = serde_json::from_str(&body).unwrap();
        assert_eq!(options, vec!["Todos", "A", "B"]);
    }

    #[tokio::test]
    async fn choropleth_uses_max_per_canton() {
        let (_, body) = get_body("/api/choropleth").await;
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        let features = value["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["properties"]["count"], 3);
        assert_eq!(features[1]["properties"]["count"], 2);
    }

    #[tokio::test]
    async fn only_dashboard_routes_are_served() {
        let (status, _) = get_body("/api/lookup?lat=10.5&lon=-83.5").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
