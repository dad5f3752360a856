use crate::controller::Controller;
use crate::{dispatch, page};
use axum::{
    extract::{Query, State},
    response::{Html, Json},
    routing::get,
    Router,
};
use rad10_proto::protocol::{Preset, StatusSnapshot};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

/// Everything a request needs.  Immutable after startup.
#[derive(Clone)]
pub struct HttpState {
    pub controller: Arc<dyn Controller>,
    pub presets: Arc<[Preset]>,
    pub volume_step: u8,
}

#[derive(Serialize)]
struct ApiStatus {
    #[serde(flatten)]
    status: StatusSnapshot,
    fetched_at: String,
}

pub fn router(state: HttpState, static_dir: Option<PathBuf>) -> Router {
    let api = Router::new()
        .route("/api/status", get(get_status))
        .layer(CorsLayer::permissive());

    let app = Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/healthz", get(healthz))
        .merge(api)
        .with_state(state);

    // css/ and images/ for the page, when deployed alongside it
    let app = match static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir)),
        None => app,
    };

    app.layer(TraceLayer::new_for_http())
}

pub async fn serve(
    bind_address: &str,
    port: u16,
    state: HttpState,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let app = router(state, static_dir);

    let addr = format!("{}:{}", bind_address, port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind HTTP server to {}: {}", addr, e))?;

    info!("rad10 listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown requested");
    }
}

/// Dispatch at most one action, then render fresh status.  Always 200.
async fn index(
    State(state): State<HttpState>,
    query: Option<Query<Vec<(String, String)>>>,
) -> Html<String> {
    let params = query.map(|Query(p)| p).unwrap_or_default();

    let mut action_error = None;
    match dispatch::resolve(&params, &state.presets) {
        Some(command) => {
            info!("HTTP: {:?} via {}", command, state.controller.name());
            if let Err(e) =
                dispatch::dispatch(state.controller.as_ref(), &command, state.volume_step).await
            {
                action_error = Some(e.to_string());
            }
        }
        None if !params.is_empty() => debug!("HTTP: no recognised control in {:?}", params),
        None => {}
    }

    let mut status = state.controller.query_status().await;
    if let Some(reason) = action_error {
        status.mark_unavailable(reason);
    }

    Html(page::render(&state.presets, &status))
}

async fn get_status(State(state): State<HttpState>) -> Json<ApiStatus> {
    let status = state.controller.query_status().await;
    Json(ApiStatus {
        status,
        fetched_at: chrono::Local::now().to_rfc3339(),
    })
}

async fn healthz() -> &'static str {
    "ok"
}
