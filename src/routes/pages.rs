use crate::{AppState, gate};
use axum::{Router, middleware};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};

/// static_bundle
///
/// Serves files from the compiled dashboard bundle. Unknown paths and
/// directories fall back to `index.html` so client-side routes (e.g.
/// `/dashboard/admin/users`) load the application shell.
pub fn static_bundle(dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dir)
        .append_index_html_on_directories(false)
        .fallback(ServeFile::new(dir.join("index.html")))
}

/// Pages Router Module
///
/// Every request that reaches the static bundle goes through the access gate
/// first, whatever spelling its path uses. The gate lets paths outside
/// `/login` and `/dashboard/**` through unchanged, so assets and the landing
/// page stay public.
pub fn page_routes(state: &AppState) -> Router {
    Router::new()
        .fallback_service(static_bundle(&state.config.static_dir))
        .layer(middleware::from_fn_with_state(
            state.gate.clone(),
            gate::access_gate,
        ))
}
