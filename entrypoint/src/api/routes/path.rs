use std::sync::Arc;

use axum::extract::State;

use crate::ServerState;

/// Debug helper, shows where the next scratch file would land.
pub(crate) async fn path_handler(State(state): State<Arc<ServerState>>) -> String {
    state.image_cache.scratch_path().display().to_string()
}
