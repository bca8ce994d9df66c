pub mod assets;
pub mod auth;
pub mod home;
pub mod posts;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

/// Every page of the blog. The caller attaches state and layers.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/about", get(home::about))
        .route("/contact", get(home::contact))
        .route("/assets/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(posts::router())
}
