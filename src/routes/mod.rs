pub mod categories;
pub mod folders;
pub mod posts;

use crate::AppState;
use axum::{Router, routing::get};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/posts", post_routes())
        .nest("/folders", folder_routes())
        .nest("/categories", category_routes())
        .with_state(state)
}

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(posts::get_posts)
                .post(posts::create_post)
                .delete(posts::delete_post),
        )
        .route("/{id}", get(posts::get_one_post).put(posts::update_post))
}

pub fn folder_routes() -> Router<AppState> {
    Router::new().route("/", get(folders::get_folders).post(folders::create_folder))
}

pub fn category_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(categories::get_categories).post(categories::create_category),
    )
}
