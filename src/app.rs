use crate::handlers;
use crate::pages;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/habits", post(pages::add_habit))
        .route("/habits/:id", get(pages::habit_detail))
        .route("/habits/:id/toggle", post(pages::toggle_habit))
        .route("/habits/:id/points", post(pages::update_points))
        .route("/habits/:id/rename", post(pages::rename_habit))
        .route("/habits/:id/delete", post(pages::delete_habit))
        .route("/habits/:id/description", post(pages::save_description))
        .route("/reorder", post(pages::reorder_habits))
        .route(
            "/api/habits",
            get(handlers::list_habits).post(handlers::create_habit),
        )
        .route(
            "/api/habits/:id",
            get(handlers::get_habit)
                .put(handlers::update_habit)
                .delete(handlers::delete_habit),
        )
        .route("/api/habits/:id/progress", get(handlers::habit_progress))
        .route("/api/points", get(handlers::points))
        .route("/api/order", put(handlers::reorder_habits))
        .with_state(state)
}
