use crate::errors::AppError;
use crate::metrics::{completion_series, habit_stats, points_series};
use crate::models::{
    DerivedPoint, Habit, HabitPatch, MessageResponse, NewHabit, ProgressResponse, ReorderRequest,
};
use crate::state::AppState;
use crate::storage::parse_id;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

pub async fn list_habits(State(state): State<AppState>) -> Result<Json<Vec<Habit>>, AppError> {
    Ok(Json(state.store.list_all().await))
}

pub async fn get_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Habit>, AppError> {
    let habit = state.store.get(parse_id(&id)?).await?;
    Ok(Json(habit))
}

pub async fn create_habit(
    State(state): State<AppState>,
    payload: Result<Json<NewHabit>, JsonRejection>,
) -> Result<(StatusCode, Json<Habit>), AppError> {
    let Json(payload) = payload?;
    let habit = state.store.create(payload).await?;
    Ok((StatusCode::CREATED, Json(habit)))
}

/// Merge patch. Fields outside `name`, `points`, `description` and
/// `completedDates` are dropped during deserialization.
pub async fn update_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
    patch: Result<Json<HabitPatch>, JsonRejection>,
) -> Result<Json<Habit>, AppError> {
    let Json(patch) = patch?;
    let habit = state.store.update(parse_id(&id)?, patch).await?;
    Ok(Json(habit))
}

pub async fn delete_habit(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state.store.delete(parse_id(&id)?).await?;
    Ok(Json(MessageResponse {
        message: "Habit deleted".into(),
    }))
}

pub async fn habit_progress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProgressResponse>, AppError> {
    let habit = state.store.get(parse_id(&id)?).await?;
    Ok(Json(ProgressResponse {
        series: completion_series(&habit),
        stats: habit_stats(&habit),
        habit,
    }))
}

pub async fn points(State(state): State<AppState>) -> Result<Json<Vec<DerivedPoint>>, AppError> {
    let habits = state.store.list_all().await;
    Ok(Json(points_series(&habits)))
}

pub async fn reorder_habits(
    State(state): State<AppState>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> Result<Json<Vec<Habit>>, AppError> {
    let Json(payload) = payload?;
    // Unknown ids are skipped by the store, so malformed ones are too.
    let ids: Vec<_> = payload
        .ids
        .iter()
        .filter_map(|raw| parse_id(raw).ok())
        .collect();
    let habits = state.store.reorder(&ids).await?;
    Ok(Json(habits))
}
